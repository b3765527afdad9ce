//! Gate library behaviour on explicit-phase registers

use approx::assert_relative_eq;
use num_complex::Complex64;
use quvec_engine::{Register, SharedRng};

const EPSILON: f64 = 1e-10;

fn one() -> Complex64 {
    Complex64::new(1.0, 0.0)
}

/// Register with unit phase and a fixed random stream.
fn fixed(qubit_count: usize, init_state: usize) -> Register {
    Register::with_phase_and_rng(qubit_count, init_state, one(), SharedRng::seeded(42)).unwrap()
}

#[test]
fn test_hadamard_on_fresh_qubit() {
    let mut reg = fixed(1, 0);
    reg.h(0).unwrap();
    assert!((reg.prob(0).unwrap() - 0.5).abs() < 1e-9);
}

#[test]
fn test_x_twice_is_exact_identity() {
    let mut reg = fixed(3, 0);
    reg.h_reg(0, 3).unwrap();
    reg.rt(0.7, 1).unwrap();
    let before = reg.clone_raw_state();

    reg.x(1).unwrap();
    reg.x(1).unwrap();
    let after = reg.clone_raw_state();
    assert_eq!(before, after);
}

#[test]
fn test_h_twice_is_identity_up_to_eps() {
    let mut reg = fixed(1, 0);
    let before = reg.clone_raw_state();
    reg.h(0).unwrap();
    reg.h(0).unwrap();
    let after = reg.clone_raw_state();
    for (b, a) in before.iter().zip(after.iter()) {
        assert_relative_eq!(b.re, a.re, epsilon = EPSILON);
        assert_relative_eq!(b.im, a.im, epsilon = EPSILON);
    }
}

#[test]
fn test_x_flips_basis_state() {
    let mut reg = fixed(2, 0);
    reg.x(1).unwrap();
    assert_relative_eq!(reg.prob_all(2).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_y_maps_zero_to_i_one() {
    let mut reg = fixed(1, 0);
    reg.y(0).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[1].re, 0.0, epsilon = EPSILON);
    assert_relative_eq!(amps[1].im, 1.0, epsilon = EPSILON);
}

#[test]
fn test_z_phases_one_state() {
    let mut reg = fixed(1, 1);
    reg.z(0).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[1].re, -1.0, epsilon = EPSILON);
}

#[test]
fn test_rx_pi_maps_zero_to_minus_i_one() {
    let mut reg = fixed(1, 0);
    reg.rx(std::f64::consts::PI, 0).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[0].norm(), 0.0, epsilon = EPSILON);
    assert_relative_eq!(amps[1].re, 0.0, epsilon = EPSILON);
    assert_relative_eq!(amps[1].im, -1.0, epsilon = EPSILON);
}

#[test]
fn test_rt_dyad_sign_convention() {
    // Dyad(1, 2) is the continuous phase shift at -π: |1⟩ picks up e^(-iπ/2).
    let mut reg = fixed(1, 1);
    reg.rt_dyad(1, 2, 0).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[1].re, 0.0, epsilon = EPSILON);
    assert_relative_eq!(amps[1].im, -1.0, epsilon = EPSILON);
}

#[test]
fn test_cnot_control_zero_leaves_target() {
    let mut reg = fixed(2, 2);
    reg.cnot(0, 1).unwrap();
    assert_relative_eq!(reg.prob_all(2).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_cnot_control_one_flips_target() {
    let mut reg = fixed(2, 1);
    reg.cnot(0, 1).unwrap();
    assert_relative_eq!(reg.prob_all(3).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_anti_cnot_fires_on_zero_control() {
    let mut reg = fixed(2, 0);
    reg.anti_cnot(0, 1).unwrap();
    assert_relative_eq!(reg.prob_all(2).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_ccnot_truth_table() {
    let mut reg = fixed(3, 3);
    reg.ccnot(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(7).unwrap(), 1.0, epsilon = EPSILON);

    let mut reg = fixed(3, 1);
    reg.ccnot(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(1).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_cz_phases_only_both_set() {
    let mut reg = fixed(2, 3);
    reg.cz(0, 1).unwrap();
    assert_relative_eq!(reg.clone_raw_state()[3].re, -1.0, epsilon = EPSILON);

    let mut reg = fixed(2, 1);
    reg.cz(0, 1).unwrap();
    assert_relative_eq!(reg.clone_raw_state()[1].re, 1.0, epsilon = EPSILON);
}

#[test]
fn test_swap_exchanges_bits() {
    let mut reg = fixed(2, 1);
    reg.swap(0, 1).unwrap();
    assert_relative_eq!(reg.prob_all(2).unwrap(), 1.0, epsilon = EPSILON);
    reg.swap(0, 1).unwrap();
    assert_relative_eq!(reg.prob_all(1).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_bell_pair() {
    let mut reg = fixed(2, 0);
    reg.h(0).unwrap();
    reg.cnot(0, 1).unwrap();

    assert!((reg.prob(0).unwrap() - 0.5).abs() < 1e-9);
    assert!((reg.prob(1).unwrap() - 0.5).abs() < 1e-9);

    let outcome = reg.m_reg(0, 2).unwrap();
    assert!(outcome == 0 || outcome == 3);
    assert_relative_eq!(
        reg.prob(0).unwrap(),
        reg.prob(1).unwrap(),
        epsilon = EPSILON
    );
}

#[test]
fn test_bell_outcomes_split() {
    let rng = SharedRng::seeded(1234);
    let mut zeros = 0;
    let mut threes = 0;
    for _ in 0..200 {
        let mut reg = Register::with_phase_and_rng(2, 0, one(), rng.clone()).unwrap();
        reg.h(0).unwrap();
        reg.cnot(0, 1).unwrap();
        match reg.m_reg(0, 2).unwrap() {
            0 => zeros += 1,
            3 => threes += 1,
            other => panic!("entangled pair collapsed to {}", other),
        }
    }
    assert_eq!(zeros + threes, 200);
    assert!(zeros > 30 && threes > 30);
}

#[test]
fn test_x_reg_inverts_window() {
    let mut reg = fixed(4, 0b0101);
    reg.x_reg(0, 3).unwrap();
    assert_relative_eq!(reg.prob_all(0b0010).unwrap(), 1.0, epsilon = EPSILON);
    reg.x_reg(0, 3).unwrap();
    assert_relative_eq!(reg.prob_all(0b0101).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_swap_reg_disjoint_ranges() {
    let mut reg = fixed(4, 0b0011);
    reg.swap_reg(0, 2, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b1100).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_logic_and() {
    let mut reg = fixed(3, 0b011);
    reg.and(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b111).unwrap(), 1.0, epsilon = EPSILON);

    let mut reg = fixed(3, 0b001);
    reg.and(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b001).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_logic_or() {
    let mut reg = fixed(3, 0b001);
    reg.or(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b101).unwrap(), 1.0, epsilon = EPSILON);

    let mut reg = fixed(3, 0b000);
    reg.or(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b000).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_logic_xor() {
    let mut reg = fixed(3, 0b011);
    reg.xor(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b011).unwrap(), 1.0, epsilon = EPSILON);

    let mut reg = fixed(3, 0b010);
    reg.xor(0, 1, 2).unwrap();
    assert_relative_eq!(reg.prob_all(0b110).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_classical_logic_variants() {
    let mut reg = fixed(2, 0b01);
    reg.cland(0, true, 1).unwrap();
    assert_relative_eq!(reg.prob_all(0b11).unwrap(), 1.0, epsilon = 1e-10);

    let mut reg = fixed(2, 0b00);
    reg.clor(0, true, 1).unwrap();
    assert_relative_eq!(reg.prob_all(0b10).unwrap(), 1.0, epsilon = 1e-10);

    let mut reg = fixed(2, 0b01);
    reg.clxor(0, true, 1).unwrap();
    assert_relative_eq!(reg.prob_all(0b01).unwrap(), 1.0, epsilon = 1e-10);
}

#[test]
fn test_and_rejects_partial_overlap() {
    let mut reg = fixed(3, 0);
    assert!(reg.and(0, 1, 1).is_err());
    assert!(reg.or(2, 1, 2).is_err());
}

#[test]
fn test_two_qubit_gates_reject_equal_indices() {
    let mut reg = fixed(2, 0);
    assert!(reg.cnot(1, 1).is_err());
    assert!(reg.swap(0, 0).is_err());
    assert!(reg.cz(1, 1).is_err());
    assert!(reg.ccnot(0, 0, 1).is_err());
}

#[test]
fn test_out_of_range_qubit_rejected() {
    let mut reg = fixed(2, 0);
    assert!(reg.x(2).is_err());
    assert!(reg.h(9).is_err());
    assert!(reg.cnot(0, 5).is_err());
}

#[test]
fn test_set_bit_forces_value() {
    let mut reg = fixed(2, 0);
    reg.set_bit(1, true).unwrap();
    assert_relative_eq!(reg.prob(1).unwrap(), 1.0, epsilon = EPSILON);
    reg.set_bit(1, false).unwrap();
    assert_relative_eq!(reg.prob(1).unwrap(), 0.0, epsilon = EPSILON);
}

#[test]
fn test_reverse_flips_bit_order() {
    let mut reg = fixed(3, 0b001);
    reg.reverse(0, 3).unwrap();
    assert_relative_eq!(reg.prob_all(0b100).unwrap(), 1.0, epsilon = EPSILON);
}

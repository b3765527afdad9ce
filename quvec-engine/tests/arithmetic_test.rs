//! Arithmetic oracle behaviour: modular, carry, signed, BCD, shifts, QFT

use approx::assert_relative_eq;
use num_complex::Complex64;
use quvec_engine::{Register, SharedRng, StateError};

const EPSILON: f64 = 1e-10;

fn one() -> Complex64 {
    Complex64::new(1.0, 0.0)
}

fn fixed(qubit_count: usize, init_state: usize) -> Register {
    Register::with_phase_and_rng(qubit_count, init_state, one(), SharedRng::seeded(42)).unwrap()
}

// ---- modular add / subtract ------------------------------------------------

#[test]
fn test_modular_add_scenario() {
    let mut reg = fixed(8, 5);
    reg.inc(3, 0, 8).unwrap();
    assert_eq!(reg.m_reg(0, 8).unwrap(), 8);
}

#[test]
fn test_inc_wraps_modulo_window() {
    let mut reg = fixed(4, 15);
    reg.inc(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_inc_dec_identity_on_superposition() {
    let mut reg = fixed(6, 0);
    reg.h_reg(0, 4).unwrap();
    let before = reg.clone_raw_state();
    reg.inc(5, 0, 6).unwrap();
    reg.dec(5, 0, 6).unwrap();
    assert_eq!(before, reg.clone_raw_state());
}

#[test]
fn test_inc_only_touches_window() {
    let mut reg = fixed(6, 0b110010);
    reg.inc(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b110011).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_incc_carry_out_on_wrap() {
    let mut reg = fixed(5, 15);
    reg.incc(1, 0, 4, 4).unwrap();
    assert_relative_eq!(reg.prob_all(1 << 4).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_incc_consumes_carry_in() {
    let mut reg = fixed(5, (1 << 4) | 3);
    reg.incc(1, 0, 4, 4).unwrap();
    assert_relative_eq!(reg.prob_all(5).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_decc_flags_borrow() {
    let mut reg = fixed(5, 0);
    reg.decc(1, 0, 4, 4).unwrap();
    assert_relative_eq!(reg.prob_all(15 | (1 << 4)).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_decc_no_borrow_leaves_carry_clear() {
    let mut reg = fixed(5, 7);
    reg.decc(3, 0, 4, 4).unwrap();
    assert_relative_eq!(reg.prob_all(4).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_carry_inside_window_rejected() {
    let mut reg = fixed(5, 0);
    assert!(matches!(
        reg.incc(1, 0, 4, 2),
        Err(StateError::OverlappingQubits { index: 2 })
    ));
}

// ---- signed add / subtract -------------------------------------------------

#[test]
fn test_incs_overflow_flips_phase_with_overflow_bit_set() {
    // 4-bit window holds 6, overflow bit prepared |1⟩: 6 + 3 = 9 overflows
    // positive, so the result amplitude at |1⟩⊗|1001⟩ picks up a -1 phase.
    let mut reg = fixed(5, 0b0110 | (1 << 4));
    reg.incs(3, 0, 4, 4).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[0b1001 | (1 << 4)].re, -1.0, epsilon = EPSILON);
}

#[test]
fn test_incs_no_phase_flip_without_overflow_bit() {
    let mut reg = fixed(5, 0b0110);
    reg.incs(3, 0, 4, 4).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[0b1001].re, 1.0, epsilon = EPSILON);
}

#[test]
fn test_incs_both_negative_overflow() {
    // -8 + -1 in a 4-bit window: |−8| + |−1| exceeds 2^3.
    let mut reg = fixed(5, 0b1000 | (1 << 4));
    reg.incs(0b1111, 0, 4, 4).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[0b0111 | (1 << 4)].re, -1.0, epsilon = EPSILON);
}

#[test]
fn test_incs_no_overflow_mixed_signs() {
    let mut reg = fixed(5, 0b1100 | (1 << 4));
    reg.incs(0b0010, 0, 4, 4).unwrap();
    let amps = reg.clone_raw_state();
    assert_relative_eq!(amps[0b1110 | (1 << 4)].re, 1.0, epsilon = EPSILON);
}

#[test]
fn test_incsc_sets_carry_on_wrap() {
    let mut reg = fixed(5, 12);
    reg.incsc(5, 0, 4, None, 4).unwrap();
    assert_relative_eq!(reg.prob_all(1 | (1 << 4)).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_decsc_flagged_form_carries_on_no_borrow() {
    // Flagged subtract borrows in while the carry is clear: 7 - 3 - 1 = 3,
    // no wrap-around borrow, so the carry comes out set.
    let mut reg = fixed(6, 7);
    reg.decsc(3, 0, 4, Some(5), 4).unwrap();
    assert_relative_eq!(reg.prob_all(3 | (1 << 4)).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_decsc_unflagged_form_marks_borrow() {
    let mut reg = fixed(5, 2);
    reg.decsc(3, 0, 4, None, 4).unwrap();
    assert_relative_eq!(reg.prob_all(15 | (1 << 4)).unwrap(), 1.0, epsilon = EPSILON);
}

// ---- rotations and shifts --------------------------------------------------

#[test]
fn test_rol_moves_and_wraps_bits() {
    let mut reg = fixed(4, 0b0001);
    reg.rol(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b0010).unwrap(), 1.0, epsilon = EPSILON);

    let mut reg = fixed(4, 0b1000);
    reg.rol(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b0001).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_rol_ror_identity() {
    let mut reg = fixed(5, 0b01101);
    let before = reg.clone_raw_state();
    reg.rol(2, 0, 5).unwrap();
    reg.ror(2, 0, 5).unwrap();
    assert_eq!(before, reg.clone_raw_state());
}

#[test]
fn test_rol_inside_larger_register() {
    let mut reg = fixed(6, 0b100001);
    reg.rol(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b100010).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_lsl_lsr_fill_with_zero() {
    let mut reg = fixed(4, 0b0011);
    reg.lsl(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b0110).unwrap(), 1.0, epsilon = EPSILON);
    reg.lsr(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b0011).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_lsl_overshift_clears_window() {
    let mut reg = fixed(4, 0b1011);
    reg.lsl(4, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_asl_shifts_below_sign_and_carry() {
    let mut reg = fixed(4, 0b0001);
    reg.asl(1, 0, 4).unwrap();
    assert_relative_eq!(reg.prob_all(0b0010).unwrap(), 1.0, epsilon = EPSILON);
}

// ---- packed decimal --------------------------------------------------------

#[test]
fn test_incbcd_carries_between_nibbles() {
    let mut reg = fixed(8, 0x25);
    reg.incbcd(17, 0, 8).unwrap();
    assert_relative_eq!(reg.prob_all(0x42).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_incbcd_decbcd_identity() {
    let mut reg = fixed(8, 0x25);
    let before = reg.clone_raw_state();
    reg.incbcd(17, 0, 8).unwrap();
    reg.decbcd(17, 0, 8).unwrap();
    assert_eq!(before, reg.clone_raw_state());
}

#[test]
fn test_bcd_invalid_digit_passes_through() {
    let mut reg = fixed(8, 0x0F);
    reg.incbcd(1, 0, 8).unwrap();
    assert_relative_eq!(reg.prob_all(0x0F).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_bcd_length_must_be_nibbles() {
    let mut reg = fixed(6, 0);
    assert!(matches!(
        reg.incbcd(1, 0, 6),
        Err(StateError::NonDecimalLength { length: 6 })
    ));
    assert!(matches!(
        reg.decbcd(1, 0, 6),
        Err(StateError::NonDecimalLength { length: 6 })
    ));
}

#[test]
fn test_incbcdc_carry_out() {
    let mut reg = fixed(9, 0x99);
    reg.incbcdc(1, 0, 8, 8).unwrap();
    assert_relative_eq!(reg.prob_all(1 << 8).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_decbcdc_borrow_out() {
    let mut reg = fixed(9, 0x00);
    reg.decbcdc(1, 0, 8, 8).unwrap();
    assert_relative_eq!(reg.prob_all(0x99 | (1 << 8)).unwrap(), 1.0, epsilon = EPSILON);
}

// ---- Fourier transform and phase flips -------------------------------------

#[test]
fn test_qft_of_zero_is_uniform() {
    let mut reg = fixed(4, 0);
    reg.qft(0, 4).unwrap();
    for k in 0..16 {
        assert_relative_eq!(reg.prob_all(k).unwrap(), 1.0 / 16.0, epsilon = 1e-9);
    }
}

#[test]
fn test_zero_phase_flip() {
    let mut reg = fixed(2, 0);
    reg.zero_phase_flip(0, 2).unwrap();
    assert_relative_eq!(reg.clone_raw_state()[0].re, -1.0, epsilon = EPSILON);

    let mut reg = fixed(2, 1);
    reg.zero_phase_flip(0, 2).unwrap();
    assert_relative_eq!(reg.clone_raw_state()[1].re, 1.0, epsilon = EPSILON);
}

#[test]
fn test_c_phase_flip_if_less() {
    let mut reg = fixed(3, 0b101);
    reg.c_phase_flip_if_less(2, 0, 2, 2).unwrap();
    assert_relative_eq!(reg.clone_raw_state()[0b101].re, -1.0, epsilon = EPSILON);

    // Flag clear: no flip even though the window value is below the bound.
    let mut reg = fixed(3, 0b001);
    reg.c_phase_flip_if_less(2, 0, 2, 2).unwrap();
    assert_relative_eq!(reg.clone_raw_state()[0b001].re, 1.0, epsilon = EPSILON);
}

#[test]
fn test_global_phase_flip() {
    let mut reg = fixed(2, 0);
    reg.phase_flip();
    assert_relative_eq!(reg.clone_raw_state()[0].re, -1.0, epsilon = EPSILON);
}

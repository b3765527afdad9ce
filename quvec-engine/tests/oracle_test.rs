//! Indexed classical-memory oracle behaviour

use approx::assert_relative_eq;
use num_complex::Complex64;
use quvec_engine::{Register, SharedRng, StateError};

const EPSILON: f64 = 1e-10;

fn one() -> Complex64 {
    Complex64::new(1.0, 0.0)
}

fn fixed(qubit_count: usize, init_state: usize) -> Register {
    Register::with_phase_and_rng(qubit_count, init_state, one(), SharedRng::seeded(7)).unwrap()
}

#[test]
fn test_superposed_lda_expectation_and_distribution() {
    // 3-bit index, 8-bit value, uniformly superposed index window.
    let table: [u8; 8] = [10, 20, 30, 40, 50, 60, 70, 80];
    let mut reg = fixed(11, 0);
    reg.h_reg(0, 3).unwrap();

    let expectation = reg.superposed_lda(0, 3, 3, 8, &table).unwrap();
    assert_eq!(expectation, 45);

    // Each index remains entangled with its own table value at weight 1/8.
    for (k, &value) in table.iter().enumerate() {
        let perm = k | ((value as usize) << 3);
        assert_relative_eq!(reg.prob_all(perm).unwrap(), 1.0 / 8.0, epsilon = 1e-9);
    }
}

#[test]
fn test_superposed_lda_on_basis_index() {
    let table: [u8; 8] = [10, 20, 30, 40, 50, 60, 70, 80];
    let mut reg = fixed(11, 5);
    let expectation = reg.superposed_lda(0, 3, 3, 8, &table).unwrap();
    assert_eq!(expectation, 60);
    assert_relative_eq!(reg.prob_all(5 | (60 << 3)).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_superposed_lda_clears_value_window_first() {
    let table: [u8; 2] = [9, 0];
    // Value window starts non-zero; the load replaces rather than ORs.
    let mut reg = fixed(9, 3 << 1);
    let expectation = reg.superposed_lda(0, 1, 1, 8, &table).unwrap();
    assert_eq!(expectation, 9);
    assert_relative_eq!(reg.prob_all(9 << 1).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_superposed_adc_adds_with_carry_out() {
    let table: [u8; 2] = [100, 0];
    // 1-bit index at 0, 8-bit value at 1..9, carry at 9; index |0⟩.
    let mut reg = fixed(10, 0);
    let expectation = reg.superposed_adc(0, 1, 1, 8, 9, &table).unwrap();
    assert_eq!(expectation, 100);
    assert_relative_eq!(reg.prob_all(100 << 1).unwrap(), 1.0, epsilon = EPSILON);

    // Add again on top of 100: 200, still no carry-out.
    let expectation = reg.superposed_adc(0, 1, 1, 8, 9, &table).unwrap();
    assert_eq!(expectation, 200);

    // Once more wraps past 255 and sets the carry.
    let expectation = reg.superposed_adc(0, 1, 1, 8, 9, &table).unwrap();
    assert_eq!(expectation, 44);
    assert_relative_eq!(
        reg.prob_all((44 << 1) | (1 << 9)).unwrap(),
        1.0,
        epsilon = EPSILON
    );
}

#[test]
fn test_superposed_sbc_with_borrow_conventions() {
    let table: [u8; 2] = [100, 0];

    // Carry clear going in means borrow: 100 - 100 - 1 wraps to 255 with
    // the carry left clear.
    let mut reg = fixed(10, 100 << 1);
    let expectation = reg.superposed_sbc(0, 1, 1, 8, 9, &table).unwrap();
    assert_eq!(expectation, 255);
    assert_relative_eq!(reg.prob_all(255 << 1).unwrap(), 1.0, epsilon = EPSILON);

    // Carry set going in: exact 100 - 100 = 0 and the carry comes out set.
    let mut reg = fixed(10, 100 << 1);
    reg.x(9).unwrap();
    let expectation = reg.superposed_sbc(0, 1, 1, 8, 9, &table).unwrap();
    assert_eq!(expectation, 0);
    assert_relative_eq!(reg.prob_all(1 << 9).unwrap(), 1.0, epsilon = EPSILON);
}

#[test]
fn test_oracle_rejects_short_table() {
    let table: [u8; 4] = [1, 2, 3, 4];
    let mut reg = fixed(11, 0);
    assert!(matches!(
        reg.superposed_lda(0, 3, 3, 8, &table),
        Err(StateError::DimensionMismatch { expected: 8, actual: 4 })
    ));
}

#[test]
fn test_oracle_rejects_overlapping_windows() {
    let table: [u8; 8] = [0; 8];
    let mut reg = fixed(8, 0);
    assert!(matches!(
        reg.superposed_lda(0, 3, 2, 4, &table),
        Err(StateError::OverlappingQubits { .. })
    ));
}

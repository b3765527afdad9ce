//! Constant gate matrices and rotation generators
//!
//! All gates in the engine are 2×2 unitaries lowered onto the state-vector
//! kernel. Named gates are compile-time constants; rotations are generated
//! from an angle in radians, with a dyadic-fraction conversion for the exact
//! binary-fraction forms used by the Fourier transform.

use num_complex::Complex64;
use std::f64::consts::PI;

/// 2×2 complex gate matrix in row-major order
pub type Matrix2x2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);
const NEG_I: Complex64 = Complex64::new(0.0, -1.0);
const NEG_ONE: Complex64 = Complex64::new(-1.0, 0.0);

const INV_SQRT2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Pauli-X gate matrix (NOT gate)
/// X = [[0, 1],
///      [1, 0]]
pub const PAULI_X: Matrix2x2 = [[ZERO, ONE], [ONE, ZERO]];

/// Pauli-Y gate matrix
/// Y = [[0, -i],
///      [i,  0]]
pub const PAULI_Y: Matrix2x2 = [[ZERO, NEG_I], [I, ZERO]];

/// Pauli-Z gate matrix
/// Z = [[1,  0],
///      [0, -1]]
pub const PAULI_Z: Matrix2x2 = [[ONE, ZERO], [ZERO, NEG_ONE]];

/// Hadamard gate matrix
/// H = 1/√2 * [[1,  1],
///             [1, -1]]
pub const HADAMARD: Matrix2x2 = [
    [
        Complex64::new(INV_SQRT2, 0.0),
        Complex64::new(INV_SQRT2, 0.0),
    ],
    [
        Complex64::new(INV_SQRT2, 0.0),
        Complex64::new(-INV_SQRT2, 0.0),
    ],
];

/// Identity gate matrix
pub const IDENTITY: Matrix2x2 = [[ONE, ZERO], [ZERO, ONE]];

/// Phase shift around |1⟩: [[1, 0], [0, e^(iθ/2)]]
#[inline]
pub fn phase_shift(radians: f64) -> Matrix2x2 {
    let half = radians / 2.0;
    [
        [ONE, ZERO],
        [ZERO, Complex64::new(half.cos(), half.sin())],
    ]
}

/// Rotation around the Pauli x axis
/// RX(θ) = [[cos(θ/2),    -i·sin(θ/2)],
///          [-i·sin(θ/2),  cos(θ/2)]]
#[inline]
pub fn rotation_x(radians: f64) -> Matrix2x2 {
    let half = radians / 2.0;
    let cosine = half.cos();
    let sine = half.sin();
    [
        [Complex64::new(cosine, 0.0), Complex64::new(0.0, -sine)],
        [Complex64::new(0.0, -sine), Complex64::new(cosine, 0.0)],
    ]
}

/// Rotation around the Pauli y axis
/// RY(θ) = [[cos(θ/2), -sin(θ/2)],
///          [sin(θ/2),  cos(θ/2)]]
#[inline]
pub fn rotation_y(radians: f64) -> Matrix2x2 {
    let half = radians / 2.0;
    let cosine = half.cos();
    let sine = half.sin();
    [
        [Complex64::new(cosine, 0.0), Complex64::new(-sine, 0.0)],
        [Complex64::new(sine, 0.0), Complex64::new(cosine, 0.0)],
    ]
}

/// Rotation around the Pauli z axis
/// RZ(θ) = [[e^(-iθ/2), 0],
///          [0,          e^(iθ/2)]]
#[inline]
pub fn rotation_z(radians: f64) -> Matrix2x2 {
    let half = radians / 2.0;
    let cosine = half.cos();
    let sine = half.sin();
    [
        [Complex64::new(cosine, -sine), ZERO],
        [ZERO, Complex64::new(cosine, sine)],
    ]
}

/// Angle of a dyadic-fraction rotation.
///
/// Dyadic operation angle sign is reversed from the radian rotation
/// operators and lacks the division by a factor of two: the continuous
/// equivalent of `*Dyad(num, den)` is the radian form at `−π·num·2/den`.
#[inline]
pub fn dyadic_angle(numerator: i32, denominator: i32) -> f64 {
    (-PI * numerator as f64 * 2.0) / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mult(a: &Matrix2x2, b: &Matrix2x2) -> Matrix2x2 {
        let mut out = [[ZERO; 2]; 2];
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    out[i][j] += a[i][k] * b[k][j];
                }
            }
        }
        out
    }

    fn assert_matrix_eq(a: &Matrix2x2, b: &Matrix2x2) {
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(a[i][j].re, b[i][j].re, epsilon = 1e-10);
                assert_relative_eq!(a[i][j].im, b[i][j].im, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_pauli_x_self_inverse() {
        assert_matrix_eq(&mult(&PAULI_X, &PAULI_X), &IDENTITY);
    }

    #[test]
    fn test_hadamard_self_inverse() {
        assert_matrix_eq(&mult(&HADAMARD, &HADAMARD), &IDENTITY);
    }

    #[test]
    fn test_rotation_x_at_zero_is_identity() {
        assert_matrix_eq(&rotation_x(0.0), &IDENTITY);
    }

    #[test]
    fn test_rotation_y_unitary() {
        let ry = rotation_y(1.3);
        let dagger = [
            [ry[0][0].conj(), ry[1][0].conj()],
            [ry[0][1].conj(), ry[1][1].conj()],
        ];
        assert_matrix_eq(&mult(&dagger, &ry), &IDENTITY);
    }

    #[test]
    fn test_rotation_z_diagonal_phases() {
        let rz = rotation_z(PI);
        assert_relative_eq!(rz[0][0].im, -1.0, epsilon = 1e-10);
        assert_relative_eq!(rz[1][1].im, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_phase_shift_half_angle() {
        let rt = phase_shift(PI);
        assert_relative_eq!(rt[1][1].re, 0.0, epsilon = 1e-10);
        assert_relative_eq!(rt[1][1].im, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_dyadic_angle_sign_and_scale() {
        // Dyad(1, 2) is the radian form at -π
        assert_relative_eq!(dyadic_angle(1, 2), -PI, epsilon = 1e-12);
        // No factor-of-two halving: Dyad(1, 1) spans a full -2π
        assert_relative_eq!(dyadic_angle(1, 1), -2.0 * PI, epsilon = 1e-12);
    }
}

//! Gate matrix library for the quvec register simulator
//!
//! Constant Pauli/Hadamard matrices plus rotation generators, shared by the
//! engine's gate library and by tests that build expected states by hand.

pub mod matrices;

pub use matrices::{
    dyadic_angle, phase_shift, rotation_x, rotation_y, rotation_z, Matrix2x2, HADAMARD, IDENTITY,
    PAULI_X, PAULI_Y, PAULI_Z,
};

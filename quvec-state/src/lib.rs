//! Dense amplitude storage and parallel sweep primitives
//!
//! This crate provides the two leaves of the register simulator: the
//! exclusively-owned, SIMD-aligned amplitude buffer ([`StateVector`]) and
//! the fork-join sweep primitives ([`par_for`], [`par_for_skip`],
//! [`par_for_mask`], [`par_norm`]) that gate kernels and arithmetic oracles
//! are built on. Sweeps share the buffer through [`AmpView`] under the
//! disjoint-write invariant; there is no locking inside a sweep.

pub mod error;
pub mod parallel;
pub mod state_vector;

pub use error::{Result, StateError};
pub use parallel::{par_for, par_for_mask, par_for_skip, par_norm, AmpView, SweepConfig};
pub use state_vector::StateVector;

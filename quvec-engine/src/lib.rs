//! Universal quantum register simulator
//!
//! A dense state-vector engine: a [`Register`] maintains the full `2^n`
//! amplitude vector of an `n`-qubit system and applies unitary gates,
//! arithmetic and lookup oracles, measurement with post-selection collapse,
//! and register composition/decomposition.
//!
//! The transformation core is the permutation-indexed 2×2 kernel behind the
//! [`Kernel`] trait: bit-masked iteration enumerates the pre-image subspace
//! of a gate, and each pre-image's two-element subspace is updated in place.
//! Everything else — the gate library, the arithmetic oracle family,
//! measurement, composition — composes above that kernel surface.
//!
//! # Example
//!
//! ```
//! use quvec_engine::Register;
//!
//! // Bell pair
//! let mut reg = Register::new(2, 0).unwrap();
//! reg.h(0).unwrap();
//! reg.cnot(0, 1).unwrap();
//! assert!((reg.prob(0).unwrap() - 0.5).abs() < 1e-9);
//! ```

pub mod arith;
pub mod compose;
pub mod gates;
pub mod kernel;
pub mod measure;
pub mod oracle;
pub mod register;
pub mod rng;

pub use kernel::{CpuKernel, Kernel, SweepCtx};
pub use register::Register;
pub use rng::SharedRng;

pub use quvec_state::{Result, StateError, SweepConfig};

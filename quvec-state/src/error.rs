//! Error types for amplitude-buffer and sweep operations

use thiserror::Error;

/// Errors that can occur during state vector operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Qubit index outside the register
    #[error("invalid qubit index {index} for {qubit_count}-qubit register")]
    InvalidQubitIndex { index: usize, qubit_count: usize },

    /// More qubits requested than a permutation index can address
    #[error("cannot hold {requested} qubits in a {max}-bit permutation index")]
    CapacityExceeded { requested: usize, max: u32 },

    /// Buffer length does not match the register dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Two roles of a multi-qubit gate name the same qubit
    #[error("qubit indices overlap at bit {index}")]
    OverlappingQubits { index: usize },

    /// Mask array handed to a sweep is not strictly ascending
    #[error("mask array must be strictly ascending")]
    UnorderedMasks,

    /// Mask array longer than the register
    #[error("{given} masks exceed the {qubit_count}-qubit register")]
    TooManyMasks { given: usize, qubit_count: usize },

    /// BCD window length is not a whole number of nibbles
    #[error("BCD register length {length} is not a multiple of 4")]
    NonDecimalLength { length: usize },

    /// Memory allocation failure
    #[error("failed to allocate {size} bytes for amplitude buffer")]
    AllocationError { size: usize },
}

/// Result type for state vector operations
pub type Result<T> = std::result::Result<T, StateError>;

//! Amplitude buffer with aligned memory for SIMD-friendly sweeps

use crate::error::{Result, StateError};
use num_complex::Complex64;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

/// Alignment requirement for SIMD operations (64 bytes for AVX-512)
const SIMD_ALIGNMENT: usize = 64;

/// Dense permutation-basis amplitude vector of a qubit register.
///
/// Owns a contiguous, 64-byte-aligned block of `2^n` complex doubles. Bit `q`
/// of an index encodes the computational value of qubit `q` (little-endian).
/// The buffer is exclusively owned; sweeps borrow it for their duration and
/// composition operations swap in a freshly sized buffer with [`replace`].
///
/// [`replace`]: StateVector::replace
///
/// # Example
///
/// ```
/// use quvec_state::StateVector;
/// use num_complex::Complex64;
///
/// let state = StateVector::basis(2, 3, Complex64::new(1.0, 0.0)).unwrap();
/// assert_eq!(state.num_qubits(), 2);
/// assert_eq!(state.amplitudes()[3], Complex64::new(1.0, 0.0));
/// ```
pub struct StateVector {
    /// Number of qubits
    num_qubits: usize,

    /// State dimension (2^num_qubits)
    dimension: usize,

    /// Pointer to aligned amplitude data
    data: NonNull<Complex64>,

    /// Memory layout for deallocation
    layout: Layout,
}

impl StateVector {
    /// Allocate a zero-filled vector for `num_qubits` qubits.
    ///
    /// # Errors
    /// `CapacityExceeded` if `num_qubits` cannot be addressed by a
    /// permutation index, `AllocationError` if the allocation fails.
    pub fn zeroed(num_qubits: usize) -> Result<Self> {
        if num_qubits >= usize::BITS as usize {
            return Err(StateError::CapacityExceeded {
                requested: num_qubits,
                max: usize::BITS,
            });
        }

        let dimension = 1usize << num_qubits;
        let size = dimension * std::mem::size_of::<Complex64>();
        let layout = Layout::from_size_align(size, SIMD_ALIGNMENT)
            .map_err(|_| StateError::AllocationError { size })?;

        let data = unsafe {
            let ptr = alloc_zeroed(layout) as *mut Complex64;
            if ptr.is_null() {
                return Err(StateError::AllocationError { size });
            }
            NonNull::new_unchecked(ptr)
        };

        Ok(Self {
            num_qubits,
            dimension,
            data,
            layout,
        })
    }

    /// Allocate a vector holding the pure basis state `|perm⟩ · phase`.
    pub fn basis(num_qubits: usize, perm: usize, phase: Complex64) -> Result<Self> {
        let mut state = Self::zeroed(num_qubits)?;
        if perm >= state.dimension {
            return Err(StateError::DimensionMismatch {
                expected: state.dimension,
                actual: perm,
            });
        }
        state.amplitudes_mut()[perm] = phase;
        Ok(state)
    }

    /// Copy a caller-supplied amplitude array verbatim.
    ///
    /// # Errors
    /// `DimensionMismatch` if `amplitudes.len() != 2^num_qubits`.
    pub fn from_amplitudes(num_qubits: usize, amplitudes: &[Complex64]) -> Result<Self> {
        let mut state = Self::zeroed(num_qubits)?;
        if amplitudes.len() != state.dimension {
            return Err(StateError::DimensionMismatch {
                expected: state.dimension,
                actual: amplitudes.len(),
            });
        }
        state.amplitudes_mut().copy_from_slice(amplitudes);
        Ok(state)
    }

    /// Get the number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the state dimension (2^num_qubits)
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get a reference to the amplitudes
    #[inline]
    pub fn amplitudes(&self) -> &[Complex64] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.dimension) }
    }

    /// Get a mutable reference to the amplitudes
    #[inline]
    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.dimension) }
    }

    /// Check if the buffer is properly aligned for SIMD
    #[inline]
    pub fn is_simd_aligned(&self) -> bool {
        (self.data.as_ptr() as usize) % SIMD_ALIGNMENT == 0
    }

    /// Swap in a freshly computed buffer, releasing the old one.
    ///
    /// The replacement may have a different qubit count; composition and
    /// decomposition resize the register this way.
    pub fn replace(&mut self, next: StateVector) {
        *self = next;
    }

    /// Zero the buffer and set a single basis amplitude.
    pub fn set_basis_state(&mut self, perm: usize, phase: Complex64) {
        let amps = self.amplitudes_mut();
        amps.fill(Complex64::new(0.0, 0.0));
        amps[perm] = phase;
    }

    /// Overwrite the amplitudes from a caller buffer.
    ///
    /// # Errors
    /// `DimensionMismatch` if the lengths differ.
    pub fn copy_from(&mut self, amplitudes: &[Complex64]) -> Result<()> {
        if amplitudes.len() != self.dimension {
            return Err(StateError::DimensionMismatch {
                expected: self.dimension,
                actual: amplitudes.len(),
            });
        }
        self.amplitudes_mut().copy_from_slice(amplitudes);
        Ok(())
    }

    /// Compute the L2 norm of the vector
    pub fn norm(&self) -> f64 {
        self.amplitudes()
            .iter()
            .map(|a| a.norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    /// Exact copy of length and contents
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_amplitudes(self.num_qubits, self.amplitudes())
    }
}

impl Drop for StateVector {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.data.as_ptr() as *mut u8, self.layout);
        }
    }
}

// Safety: StateVector owns its data and ensures exclusive access
unsafe impl Send for StateVector {}
unsafe impl Sync for StateVector {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zeroed() {
        let state = StateVector::zeroed(3).unwrap();
        assert_eq!(state.num_qubits(), 3);
        assert_eq!(state.dimension(), 8);
        assert!(state.is_simd_aligned());
        for amp in state.amplitudes() {
            assert_eq!(*amp, Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_basis_state() {
        let state = StateVector::basis(2, 2, Complex64::new(0.0, 1.0)).unwrap();
        assert_eq!(state.amplitudes()[2], Complex64::new(0.0, 1.0));
        assert_relative_eq!(state.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_basis_out_of_range() {
        let result = StateVector::basis(2, 4, Complex64::new(1.0, 0.0));
        assert!(matches!(
            result,
            Err(StateError::DimensionMismatch { expected: 4, actual: 4 })
        ));
    }

    #[test]
    fn test_from_amplitudes() {
        let amplitudes = vec![
            Complex64::new(0.5, 0.0),
            Complex64::new(0.5, 0.0),
            Complex64::new(0.5, 0.0),
            Complex64::new(0.5, 0.0),
        ];

        let state = StateVector::from_amplitudes(2, &amplitudes).unwrap();
        assert_eq!(state.amplitudes(), amplitudes.as_slice());
        assert_relative_eq!(state.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let amplitudes = vec![Complex64::new(1.0, 0.0)];
        assert!(StateVector::from_amplitudes(2, &amplitudes).is_err());
    }

    #[test]
    fn test_capacity_exceeded() {
        assert!(matches!(
            StateVector::zeroed(usize::BITS as usize),
            Err(StateError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_replace_resizes() {
        let mut state = StateVector::basis(2, 0, Complex64::new(1.0, 0.0)).unwrap();
        let next = StateVector::basis(3, 5, Complex64::new(1.0, 0.0)).unwrap();
        state.replace(next);
        assert_eq!(state.num_qubits(), 3);
        assert_eq!(state.amplitudes()[5], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_set_basis_state() {
        let mut state = StateVector::basis(2, 0, Complex64::new(1.0, 0.0)).unwrap();
        state.set_basis_state(3, Complex64::new(0.0, -1.0));
        assert_eq!(state.amplitudes()[0], Complex64::new(0.0, 0.0));
        assert_eq!(state.amplitudes()[3], Complex64::new(0.0, -1.0));
    }

    #[test]
    fn test_try_clone() {
        let state = StateVector::basis(2, 1, Complex64::new(1.0, 0.0)).unwrap();
        let copy = state.try_clone().unwrap();
        assert_eq!(copy.num_qubits(), 2);
        assert_eq!(copy.amplitudes(), state.amplitudes());
    }
}

//! Register lifecycle, lazy normalization, and kernel dispatch

use crate::kernel::{CpuKernel, Kernel, SweepCtx};
use crate::rng::SharedRng;
use num_complex::Complex64;
use quvec_gates::Matrix2x2;
use quvec_state::{par_norm, Result, StateError, StateVector, SweepConfig};
use rayon::prelude::*;
use std::f64::consts::PI;
use std::fmt;

/// Amplitudes whose squared magnitude falls below this are snapped to zero
/// during normalization.
pub(crate) const MIN_NORM: f64 = 1e-15;

/// A coherent register of `n` qubits backed by a dense `2^n` amplitude
/// vector.
///
/// The register applies unitary gates, arithmetic oracles, measurement and
/// composition in place over its permutation-basis amplitudes. Bit `q` of a
/// permutation index holds the computational value of qubit `q`; registers
/// cohered after this one occupy higher bit positions.
///
/// Normalization is lazy: operations that scale amplitudes non-unitarily
/// record the drift in a running norm, and observable operations divide it
/// back out before reading.
///
/// # Example
///
/// ```
/// use quvec_engine::Register;
///
/// let mut reg = Register::new(2, 0).unwrap();
/// reg.h(0).unwrap();
/// reg.cnot(0, 1).unwrap();
/// let outcome = reg.m_reg(0, 2).unwrap();
/// assert!(outcome == 0 || outcome == 3);
/// ```
pub struct Register {
    pub(crate) qubit_count: usize,
    pub(crate) max_q_power: usize,
    pub(crate) running_norm: f64,
    pub(crate) state: StateVector,
    pub(crate) kernel: Box<dyn Kernel>,
    pub(crate) rng: SharedRng,
    pub(crate) sweep: SweepConfig,
}

impl Register {
    /// Create a register in the pure basis state `|init_state⟩` with a
    /// random global phase.
    ///
    /// The random phase replicates the unknowable initial phase of a
    /// physical system; pass an explicit phase via [`with_phase`] when exact
    /// amplitudes matter.
    ///
    /// [`with_phase`]: Register::with_phase
    pub fn new(qubit_count: usize, init_state: usize) -> Result<Self> {
        Self::build(qubit_count, init_state, None, SharedRng::from_entropy())
    }

    /// Create a register sharing a PRNG handle with other registers.
    pub fn with_rng(qubit_count: usize, init_state: usize, rng: SharedRng) -> Result<Self> {
        Self::build(qubit_count, init_state, None, rng)
    }

    /// Create a register with an explicit global phase factor.
    pub fn with_phase(qubit_count: usize, init_state: usize, phase: Complex64) -> Result<Self> {
        Self::build(qubit_count, init_state, Some(phase), SharedRng::from_entropy())
    }

    /// Create a register with an explicit phase and a shared PRNG handle.
    pub fn with_phase_and_rng(
        qubit_count: usize,
        init_state: usize,
        phase: Complex64,
        rng: SharedRng,
    ) -> Result<Self> {
        Self::build(qubit_count, init_state, Some(phase), rng)
    }

    fn build(
        qubit_count: usize,
        init_state: usize,
        phase: Option<Complex64>,
        rng: SharedRng,
    ) -> Result<Self> {
        let phase = match phase {
            Some(p) => p,
            None => {
                let angle = rng.next_f64() * 2.0 * PI;
                Complex64::from_polar(1.0, angle)
            }
        };
        let state = StateVector::basis(qubit_count, init_state, phase)?;
        Ok(Self {
            qubit_count,
            max_q_power: 1 << qubit_count,
            running_norm: 1.0,
            state,
            kernel: Box::new(CpuKernel),
            rng,
            sweep: SweepConfig::default(),
        })
    }

    /// Create a register from a caller-supplied amplitude array, copied
    /// verbatim.
    pub fn from_state(qubit_count: usize, amplitudes: &[Complex64]) -> Result<Self> {
        let state = StateVector::from_amplitudes(qubit_count, amplitudes)?;
        Ok(Self {
            qubit_count,
            max_q_power: 1 << qubit_count,
            running_norm: 1.0,
            state,
            kernel: Box::new(CpuKernel),
            rng: SharedRng::from_entropy(),
            sweep: SweepConfig::default(),
        })
    }

    /// Swap in a different gate kernel, selected at construction time.
    pub fn with_kernel(mut self, kernel: Box<dyn Kernel>) -> Self {
        self.kernel = kernel;
        self
    }

    /// Clone this register's exact quantum state into a new register
    /// sharing the same PRNG handle.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            qubit_count: self.qubit_count,
            max_q_power: self.max_q_power,
            running_norm: self.running_norm,
            state: self.state.try_clone()?,
            kernel: Box::new(CpuKernel),
            rng: self.rng.clone(),
            sweep: self.sweep,
        })
    }

    /// Number of qubits in the register
    #[inline]
    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    /// Dimension of the amplitude vector (`2^n`)
    #[inline]
    pub fn max_q_power(&self) -> usize {
        self.max_q_power
    }

    /// The shared PRNG handle, clonable into sibling registers.
    pub fn rng(&self) -> &SharedRng {
        &self.rng
    }

    /// Reseed the (possibly shared) PRNG, primarily for testing.
    pub fn set_random_seed(&self, seed: u32) {
        self.rng.reseed(seed);
    }

    /// Override the sweep tuning, e.g. to force serial execution in tests.
    pub fn set_sweep_config(&mut self, sweep: SweepConfig) {
        self.sweep = sweep;
    }

    /// Copy out the exact amplitude vector, normalizing first.
    pub fn clone_raw_state(&mut self) -> Vec<Complex64> {
        self.ensure_normalized();
        self.state.amplitudes().to_vec()
    }

    /// Overwrite the amplitude vector from a caller buffer.
    ///
    /// # Errors
    /// `DimensionMismatch` if the buffer length is not `2^n`.
    pub fn set_quantum_state(&mut self, amplitudes: &[Complex64]) -> Result<()> {
        self.state.copy_from(amplitudes)?;
        self.running_norm = 1.0;
        Ok(())
    }

    // ---- lazy normalization ----------------------------------------------

    /// Bring the running norm back to `1.0` if an earlier operation left
    /// drift behind.
    pub(crate) fn ensure_normalized(&mut self) {
        if self.running_norm != 1.0 {
            self.normalize_state();
        }
    }

    /// Divide every amplitude by the running norm, snapping underflowed
    /// amplitudes to zero.
    fn normalize_state(&mut self) {
        let nrm = self.running_norm;
        self.for_each_amp(|_, amp| {
            *amp /= nrm;
            if amp.norm_sqr() < MIN_NORM {
                *amp = Complex64::new(0.0, 0.0);
            }
        });
        self.running_norm = 1.0;
    }

    /// Recompute the running norm from the current amplitudes.
    pub(crate) fn update_running_norm(&mut self) {
        self.running_norm = par_norm(self.sweep, self.state.amplitudes());
    }

    // ---- sweep helpers ---------------------------------------------------

    /// In-place per-slot sweep; each invocation owns exactly its own slot.
    pub(crate) fn for_each_amp<F>(&mut self, f: F)
    where
        F: Fn(usize, &mut Complex64) + Sync + Send,
    {
        let sweep = self.sweep;
        let amps = self.state.amplitudes_mut();
        if sweep.workers < 2 || amps.len() < sweep.parallel_threshold {
            for (i, amp) in amps.iter_mut().enumerate() {
                f(i, amp);
            }
        } else {
            amps.par_iter_mut().enumerate().for_each(|(i, amp)| f(i, amp));
        }
    }

    // ---- validation ------------------------------------------------------

    pub(crate) fn check_qubit(&self, qubit: usize) -> Result<()> {
        if qubit >= self.qubit_count {
            return Err(StateError::InvalidQubitIndex {
                index: qubit,
                qubit_count: self.qubit_count,
            });
        }
        Ok(())
    }

    pub(crate) fn check_range(&self, start: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        if start + length > self.qubit_count {
            return Err(StateError::InvalidQubitIndex {
                index: start + length - 1,
                qubit_count: self.qubit_count,
            });
        }
        Ok(())
    }

    pub(crate) fn check_distinct(&self, a: usize, b: usize) -> Result<()> {
        if a == b {
            return Err(StateError::OverlappingQubits { index: a });
        }
        Ok(())
    }

    // ---- kernel dispatch -------------------------------------------------

    pub(crate) fn kernel_apply_2x2(
        &mut self,
        offset1: usize,
        offset2: usize,
        mtrx: &Matrix2x2,
        sorted_powers: &[usize],
        do_apply_norm: bool,
        do_calc_norm: bool,
    ) -> Result<()> {
        let ctx = SweepCtx {
            state: &mut self.state,
            running_norm: &mut self.running_norm,
            sweep: self.sweep,
        };
        self.kernel.apply_2x2(
            ctx,
            offset1,
            offset2,
            mtrx,
            sorted_powers,
            do_apply_norm,
            do_calc_norm,
        )
    }

    /// Apply a 2×2 matrix across one bit, unconditioned.
    pub(crate) fn apply_single_bit(
        &mut self,
        qubit: usize,
        mtrx: &Matrix2x2,
        do_calc_norm: bool,
    ) -> Result<()> {
        self.check_qubit(qubit)?;
        let q_power = 1usize << qubit;
        self.kernel_apply_2x2(0, q_power, mtrx, &[q_power], true, do_calc_norm)
    }

    /// Apply a 2×2 matrix to `target` inside the control-set subspace.
    pub(crate) fn apply_controlled_2x2(
        &mut self,
        control: usize,
        target: usize,
        mtrx: &Matrix2x2,
        do_calc_norm: bool,
    ) -> Result<()> {
        self.check_qubit(control)?;
        self.check_qubit(target)?;
        self.check_distinct(control, target)?;
        let c_power = 1usize << control;
        let t_power = 1usize << target;
        let sorted = [c_power.min(t_power), c_power.max(t_power)];
        self.kernel_apply_2x2(c_power, c_power + t_power, mtrx, &sorted, false, do_calc_norm)
    }

    /// Apply a 2×2 matrix to `target` inside the control-zero subspace.
    pub(crate) fn apply_anti_controlled_2x2(
        &mut self,
        control: usize,
        target: usize,
        mtrx: &Matrix2x2,
        do_calc_norm: bool,
    ) -> Result<()> {
        self.check_qubit(control)?;
        self.check_qubit(target)?;
        self.check_distinct(control, target)?;
        let c_power = 1usize << control;
        let t_power = 1usize << target;
        let sorted = [c_power.min(t_power), c_power.max(t_power)];
        self.kernel_apply_2x2(0, t_power, mtrx, &sorted, false, do_calc_norm)
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("qubit_count", &self.qubit_count)
            .field("max_q_power", &self.max_q_power)
            .field("running_norm", &self.running_norm)
            .finish()
    }
}

//! Register composition and decomposition
//!
//! Cohere is an exact tensor product; Decohere and Dispose reconstruct each
//! side from marginal probabilities and a representative phase, which is a
//! product-state approximation of the partial trace. It is exact only when
//! the extracted window is separable from the remainder; extracting an
//! entangled window is lossy.

use crate::register::Register;
use num_complex::Complex64;
use quvec_state::{par_for, AmpView, Result, StateError, StateVector};

impl Register {
    /// Tensor another register onto the high end of this one.
    ///
    /// The other register's qubits occupy bit positions `n ..` of the
    /// combined register; both inputs are normalized first and the other is
    /// left untouched apart from that.
    pub fn cohere(&mut self, other: &mut Register) -> Result<()> {
        let n_qubit_count = self.qubit_count + other.qubit_count;
        if n_qubit_count >= usize::BITS as usize {
            return Err(StateError::CapacityExceeded {
                requested: n_qubit_count,
                max: usize::BITS,
            });
        }
        self.ensure_normalized();
        other.ensure_normalized();

        let n_max_q_power = 1usize << n_qubit_count;
        let start_mask = self.max_q_power - 1;
        let end_mask = (other.max_q_power - 1) << self.qubit_count;
        let shift = self.qubit_count;

        let mut next = StateVector::zeroed(n_qubit_count)?;
        {
            let low = self.state.amplitudes();
            let high = other.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for(self.sweep, 0, n_max_q_power, |lcv| {
                let value = low[lcv & start_mask] * high[(lcv & end_mask) >> shift];
                unsafe { view.write(lcv, value) };
            });
        }

        self.qubit_count = n_qubit_count;
        self.max_q_power = n_max_q_power;
        self.state.replace(next);
        self.update_running_norm();
        Ok(())
    }

    /// Tensor a sequence of registers onto this one, each occupying the next
    /// contiguous qubit block.
    pub fn cohere_many(&mut self, others: &mut [&mut Register]) -> Result<()> {
        let mut n_qubit_count = self.qubit_count;
        for other in others.iter() {
            n_qubit_count += other.qubit_count;
        }
        if n_qubit_count >= usize::BITS as usize {
            return Err(StateError::CapacityExceeded {
                requested: n_qubit_count,
                max: usize::BITS,
            });
        }

        self.ensure_normalized();
        let mut masks = Vec::with_capacity(others.len());
        let mut offsets = Vec::with_capacity(others.len());
        let mut offset = self.qubit_count;
        for other in others.iter_mut() {
            other.ensure_normalized();
            masks.push((other.max_q_power - 1) << offset);
            offsets.push(offset);
            offset += other.qubit_count;
        }

        let n_max_q_power = 1usize << n_qubit_count;
        let start_mask = self.max_q_power - 1;

        let mut next = StateVector::zeroed(n_qubit_count)?;
        {
            let low = self.state.amplitudes();
            let highs: Vec<&[Complex64]> = others.iter().map(|o| o.state.amplitudes()).collect();
            let view = AmpView::new(next.amplitudes_mut());
            par_for(self.sweep, 0, n_max_q_power, |lcv| {
                let mut value = low[lcv & start_mask];
                for (j, high) in highs.iter().enumerate() {
                    value *= high[(lcv & masks[j]) >> offsets[j]];
                }
                unsafe { view.write(lcv, value) };
            });
        }

        self.qubit_count = n_qubit_count;
        self.max_q_power = n_max_q_power;
        self.state.replace(next);
        self.update_running_norm();
        Ok(())
    }

    /// Extract qubits `[start, start+length)` into `destination`, shrinking
    /// this register by `length` qubits.
    ///
    /// Both sides are rebuilt as `√P · e^{iφ}` from their marginal
    /// probabilities and the last phase seen per pattern. This is a
    /// product-state approximation of the partial trace: exact for a
    /// separable window, lossy on entangled input.
    ///
    /// `destination` must be a freshly initialised `length`-qubit register;
    /// its previous state is overwritten.
    pub fn decohere(
        &mut self,
        start: usize,
        length: usize,
        destination: &mut Register,
    ) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        self.check_range(start, length)?;
        if destination.qubit_count != length {
            return Err(StateError::DimensionMismatch {
                expected: length,
                actual: destination.qubit_count,
            });
        }
        self.ensure_normalized();

        let part_power = 1usize << length;
        let remainder_power = 1usize << (self.qubit_count - length);
        let mask = (part_power - 1) << start;
        let start_mask = (1usize << start) - 1;
        let end_mask = (self.max_q_power - 1) ^ (mask | start_mask);

        let mut part_prob = vec![0.0f64; part_power];
        let mut part_angle = vec![0.0f64; part_power];
        let mut remainder_prob = vec![0.0f64; remainder_power];
        let mut remainder_angle = vec![0.0f64; remainder_power];

        for (i, amp) in self.state.amplitudes().iter().enumerate() {
            let prob = amp.norm_sqr();
            let angle = amp.arg();
            let part_idx = (i & mask) >> start;
            part_prob[part_idx] += prob;
            part_angle[part_idx] = angle;
            let remainder_idx = (i & start_mask) | ((i & end_mask) >> length);
            remainder_prob[remainder_idx] += prob;
            remainder_angle[remainder_idx] = angle;
        }

        self.qubit_count -= length;
        self.max_q_power = remainder_power;

        let mut next = StateVector::zeroed(self.qubit_count)?;
        for (i, amp) in next.amplitudes_mut().iter_mut().enumerate() {
            *amp = Complex64::from_polar(remainder_prob[i].sqrt(), remainder_angle[i]);
        }
        self.state.replace(next);

        let mut dest_next = StateVector::zeroed(length)?;
        for (i, amp) in dest_next.amplitudes_mut().iter_mut().enumerate() {
            *amp = Complex64::from_polar(part_prob[i].sqrt(), part_angle[i]);
        }
        destination.state.replace(dest_next);

        self.update_running_norm();
        destination.update_running_norm();
        Ok(())
    }

    /// Drop qubits `[start, start+length)`, tracing them out of the
    /// register.
    ///
    /// Same product-state approximation as [`decohere`], with the extracted
    /// side discarded.
    ///
    /// [`decohere`]: Register::decohere
    pub fn dispose(&mut self, start: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        self.check_range(start, length)?;
        self.ensure_normalized();

        let part_power = 1usize << length;
        let remainder_power = 1usize << (self.qubit_count - length);
        let mask = (part_power - 1) << start;
        let start_mask = (1usize << start) - 1;
        let end_mask = (self.max_q_power - 1) ^ (mask | start_mask);

        let mut remainder_prob = vec![0.0f64; remainder_power];
        let mut remainder_angle = vec![0.0f64; remainder_power];

        for (i, amp) in self.state.amplitudes().iter().enumerate() {
            let remainder_idx = (i & start_mask) | ((i & end_mask) >> length);
            remainder_prob[remainder_idx] += amp.norm_sqr();
            remainder_angle[remainder_idx] = amp.arg();
        }

        self.qubit_count -= length;
        self.max_q_power = remainder_power;

        let mut next = StateVector::zeroed(self.qubit_count)?;
        for (i, amp) in next.amplitudes_mut().iter_mut().enumerate() {
            *amp = Complex64::from_polar(remainder_prob[i].sqrt(), remainder_angle[i]);
        }
        self.state.replace(next);

        self.update_running_norm();
        Ok(())
    }
}

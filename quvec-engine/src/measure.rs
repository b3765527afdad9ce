//! Measurement and direct probability access
//!
//! Probability reads are pseudo-quantum conveniences of classical emulation;
//! they normalize any recorded drift first. Measurement collapses the state
//! with a freshly drawn random global phase, replicating the arbitrariness
//! of a physical post-measurement state.

use crate::register::Register;
use num_complex::Complex64;
use quvec_state::{Result, StateError};
use rayon::prelude::*;
use std::f64::consts::PI;

impl Register {
    /// Probability mass of the indices matching `value` under `mask`.
    fn masked_prob(&self, mask: usize, value: usize) -> f64 {
        let sweep = self.sweep;
        let amps = self.state.amplitudes();
        if sweep.workers < 2 || amps.len() < sweep.parallel_threshold {
            amps.iter()
                .enumerate()
                .filter(|&(i, _)| i & mask == value)
                .map(|(_, amp)| amp.norm_sqr())
                .sum()
        } else {
            amps.par_iter()
                .enumerate()
                .filter(|&(i, _)| i & mask == value)
                .map(|(_, amp)| amp.norm_sqr())
                .sum()
        }
    }

    /// Probability of measuring qubit `qubit` in |1⟩.
    pub fn prob(&mut self, qubit: usize) -> Result<f64> {
        self.check_qubit(qubit)?;
        self.ensure_normalized();
        let q_power = 1usize << qubit;
        Ok(self.masked_prob(q_power, q_power))
    }

    /// Probability of the full register being in permutation state `perm`.
    pub fn prob_all(&mut self, perm: usize) -> Result<f64> {
        if perm >= self.max_q_power {
            return Err(StateError::DimensionMismatch {
                expected: self.max_q_power,
                actual: perm,
            });
        }
        self.ensure_normalized();
        Ok(self.state.amplitudes()[perm].norm_sqr())
    }

    /// Probabilities of every permutation state.
    pub fn prob_array(&mut self) -> Vec<f64> {
        self.ensure_normalized();
        self.state.amplitudes().iter().map(|a| a.norm_sqr()).collect()
    }

    /// Measure one qubit, collapsing the state.
    ///
    /// The retained subspace is rescaled by `e^{iφ}/√P` with a freshly drawn
    /// random global phase `φ`.
    pub fn m(&mut self, qubit: usize) -> Result<bool> {
        self.check_qubit(qubit)?;
        self.ensure_normalized();

        let prob_draw = self.rng.next_f64();
        let angle = self.rng.next_f64() * 2.0 * PI;

        let q_power = 1usize << qubit;
        let one_chance = self.masked_prob(q_power, q_power);
        let result = prob_draw < one_chance && one_chance > 0.0;

        let mut nrmlzr = 1.0;
        if result {
            if one_chance > 0.0 {
                nrmlzr = one_chance.sqrt();
            }
        } else if one_chance < 1.0 {
            nrmlzr = (1.0 - one_chance).sqrt();
        }
        let nrm = Complex64::from_polar(1.0, angle) / nrmlzr;

        let keep = if result { q_power } else { 0 };
        self.for_each_amp(|i, amp| {
            if i & q_power == keep {
                *amp *= nrm;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        });
        self.update_running_norm();

        Ok(result)
    }

    /// Measure the permutation state of a window, collapsing the register
    /// onto the drawn pattern.
    pub fn m_reg(&mut self, start: usize, length: usize) -> Result<usize> {
        self.check_range(start, length)?;
        if length == 0 {
            return Ok(0);
        }
        if length == 1 {
            return Ok(self.m(start)? as usize);
        }
        self.ensure_normalized();

        let prob_draw = self.rng.next_f64();
        let angle = self.rng.next_f64() * 2.0 * PI;

        let length_power = 1usize << length;
        let reg_mask = (length_power - 1) << start;

        let mut prob_array = vec![0.0f64; length_power];
        for (i, amp) in self.state.amplitudes().iter().enumerate() {
            prob_array[(i & reg_mask) >> start] += amp.norm_sqr();
        }

        // Walk the cumulative histogram; the largest bucket seen so far is
        // the fallback when rounding keeps every cumulative sum below the
        // draw.
        let mut result = length_power - 1;
        let mut nrmlzr = 0.0;
        let mut lower_prob = 0.0;
        let mut largest_prob = 0.0;
        let mut found = false;
        let mut lcv = 0;
        while !found && lcv < length_power {
            if prob_array[lcv] + lower_prob > prob_draw {
                found = true;
                result = lcv;
                nrmlzr = prob_array[lcv];
            } else {
                if largest_prob <= prob_array[lcv] {
                    largest_prob = prob_array[lcv];
                    result = lcv;
                    nrmlzr = largest_prob;
                }
                lower_prob += prob_array[lcv];
                lcv += 1;
            }
        }

        let nrm = Complex64::from_polar(1.0, angle) / nrmlzr;
        self.for_each_amp(|i, amp| {
            if (i & reg_mask) >> start == result {
                *amp *= nrm;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        });
        self.update_running_norm();

        Ok(result)
    }

    /// Force a single qubit to a computational value by measuring and
    /// conditionally flipping.
    pub fn set_bit(&mut self, qubit: usize, value: bool) -> Result<()> {
        if value != self.m(qubit)? {
            self.x(qubit)?;
        }
        Ok(())
    }

    /// Force a window to a computational value.
    ///
    /// The whole-register case resets to a pure basis state with a random
    /// global phase; otherwise the window is measured and patched bit-wise.
    pub fn set_reg(&mut self, start: usize, length: usize, value: usize) -> Result<()> {
        self.check_range(start, length)?;
        if length == 0 {
            return Ok(());
        }
        if length == 1 {
            return self.set_bit(start, value == 1);
        }
        if start == 0 && length == self.qubit_count {
            if value >= self.max_q_power {
                return Err(StateError::DimensionMismatch {
                    expected: self.max_q_power,
                    actual: value,
                });
            }
            let angle = self.rng.next_f64() * 2.0 * PI;
            self.running_norm = 1.0;
            self.state
                .set_basis_state(value, Complex64::from_polar(1.0, angle));
            return Ok(());
        }

        let reg_val = self.m_reg(start, length)?;
        for i in 0..length {
            let bit_val = reg_val & (1usize << i) != 0;
            let want = value & (1usize << i) != 0;
            if bit_val != want {
                self.x(start + i)?;
            }
        }
        Ok(())
    }

    /// Reset the whole register to the pure basis state `|value⟩`.
    pub fn set_permutation(&mut self, value: usize) -> Result<()> {
        self.set_reg(0, self.qubit_count, value)
    }
}

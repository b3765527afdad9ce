//! Indexed classical-memory oracles
//!
//! A page of classical memory is loaded coherently: the index window selects
//! a table entry for every eigenstate at once, and the value window receives
//! it (or has it added/subtracted with carry). Each returns the rounded
//! expectation of the value window as a classical convenience.

use crate::kernel::SweepCtx;
use crate::register::Register;
use quvec_state::{Result, StateError};

impl Register {
    fn check_oracle_windows(
        &self,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: Option<usize>,
    ) -> Result<()> {
        self.check_range(index_start, index_length)?;
        self.check_range(value_start, value_length)?;
        let index_mask = ((1usize << index_length) - 1) << index_start;
        let value_mask = ((1usize << value_length) - 1) << value_start;
        if index_mask & value_mask != 0 {
            return Err(StateError::OverlappingQubits {
                index: (index_mask & value_mask).trailing_zeros() as usize,
            });
        }
        if let Some(carry) = carry_index {
            self.check_qubit(carry)?;
            if (1usize << carry) & (index_mask | value_mask) != 0 {
                return Err(StateError::OverlappingQubits { index: carry });
            }
        }
        Ok(())
    }

    /// Load a classical table into the value window, superposed over every
    /// index-window eigenstate.
    ///
    /// The value window is cleared first. Table entries are packed
    /// little-endian, `ceil(value_length/8)` bytes per entry. Returns the
    /// rounded expectation of the loaded value.
    pub fn superposed_lda(
        &mut self,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        values: &[u8],
    ) -> Result<usize> {
        self.check_oracle_windows(index_start, index_length, value_start, value_length, None)?;
        self.set_reg(value_start, value_length, 0)?;
        let ctx = SweepCtx {
            state: &mut self.state,
            running_norm: &mut self.running_norm,
            sweep: self.sweep,
        };
        self.kernel
            .indexed_lda(ctx, index_start, index_length, value_start, value_length, values)
    }

    /// Add a table-indexed classical value into the value window, with
    /// carry.
    ///
    /// The carry qubit is measured and cleared first; a set carry carries 1
    /// in. Returns the rounded expectation of the sum.
    pub fn superposed_adc(
        &mut self,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: usize,
        values: &[u8],
    ) -> Result<usize> {
        self.check_oracle_windows(
            index_start,
            index_length,
            value_start,
            value_length,
            Some(carry_index),
        )?;
        let carry_in = if self.m(carry_index)? {
            self.x(carry_index)?;
            1
        } else {
            0
        };
        let ctx = SweepCtx {
            state: &mut self.state,
            running_norm: &mut self.running_norm,
            sweep: self.sweep,
        };
        self.kernel.indexed_adc(
            ctx,
            index_start,
            index_length,
            value_start,
            value_length,
            carry_index,
            carry_in,
            values,
        )
    }

    /// Subtract a table-indexed classical value from the value window, with
    /// borrow.
    ///
    /// A set carry going in means borrow 0; the carry is cleared after the
    /// test. Returns the rounded expectation of the difference.
    pub fn superposed_sbc(
        &mut self,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: usize,
        values: &[u8],
    ) -> Result<usize> {
        self.check_oracle_windows(
            index_start,
            index_length,
            value_start,
            value_length,
            Some(carry_index),
        )?;
        let carry_in = if self.m(carry_index)? {
            self.x(carry_index)?;
            0
        } else {
            1
        };
        let ctx = SweepCtx {
            state: &mut self.state,
            running_norm: &mut self.running_norm,
            sweep: self.sweep,
        };
        self.kernel.indexed_sbc(
            ctx,
            index_start,
            index_length,
            value_start,
            value_length,
            carry_index,
            carry_in,
            values,
        )
    }
}

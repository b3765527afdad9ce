//! Gate kernel boundary: the operations an accelerator must mirror
//!
//! The engine's only polymorphism point. Everything above this trait (the
//! gate library, the arithmetic oracle family, measurement, composition) is
//! composed from these operations plus plain sweeps, so an offload backend
//! only has to provide this surface.

use num_complex::Complex64;
use quvec_gates::Matrix2x2;
use quvec_state::{
    par_for, par_for_mask, par_for_skip, par_norm, AmpView, Result, StateError, StateVector,
    SweepConfig,
};
use rayon::prelude::*;
use std::fmt;

/// Mutable view of the register handed to a kernel for one sweep.
pub struct SweepCtx<'a> {
    pub state: &'a mut StateVector,
    pub running_norm: &'a mut f64,
    pub sweep: SweepConfig,
}

/// The kernel operations behind which the host and any accelerator variant
/// sit. Selected once at register construction.
pub trait Kernel: fmt::Debug + Send + Sync {
    /// Apply an arbitrary 2×2 matrix across the acted bit of every
    /// pre-image, in place.
    ///
    /// `sorted_powers` holds the acted and control bit masks in strictly
    /// ascending order; the sweep enumerates indices with all of them zero.
    /// For each pre-image `p`, the pair `(p | offset1, p | offset2)` is the
    /// two-element subspace the matrix acts on.
    ///
    /// With `do_apply_norm` the two written amplitudes are divided by the
    /// pre-sweep running norm. With `do_calc_norm` the running norm is
    /// recomputed from the result; otherwise it resets to `1.0`, since the
    /// applied scaling has consumed any recorded drift.
    #[allow(clippy::too_many_arguments)]
    fn apply_2x2(
        &self,
        ctx: SweepCtx<'_>,
        offset1: usize,
        offset2: usize,
        mtrx: &Matrix2x2,
        sorted_powers: &[usize],
        do_apply_norm: bool,
        do_calc_norm: bool,
    ) -> Result<()>;

    /// Cyclic left rotation of a bit window.
    fn rol(&self, ctx: SweepCtx<'_>, shift: usize, start: usize, length: usize) -> Result<()>;

    /// Cyclic right rotation of a bit window.
    fn ror(&self, ctx: SweepCtx<'_>, shift: usize, start: usize, length: usize) -> Result<()>;

    /// Modular add with carry-out; the carry subspace must already be clear.
    fn incc(
        &self,
        ctx: SweepCtx<'_>,
        to_add: usize,
        start: usize,
        length: usize,
        carry_index: usize,
    ) -> Result<()>;

    /// Modular subtract with borrow flagged in the carry bit.
    fn decc(
        &self,
        ctx: SweepCtx<'_>,
        to_sub: usize,
        start: usize,
        length: usize,
        carry_index: usize,
    ) -> Result<()>;

    /// Superpose a classical table into the value window, indexed by the
    /// index window. Returns the rounded expectation of the loaded value.
    fn indexed_lda(
        &self,
        ctx: SweepCtx<'_>,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        values: &[u8],
    ) -> Result<usize>;

    /// Add a table-indexed classical value (plus carry-in) into the value
    /// window, carry-out in `carry_index`. Returns the rounded expectation.
    #[allow(clippy::too_many_arguments)]
    fn indexed_adc(
        &self,
        ctx: SweepCtx<'_>,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: usize,
        carry_in: usize,
        values: &[u8],
    ) -> Result<usize>;

    /// Subtract a table-indexed classical value (with borrow-in) from the
    /// value window, borrow state in `carry_index`. Returns the rounded
    /// expectation.
    #[allow(clippy::too_many_arguments)]
    fn indexed_sbc(
        &self,
        ctx: SweepCtx<'_>,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: usize,
        carry_in: usize,
        values: &[u8],
    ) -> Result<usize>;
}

/// Host-side kernel over the in-process amplitude buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuKernel;

/// Expectation of the integer held in a masked window, `Σ p·|ψ_p|²`.
fn window_expectation(
    sweep: SweepConfig,
    amplitudes: &[Complex64],
    mask: usize,
    shift: usize,
) -> f64 {
    if sweep.workers < 2 || amplitudes.len() < sweep.parallel_threshold {
        amplitudes
            .iter()
            .enumerate()
            .map(|(i, amp)| amp.norm_sqr() * ((i & mask) >> shift) as f64)
            .sum()
    } else {
        amplitudes
            .par_iter()
            .enumerate()
            .map(|(i, amp)| amp.norm_sqr() * ((i & mask) >> shift) as f64)
            .sum()
    }
}

fn check_table(values: &[u8], index_length: usize, value_bytes: usize) -> Result<()> {
    let expected = (1usize << index_length) * value_bytes;
    if values.len() < expected {
        return Err(StateError::DimensionMismatch {
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn check_window(qubit_count: usize, start: usize, length: usize) -> Result<()> {
    if length > 0 && start + length > qubit_count {
        return Err(StateError::InvalidQubitIndex {
            index: start + length - 1,
            qubit_count,
        });
    }
    Ok(())
}

fn check_bit_outside(qubit_count: usize, bit: usize, window_mask: usize) -> Result<()> {
    if bit >= qubit_count {
        return Err(StateError::InvalidQubitIndex {
            index: bit,
            qubit_count,
        });
    }
    if (1usize << bit) & window_mask != 0 {
        return Err(StateError::OverlappingQubits { index: bit });
    }
    Ok(())
}

impl Kernel for CpuKernel {
    fn apply_2x2(
        &self,
        ctx: SweepCtx<'_>,
        offset1: usize,
        offset2: usize,
        mtrx: &Matrix2x2,
        sorted_powers: &[usize],
        do_apply_norm: bool,
        do_calc_norm: bool,
    ) -> Result<()> {
        let dimension = ctx.state.dimension();
        let qubit_count = ctx.state.num_qubits();
        for &power in sorted_powers {
            if power >= dimension {
                return Err(StateError::InvalidQubitIndex {
                    index: power.trailing_zeros() as usize,
                    qubit_count,
                });
            }
        }

        let nrm = if do_apply_norm {
            1.0 / *ctx.running_norm
        } else {
            1.0
        };
        let m = *mtrx;
        let view = AmpView::new(ctx.state.amplitudes_mut());
        par_for_mask(ctx.sweep, 0, dimension, sorted_powers, qubit_count, move |lcv| unsafe {
            let y0 = view.read(lcv | offset1);
            let y1 = view.read(lcv | offset2);
            view.write(lcv | offset1, (m[0][0] * y0 + m[0][1] * y1) * nrm);
            view.write(lcv | offset2, (m[1][0] * y0 + m[1][1] * y1) * nrm);
        })?;

        if do_calc_norm {
            *ctx.running_norm = par_norm(ctx.sweep, ctx.state.amplitudes());
        } else {
            *ctx.running_norm = 1.0;
        }
        Ok(())
    }

    fn rol(&self, ctx: SweepCtx<'_>, shift: usize, start: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        check_window(ctx.state.num_qubits(), start, length)?;
        let shift = shift % length;
        if shift == 0 {
            return Ok(());
        }
        let dimension = ctx.state.dimension();
        let length_power = 1usize << length;
        let reg_mask = (length_power - 1) << start;
        let other_mask = (dimension - 1) ^ reg_mask;

        let mut next = StateVector::zeroed(ctx.state.num_qubits())?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for(ctx.sweep, 0, dimension, |lcv| {
                let other_res = lcv & other_mask;
                let reg_int = (lcv & reg_mask) >> start;
                let out_int =
                    ((reg_int << shift) | (reg_int >> (length - shift))) & (length_power - 1);
                unsafe { view.write((out_int << start) | other_res, src[lcv]) };
            });
        }
        ctx.state.replace(next);
        Ok(())
    }

    fn ror(&self, ctx: SweepCtx<'_>, shift: usize, start: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        check_window(ctx.state.num_qubits(), start, length)?;
        let shift = shift % length;
        if shift == 0 {
            return Ok(());
        }
        let dimension = ctx.state.dimension();
        let length_power = 1usize << length;
        let reg_mask = (length_power - 1) << start;
        let other_mask = (dimension - 1) ^ reg_mask;

        let mut next = StateVector::zeroed(ctx.state.num_qubits())?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for(ctx.sweep, 0, dimension, |lcv| {
                let other_res = lcv & other_mask;
                let reg_int = (lcv & reg_mask) >> start;
                let out_int =
                    ((reg_int >> shift) | (reg_int << (length - shift))) & (length_power - 1);
                unsafe { view.write((out_int << start) | other_res, src[lcv]) };
            });
        }
        ctx.state.replace(next);
        Ok(())
    }

    fn incc(
        &self,
        ctx: SweepCtx<'_>,
        to_add: usize,
        start: usize,
        length: usize,
        carry_index: usize,
    ) -> Result<()> {
        check_window(ctx.state.num_qubits(), start, length)?;
        let dimension = ctx.state.dimension();
        let length_power = 1usize << length;
        let in_out_mask = (length_power - 1) << start;
        check_bit_outside(ctx.state.num_qubits(), carry_index, in_out_mask)?;
        let carry_mask = 1usize << carry_index;
        let other_mask = (dimension - 1) ^ (in_out_mask | carry_mask);
        // A carry-in folded onto a full-window addend may equal the window
        // size itself; anything beyond that wraps.
        let to_add = if to_add > length_power {
            to_add % length_power
        } else {
            to_add
        };

        let mut next = StateVector::zeroed(ctx.state.num_qubits())?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for_skip(ctx.sweep, 0, dimension, carry_mask, 1, |lcv| {
                let other_res = lcv & other_mask;
                let in_out_int = (lcv & in_out_mask) >> start;
                let out_int = in_out_int + to_add;
                let out_res = if out_int < length_power {
                    (out_int << start) | other_res
                } else {
                    ((out_int - length_power) << start) | other_res | carry_mask
                };
                unsafe { view.write(out_res, src[lcv]) };
            });
        }
        ctx.state.replace(next);
        Ok(())
    }

    fn decc(
        &self,
        ctx: SweepCtx<'_>,
        to_sub: usize,
        start: usize,
        length: usize,
        carry_index: usize,
    ) -> Result<()> {
        check_window(ctx.state.num_qubits(), start, length)?;
        let dimension = ctx.state.dimension();
        let length_power = 1usize << length;
        let in_out_mask = (length_power - 1) << start;
        check_bit_outside(ctx.state.num_qubits(), carry_index, in_out_mask)?;
        let carry_mask = 1usize << carry_index;
        let other_mask = (dimension - 1) ^ (in_out_mask | carry_mask);
        // A borrow-in folded onto a full-window subtrahend may equal the
        // window size itself; anything beyond that wraps.
        let to_sub = if to_sub > length_power {
            to_sub % length_power
        } else {
            to_sub
        };

        let mut next = StateVector::zeroed(ctx.state.num_qubits())?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for_skip(ctx.sweep, 0, dimension, carry_mask, 1, |lcv| {
                let other_res = lcv & other_mask;
                let in_out_int = (lcv & in_out_mask) >> start;
                let out_int = (in_out_int + length_power).wrapping_sub(to_sub);
                // Borrow shows up in the carry bit.
                let out_res = if out_int < length_power {
                    (out_int << start) | other_res | carry_mask
                } else {
                    ((out_int - length_power) << start) | other_res
                };
                unsafe { view.write(out_res, src[lcv]) };
            });
        }
        ctx.state.replace(next);
        Ok(())
    }

    fn indexed_lda(
        &self,
        ctx: SweepCtx<'_>,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        values: &[u8],
    ) -> Result<usize> {
        let dimension = ctx.state.dimension();
        let qubit_count = ctx.state.num_qubits();
        let value_bytes = (value_length + 7) / 8;
        check_window(qubit_count, index_start, index_length)?;
        check_window(qubit_count, value_start, value_length)?;
        check_table(values, index_length, value_bytes)?;

        let value_cap = (1usize << value_length) - 1;
        let input_mask = ((1usize << index_length) - 1) << index_start;
        let output_mask = value_cap << value_start;
        let skip_power = 1usize << value_start;

        let mut next = StateVector::zeroed(qubit_count)?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for_skip(ctx.sweep, 0, dimension, skip_power, value_length, |lcv| {
                let input_int = (lcv & input_mask) >> index_start;
                let mut output_int = 0usize;
                for j in 0..value_bytes {
                    output_int |= (values[input_int * value_bytes + j] as usize) << (8 * j);
                }
                output_int &= value_cap;
                unsafe { view.write((output_int << value_start) | lcv, src[lcv]) };
            });
        }

        let average = window_expectation(ctx.sweep, next.amplitudes(), output_mask, value_start);
        ctx.state.replace(next);
        Ok((average + 0.5) as usize)
    }

    fn indexed_adc(
        &self,
        ctx: SweepCtx<'_>,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: usize,
        carry_in: usize,
        values: &[u8],
    ) -> Result<usize> {
        let dimension = ctx.state.dimension();
        let qubit_count = ctx.state.num_qubits();
        let value_bytes = (value_length + 7) / 8;
        check_window(qubit_count, index_start, index_length)?;
        check_window(qubit_count, value_start, value_length)?;
        let output_mask = ((1usize << value_length) - 1) << value_start;
        check_bit_outside(qubit_count, carry_index, output_mask)?;
        check_table(values, index_length, value_bytes)?;

        let length_power = 1usize << value_length;
        let carry_mask = 1usize << carry_index;
        let input_mask = ((1usize << index_length) - 1) << index_start;
        let other_mask = (dimension - 1) & !(input_mask | output_mask);

        let mut next = StateVector::zeroed(qubit_count)?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for_skip(ctx.sweep, 0, dimension, carry_mask, 1, |lcv| {
                let other_res = lcv & other_mask;
                let input_res = lcv & input_mask;
                let input_int = input_res >> index_start;

                let mut output_int = 0usize;
                for j in 0..value_bytes {
                    output_int |= (values[input_int * value_bytes + j] as usize) << (8 * j);
                }
                output_int &= length_power - 1;
                output_int += ((lcv & output_mask) >> value_start) + carry_in;

                let mut carry_res = 0usize;
                if output_int >= length_power {
                    output_int -= length_power;
                    carry_res = carry_mask;
                }
                let output_res = output_int << value_start;
                unsafe { view.write(output_res | input_res | other_res | carry_res, src[lcv]) };
            });
        }

        let average = window_expectation(ctx.sweep, next.amplitudes(), output_mask, value_start);
        ctx.state.replace(next);
        Ok((average + 0.5) as usize)
    }

    fn indexed_sbc(
        &self,
        ctx: SweepCtx<'_>,
        index_start: usize,
        index_length: usize,
        value_start: usize,
        value_length: usize,
        carry_index: usize,
        carry_in: usize,
        values: &[u8],
    ) -> Result<usize> {
        let dimension = ctx.state.dimension();
        let qubit_count = ctx.state.num_qubits();
        let value_bytes = (value_length + 7) / 8;
        check_window(qubit_count, index_start, index_length)?;
        check_window(qubit_count, value_start, value_length)?;
        let output_mask = ((1usize << value_length) - 1) << value_start;
        check_bit_outside(qubit_count, carry_index, output_mask)?;
        check_table(values, index_length, value_bytes)?;

        let length_power = 1usize << value_length;
        let carry_mask = 1usize << carry_index;
        let input_mask = ((1usize << index_length) - 1) << index_start;
        let other_mask = (dimension - 1) & !(input_mask | output_mask);

        let mut next = StateVector::zeroed(qubit_count)?;
        {
            let src = ctx.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for_skip(ctx.sweep, 0, dimension, carry_mask, 1, |lcv| {
                let other_res = lcv & other_mask;
                let input_res = lcv & input_mask;
                let input_int = input_res >> index_start;

                let mut loaded = 0usize;
                for j in 0..value_bytes {
                    loaded |= (values[input_int * value_bytes + j] as usize) << (8 * j);
                }
                loaded &= length_power - 1;
                let mut output_int = ((lcv & output_mask) >> value_start)
                    .wrapping_add(length_power.wrapping_sub(loaded + carry_in));

                // Borrow-out leaves the carry clear; no borrow sets it.
                let mut carry_res = 0usize;
                if output_int >= length_power {
                    output_int -= length_power;
                    carry_res = carry_mask;
                }
                let output_res = output_int << value_start;
                unsafe { view.write(output_res | input_res | other_res | carry_res, src[lcv]) };
            });
        }

        let average = window_expectation(ctx.sweep, next.amplitudes(), output_mask, value_start);
        ctx.state.replace(next);
        Ok((average + 0.5) as usize)
    }
}

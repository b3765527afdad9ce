//! Data-parallel sweeps over permutation indices
//!
//! Every gate and oracle is a fork-join sweep over a contiguous range of
//! logical counters. The skip and mask variants expand each counter into a
//! physical index with one or more bit positions held at zero, enumerating
//! the pre-image space of an operation that writes those bits. Iteration
//! order within a sweep is unspecified; per-index functions must only touch
//! the slots their own index addresses.

use crate::error::{Result, StateError};
use num_complex::Complex64;
use rayon::prelude::*;
use std::marker::PhantomData;

/// Tuning knobs for parallel sweeps.
///
/// `workers` is a hint taken from the hardware concurrency at construction;
/// ranges shorter than `parallel_threshold` run on the calling thread to
/// avoid fork-join overhead on small registers.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub workers: usize,
    pub parallel_threshold: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            parallel_threshold: 1 << 12,
        }
    }
}

impl SweepConfig {
    #[inline]
    fn run_serial(&self, count: usize) -> bool {
        self.workers < 2 || count < self.parallel_threshold
    }

    #[inline]
    fn min_chunk(&self, count: usize) -> usize {
        (count / (self.workers * 4)).max(1)
    }
}

/// Invoke `f(i)` for every `i` in `[begin, end)`.
pub fn par_for<F>(cfg: SweepConfig, begin: usize, end: usize, f: F)
where
    F: Fn(usize) + Sync + Send,
{
    let count = end.saturating_sub(begin);
    if cfg.run_serial(count) {
        for i in begin..end {
            f(i);
        }
    } else {
        (begin..end)
            .into_par_iter()
            .with_min_len(cfg.min_chunk(count))
            .for_each(f);
    }
}

/// Iterate the indices whose `mask_width` bits at the position of
/// `skip_mask` are zero.
///
/// `skip_mask` is the power of two marking the lowest skipped bit. Each
/// logical counter is split around the hole: low bits pass through, high
/// bits shift up past it, so the `(end - begin) >> mask_width` pre-images
/// are visited exactly once.
pub fn par_for_skip<F>(
    cfg: SweepConfig,
    begin: usize,
    end: usize,
    skip_mask: usize,
    mask_width: usize,
    f: F,
) where
    F: Fn(usize) + Sync + Send,
{
    let low_mask = skip_mask - 1;
    let hole = (skip_mask << mask_width).wrapping_sub(skip_mask);
    let high_mask = !(low_mask | hole);
    let count = end.saturating_sub(begin) >> mask_width;

    let expand = move |c: usize| ((c << mask_width) & high_mask) | (c & low_mask);

    if cfg.run_serial(count) {
        for c in begin..begin + count {
            f(expand(c));
        }
    } else {
        (begin..begin + count)
            .into_par_iter()
            .with_min_len(cfg.min_chunk(count))
            .for_each(|c| f(expand(c)));
    }
}

/// Generalised skip over `mask_array.len()` disjoint single-bit holes.
///
/// The masks must be single qubit powers in strictly ascending order. Each
/// logical counter is pushed apart one mask at a time, lowest hole first.
///
/// # Errors
/// `UnorderedMasks` if the masks are not strictly ascending (equal masks are
/// likewise rejected), `TooManyMasks` if there are more masks than qubits.
pub fn par_for_mask<F>(
    cfg: SweepConfig,
    begin: usize,
    end: usize,
    mask_array: &[usize],
    qubit_count: usize,
    f: F,
) -> Result<()>
where
    F: Fn(usize) + Sync + Send,
{
    if mask_array.len() > qubit_count {
        return Err(StateError::TooManyMasks {
            given: mask_array.len(),
            qubit_count,
        });
    }
    for pair in mask_array.windows(2) {
        if pair[1] <= pair[0] {
            return Err(StateError::UnorderedMasks);
        }
    }

    // Per-mask (low, high) splits, precomputed once.
    let splits: Vec<(usize, usize)> = mask_array
        .iter()
        .map(|&m| (m - 1, !((m - 1) | m)))
        .collect();

    let count = end.saturating_sub(begin) >> mask_array.len();
    let expand = move |mut c: usize| {
        for &(low, high) in &splits {
            c = ((c << 1) & high) | (c & low);
        }
        c
    };

    if cfg.run_serial(count) {
        for c in begin..begin + count {
            f(expand(c));
        }
    } else {
        (begin..begin + count)
            .into_par_iter()
            .with_min_len(cfg.min_chunk(count))
            .for_each(|c| f(expand(c)));
    }

    Ok(())
}

/// Compute `sqrt(Σ |ψ_p|²)` with per-worker partial sums.
pub fn par_norm(cfg: SweepConfig, amplitudes: &[Complex64]) -> f64 {
    let sqr_norm: f64 = if cfg.run_serial(amplitudes.len()) {
        amplitudes.iter().map(|a| a.norm_sqr()).sum()
    } else {
        amplitudes.par_iter().map(|a| a.norm_sqr()).sum()
    };
    sqr_norm.sqrt()
}

/// Shared mutable view of an amplitude buffer for the duration of one sweep.
///
/// Sweeps hand this to worker closures so that disjoint slots can be written
/// without locks. Soundness rests on the disjoint-write invariant: the
/// closure invoked for index `p` may only touch slots derived from `p` and
/// the sweep's iteration masks, and no two indices of one sweep may derive
/// the same slot.
pub struct AmpView<'a> {
    ptr: *mut Complex64,
    len: usize,
    _marker: PhantomData<&'a mut [Complex64]>,
}

unsafe impl Send for AmpView<'_> {}
unsafe impl Sync for AmpView<'_> {}

impl<'a> AmpView<'a> {
    pub fn new(amplitudes: &'a mut [Complex64]) -> Self {
        Self {
            ptr: amplitudes.as_mut_ptr(),
            len: amplitudes.len(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the amplitude at `index`.
    ///
    /// # Safety
    /// `index` must be in bounds and no concurrent write to the same slot
    /// may be in flight.
    #[inline]
    pub unsafe fn read(&self, index: usize) -> Complex64 {
        debug_assert!(index < self.len);
        *self.ptr.add(index)
    }

    /// Write the amplitude at `index`.
    ///
    /// # Safety
    /// `index` must be in bounds and owned exclusively by the calling
    /// iteration under the sweep's disjoint-write invariant.
    #[inline]
    pub unsafe fn write(&self, index: usize, value: Complex64) {
        debug_assert!(index < self.len);
        *self.ptr.add(index) = value;
    }
}

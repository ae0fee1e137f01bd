// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Prefix Sum Module** - *Compensated Running Totals*
//!
//! Running sums `y[i] = Σ_{j≤i} x[j]` with Kahan-Neumaier compensation, so the rounding
//! error of each output stays bounded independently of its position.
//!
//! The body works in blocks of two vector groups: each group gets an in-register running
//! sum, is offset by the compensated scalar total, written out, and then its last lane is
//! folded back into the scalar pair. Compensation therefore costs one scalar update per
//! group rather than per element. The unaligned prefix and the short tail are handled one
//! element at a time with the same update.
//!
//! Source and destination may be the same buffer, see [`prefix_sum_in_place`].

use crate::config::PREFIX_BLOCK_GROUPS;
use crate::kernels::lanes::{Lanes, Vector};
use crate::kernels::source::PrefixSumSource;

/// Compensated running sum as an `(accumulator, compensator)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KahanPair {
    pub accumulator: f64,
    pub compensator: f64,
}

impl KahanPair {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value`, recovering the rounding error from whichever operand is larger.
    #[inline(always)]
    pub fn update(&mut self, value: f64) {
        let updated = self.accumulator + value;
        if self.accumulator.abs() >= value.abs() {
            self.compensator += (self.accumulator - updated) + value;
        } else {
            self.compensator += (value - updated) + self.accumulator;
        }
        self.accumulator = updated;
    }

    /// Best estimate of the running total.
    #[inline(always)]
    pub fn total(&self) -> f64 {
        self.accumulator + self.compensator
    }
}

/// Drives `source` to completion, feeding one running total per input value.
pub fn compensated_prefix_sum<L: Lanes>(source: &mut PrefixSumSource<'_>) {
    let mut kahan = KahanPair::new();
    while source.can_procure::<f64>(1) && !source.is_aligned::<L>() {
        let value: f64 = source.procure();
        kahan.update(value);
        source.feed(kahan.total());
    }

    while source.can_procure::<L>(PREFIX_BLOCK_GROUPS) {
        let first: L = source.procure();
        let second: L = source.procure();
        let first = first.running_sum();
        let second = second.running_sum();

        source.feed(first + L::splat(kahan.total()));
        kahan.update(first.last());
        source.feed(second + L::splat(kahan.total()));
        kahan.update(second.last());
    }

    while source.can_procure::<f64>(1) {
        let value: f64 = source.procure();
        kahan.update(value);
        source.feed(kahan.total());
    }
}

/// Writes the running totals of `src` into `dst[..src.len()]`.
#[inline]
pub fn prefix_sum<L: Lanes>(src: &[f64], dst: &mut [f64]) {
    compensated_prefix_sum::<L>(&mut PrefixSumSource::new(src, dst));
}

/// Replaces `buf` with its running totals.
#[inline]
pub fn prefix_sum_in_place<L: Lanes>(buf: &mut [f64]) {
    compensated_prefix_sum::<L>(&mut PrefixSumSource::in_place(buf));
}

/// Running totals of `src` in a fresh vector.
pub fn cumulative_sum(src: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; src.len()];
    prefix_sum::<Vector>(src, &mut out);
    out
}

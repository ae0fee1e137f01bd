// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Cascade Summation Module** - *Pairwise Vectorised Reductions*
//!
//! Sums, weighted sums and moment statistics computed with cascade (pairwise) summation.
//! Rounding error grows with `O(log n · ε)` rather than the `O(n · ε)` of a left-to-right loop,
//! while the body still runs a full vector register at a time.
//!
//! ## Algorithm
//! 1. Scalar warm-up until the value buffer is lane-aligned.
//! 2. Each iteration procures four vector groups into a fresh accumulator (as two pairs).
//! 3. The iteration counter acts as a binary counter: every trailing set bit pops one
//!    equally-sized partial off the stack and merges it in, so only sums of equal rank meet.
//! 4. The merged accumulator is pushed.
//! 5. Once fewer than four groups remain, the stack is folded top to bottom, reduced
//!    horizontally, and the tail is consumed one value at a time.
//! 6. The source converts the channel totals into its statistic.
//!
//! Results are deterministic for a fixed lane width and buffer alignment. They are not
//! bit-identical to naive summation.
//!
//! Every entry point is generic over [`Lanes`]; use `f64` for the scalar path and
//! [`Vector`](crate::kernels::lanes::Vector) for the vectorised one.

use crate::config::{ACCUMULATOR_STACK_DEPTH, CASCADE_GROUPS};
use crate::kernels::lanes::Lanes;
use crate::kernels::source::{
    LaneSource, StandardDeviationSource, SumSource, WeightedMeanSource,
    WeightedStandardDeviationSource, WeightedSumSource,
};

#[inline(always)]
fn add_channels<L: Lanes, const C: usize>(acc: &mut [L; C], other: &[L; C]) {
    for (a, &b) in acc.iter_mut().zip(other.iter()) {
        *a += b;
    }
}

/// Reduces `source` with cascade summation over `C` channels in lock-step.
///
/// Returns the source's statistic computed from the final channel totals.
pub fn cascade_sum<L, S, const C: usize>(source: &mut S) -> f64
where
    L: Lanes,
    S: LaneSource<C>,
{
    let mut totals = [0.0_f64; C];
    while source.can_procure::<f64>(1) && !source.is_aligned::<L>() {
        source.procure(&mut totals);
    }

    let mut stack = [[L::zero(); C]; ACCUMULATOR_STACK_DEPTH];
    let mut depth = 0usize;
    let mut iteration = 0usize;
    while source.can_procure::<L>(CASCADE_GROUPS) {
        let mut v = [L::zero(); C];
        source.procure(&mut v);
        source.procure(&mut v);
        let mut w = [L::zero(); C];
        source.procure(&mut w);
        source.procure(&mut w);
        add_channels(&mut v, &w);

        let mut bit = 1usize;
        while iteration & bit != 0 {
            depth -= 1;
            add_channels(&mut v, &stack[depth]);
            bit <<= 1;
        }
        debug_assert!(depth < ACCUMULATOR_STACK_DEPTH);
        stack[depth] = v;
        depth += 1;
        iteration += 1;
    }

    let mut folded = [L::zero(); C];
    for level in stack[..depth].iter().rev() {
        add_channels(&mut folded, level);
    }
    for (total, lanes) in totals.iter_mut().zip(folded) {
        *total += lanes.reduce_sum();
    }

    while source.can_procure::<f64>(1) {
        source.procure(&mut totals);
    }
    source.result(totals)
}

/// Cascade sum of `values`. Empty input sums to `0.0`.
#[inline]
pub fn sum<L: Lanes>(values: &[f64]) -> f64 {
    cascade_sum::<L, _, 1>(&mut SumSource::new(values))
}

/// Arithmetic mean, `sum / n`. Empty input yields NaN.
#[inline]
pub fn mean<L: Lanes>(values: &[f64]) -> f64 {
    sum::<L>(values) / values.len() as f64
}

/// `Σ values[i] · weights[i]` over `values.len()` entries.
#[inline]
pub fn weighted_sum<L: Lanes>(values: &[f64], weights: &[f64]) -> f64 {
    cascade_sum::<L, _, 1>(&mut WeightedSumSource::new(values, weights))
}

/// Inner product of `lhs` and `rhs` over `lhs.len()` entries.
#[inline]
pub fn dot<L: Lanes>(lhs: &[f64], rhs: &[f64]) -> f64 {
    weighted_sum::<L>(lhs, rhs)
}

/// `Σ x·w / Σ w`. A zero weight total is divided as-is (±inf or NaN).
#[inline]
pub fn weighted_mean<L: Lanes>(values: &[f64], weights: &[f64]) -> f64 {
    cascade_sum::<L, _, 2>(&mut WeightedMeanSource::new(values, weights))
}

/// Unbiased standard deviation, `sqrt(max(0, (Σx² - (Σx)²/n) / (n - 1)))`.
///
/// A single value divides by zero and returns NaN.
#[inline]
pub fn standard_deviation<L: Lanes>(values: &[f64]) -> f64 {
    cascade_sum::<L, _, 2>(&mut StandardDeviationSource::new(values))
}

/// Biased standard deviation, `sqrt((n - 1) / n) · standard_deviation`.
#[inline]
pub fn standard_deviation_biased<L: Lanes>(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    ((n - 1.0) / n).sqrt() * standard_deviation::<L>(values)
}

/// Biased weighted standard deviation, `sqrt(max(0, Σx²w/Σw - (Σxw/Σw)²))`.
#[inline]
pub fn weighted_standard_deviation<L: Lanes>(values: &[f64], weights: &[f64]) -> f64 {
    cascade_sum::<L, _, 3>(&mut WeightedStandardDeviationSource::new(values, weights))
}

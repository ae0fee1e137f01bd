// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Lane Source Module** - *Statistic-Specific Input Cursors*
//!
//! A lane source is a cursor over one or more parallel `f64` buffers that hands values
//! to a reduction engine one [`Lanes`] group at a time. Each source owns the arithmetic
//! for its statistic, so the engines in `cascade` and `prefix` stay statistic-agnostic.
//!
//! ## Sources
//! | Source | Channels | Accumulates |
//! |---|---|---|
//! | [`SumSource`] | 1 | `x` |
//! | [`WeightedSumSource`] | 1 | `x·w` |
//! | [`WeightedMeanSource`] | 2 | `x·w`, `w` |
//! | [`StandardDeviationSource`] | 2 | `x²`, `x` |
//! | [`WeightedStandardDeviationSource`] | 3 | `x²·w`, `x·w`, `w` |
//! | [`PrefixSumSource`] | - | loads `x`, feeds running totals |
//!
//! Every source keeps `remaining() == length - consumed` and never reads past its length.
//! Alignment is judged on the value buffer only; weights are loaded wherever they sit.

use crate::kernels::lanes::{Lanes, is_lane_aligned};

/// Cursor handing `C` parallel channels of partial sums to a reduction engine.
pub trait LaneSource<const C: usize> {
    /// Values not yet consumed.
    fn remaining(&self) -> usize;

    /// True iff at least `groups` whole `L` groups remain.
    #[inline(always)]
    fn can_procure<L: Lanes>(&self, groups: usize) -> bool {
        self.remaining() >= groups * L::LANES
    }

    /// True iff the read position can be loaded as `L` without straddling a lane boundary.
    fn is_aligned<L: Lanes>(&self) -> bool;

    /// Accumulates the next `L::LANES` values into `acc` and advances the cursor.
    fn procure<L: Lanes>(&mut self, acc: &mut [L; C]);

    /// Converts the final per-channel totals into the statistic.
    fn result(&self, totals: [f64; C]) -> f64;
}

/// Plain sum of a value buffer.
#[derive(Debug, Clone)]
pub struct SumSource<'a> {
    values: &'a [f64],
}

impl<'a> SumSource<'a> {
    #[inline]
    pub fn new(values: &'a [f64]) -> Self {
        Self { values }
    }
}

impl LaneSource<1> for SumSource<'_> {
    #[inline(always)]
    fn remaining(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    fn is_aligned<L: Lanes>(&self) -> bool {
        is_lane_aligned::<L>(self.values)
    }

    #[inline(always)]
    fn procure<L: Lanes>(&mut self, acc: &mut [L; 1]) {
        acc[0] += L::load(self.values);
        self.values = &self.values[L::LANES..];
    }

    #[inline(always)]
    fn result(&self, totals: [f64; 1]) -> f64 {
        totals[0]
    }
}

/// Sum of element-wise products. Also serves as the dot product.
#[derive(Debug, Clone)]
pub struct WeightedSumSource<'a> {
    values: &'a [f64],
    weights: &'a [f64],
}

impl<'a> WeightedSumSource<'a> {
    /// `weights` must hold at least `values.len()` entries.
    #[inline]
    pub fn new(values: &'a [f64], weights: &'a [f64]) -> Self {
        debug_assert!(weights.len() >= values.len());
        Self { values, weights }
    }
}

impl LaneSource<1> for WeightedSumSource<'_> {
    #[inline(always)]
    fn remaining(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    fn is_aligned<L: Lanes>(&self) -> bool {
        is_lane_aligned::<L>(self.values)
    }

    #[inline(always)]
    fn procure<L: Lanes>(&mut self, acc: &mut [L; 1]) {
        acc[0] += L::load(self.values) * L::load(self.weights);
        self.values = &self.values[L::LANES..];
        self.weights = &self.weights[L::LANES..];
    }

    #[inline(always)]
    fn result(&self, totals: [f64; 1]) -> f64 {
        totals[0]
    }
}

/// Weighted mean: channel 0 carries `Σ x·w`, channel 1 carries `Σ w`.
///
/// A zero weight total is not guarded; the division follows IEEE-754 (±inf or NaN).
#[derive(Debug, Clone)]
pub struct WeightedMeanSource<'a> {
    values: &'a [f64],
    weights: &'a [f64],
}

impl<'a> WeightedMeanSource<'a> {
    #[inline]
    pub fn new(values: &'a [f64], weights: &'a [f64]) -> Self {
        debug_assert!(weights.len() >= values.len());
        Self { values, weights }
    }
}

impl LaneSource<2> for WeightedMeanSource<'_> {
    #[inline(always)]
    fn remaining(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    fn is_aligned<L: Lanes>(&self) -> bool {
        is_lane_aligned::<L>(self.values)
    }

    #[inline(always)]
    fn procure<L: Lanes>(&mut self, acc: &mut [L; 2]) {
        let value = L::load(self.values);
        let weight = L::load(self.weights);
        acc[0] += value * weight;
        acc[1] += weight;
        self.values = &self.values[L::LANES..];
        self.weights = &self.weights[L::LANES..];
    }

    #[inline(always)]
    fn result(&self, totals: [f64; 2]) -> f64 {
        let [vw, w] = totals;
        vw / w
    }
}

/// Unbiased standard deviation from the first two raw moments.
///
/// Channel 0 carries `Σ x²`, channel 1 carries `Σ x`. A single element divides by zero.
#[derive(Debug, Clone)]
pub struct StandardDeviationSource<'a> {
    values: &'a [f64],
    initial_len: usize,
}

impl<'a> StandardDeviationSource<'a> {
    #[inline]
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            values,
            initial_len: values.len(),
        }
    }
}

impl LaneSource<2> for StandardDeviationSource<'_> {
    #[inline(always)]
    fn remaining(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    fn is_aligned<L: Lanes>(&self) -> bool {
        is_lane_aligned::<L>(self.values)
    }

    #[inline(always)]
    fn procure<L: Lanes>(&mut self, acc: &mut [L; 2]) {
        let value = L::load(self.values);
        acc[0] += value * value;
        acc[1] += value;
        self.values = &self.values[L::LANES..];
    }

    #[inline(always)]
    fn result(&self, totals: [f64; 2]) -> f64 {
        let [v2, v] = totals;
        let n = self.initial_len as f64;
        let variance = (v2 - v * v / n) / (n - 1.0);
        // Cancellation can push the estimate just below zero.
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }
}

/// Biased weighted standard deviation.
///
/// Channels carry `Σ x²·w`, `Σ x·w` and `Σ w`.
#[derive(Debug, Clone)]
pub struct WeightedStandardDeviationSource<'a> {
    values: &'a [f64],
    weights: &'a [f64],
}

impl<'a> WeightedStandardDeviationSource<'a> {
    #[inline]
    pub fn new(values: &'a [f64], weights: &'a [f64]) -> Self {
        debug_assert!(weights.len() >= values.len());
        Self { values, weights }
    }
}

impl LaneSource<3> for WeightedStandardDeviationSource<'_> {
    #[inline(always)]
    fn remaining(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    fn is_aligned<L: Lanes>(&self) -> bool {
        is_lane_aligned::<L>(self.values)
    }

    #[inline(always)]
    fn procure<L: Lanes>(&mut self, acc: &mut [L; 3]) {
        let value = L::load(self.values);
        let weight = L::load(self.weights);
        let value_weight = value * weight;
        acc[0] += value_weight * value;
        acc[1] += value_weight;
        acc[2] += weight;
        self.values = &self.values[L::LANES..];
        self.weights = &self.weights[L::LANES..];
    }

    #[inline(always)]
    fn result(&self, totals: [f64; 3]) -> f64 {
        let [v2w, vw, w] = totals;
        let variance = v2w / w - (vw * vw) / (w * w);
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }
}

#[derive(Debug)]
enum PrefixBuffers<'a> {
    Split { src: &'a [f64], dst: &'a mut [f64] },
    Shared(&'a mut [f64]),
}

/// Cursor for the prefix-sum engine: loads input groups and feeds running totals back.
///
/// The shared form reads and writes one buffer. Every group is loaded before the totals
/// covering it are fed, so reads always run ahead of writes.
#[derive(Debug)]
pub struct PrefixSumSource<'a> {
    buffers: PrefixBuffers<'a>,
    read: usize,
    write: usize,
    len: usize,
}

impl<'a> PrefixSumSource<'a> {
    /// Reads `src`, writes `dst[..src.len()]`.
    #[inline]
    pub fn new(src: &'a [f64], dst: &'a mut [f64]) -> Self {
        debug_assert!(dst.len() >= src.len());
        let len = src.len();
        Self {
            buffers: PrefixBuffers::Split { src, dst },
            read: 0,
            write: 0,
            len,
        }
    }

    /// Replaces `buf` with its own running totals.
    #[inline]
    pub fn in_place(buf: &'a mut [f64]) -> Self {
        let len = buf.len();
        Self {
            buffers: PrefixBuffers::Shared(buf),
            read: 0,
            write: 0,
            len,
        }
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.len - self.read
    }

    #[inline(always)]
    pub fn can_procure<L: Lanes>(&self, groups: usize) -> bool {
        self.remaining() >= groups * L::LANES
    }

    #[inline(always)]
    fn unread(&self) -> &[f64] {
        match &self.buffers {
            PrefixBuffers::Split { src, .. } => &src[self.read..],
            PrefixBuffers::Shared(buf) => &buf[self.read..self.len],
        }
    }

    #[inline(always)]
    pub fn is_aligned<L: Lanes>(&self) -> bool {
        is_lane_aligned::<L>(self.unread())
    }

    /// Loads the next `L::LANES` values.
    #[inline(always)]
    pub fn procure<L: Lanes>(&mut self) -> L {
        let value = L::load(self.unread());
        self.read += L::LANES;
        value
    }

    /// Writes `L::LANES` running totals at the write position.
    #[inline(always)]
    pub fn feed<L: Lanes>(&mut self, totals: L) {
        debug_assert!(self.write + L::LANES <= self.read);
        let out = match &mut self.buffers {
            PrefixBuffers::Split { dst, .. } => &mut dst[self.write..],
            PrefixBuffers::Shared(buf) => &mut buf[self.write..],
        };
        totals.store(out);
        self.write += L::LANES;
    }
}

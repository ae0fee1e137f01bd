// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Log-Domain Module** - *Stable Sums of Exponentials*
//!
//! Reductions over values stored as logarithms.
//!
//! ## Operations
//! - [`logsumexp`]: `log(Σ exp(x_i))`, shifted by `max(x)` so no term overflows and the
//!   largest term is exactly `1`.
//! - [`log_add_exp`]: the binary case, `log(exp(x) + exp(y))`, with `-inf` treated as the
//!   identity so that two empty probabilities combine to `-inf`.
//! - [`log_rescale`]: subtracts `logsumexp(x)` from every element, so `Σ exp(out_i) == 1`.
//!
//! ## Edge cases
//! - All inputs `-inf`, and empty input, return `-inf` directly. The shift would otherwise
//!   compute `-inf - -inf`.
//! - A `+inf` input is not special-cased; it yields NaN through `inf - inf`.
//! - NaN inputs propagate, including when every other input is `-inf`.

use crate::kernels::lanes::{Lanes, is_lane_aligned};

/// Largest value of `values`, `-inf` for empty input. Any NaN makes the result NaN.
#[inline]
pub fn max_or_neg_infinity(values: &[f64]) -> f64 {
    values
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &x| if x > acc || x.is_nan() { x } else { acc })
}

/// Sum of `exp(x - offset)`: scalar up to lane alignment, vectorised body, scalar tail.
#[inline]
fn shifted_exp_sum<L: Lanes>(values: &[f64], offset: f64) -> f64 {
    let mut rest = values;
    let mut acc = 0.0;
    while !rest.is_empty() && !is_lane_aligned::<L>(rest) {
        acc += (rest[0] - offset).exp();
        rest = &rest[1..];
    }

    let body = rest.len() - rest.len() % L::LANES;
    let (body, tail) = rest.split_at(body);
    for &x in tail {
        acc += (x - offset).exp();
    }

    let shift = L::splat(offset);
    let mut vacc = L::zero();
    for chunk in body.chunks_exact(L::LANES) {
        vacc += (L::load(chunk) - shift).exp();
    }
    acc + vacc.reduce_sum()
}

/// `log(Σ exp(x_i))` without overflow or underflow.
pub fn logsumexp<L: Lanes>(values: &[f64]) -> f64 {
    let offset = max_or_neg_infinity(values);
    if offset == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    shifted_exp_sum::<L>(values, offset).ln() + offset
}

/// `log(exp(x) + exp(y))`.
///
/// Computed as `max + log1p(exp(min - max))`, after which a `-inf` operand yields the
/// other operand unchanged.
#[inline(always)]
pub fn log_add_exp(x: f64, y: f64) -> f64 {
    // NaN in either operand must reach the result.
    let (max, min) = if x > y { (x, y) } else { (y, x) };
    let mut res = max + (min - max).exp().ln_1p();
    if x == f64::NEG_INFINITY {
        res = y;
    }
    if y == f64::NEG_INFINITY {
        res = x;
    }
    res
}

/// `out[i] = log_add_exp(lhs[i], rhs[i])` for `i < out.len()`.
///
/// `lhs` and `rhs` must hold at least `out.len()` values.
pub fn log_add_exp_into(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
    for ((o, &x), &y) in out.iter_mut().zip(lhs).zip(rhs) {
        *o = log_add_exp(x, y);
    }
}

/// `dst[i] = log_add_exp(dst[i], src[i])`.
pub fn log_add_exp_assign(dst: &mut [f64], src: &[f64]) {
    for (d, &y) in dst.iter_mut().zip(src) {
        *d = log_add_exp(*d, y);
    }
}

/// Writes `src[i] - logsumexp(src)` into `dst[..src.len()]`.
pub fn log_rescale<L: Lanes>(src: &[f64], dst: &mut [f64]) {
    let total = logsumexp::<L>(src);
    for (d, &x) in dst.iter_mut().zip(src) {
        *d = x - total;
    }
}

/// Normalises `buf` in place so that `Σ exp(buf_i) == 1`.
pub fn log_rescale_in_place<L: Lanes>(buf: &mut [f64]) {
    let total = logsumexp::<L>(buf);
    for x in buf.iter_mut() {
        *x -= total;
    }
}

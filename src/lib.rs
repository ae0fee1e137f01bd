// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.
// See LICENSE for details.

// `std::simd` is still nightly-only. The `simd` feature switches the vector lane type
// over to it; without the feature a plain array-backed pack is used instead.
#![cfg_attr(feature = "simd", feature(portable_simd))]

// compile with RUSTFLAGS="-C target-cpu=native" cargo +nightly build --features simd

//! # **Cascade Kernels** - *Numerically Stable Vectorised Reductions*
//!
//! Sums, weighted sums, means, standard deviations, compensated prefix sums and
//! log-domain reductions over contiguous `f64` buffers.
//!
//! - [`kernels::cascade`]: pairwise (cascade) summation with 1, 2 and 3 accumulator channels.
//! - [`kernels::prefix`]: Kahan-Neumaier compensated running totals.
//! - [`kernels::logdomain`]: shifted log-sum-exp and log-add-exp.
//! - [`dispatch::Reducer`]: validated `(buffer, offset, length)` entry points over the
//!   scalar or vector instantiation picked at start-up.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod utils;

pub mod kernels {
    pub mod cascade;
    pub mod complex;
    pub mod lanes;
    pub mod logdomain;
    pub mod prefix;
    pub mod source;
}

pub use dispatch::{Backend, Reducer};
pub use errors::KernelError;

// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Lanes Module** - *Vector Register Abstraction*
//!
//! The reduction engines are written once, generic over [`Lanes`]. A `Lanes` value is
//! a group of `LANES` doubles that moves through the engine as one unit.
//!
//! ## Implementations
//! - **`f64`**: one lane. This is the non-vectorised fallback and the shape used for
//!   unaligned prefixes and tails.
//! - **[`Vector`]**: `W64` lanes, where `W64` is resolved by `build.rs`.
//!   With the `simd` feature this is `std::simd::Simd<f64, W64>`, otherwise a plain
//!   fixed-size pack with element-wise operators that the optimiser can vectorise.

include!(concat!(env!("OUT_DIR"), "/simd_lanes.rs"));

use core::mem::size_of;
use std::ops::{Add, AddAssign, Mul, Sub};

#[cfg(feature = "simd")]
use std::simd::{Simd, StdFloat};

/// A vector register of `f64` values as seen by the reduction engines.
pub trait Lanes:
    Copy + Add<Output = Self> + AddAssign + Sub<Output = Self> + Mul<Output = Self>
{
    /// Number of `f64` values held.
    const LANES: usize;

    /// All lanes `0.0`.
    fn zero() -> Self;

    /// All lanes set to `value`.
    fn splat(value: f64) -> Self;

    /// Loads the first `LANES` values of `src`.
    fn load(src: &[f64]) -> Self;

    /// Stores into the first `LANES` slots of `dst`.
    fn store(self, dst: &mut [f64]);

    /// Horizontal sum, lowest lane first.
    fn reduce_sum(self) -> f64;

    /// Inclusive running sum across the lanes.
    fn running_sum(self) -> Self;

    /// Value held in the highest lane.
    fn last(self) -> f64;

    /// Lane-wise `exp`.
    fn exp(self) -> Self;
}

/// True if `slice` starts on a boundary suitable for loading `L` directly.
///
/// Alignment is relative to the lane width: `L::LANES * size_of::<f64>()` bytes.
/// Single-lane values are always aligned.
#[inline(always)]
pub fn is_lane_aligned<L: Lanes>(slice: &[f64]) -> bool {
    (slice.as_ptr() as usize) % (L::LANES * size_of::<f64>()) == 0
}

impl Lanes for f64 {
    const LANES: usize = 1;

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn load(src: &[f64]) -> Self {
        src[0]
    }

    #[inline(always)]
    fn store(self, dst: &mut [f64]) {
        dst[0] = self;
    }

    #[inline(always)]
    fn reduce_sum(self) -> f64 {
        self
    }

    #[inline(always)]
    fn running_sum(self) -> Self {
        self
    }

    #[inline(always)]
    fn last(self) -> f64 {
        self
    }

    #[inline(always)]
    fn exp(self) -> Self {
        f64::exp(self)
    }
}

/// Vector register used by the engines when running vectorised.
#[cfg(feature = "simd")]
pub type Vector = Simd<f64, W64>;

/// Vector register used by the engines when running vectorised.
#[cfg(not(feature = "simd"))]
pub type Vector = Pack;

#[cfg(feature = "simd")]
impl Lanes for Simd<f64, W64> {
    const LANES: usize = W64;

    #[inline(always)]
    fn zero() -> Self {
        Simd::splat(0.0)
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        Simd::splat(value)
    }

    #[inline(always)]
    fn load(src: &[f64]) -> Self {
        Simd::from_slice(&src[..W64])
    }

    #[inline(always)]
    fn store(self, dst: &mut [f64]) {
        self.copy_to_slice(&mut dst[..W64]);
    }

    #[inline(always)]
    fn reduce_sum(self) -> f64 {
        // Fixed left-to-right order keeps results reproducible for a given width.
        self.to_array().iter().fold(0.0, |acc, &x| acc + x)
    }

    #[inline(always)]
    fn running_sum(self) -> Self {
        let mut lanes = self.to_array();
        for i in 1..W64 {
            lanes[i] += lanes[i - 1];
        }
        Simd::from_array(lanes)
    }

    #[inline(always)]
    fn last(self) -> f64 {
        self[W64 - 1]
    }

    #[inline(always)]
    fn exp(self) -> Self {
        StdFloat::exp(self)
    }
}

/// Portable `W64`-wide pack used when `std::simd` is not enabled.
#[cfg(not(feature = "simd"))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pack(pub [f64; W64]);

#[cfg(not(feature = "simd"))]
macro_rules! impl_pack_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Pack {
            type Output = Pack;

            #[inline(always)]
            fn $method(self, rhs: Pack) -> Pack {
                let mut out = self.0;
                for (o, r) in out.iter_mut().zip(rhs.0) {
                    *o = *o $op r;
                }
                Pack(out)
            }
        }
    };
}

#[cfg(not(feature = "simd"))]
impl_pack_op!(Add, add, +);
#[cfg(not(feature = "simd"))]
impl_pack_op!(Sub, sub, -);
#[cfg(not(feature = "simd"))]
impl_pack_op!(Mul, mul, *);

#[cfg(not(feature = "simd"))]
impl AddAssign for Pack {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Pack) {
        for (o, r) in self.0.iter_mut().zip(rhs.0) {
            *o += r;
        }
    }
}

#[cfg(not(feature = "simd"))]
impl Lanes for Pack {
    const LANES: usize = W64;

    #[inline(always)]
    fn zero() -> Self {
        Pack([0.0; W64])
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        Pack([value; W64])
    }

    #[inline(always)]
    fn load(src: &[f64]) -> Self {
        let mut lanes = [0.0; W64];
        lanes.copy_from_slice(&src[..W64]);
        Pack(lanes)
    }

    #[inline(always)]
    fn store(self, dst: &mut [f64]) {
        dst[..W64].copy_from_slice(&self.0);
    }

    #[inline(always)]
    fn reduce_sum(self) -> f64 {
        self.0.iter().fold(0.0, |acc, &x| acc + x)
    }

    #[inline(always)]
    fn running_sum(self) -> Self {
        let mut lanes = self.0;
        for i in 1..W64 {
            lanes[i] += lanes[i - 1];
        }
        Pack(lanes)
    }

    #[inline(always)]
    fn last(self) -> f64 {
        self.0[W64 - 1]
    }

    #[inline(always)]
    fn exp(self) -> Self {
        Pack(self.0.map(f64::exp))
    }
}

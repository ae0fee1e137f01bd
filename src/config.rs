// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

// These parameters should rarely need adjustment.

//! # **Configuration Constants** - *Runtime Behaviour Parameters*
//!
//! Global configuration constants controlling kernel behaviour and performance thresholds.
//! These values are compile-time constants optimised for typical workloads.
//! The lane width itself is resolved by `build.rs`, see `kernels::lanes::W64`.

/// Capacity of the cascade accumulator stack.
///
/// Slot `k` holds a partial sum over `2^k` cascade groups, so 62 levels cover any
/// addressable input at any lane width.
pub const ACCUMULATOR_STACK_DEPTH: usize = 62;

/// Vector groups procured per cascade iteration.
///
/// Four groups are gathered as two independent pairs to shorten the dependency chain.
pub const CASCADE_GROUPS: usize = 4;

/// Vector groups per block in the compensated prefix-sum body.
pub const PREFIX_BLOCK_GROUPS: usize = 2;

/// Environment variable consulted by `Reducer::detect` to force a backend.
///
/// Accepted values are `scalar` and `vector` (case-insensitive).
pub const BACKEND_ENV_VAR: &str = "CASCADE_KERNELS_BACKEND";

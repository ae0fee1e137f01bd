// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Error Types** - *Argument Validation Errors*
//!
//! The reduction kernels themselves never fail: exceptional numeric cases surface as
//! NaN or ±infinity. Errors only arise in the validated entry points of
//! [`Reducer`](crate::dispatch::Reducer), which check buffer/offset/length triples before
//! handing slices to the kernels.
//!
//! All errors include contextual message space for debugging.

use core::fmt;
use std::error::Error;

/// Error type for the validated entry points.
///
/// Each variant includes a contextual message string providing specific details
/// about the error condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Paired buffers disagree on length.
    LengthMismatch(String),

    /// Invalid arguments provided to kernel function.
    InvalidArguments(String),

    /// `offset + length` runs past the end of a buffer.
    OutOfBounds(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::LengthMismatch(msg) => write!(f, "Length mismatch: {}", msg),
            KernelError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            KernelError::OutOfBounds(msg) => write!(f, "Out of bounds: {}", msg),
        }
    }
}

impl Error for KernelError {}

/// Creates a formatted error message for length mismatches between left-hand side (LHS) and right-hand side (RHS) arrays.
///
/// # Arguments
/// * `fname` - Function name where the mismatch occurred
/// * `lhs` - Length of the left-hand side array
/// * `rhs` - Length of the right-hand side array
pub fn log_length_mismatch(fname: &str, lhs: usize, rhs: usize) -> String {
    format!("{} => Length mismatch: LHS {} RHS {}", fname, lhs, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = KernelError::OutOfBounds("sum: values has length 3 (should be at least 5)".into());
        assert_eq!(
            e.to_string(),
            "Out of bounds: sum: values has length 3 (should be at least 5)"
        );
        assert_eq!(
            log_length_mismatch("dot", 4, 2),
            "dot => Length mismatch: LHS 4 RHS 2"
        );
    }
}

// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Utility Functions** - *Argument Validation*
//!
//! Checks run by the validated entry points before a kernel sees its slices.
//! The kernels assume in-bounds arguments and perform no checks of their own.

use crate::errors::{KernelError, log_length_mismatch};

/// Validates an `(offset, length)` window over a buffer of `buffer_len` values
/// and returns the corresponding index range.
///
/// # Parameters
/// - `label`: Descriptive context label for error reporting (e.g., "sum: values")
/// - `buffer_len`: Length of the whole buffer
/// - `offset`: Index of the first value in the window
/// - `length`: Number of values in the window
///
/// # Returns
/// `offset..offset + length`, otherwise `KernelError::OutOfBounds` when the window
/// runs past the buffer (including when `offset + length` overflows).
#[inline(always)]
pub fn confirm_offset_and_length(
    label: &str,
    buffer_len: usize,
    offset: usize,
    length: usize,
) -> Result<std::ops::Range<usize>, KernelError> {
    match offset.checked_add(length) {
        Some(end) if end <= buffer_len => Ok(offset..end),
        _ => Err(KernelError::OutOfBounds(format!(
            "{}: buffer has length {} (should be at least {})",
            label,
            buffer_len,
            offset.saturating_add(length)
        ))),
    }
}

/// Validates that two lengths are equal for paired-buffer operations.
///
/// # Returns
/// `Ok(())` if lengths are equal, otherwise `KernelError::LengthMismatch` with diagnostic details.
#[inline(always)]
pub fn confirm_equal_len(label: &str, a: usize, b: usize) -> Result<(), KernelError> {
    if a != b {
        return Err(KernelError::LengthMismatch(log_length_mismatch(label, a, b)));
    }
    Ok(())
}

// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! Element-wise complex product over interleaved `(re, im)` buffers.

use num_complex::Complex64;

/// `out[k] = lhs[k] · rhs[k]` for each complex pair `k < out.len() / 2`.
///
/// A trailing odd value in `out` is left untouched.
pub fn complex_times(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
    for ((o, a), b) in out
        .chunks_exact_mut(2)
        .zip(lhs.chunks_exact(2))
        .zip(rhs.chunks_exact(2))
    {
        let z = Complex64::new(a[0], a[1]) * Complex64::new(b[0], b[1]);
        o[0] = z.re;
        o[1] = z.im;
    }
}

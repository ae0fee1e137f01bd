#![allow(unused)]

use cascade_kernels::{Backend, Reducer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Asserts `a` is within `tol` of `e`, relative to `max(1, |e|)`. NaN and infinite
/// expectations must match exactly.
pub fn assert_close(a: f64, e: f64, tol: f64) {
    if e.is_nan() {
        assert!(a.is_nan(), "expected NaN, got {a}");
        return;
    }
    if e.is_infinite() {
        assert_eq!(a, e, "expected {e}, got {a}");
        return;
    }
    let scale = 1.0_f64.max(e.abs());
    assert!(
        (a - e).abs() <= tol * scale,
        "mismatch: got {a}, expect {e} (tol={tol})"
    );
}

pub fn assert_slice_close(a: &[f64], e: &[f64], tol: f64) {
    assert_eq!(a.len(), e.len(), "len mismatch");
    for (i, (&ai, &ei)) in a.iter().zip(e.iter()).enumerate() {
        if ei.is_nan() {
            assert!(ai.is_nan(), "idx {i}: expected NaN, got {ai}");
            continue;
        }
        if ei.is_infinite() {
            assert_eq!(ai, ei, "idx {i}: expected {ei}, got {ai}");
            continue;
        }
        let scale = 1.0_f64.max(ei.abs());
        assert!(
            (ai - ei).abs() <= tol * scale,
            "idx {i}: got {ai}, expect {ei} (tol={tol})"
        );
    }
}

/// One reducer per backend, scalar first.
pub fn reducers() -> [Reducer; 2] {
    [Reducer::new(Backend::Scalar), Reducer::new(Backend::Vector)]
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `n` values drawn uniformly from `[lo, hi)`.
pub fn uniform(rng: &mut StdRng, n: usize, lo: f64, hi: f64) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(lo..hi)).collect()
}

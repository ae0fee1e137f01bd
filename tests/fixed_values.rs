//! Reference values for a 10-element sample, computed independently in R.
#![allow(clippy::excessive_precision)]

mod util;

use util::{assert_close, reducers};

const VALUES: [f64; 10] = [
    1.5409738, 2.6926526, 0.8159389, 2.5009070, 3.2777667, 1.5157005, 0.9984120, 2.3274278,
    1.7286019, 0.9756442,
];

const WEIGHTS: [f64; 10] = [
    0.04437868, 0.93508668, 0.09091827, 0.17638019, 0.86624410, 0.24522868, 0.85157408,
    0.17318330, 0.07582913, 0.73878585,
];

#[test]
fn sum_whole() {
    for r in reducers() {
        assert_close(r.sum(&VALUES, 0, 10).unwrap(), 18.37403, 1e-5);
    }
}

#[test]
fn sum_slice() {
    for r in reducers() {
        assert_close(r.sum(&VALUES, 3, 4).unwrap(), 8.292786, 1e-6);
    }
}

#[test]
fn mean_whole_and_slice() {
    for r in reducers() {
        assert_close(r.mean(&VALUES, 0, 10).unwrap(), 1.837403, 1e-6);
        assert_close(r.mean(&VALUES, 3, 4).unwrap(), 2.073197, 1e-6);
    }
}

#[test]
fn standard_deviation_whole() {
    for r in reducers() {
        assert_close(r.standard_deviation(&VALUES, 0, 10).unwrap(), 0.8286257, 1e-7);
        assert_close(
            r.standard_deviation_biased(&VALUES, 0, 10).unwrap(),
            0.7861034,
            1e-7,
        );
    }
}

#[test]
fn standard_deviation_slice() {
    for r in reducers() {
        assert_close(r.standard_deviation(&VALUES, 3, 4).unwrap(), 1.016512, 1e-6);
        assert_close(
            r.standard_deviation_biased(&VALUES, 3, 4).unwrap(),
            0.8803251,
            1e-7,
        );
    }
}

#[test]
fn weighted_statistics_whole() {
    for r in reducers() {
        assert_close(r.weighted_sum(&VALUES, 0, &WEIGHTS, 0, 10).unwrap(), 8.417747, 1e-6);
        assert_close(r.weighted_mean(&VALUES, 0, &WEIGHTS, 0, 10).unwrap(), 2.005367, 1e-6);
        assert_close(
            r.weighted_standard_deviation(&VALUES, 0, &WEIGHTS, 0, 10).unwrap(),
            0.9458158,
            1e-7,
        );
    }
}

#[test]
fn weighted_statistics_slices() {
    for r in reducers() {
        assert_close(r.weighted_sum(&VALUES, 3, &WEIGHTS, 2, 4).unwrap(), 2.363317, 1e-6);
        assert_close(r.weighted_mean(&VALUES, 3, &WEIGHTS, 2, 4).unwrap(), 1.714075, 1e-6);
        assert_close(
            r.weighted_standard_deviation(&VALUES, 3, &WEIGHTS, 2, 4).unwrap(),
            0.6851563,
            1e-7,
        );
    }
}

#[test]
fn weighted_sum_equals_dot() {
    for r in reducers() {
        assert_eq!(
            r.weighted_sum(&VALUES, 0, &WEIGHTS, 0, 10).unwrap(),
            r.dot(&VALUES, 0, &WEIGHTS, 0, 10).unwrap()
        );
    }
}

//! Log-domain reductions through the validated entry points.

mod util;

use cascade_kernels::kernels::logdomain::log_add_exp;
use util::{assert_close, reducers, seeded, uniform};

fn reference(values: &[f64]) -> f64 {
    let m = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    values.iter().map(|x| (x - m).exp()).sum::<f64>().ln() + m
}

#[test]
fn log_sum_exp_matches_reference() {
    let mut rng = seeded(5);
    let data = uniform(&mut rng, 2049, -50.0, 50.0);
    for r in reducers() {
        for n in [1, 2, 3, 7, 64, 65, 1000, 2049] {
            let got = r.log_sum_exp(&data, 0, n).unwrap();
            assert_close(got, reference(&data[..n]), 1e-13);
        }
        let got = r.log_sum_exp(&data, 3, 2000).unwrap();
        assert_close(got, reference(&data[3..2003]), 1e-13);
    }
}

#[test]
fn log_sum_exp_of_constant() {
    for r in reducers() {
        let data = vec![-700.25; 513];
        assert_close(
            r.log_sum_exp(&data, 0, data.len()).unwrap(),
            -700.25 + 513f64.ln(),
            1e-14,
        );
    }
}

#[test]
fn log_sum_exp_infinities() {
    for r in reducers() {
        let ninf = [f64::NEG_INFINITY; 5];
        assert_eq!(r.log_sum_exp(&ninf, 0, 5), Ok(f64::NEG_INFINITY));
        assert!(r
            .log_sum_exp(&[0.0, f64::INFINITY, 1.0], 0, 3)
            .unwrap()
            .is_nan());
        assert!(r.log_sum_exp(&[0.0, f64::NAN], 0, 2).unwrap().is_nan());
        assert!(r.log_sum_exp(&[f64::NAN, f64::NAN], 0, 2).unwrap().is_nan());
        assert!(r
            .log_sum_exp(&[f64::NAN, f64::NEG_INFINITY], 0, 2)
            .unwrap()
            .is_nan());
    }
}

#[test]
fn log_add_exp_folds_to_log_sum_exp() {
    let mut rng = seeded(13);
    let data = uniform(&mut rng, 100, -10.0, 10.0);
    let folded = data.iter().fold(f64::NEG_INFINITY, |acc, &x| log_add_exp(acc, x));
    for r in reducers() {
        assert_close(r.log_sum_exp(&data, 0, 100).unwrap(), folded, 1e-12);
    }
}

#[test]
fn log_rescale_gives_unit_mass() {
    let mut rng = seeded(17);
    let data = uniform(&mut rng, 333, -40.0, 5.0);
    for r in reducers() {
        let mut out = vec![0.0; data.len()];
        r.log_rescale(&data, 0, &mut out, 0, data.len()).unwrap();
        let mass: f64 = out.iter().map(|x| x.exp()).sum();
        assert_close(mass, 1.0, 1e-12);
        assert_close(r.log_sum_exp(&out, 0, out.len()).unwrap(), 0.0, 1e-12);

        let mut buf = data.clone();
        let n = buf.len();
        r.log_rescale_in_place(&mut buf, 0, n).unwrap();
        for (a, b) in buf.iter().zip(&out) {
            assert_close(*a, *b, 1e-12);
        }
    }
}

#[test]
fn log_add_exp_windows() {
    let lhs = [0.0, -1.0, f64::NEG_INFINITY, 3.0];
    let rhs = [0.0, -1.0, 2.0, f64::NEG_INFINITY];
    for r in reducers() {
        let mut out = [0.0; 4];
        r.log_add_exp(&lhs, 0, &rhs, 0, &mut out, 0, 4).unwrap();
        assert_close(out[0], 2f64.ln(), 1e-15);
        assert_close(out[1], -1.0 + 2f64.ln(), 1e-15);
        assert_eq!(out[2], 2.0);
        assert_eq!(out[3], 3.0);
        assert!(r.log_add_exp(&lhs, 1, &rhs, 0, &mut out, 0, 4).is_err());

        let nan = [f64::NAN; 2];
        let mut out = [0.0; 2];
        r.log_add_exp(&nan, 0, &[1.0, f64::NEG_INFINITY], 0, &mut out, 0, 2).unwrap();
        assert!(out.iter().all(|x| x.is_nan()));
    }
}

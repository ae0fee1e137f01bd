// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Dispatch Module** - *Backend Selection and Validated Entry Points*
//!
//! Probes the host once for the instruction sets the vector path was built for, picks a
//! [`Backend`], and exposes every reduction through [`Reducer`], which takes
//! `(buffer, offset, length)` triples, checks them, and hands in-bounds slices to the
//! unchecked kernels under `crate::kernels`.
//!
//! ## Selection
//! - `Vector` when the build resolved more than one lane (`W64 > 1`) and the host is either
//!   non-x86 or reports `avx` or `sse2`.
//! - `Scalar` otherwise.
//! - `CASCADE_KERNELS_BACKEND=scalar|vector` overrides the probe at [`Reducer::detect`].
//!
//! ```rust
//! use cascade_kernels::dispatch::Reducer;
//!
//! let reducer = Reducer::detect();
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(reducer.sum(&data, 1, 3).unwrap(), 9.0);
//! assert!(reducer.sum(&data, 4, 2).is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use log::{debug, trace, warn};

use crate::config::BACKEND_ENV_VAR;
use crate::errors::KernelError;
use crate::kernels::lanes::{Vector, W64};
use crate::kernels::{cascade, complex, logdomain, prefix};
use crate::utils::{confirm_equal_len, confirm_offset_and_length};

/// Instruction-set queries used to decide whether the vector path may run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimdCapabilities {
    pub sse2: bool,
    pub avx: bool,
}

impl SimdCapabilities {
    /// Probes the running CPU. Non-x86 targets report `false` for both queries.
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            Self {
                sse2: std::arch::is_x86_feature_detected!("sse2"),
                avx: std::arch::is_x86_feature_detected!("avx"),
            }
        }
        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        {
            Self::default()
        }
    }
}

impl fmt::Display for SimdCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sse2={} avx={} lanes={}", self.sse2, self.avx, W64)
    }
}

static CAPABILITIES: OnceLock<SimdCapabilities> = OnceLock::new();

/// Process-wide probe result, computed on first use.
pub fn capabilities() -> &'static SimdCapabilities {
    CAPABILITIES.get_or_init(|| {
        let caps = SimdCapabilities::detect();
        debug!("cascade-kernels: probed {caps}");
        caps
    })
}

/// Kernel instantiation used by a [`Reducer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// One value per step.
    Scalar,
    /// `W64` values per step.
    Vector,
}

impl Backend {
    pub fn label(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Vector => "vector",
        }
    }

    /// Picks the widest backend the build and the host both support.
    pub fn select(caps: &SimdCapabilities) -> Self {
        let host_ok = if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            caps.avx || caps.sse2
        } else {
            true
        };
        if W64 > 1 && host_ok {
            Backend::Vector
        } else {
            Backend::Scalar
        }
    }

    /// Reads the override in `CASCADE_KERNELS_BACKEND`, falling back to `default` when it
    /// is unset or unrecognised.
    pub fn from_env_or(default: Backend) -> Self {
        match std::env::var(BACKEND_ENV_VAR) {
            Ok(raw) => match raw.parse::<Backend>() {
                Ok(backend) => backend,
                Err(e) => {
                    warn!("cascade-kernels: ignoring {BACKEND_ENV_VAR}: {e}");
                    default
                }
            },
            Err(_) => default,
        }
    }
}

impl FromStr for Backend {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(Backend::Scalar),
            "vector" | "simd" => Ok(Backend::Vector),
            other => Err(KernelError::InvalidArguments(format!(
                "unknown backend '{other}', expected 'scalar' or 'vector'"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calls `kernel::<f64>` or `kernel::<Vector>` depending on the backend.
macro_rules! dispatch {
    ($backend:expr, $($kernel:ident)::+ ( $($arg:expr),* $(,)? )) => {
        match $backend {
            Backend::Scalar => $($kernel)::+::<f64>($($arg),*),
            Backend::Vector => $($kernel)::+::<Vector>($($arg),*),
        }
    };
}

#[inline]
fn window<'a>(
    label: &str,
    buf: &'a [f64],
    offset: usize,
    length: usize,
) -> Result<&'a [f64], KernelError> {
    let range = confirm_offset_and_length(label, buf.len(), offset, length)?;
    Ok(&buf[range])
}

#[inline]
fn window_mut<'a>(
    label: &str,
    buf: &'a mut [f64],
    offset: usize,
    length: usize,
) -> Result<&'a mut [f64], KernelError> {
    let range = confirm_offset_and_length(label, buf.len(), offset, length)?;
    Ok(&mut buf[range])
}

/// Validated entry points over `(buffer, offset, length)` triples.
///
/// Every method checks that each window lies inside its buffer before running the
/// kernel for the configured [`Backend`]. Paired windows share one `length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reducer {
    backend: Backend,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::detect()
    }
}

impl Reducer {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Probes the host, applies the environment override and logs the result.
    pub fn detect() -> Self {
        let probed = Backend::select(capabilities());
        let backend = Backend::from_env_or(probed);
        debug!("cascade-kernels: backend {backend} (probed {probed}, {W64} lanes)");
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn sum(&self, values: &[f64], offset: usize, length: usize) -> Result<f64, KernelError> {
        let values = window("sum: values", values, offset, length)?;
        trace!("sum len={length}");
        Ok(dispatch!(self.backend, cascade::sum(values)))
    }

    /// Arithmetic mean; NaN for an empty window.
    pub fn mean(&self, values: &[f64], offset: usize, length: usize) -> Result<f64, KernelError> {
        let values = window("mean: values", values, offset, length)?;
        trace!("mean len={length}");
        Ok(dispatch!(self.backend, cascade::mean(values)))
    }

    pub fn weighted_sum(
        &self,
        values: &[f64],
        values_offset: usize,
        weights: &[f64],
        weights_offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let values = window("weighted_sum: values", values, values_offset, length)?;
        let weights = window("weighted_sum: weights", weights, weights_offset, length)?;
        trace!("weighted_sum len={length}");
        Ok(dispatch!(self.backend, cascade::weighted_sum(values, weights)))
    }

    /// `Σ w_i x_i / Σ w_i`. Zero total weight yields NaN or ±infinity.
    pub fn weighted_mean(
        &self,
        values: &[f64],
        values_offset: usize,
        weights: &[f64],
        weights_offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let values = window("weighted_mean: values", values, values_offset, length)?;
        let weights = window("weighted_mean: weights", weights, weights_offset, length)?;
        trace!("weighted_mean len={length}");
        Ok(dispatch!(self.backend, cascade::weighted_mean(values, weights)))
    }

    /// Sample standard deviation (`n - 1` denominator).
    pub fn standard_deviation(
        &self,
        values: &[f64],
        offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let values = window("standard_deviation: values", values, offset, length)?;
        trace!("standard_deviation len={length}");
        Ok(dispatch!(self.backend, cascade::standard_deviation(values)))
    }

    /// Population standard deviation (`n` denominator).
    pub fn standard_deviation_biased(
        &self,
        values: &[f64],
        offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let values = window("standard_deviation_biased: values", values, offset, length)?;
        trace!("standard_deviation_biased len={length}");
        Ok(dispatch!(self.backend, cascade::standard_deviation_biased(values)))
    }

    pub fn weighted_standard_deviation(
        &self,
        values: &[f64],
        values_offset: usize,
        weights: &[f64],
        weights_offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let values = window("weighted_standard_deviation: values", values, values_offset, length)?;
        let weights = window(
            "weighted_standard_deviation: weights",
            weights,
            weights_offset,
            length,
        )?;
        trace!("weighted_standard_deviation len={length}");
        Ok(dispatch!(
            self.backend,
            cascade::weighted_standard_deviation(values, weights)
        ))
    }

    pub fn dot(
        &self,
        lhs: &[f64],
        lhs_offset: usize,
        rhs: &[f64],
        rhs_offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let lhs = window("dot: lhs", lhs, lhs_offset, length)?;
        let rhs = window("dot: rhs", rhs, rhs_offset, length)?;
        trace!("dot len={length}");
        Ok(dispatch!(self.backend, cascade::dot(lhs, rhs)))
    }

    /// Dot product of two whole slices, which must have equal lengths.
    pub fn dot_slices(&self, lhs: &[f64], rhs: &[f64]) -> Result<f64, KernelError> {
        confirm_equal_len("dot_slices", lhs.len(), rhs.len())?;
        trace!("dot_slices len={}", lhs.len());
        Ok(dispatch!(self.backend, cascade::dot(lhs, rhs)))
    }

    /// Writes compensated running totals of the source window into the destination window.
    pub fn prefix_sum(
        &self,
        src: &[f64],
        src_offset: usize,
        dst: &mut [f64],
        dst_offset: usize,
        length: usize,
    ) -> Result<(), KernelError> {
        let src = window("prefix_sum: src", src, src_offset, length)?;
        let dst = window_mut("prefix_sum: dst", dst, dst_offset, length)?;
        trace!("prefix_sum len={length}");
        dispatch!(self.backend, prefix::prefix_sum(src, dst));
        Ok(())
    }

    pub fn prefix_sum_in_place(
        &self,
        buf: &mut [f64],
        offset: usize,
        length: usize,
    ) -> Result<(), KernelError> {
        let buf = window_mut("prefix_sum_in_place: buf", buf, offset, length)?;
        trace!("prefix_sum_in_place len={length}");
        dispatch!(self.backend, prefix::prefix_sum_in_place(buf));
        Ok(())
    }

    /// `log(Σ exp(x_i))`; `-inf` for an empty window.
    pub fn log_sum_exp(
        &self,
        values: &[f64],
        offset: usize,
        length: usize,
    ) -> Result<f64, KernelError> {
        let values = window("log_sum_exp: values", values, offset, length)?;
        trace!("log_sum_exp len={length}");
        Ok(dispatch!(self.backend, logdomain::logsumexp(values)))
    }

    /// `out[i] = log(exp(lhs[i]) + exp(rhs[i]))` over the three windows.
    #[allow(clippy::too_many_arguments)]
    pub fn log_add_exp(
        &self,
        lhs: &[f64],
        lhs_offset: usize,
        rhs: &[f64],
        rhs_offset: usize,
        out: &mut [f64],
        out_offset: usize,
        length: usize,
    ) -> Result<(), KernelError> {
        let lhs = window("log_add_exp: lhs", lhs, lhs_offset, length)?;
        let rhs = window("log_add_exp: rhs", rhs, rhs_offset, length)?;
        let out = window_mut("log_add_exp: out", out, out_offset, length)?;
        trace!("log_add_exp len={length}");
        logdomain::log_add_exp_into(lhs, rhs, out);
        Ok(())
    }

    /// `dst[i] = log(exp(dst[i]) + exp(src[i]))`.
    pub fn log_add_exp_assign(
        &self,
        dst: &mut [f64],
        dst_offset: usize,
        src: &[f64],
        src_offset: usize,
        length: usize,
    ) -> Result<(), KernelError> {
        let src = window("log_add_exp_assign: src", src, src_offset, length)?;
        let dst = window_mut("log_add_exp_assign: dst", dst, dst_offset, length)?;
        trace!("log_add_exp_assign len={length}");
        logdomain::log_add_exp_assign(dst, src);
        Ok(())
    }

    /// Writes the source window minus its log-sum-exp into the destination window.
    pub fn log_rescale(
        &self,
        src: &[f64],
        src_offset: usize,
        dst: &mut [f64],
        dst_offset: usize,
        length: usize,
    ) -> Result<(), KernelError> {
        let src = window("log_rescale: src", src, src_offset, length)?;
        let dst = window_mut("log_rescale: dst", dst, dst_offset, length)?;
        trace!("log_rescale len={length}");
        dispatch!(self.backend, logdomain::log_rescale(src, dst));
        Ok(())
    }

    pub fn log_rescale_in_place(
        &self,
        buf: &mut [f64],
        offset: usize,
        length: usize,
    ) -> Result<(), KernelError> {
        let buf = window_mut("log_rescale_in_place: buf", buf, offset, length)?;
        trace!("log_rescale_in_place len={length}");
        dispatch!(self.backend, logdomain::log_rescale_in_place(buf));
        Ok(())
    }

    /// Element-wise complex product over interleaved `(re, im)` windows of `2 * count`
    /// values each.
    #[allow(clippy::too_many_arguments)]
    pub fn complex_times(
        &self,
        lhs: &[f64],
        lhs_offset: usize,
        rhs: &[f64],
        rhs_offset: usize,
        out: &mut [f64],
        out_offset: usize,
        count: usize,
    ) -> Result<(), KernelError> {
        let length = count.checked_mul(2).ok_or_else(|| {
            KernelError::InvalidArguments(format!("complex_times: count {count} overflows"))
        })?;
        let lhs = window("complex_times: lhs", lhs, lhs_offset, length)?;
        let rhs = window("complex_times: rhs", rhs, rhs_offset, length)?;
        let out = window_mut("complex_times: out", out, out_offset, length)?;
        trace!("complex_times count={count}");
        complex::complex_times(lhs, rhs, out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reducers() -> [Reducer; 2] {
        [Reducer::new(Backend::Scalar), Reducer::new(Backend::Vector)]
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("scalar".parse::<Backend>(), Ok(Backend::Scalar));
        assert_eq!(" Vector ".parse::<Backend>(), Ok(Backend::Vector));
        assert!(matches!(
            "avx9000".parse::<Backend>(),
            Err(KernelError::InvalidArguments(_))
        ));
        assert_eq!(Backend::Vector.to_string(), "vector");
    }

    #[test]
    fn test_backend_select() {
        let none = SimdCapabilities::default();
        let both = SimdCapabilities { sse2: true, avx: true };
        if W64 == 1 {
            assert_eq!(Backend::select(&both), Backend::Scalar);
        } else {
            assert_eq!(Backend::select(&both), Backend::Vector);
        }
        if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            assert_eq!(Backend::select(&none), Backend::Scalar);
        }
    }

    #[test]
    fn test_capabilities_is_stable() {
        assert_eq!(capabilities(), capabilities());
        assert_eq!(*capabilities(), SimdCapabilities::detect());
    }

    #[test]
    fn test_window_checks() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        for r in reducers() {
            assert_eq!(r.sum(&data, 1, 3), Ok(9.0));
            assert_eq!(r.sum(&data, 5, 0), Ok(0.0));
            assert!(matches!(r.sum(&data, 3, 3), Err(KernelError::OutOfBounds(_))));
            assert!(matches!(
                r.sum(&data, usize::MAX, 2),
                Err(KernelError::OutOfBounds(_))
            ));
            assert!(matches!(
                r.dot(&data, 0, &data[..2], 0, 3),
                Err(KernelError::OutOfBounds(_))
            ));
            let mut out = [0.0; 2];
            assert!(r.prefix_sum(&data, 0, &mut out, 0, 3).is_err());
            assert_eq!(r.dot_slices(&data[..2], &data[1..3]), Ok(8.0));
            assert!(matches!(
                r.dot_slices(&data, &data[1..]),
                Err(KernelError::LengthMismatch(_))
            ));
        }
    }

    #[test]
    fn test_backends_agree() {
        let data: Vec<f64> = (0..1000).map(|i| ((i * 31) % 17) as f64 - 8.0).collect();
        let [s, v] = reducers();
        assert_eq!(s.sum(&data, 3, 990), v.sum(&data, 3, 990));
        assert_eq!(s.dot(&data, 0, &data, 1, 999), v.dot(&data, 0, &data, 1, 999));
    }

    #[test]
    fn test_prefix_sum_windows() {
        let src = [9.0, 1.0, 2.0, 3.0, 9.0];
        for r in reducers() {
            let mut dst = [0.0; 6];
            r.prefix_sum(&src, 1, &mut dst, 2, 3).unwrap();
            assert_eq!(dst, [0.0, 0.0, 1.0, 3.0, 6.0, 0.0]);

            let mut buf = src;
            r.prefix_sum_in_place(&mut buf, 1, 3).unwrap();
            assert_eq!(buf, [9.0, 1.0, 3.0, 6.0, 9.0]);
        }
    }

    #[test]
    fn test_log_domain_windows() {
        for r in reducers() {
            let lhs = [0.0, 0.0, f64::NEG_INFINITY];
            let rhs = [7.0, 0.0, 2.0];
            let mut out = [0.0; 2];
            r.log_add_exp(&lhs, 1, &rhs, 1, &mut out, 0, 2).unwrap();
            assert!((out[0] - 2f64.ln()).abs() < 1e-15);
            assert_eq!(out[1], 2.0);

            let mut dst = lhs;
            r.log_add_exp_assign(&mut dst, 1, &rhs, 1, 2).unwrap();
            assert_eq!(dst[0], 0.0);
            assert_eq!(&dst[1..], &out);

            assert_eq!(r.log_sum_exp(&lhs, 0, 0), Ok(f64::NEG_INFINITY));

            let mut buf = [5.0, 0.0, 0.0, 5.0];
            r.log_rescale_in_place(&mut buf, 1, 2).unwrap();
            assert_eq!(buf[0], 5.0);
            assert!((buf[1] + 2f64.ln()).abs() < 1e-15);

            let mut dst = [0.0; 2];
            r.log_rescale(&[0.0, 0.0], 0, &mut dst, 0, 2).unwrap();
            assert_eq!(dst, [buf[1], buf[2]]);
        }
    }

    #[test]
    fn test_complex_times_window() {
        let r = Reducer::new(Backend::Scalar);
        let lhs = [0.0, 1.0, 2.0];
        let rhs = [3.0, 4.0];
        let mut out = [0.0; 2];
        r.complex_times(&lhs, 1, &rhs, 0, &mut out, 0, 1).unwrap();
        assert_eq!(out, [-5.0, 10.0]);
        assert!(r.complex_times(&lhs, 2, &rhs, 0, &mut out, 0, 1).is_err());
    }
}

use crate::error::StatsError;
use crate::testing::inference::kolmogorov::{ks_critical_value, ks_pvalue};
use crate::testing::inference::options::KsOptions;
use crate::testing::utils::remove_nan;
use crate::testing::{Tail, TestResult};
use nalgebra::Complex;
use ndarray::{ArrayView2, ArrayViewD};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use single_utilities::traits::{FloatOps, FloatOpsTS};
use std::cmp::Ordering;
use tracing::debug;

/// Empirical CDF of a sample, stored at its jump points.
///
/// For each distinct observation `x[i]`, `before[i]` is the value of the step
/// function just left of the jump and `after[i]` the value at the jump
/// (right-continuous), so `after[i] - before[i]` is the fraction of
/// observations equal to `x[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ecdf {
    pub x: Vec<f64>,
    pub before: Vec<f64>,
    pub after: Vec<f64>,
    pub n: usize,
}

impl Ecdf {
    /// Build from a sample without NaN values.
    pub fn new(sample: &[f64]) -> Result<Self, StatsError> {
        if sample.is_empty() {
            return Err(StatsError::EmptySample);
        }

        let mut sorted = sample.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let n = sorted.len();
        let nf = n as f64;
        let mut x = Vec::new();
        let mut before = Vec::new();
        let mut after = Vec::new();

        let mut i = 0;
        while i < n {
            let val = sorted[i];
            let mut j = i + 1;

            // Find tied values
            while j < n && sorted[j] == val {
                j += 1;
            }

            x.push(val);
            before.push(i as f64 / nf);
            after.push(j as f64 / nf);
            i = j;
        }

        Ok(Ecdf { x, before, after, n })
    }

    /// `S(v)`: fraction of observations `<= v`.
    pub fn eval(&self, v: f64) -> f64 {
        let idx = self.x.partition_point(|&x| x <= v);
        if idx == 0 { 0.0 } else { self.after[idx - 1] }
    }
}

/// Kolmogorov–Smirnov distance between an empirical CDF and the null CDF
/// evaluated at the same jump points.
///
/// NaN if the null CDF is NaN at any jump point.
pub fn ks_statistic(ecdf: &Ecdf, null: &[f64], tail: Tail) -> f64 {
    if null.iter().any(|f| f.is_nan()) {
        return f64::NAN;
    }
    ecdf.before
        .iter()
        .zip(&ecdf.after)
        .zip(null)
        .flat_map(|((&lo, &hi), &f)| {
            let deltas = [lo - f, hi - f];
            deltas.map(|d| match tail {
                Tail::Unequal => d.abs(),
                Tail::Larger => d,
                Tail::Smaller => -d,
            })
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// One-sample Kolmogorov–Smirnov test of `x` against `options.cdf`.
///
/// NaN observations are ignored. The null hypothesis is rejected when the
/// p-value is below `options.alpha`. The critical value is only computed
/// when `options.critical_value` is set.
///
/// # Errors
///
/// * [`StatsError::EmptySample`] if no observations remain after removing NaN
/// * [`StatsError::InvalidOption`] for an out-of-range `alpha`
/// * [`StatsError::CdfTableRange`] if a tabulated CDF does not cover the sample
pub fn kstest<T>(x: &[T], options: &KsOptions) -> anyhow::Result<TestResult<f64>>
where
    T: FloatOps,
{
    options.validate()?;

    let sample = remove_nan(x);
    let n = sample.len();
    if n == 0 {
        return Err(StatsError::EmptySample.into());
    }

    let ecdf = Ecdf::new(&sample)?;
    let null = options.cdf.evaluate(&ecdf.x)?;
    let statistic = ks_statistic(&ecdf, &null, options.tail);
    let (p_value, method) = ks_pvalue(statistic, n, options.tail);

    debug!(
        n,
        statistic,
        p_value,
        tail = options.tail.as_str(),
        method = method.as_str(),
        "kstest"
    );

    let mut result = TestResult::new(statistic, p_value)
        .with_decision(options.alpha)
        .with_metadata("n", n as f64)
        .with_metadata("alpha", options.alpha)
        .with_label("tail", options.tail.as_str())
        .with_label("method", method.as_str());

    if options.critical_value {
        result = result.with_critical_value(ks_critical_value(n, options.alpha, options.tail));
    }

    Ok(result)
}

/// [`kstest`] on an n-dimensional array that must be a vector: 1-D, a
/// single value, or 2-D with one singleton dimension.
pub fn kstest_array<T>(x: ArrayViewD<'_, T>, options: &KsOptions) -> anyhow::Result<TestResult<f64>>
where
    T: FloatOps,
{
    let shape = x.shape();
    let is_vector = match shape.len() {
        0 | 1 => true,
        2 => shape[0] == 1 || shape[1] == 1,
        _ => false,
    };
    if !is_vector {
        return Err(StatsError::NotVector(shape.to_vec()).into());
    }
    let values: Vec<T> = x.iter().copied().collect();
    kstest(&values, options)
}

/// Convert complex observations to real ones. Any non-zero imaginary part is
/// rejected.
pub fn real_sample(values: &[Complex<f64>]) -> Result<Vec<f64>, StatsError> {
    values
        .iter()
        .enumerate()
        .map(|(index, c)| {
            if c.im != 0.0 {
                return Err(StatsError::NotReal {
                    index,
                    imaginary: c.im,
                });
            }
            Ok(c.re)
        })
        .collect()
}

/// Run [`kstest`] on every column of a matrix, in parallel.
pub fn kstest_columns<T>(
    matrix: ArrayView2<'_, T>,
    options: &KsOptions,
) -> anyhow::Result<Vec<TestResult<f64>>>
where
    T: FloatOpsTS,
{
    let n_cols = matrix.ncols();
    if n_cols == 0 {
        return Err(anyhow::anyhow!("Matrix has no columns to test"));
    }

    (0..n_cols)
        .into_par_iter()
        .map(|col| {
            let values: Vec<T> = matrix.column(col).iter().copied().collect();
            kstest(&values, options)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::inference::null_cdf::NullCdf;
    use approx::assert_relative_eq;

    #[test]
    fn test_ecdf_with_ties() {
        let e = Ecdf::new(&[3.0, 1.0, 2.0, 2.0]).unwrap();
        assert_eq!(e.x, vec![1.0, 2.0, 3.0]);
        assert_eq!(e.before, vec![0.0, 0.25, 0.75]);
        assert_eq!(e.after, vec![0.25, 0.75, 1.0]);
        assert_eq!(e.eval(0.5), 0.0);
        assert_eq!(e.eval(2.0), 0.75);
        assert_eq!(e.eval(2.5), 0.75);
        assert_eq!(e.eval(10.0), 1.0);
    }

    #[test]
    fn test_ecdf_empty() {
        assert_eq!(Ecdf::new(&[]).unwrap_err(), StatsError::EmptySample);
    }

    #[test]
    fn test_statistic_uses_both_sides_of_jumps() {
        // Uniform(0, 1) null; sample 0.1, 0.9.
        let e = Ecdf::new(&[0.1, 0.9]).unwrap();
        let null = [0.1, 0.9];
        // before - F: -0.1, -0.4 ; after - F: 0.4, 0.1
        assert_relative_eq!(ks_statistic(&e, &null, Tail::Unequal), 0.4, epsilon = 1e-12);
        assert_relative_eq!(ks_statistic(&e, &null, Tail::Larger), 0.4, epsilon = 1e-12);
        assert_relative_eq!(ks_statistic(&e, &null, Tail::Smaller), 0.4, epsilon = 1e-12);

        let null = [0.3, 0.6];
        // before - F: -0.3, -0.1 ; after - F: 0.2, 0.4
        assert_relative_eq!(ks_statistic(&e, &null, Tail::Larger), 0.4, epsilon = 1e-12);
        assert_relative_eq!(ks_statistic(&e, &null, Tail::Smaller), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_statistic_nan_when_null_is_nan() {
        let e = Ecdf::new(&[0.1, 0.2, 0.9]).unwrap();
        for tail in [Tail::Unequal, Tail::Larger, Tail::Smaller] {
            assert!(ks_statistic(&e, &[f64::NAN; 3], tail).is_nan());
            assert!(ks_statistic(&e, &[0.1, 0.2, f64::NAN], tail).is_nan());
        }
    }

    #[test]
    fn test_nan_null_cdf_does_not_reject() {
        let x = [0.1_f64, 0.2, 0.9];
        for tail in [Tail::Unequal, Tail::Larger, Tail::Smaller] {
            let options = KsOptions::default()
                .with_tail(tail)
                .with_cdf(NullCdf::callable(|_| f64::NAN));
            let r = kstest(&x, &options).unwrap();
            assert!(r.statistic.is_nan());
            assert!(r.p_value.is_nan());
            assert!(!r.reject);
        }

        let partly = NullCdf::callable(|v| if v > 0.5 { f64::NAN } else { v });
        let r = kstest(&x, &KsOptions::default().with_cdf(partly)).unwrap();
        assert!(r.statistic.is_nan());
        assert!(!r.reject);
    }

    #[test]
    fn test_options_checked_before_sample() {
        let options = KsOptions::default().with_alpha(2.0);
        let err = kstest(&[f64::NAN, f64::NAN], &options).unwrap_err();
        let err = err.downcast_ref::<StatsError>().unwrap();
        assert!(matches!(err, StatsError::InvalidOption { .. }));
        assert!(err.is_usage());
    }

    #[test]
    fn test_single_observation() {
        let r = kstest(&[0.0_f64], &KsOptions::default()).unwrap();
        assert_relative_eq!(r.statistic, 0.5, epsilon = 1e-12);
        assert_relative_eq!(r.p_value, 1.0, epsilon = 1e-12);
        assert!(!r.reject);
    }

    #[test]
    fn test_shifted_sample_rejects() {
        let x = [2.0_f64, 3.0, 4.0, 5.0, 6.0];
        let r = kstest(&x, &KsOptions::default()).unwrap();
        assert!(r.reject);
        assert!(r.statistic > 0.97);
        assert!(r.p_value < 1e-6);
        assert_eq!(r.metadata["n"], 5.0);
        assert_eq!(r.labels["tail"], "unequal");
    }

    #[test]
    fn test_nan_removal() {
        let with_nan = [f64::NAN, -0.5, 0.2, f64::NAN, 1.1];
        let without = [-0.5, 0.2, 1.1];
        let a = kstest(&with_nan, &KsOptions::default()).unwrap();
        let b = kstest(&without, &KsOptions::default()).unwrap();
        assert_eq!(a.statistic, b.statistic);
        assert_eq!(a.p_value, b.p_value);
        assert_eq!(a.metadata["n"], 3.0);
    }

    #[test]
    fn test_all_nan_is_error() {
        let err = kstest(&[f64::NAN, f64::NAN], &KsOptions::default()).unwrap_err();
        assert_eq!(err.downcast_ref::<StatsError>(), Some(&StatsError::EmptySample));
    }

    #[test]
    fn test_invalid_alpha_is_error() {
        let options = KsOptions::default().with_alpha(1.5);
        let err = kstest(&[0.1_f64, 0.2], &options).unwrap_err();
        assert!(err.downcast_ref::<StatsError>().unwrap().is_usage());
    }

    #[test]
    fn test_table_cdf_matches_callable() {
        let x = [0.15_f64, 0.3, 0.45, 0.8];
        let table = NullCdf::table(&[[0.0, 0.0], [1.0, 1.0]]).unwrap();
        let a = kstest(&x, &KsOptions::default().with_cdf(table)).unwrap();
        let uniform = NullCdf::named("uniform", &[]).unwrap();
        let b = kstest(&x, &KsOptions::default().with_cdf(uniform)).unwrap();
        assert_relative_eq!(a.statistic, b.statistic, epsilon = 1e-12);
        assert_relative_eq!(a.p_value, b.p_value, epsilon = 1e-12);
    }

    #[test]
    fn test_table_not_covering_sample() {
        let table = NullCdf::table(&[[0.0, 0.0], [1.0, 1.0]]).unwrap();
        let err = kstest(&[0.5_f64, 1.5], &KsOptions::default().with_cdf(table)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::CdfTableRange { .. })
        ));
    }

    #[test]
    fn test_critical_value_only_when_requested() {
        let x = [-1.2_f64, -0.3, 0.1, 0.4, 1.7];
        let r = kstest(&x, &KsOptions::default()).unwrap();
        assert!(r.critical_value.is_none());

        let r = kstest(&x, &KsOptions::default().with_critical_value(true)).unwrap();
        assert_relative_eq!(r.critical_value.unwrap(), 0.56328, epsilon = 1e-10);

        let r = kstest(
            &x,
            &KsOptions::default().with_alpha(0.3).with_critical_value(true),
        )
        .unwrap();
        assert!(r.critical_value.unwrap().is_nan());
    }

    #[test]
    fn test_kstest_array_shapes() {
        let v = ndarray::array![[0.1_f64, 0.2, 0.3]].into_dyn();
        assert!(kstest_array(v.view(), &KsOptions::default()).is_ok());

        let m = ndarray::array![[0.1_f64, 0.2], [0.3, 0.4]].into_dyn();
        let err = kstest_array(m.view(), &KsOptions::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StatsError>(),
            Some(&StatsError::NotVector(vec![2, 2]))
        );
    }

    #[test]
    fn test_complex_sample_rejected() {
        let values = [
            Complex::new(2.0, 0.0),
            Complex::new(3.0, 0.0),
            Complex::new(5.0, 0.0),
            Complex::new(7.0, 0.0),
            Complex::new(3.0, 3.0),
        ];
        let err = real_sample(&values).unwrap_err();
        assert_eq!(
            err,
            StatsError::NotReal {
                index: 4,
                imaginary: 3.0
            }
        );
        assert_eq!(real_sample(&values[..4]).unwrap(), vec![2.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_columns_in_parallel() {
        let matrix = ndarray::array![
            [-0.4_f64, 5.0],
            [0.1, 6.0],
            [0.9, 7.0],
            [-1.3, 8.0]
        ];
        let results = kstest_columns(matrix.view(), &KsOptions::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].reject);
        assert!(results[1].reject);

        let empty = ndarray::Array2::<f64>::zeros((3, 0));
        assert!(kstest_columns(empty.view(), &KsOptions::default()).is_err());
    }
}

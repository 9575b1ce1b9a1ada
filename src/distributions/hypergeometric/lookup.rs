//! Row-wise inversion of discrete CDFs.
//!
//! Each row of a density matrix is evaluated against a support vector shared by
//! all rows (`0..=max(n)`). Rows with a smaller `n` are padded with entries
//! that carry no probability mass, so every row is accumulated and normalised
//! only up to its own end-of-support index before it is searched.

use ndarray::{Array2, ArrayView1};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// How a target probability is matched against a cumulative row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupRule {
    /// First index with `CDF(k) >= target`. Quantile convention.
    Inclusive,
    /// First index with `CDF(k) > target`. Used for uniform draws so that a
    /// draw of exactly zero still lands inside the support.
    Strict,
}

/// Cumulative sum of `pmf[0..=end]`, normalised by its last entry.
///
/// Returns an empty vector if the row carries no mass.
pub fn normalized_cdf(pmf: ArrayView1<f64>, end: usize) -> Vec<f64> {
    let end = end.min(pmf.len().saturating_sub(1));
    let mut cdf: Vec<f64> = pmf
        .iter()
        .take(end + 1)
        .scan(0.0, |acc, &p| {
            *acc += p;
            Some(*acc)
        })
        .collect();

    let total = match cdf.last() {
        Some(&t) if t > 0.0 && t.is_finite() => t,
        _ => return Vec::new(),
    };
    cdf.iter_mut().for_each(|c| *c /= total);
    cdf
}

/// Index of the first cumulative entry matching `target` under `rule`.
pub fn locate(cdf: &[f64], target: f64, rule: LookupRule) -> usize {
    let idx = match rule {
        LookupRule::Inclusive => cdf.partition_point(|&c| c < target),
        LookupRule::Strict => cdf.partition_point(|&c| c <= target),
    };
    idx.min(cdf.len().saturating_sub(1))
}

/// Invert every row of `density` at its own target.
///
/// `ends[r]` is the last meaningful column of row `r`, `targets[r]` the
/// probability to invert. The returned value is `support[index]`, or NaN when a
/// row has no usable mass.
pub fn invert_rows(
    support: &[f64],
    density: &Array2<f64>,
    ends: &[usize],
    targets: &[f64],
    rule: LookupRule,
) -> Vec<f64> {
    debug_assert_eq!(density.nrows(), ends.len());
    debug_assert_eq!(density.nrows(), targets.len());

    (0..density.nrows())
        .into_par_iter()
        .map(|row| {
            let cdf = normalized_cdf(density.row(row), ends[row]);
            if cdf.is_empty() || targets[row].is_nan() {
                return f64::NAN;
            }
            support[locate(&cdf, targets[row], rule)]
        })
        .collect()
}

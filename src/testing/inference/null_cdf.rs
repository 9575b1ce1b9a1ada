//! Hypothesised CDF of a one-sample goodness-of-fit test.
//!
//! Whatever the caller passes (a closure, a `statrs` distribution, a
//! distribution name or a two-column table) is resolved once into one of two
//! variants. The test pipeline only ever sees [`NullCdf`].

use crate::error::StatsError;
use crate::testing::utils::interp_linear;
use statrs::distribution::{ContinuousCDF, Exp, Laplace, LogNormal, Normal, Uniform};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

pub type CdfFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

#[derive(Clone)]
pub enum NullCdf {
    /// Any function `F: ℝ → [0, 1]`.
    Callable(CdfFn),
    /// Tabulated `(x, F(x))` pairs, ascending in `x`, duplicates consolidated.
    Table { x: Vec<f64>, y: Vec<f64> },
}

impl fmt::Debug for NullCdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullCdf::Callable(_) => f.write_str("NullCdf::Callable(..)"),
            NullCdf::Table { x, .. } => write!(f, "NullCdf::Table({} points)", x.len()),
        }
    }
}

impl Default for NullCdf {
    fn default() -> Self {
        NullCdf::standard_normal()
    }
}

fn invalid_cdf(reason: String) -> StatsError {
    StatsError::InvalidOption {
        option: "cdf".to_string(),
        reason,
    }
}

fn param(params: &[f64], idx: usize, default: f64) -> f64 {
    params.get(idx).copied().unwrap_or(default)
}

impl NullCdf {
    pub fn standard_normal() -> Self {
        NullCdf::from_distribution(Normal::standard())
    }

    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        NullCdf::Callable(Arc::new(f))
    }

    /// Wrap any continuous `statrs` distribution.
    pub fn from_distribution<D>(dist: D) -> Self
    where
        D: ContinuousCDF<f64, f64> + Send + Sync + 'static,
    {
        NullCdf::callable(move |x| dist.cdf(x))
    }

    /// Resolve a distribution by name. Missing parameters take the standard
    /// defaults of each family.
    ///
    /// | name                      | parameters          | defaults  |
    /// |---------------------------|---------------------|-----------|
    /// | `normal`, `norm`          | mean, std-dev       | 0, 1      |
    /// | `exponential`, `exp`      | mean                | 1         |
    /// | `uniform`, `unif`         | lower, upper        | 0, 1      |
    /// | `laplace`                 | location, scale     | 0, 1      |
    /// | `logistic`                | location, scale     | 0, 1      |
    /// | `lognormal`, `logn`       | log-mean, log-sd    | 0, 1      |
    pub fn named(name: &str, params: &[f64]) -> anyhow::Result<Self> {
        let p = |i, d| param(params, i, d);
        let cdf = match name.to_ascii_lowercase().as_str() {
            "normal" | "norm" => Normal::new(p(0, 0.0), p(1, 1.0))
                .map(NullCdf::from_distribution)
                .map_err(|e| invalid_cdf(e.to_string()))?,
            "exponential" | "exp" => {
                let mean = p(0, 1.0);
                if !(mean > 0.0) {
                    return Err(invalid_cdf(format!("exponential mean must be positive, got {}", mean)).into());
                }
                Exp::new(1.0 / mean)
                    .map(NullCdf::from_distribution)
                    .map_err(|e| invalid_cdf(e.to_string()))?
            }
            "uniform" | "unif" => Uniform::new(p(0, 0.0), p(1, 1.0))
                .map(NullCdf::from_distribution)
                .map_err(|e| invalid_cdf(e.to_string()))?,
            "laplace" => Laplace::new(p(0, 0.0), p(1, 1.0))
                .map(NullCdf::from_distribution)
                .map_err(|e| invalid_cdf(e.to_string()))?,
            "lognormal" | "logn" => LogNormal::new(p(0, 0.0), p(1, 1.0))
                .map(NullCdf::from_distribution)
                .map_err(|e| invalid_cdf(e.to_string()))?,
            "logistic" => {
                let (mu, s) = (p(0, 0.0), p(1, 1.0));
                if !(s > 0.0 && s.is_finite() && mu.is_finite()) {
                    return Err(invalid_cdf(format!("logistic scale must be positive, got {}", s)).into());
                }
                NullCdf::callable(move |x| 1.0 / (1.0 + (-(x - mu) / s).exp()))
            }
            other => {
                return Err(invalid_cdf(format!("unknown distribution '{}'", other)).into());
            }
        };
        debug!(name, "resolved named null distribution");
        Ok(cdf)
    }

    /// Build a tabulated CDF from `(x, F(x))` rows.
    ///
    /// Rows are sorted by `x`. `F` must be finite, within `[0, 1]` and
    /// non-decreasing. Repeated `x` values are merged when they carry the
    /// same `F`, otherwise the table is rejected.
    pub fn table(rows: &[[f64; 2]]) -> anyhow::Result<Self> {
        if rows.is_empty() {
            return Err(StatsError::InvalidCdfTable("table has no rows".into()).into());
        }
        if let Some(row) = rows
            .iter()
            .find(|r| !r[0].is_finite() || !r[1].is_finite() || !(0.0..=1.0).contains(&r[1]))
        {
            return Err(StatsError::InvalidCdfTable(format!(
                "row ({}, {}) is not a finite point with F in [0, 1]",
                row[0], row[1]
            ))
            .into());
        }

        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(Ordering::Equal));

        if let Some(w) = sorted.windows(2).find(|w| w[1][1] < w[0][1]) {
            return Err(StatsError::InvalidCdfTable(format!(
                "F decreases from {} at x = {} to {} at x = {}",
                w[0][1], w[0][0], w[1][1], w[1][0]
            ))
            .into());
        }

        let mut x: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut y: Vec<f64> = Vec::with_capacity(sorted.len());
        for [xi, yi] in sorted {
            match (x.last(), y.last()) {
                (Some(&px), Some(&py)) if px == xi => {
                    if py != yi {
                        return Err(StatsError::InvalidCdfTable(format!(
                            "x = {} appears with different F values {} and {}",
                            xi, py, yi
                        ))
                        .into());
                    }
                }
                _ => {
                    x.push(xi);
                    y.push(yi);
                }
            }
        }

        Ok(NullCdf::Table { x, y })
    }

    /// Evaluate at strictly ascending points.
    ///
    /// A table whose `x` column equals `points` is read directly; otherwise it
    /// is linearly interpolated, which fails if the table does not bracket
    /// every point.
    pub fn evaluate(&self, points: &[f64]) -> anyhow::Result<Vec<f64>> {
        match self {
            NullCdf::Callable(f) => Ok(points.iter().map(|&p| f(p)).collect()),
            NullCdf::Table { x, y } => {
                if x.len() != y.len() {
                    return Err(StatsError::InvalidCdfTable(format!(
                        "{} x values but {} F values",
                        x.len(),
                        y.len()
                    ))
                    .into());
                }
                if x.as_slice() == points {
                    trace!("CDF table matches sample points, reading values directly");
                    return Ok(y.clone());
                }

                let (Some(&lo), Some(&hi)) = (points.first(), points.last()) else {
                    return Ok(Vec::new());
                };
                let (Some(&table_min), Some(&table_max)) = (x.first(), x.last()) else {
                    return Err(StatsError::InvalidCdfTable("table has no rows".into()).into());
                };
                if lo < table_min || hi > table_max {
                    return Err(StatsError::CdfTableRange {
                        table_min,
                        table_max,
                        sample_min: lo,
                        sample_max: hi,
                    }
                    .into());
                }

                debug!(points = points.len(), table = x.len(), "interpolating CDF table");
                Ok(points.iter().map(|&p| interp_linear(x, y, p)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_normal_default() {
        let cdf = NullCdf::default();
        let v = cdf.evaluate(&[0.0, 1.959963984540054]).unwrap();
        assert_relative_eq!(v[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(v[1], 0.975, epsilon = 1e-9);
    }

    #[test]
    fn test_named_distributions() {
        let u = NullCdf::named("unif", &[0.0, 4.0]).unwrap();
        assert_relative_eq!(u.evaluate(&[1.0]).unwrap()[0], 0.25, epsilon = 1e-12);

        let e = NullCdf::named("exponential", &[2.0]).unwrap();
        assert_relative_eq!(e.evaluate(&[2.0]).unwrap()[0], 1.0 - (-1.0_f64).exp(), epsilon = 1e-12);

        let l = NullCdf::named("Logistic", &[]).unwrap();
        assert_relative_eq!(l.evaluate(&[0.0]).unwrap()[0], 0.5, epsilon = 1e-12);

        let la = NullCdf::named("laplace", &[1.0, 2.0]).unwrap();
        assert_relative_eq!(la.evaluate(&[1.0]).unwrap()[0], 0.5, epsilon = 1e-12);

        assert!(NullCdf::named("cauchy", &[]).is_err());
        assert!(NullCdf::named("normal", &[0.0, -1.0]).is_err());
        assert!(NullCdf::named("exp", &[0.0]).is_err());
    }

    #[test]
    fn test_table_consolidates_duplicates() {
        let t = NullCdf::table(&[[1.0, 0.2], [0.0, 0.0], [1.0, 0.2], [2.0, 1.0]]).unwrap();
        match &t {
            NullCdf::Table { x, y } => {
                assert_eq!(x, &vec![0.0, 1.0, 2.0]);
                assert_eq!(y, &vec![0.0, 0.2, 1.0]);
            }
            _ => panic!("expected a table"),
        }

        // Building again from the consolidated rows yields the same table.
        if let NullCdf::Table { x, y } = &t {
            let rows: Vec<[f64; 2]> = x.iter().zip(y).map(|(&a, &b)| [a, b]).collect();
            match NullCdf::table(&rows).unwrap() {
                NullCdf::Table { x: x2, y: y2 } => {
                    assert_eq!(&x2, x);
                    assert_eq!(&y2, y);
                }
                _ => panic!("expected a table"),
            }
        }
    }

    #[test]
    fn test_table_rejects_conflicting_duplicates() {
        let err = NullCdf::table(&[[0.0, 0.0], [1.0, 0.2], [1.0, 0.2], [1.0, 0.3], [2.0, 1.0]]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::InvalidCdfTable(_))
        ));
    }

    #[test]
    fn test_table_rejects_decreasing() {
        let err = NullCdf::table(&[[0.0, 0.5], [1.0, 0.4]]).unwrap_err();
        assert!(err.to_string().contains("decreases"));
        assert!(NullCdf::table(&[[0.0, 1.5]]).is_err());
        assert!(NullCdf::table(&[]).is_err());
    }

    #[test]
    fn test_table_direct_read_and_interpolation() {
        let t = NullCdf::table(&[[0.0, 0.0], [1.0, 0.4], [2.0, 1.0]]).unwrap();
        assert_eq!(t.evaluate(&[0.0, 1.0, 2.0]).unwrap(), vec![0.0, 0.4, 1.0]);
        let v = t.evaluate(&[0.5, 1.5]).unwrap();
        assert_relative_eq!(v[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(v[1], 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_table_range_is_infeasible() {
        let t = NullCdf::table(&[[0.0, 0.0], [1.0, 1.0]]).unwrap();
        let err = t.evaluate(&[-0.5, 0.5]).unwrap_err();
        let stats_err = err.downcast_ref::<StatsError>().unwrap();
        assert!(matches!(stats_err, StatsError::CdfTableRange { .. }));
        assert!(!stats_err.is_usage());
    }
}

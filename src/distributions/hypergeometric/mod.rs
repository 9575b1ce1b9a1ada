//! # Hypergeometric Distribution
//!
//! Number of successes in `n` draws without replacement from a population of
//! `t` items of which `m` are successes:
//!
//! ```text
//! P(X = x) = C(m, x) × C(t-m, n-x) / C(t, n),   max(0, n-(t-m)) ≤ x ≤ min(n, m)
//! ```
//!
//! All functions accept parameters as scalars or arrays of one common shape
//! (see [`common_size`](crate::distributions::broadcast::common_size)).
//! Invalid parameter combinations never raise an error: the affected output
//! elements are NaN, so arrays that mix valid and invalid rows can be
//! evaluated in one call. Only shape mismatches are reported as errors.

mod lookup;

use crate::distributions::broadcast::{all_scalar, common_size, expand};
use crate::error::StatsError;
use lookup::{LookupRule, invert_rows, locate, normalized_cdf};
use ndarray::{Array1, Array2, ArrayD, IxDyn, Zip};
use rand::Rng;
use statrs::function::factorial::ln_binomial;
use tracing::debug;

/// Which tail of the distribution [`hygecdf`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CdfTail {
    /// `P(X <= x)`
    #[default]
    Lower,
    /// `P(X > x)`
    Upper,
}

/// Validated hypergeometric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HygeParams {
    /// Population size.
    pub t: u64,
    /// Number of successes in the population.
    pub m: u64,
    /// Number of draws.
    pub n: u64,
}

fn is_count(v: f64) -> bool {
    v.is_finite() && v >= 0.0 && v == v.trunc() && v <= u64::MAX as f64
}

impl HygeParams {
    /// Validate raw parameters. Returns `None` for non-integer or negative
    /// values, `m > t`, `n > t` or `n == 0`.
    pub fn new(t: f64, m: f64, n: f64) -> Option<Self> {
        if !(is_count(t) && is_count(m) && is_count(n)) {
            return None;
        }
        let (t, m, n) = (t as u64, m as u64, n as u64);
        if n == 0 || m > t || n > t {
            return None;
        }
        Some(HygeParams { t, m, n })
    }

    /// Smallest value with non-zero probability.
    pub fn lower(&self) -> u64 {
        self.n.saturating_sub(self.t - self.m)
    }

    /// Largest value with non-zero probability.
    pub fn upper(&self) -> u64 {
        self.n.min(self.m)
    }

    /// Log-domain point mass at integer `x`. `-inf` outside the support.
    pub fn ln_pmf(&self, x: u64) -> f64 {
        if x < self.lower() || x > self.upper() {
            return f64::NEG_INFINITY;
        }
        ln_binomial(self.m, x) + ln_binomial(self.t - self.m, self.n - x)
            - ln_binomial(self.t, self.n)
    }

    /// Point mass at `x`. Non-integer or out-of-support values have zero mass.
    pub fn pmf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x != x.trunc() || x < self.lower() as f64 || x > self.upper() as f64 {
            return 0.0;
        }
        self.ln_pmf(x as u64).exp()
    }

    /// `P(X <= x)` or `P(X > x)`, summing the requested tail term by term.
    pub fn cdf(&self, x: f64, tail: CdfTail) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let x = x.floor();
        let (lower, upper) = (self.lower() as f64, self.upper() as f64);
        let below = x < lower;
        let above = x >= upper;
        match tail {
            CdfTail::Lower if below => 0.0,
            CdfTail::Lower if above => 1.0,
            CdfTail::Upper if below => 1.0,
            CdfTail::Upper if above => 0.0,
            CdfTail::Lower => {
                let sum: f64 = (self.lower()..=x as u64).map(|k| self.ln_pmf(k).exp()).sum();
                sum.min(1.0)
            }
            CdfTail::Upper => {
                let sum: f64 = (x as u64 + 1..=self.upper())
                    .map(|k| self.ln_pmf(k).exp())
                    .sum();
                sum.min(1.0)
            }
        }
    }

    /// Mean and variance.
    pub fn moments(&self) -> (f64, f64) {
        let (t, m, n) = (self.t as f64, self.m as f64, self.n as f64);
        let mean = n * m / t;
        let var = if self.t > 1 {
            n * (m / t) * ((t - m) / t) * ((t - n) / (t - 1.0))
        } else {
            0.0
        };
        (mean, var)
    }

    /// Normalised CDF over `0..=n`, used for scalar inversion.
    fn support_cdf(&self) -> Vec<f64> {
        let pmf: Array1<f64> = (0..=self.n).map(|k| self.ln_pmf(k).exp()).collect();
        normalized_cdf(pmf.view(), self.n as usize)
    }
}

fn resolve(
    args: &[&ArrayD<f64>],
) -> Result<(Vec<usize>, Vec<ArrayD<f64>>), StatsError> {
    let shape = common_size(args)?;
    let expanded = args.iter().map(|a| expand(a, &shape)).collect();
    Ok((shape, expanded))
}

/// Hypergeometric probability mass evaluated element-wise.
///
/// `x`, `t`, `m` and `n` are scalars or arrays of one common shape; the
/// output has that shape.
pub fn hygepdf(
    x: &ArrayD<f64>,
    t: &ArrayD<f64>,
    m: &ArrayD<f64>,
    n: &ArrayD<f64>,
) -> anyhow::Result<ArrayD<f64>> {
    let (_, a) = resolve(&[x, t, m, n])?;
    Ok(Zip::from(&a[0])
        .and(&a[1])
        .and(&a[2])
        .and(&a[3])
        .par_map_collect(|&x, &t, &m, &n| match HygeParams::new(t, m, n) {
            Some(p) => p.pmf(x),
            None => f64::NAN,
        }))
}

/// "vectorexpand" density: every element of the parameter arrays evaluated at
/// every support point in `x`.
///
/// Rows follow the logical (row-major) order of the broadcast parameters,
/// columns follow `x`. Rows with invalid parameters are entirely NaN.
pub fn hygepdf_expand(
    x: &[f64],
    t: &ArrayD<f64>,
    m: &ArrayD<f64>,
    n: &ArrayD<f64>,
) -> anyhow::Result<Array2<f64>> {
    let (_, a) = resolve(&[t, m, n])?;
    let params: Vec<Option<HygeParams>> = Zip::from(&a[0])
        .and(&a[1])
        .and(&a[2])
        .map_collect(|&t, &m, &n| HygeParams::new(t, m, n))
        .iter()
        .copied()
        .collect();
    Ok(expand_rows(x, &params))
}

fn expand_rows(x: &[f64], params: &[Option<HygeParams>]) -> Array2<f64> {
    let mut out = Array2::from_elem((params.len(), x.len()), f64::NAN);
    Zip::from(out.rows_mut())
        .and(params)
        .par_for_each(|mut row, p| {
            if let Some(p) = p {
                row.iter_mut().zip(x).for_each(|(o, &xi)| *o = p.pmf(xi));
            }
        });
    out
}

/// Hypergeometric cumulative distribution evaluated element-wise.
pub fn hygecdf(
    x: &ArrayD<f64>,
    t: &ArrayD<f64>,
    m: &ArrayD<f64>,
    n: &ArrayD<f64>,
    tail: CdfTail,
) -> anyhow::Result<ArrayD<f64>> {
    let (_, a) = resolve(&[x, t, m, n])?;
    Ok(Zip::from(&a[0])
        .and(&a[1])
        .and(&a[2])
        .and(&a[3])
        .par_map_collect(|&x, &t, &m, &n| match HygeParams::new(t, m, n) {
            Some(p) => p.cdf(x, tail),
            None => f64::NAN,
        }))
}

/// Mean and variance of the hypergeometric distribution, element-wise.
pub fn hygestat(
    t: &ArrayD<f64>,
    m: &ArrayD<f64>,
    n: &ArrayD<f64>,
) -> anyhow::Result<(ArrayD<f64>, ArrayD<f64>)> {
    let (_, a) = resolve(&[t, m, n])?;
    let moments = Zip::from(&a[0])
        .and(&a[1])
        .and(&a[2])
        .map_collect(|&t, &m, &n| {
            HygeParams::new(t, m, n)
                .map(|p| p.moments())
                .unwrap_or((f64::NAN, f64::NAN))
        });
    Ok((moments.mapv(|(mean, _)| mean), moments.mapv(|(_, var)| var)))
}

/// Invert one target per flattened position, given the parameters of each
/// position. Positions whose parameters are invalid or whose target is NaN
/// are left untouched in `out`.
fn invert_positions(
    params: &[Option<HygeParams>],
    targets: &[f64],
    pending: &[usize],
    rule: LookupRule,
    out: &mut [f64],
) {
    let rows: Vec<(usize, HygeParams)> = pending
        .iter()
        .filter_map(|&i| params[i].map(|p| (i, p)))
        .collect();
    if rows.is_empty() {
        return;
    }

    let max_n = rows.iter().map(|(_, p)| p.n).max().unwrap_or(0);
    let support: Vec<f64> = (0..=max_n).map(|k| k as f64).collect();
    let row_params: Vec<Option<HygeParams>> = rows.iter().map(|&(_, p)| Some(p)).collect();
    let density = expand_rows(&support, &row_params);
    let ends: Vec<usize> = rows.iter().map(|(_, p)| p.n as usize).collect();
    let row_targets: Vec<f64> = rows.iter().map(|&(i, _)| targets[i]).collect();

    debug!(
        rows = rows.len(),
        support = support.len(),
        "inverting hypergeometric CDF rows"
    );

    let values = invert_rows(&support, &density, &ends, &row_targets, rule);
    for ((i, _), v) in rows.iter().zip(values) {
        out[*i] = v;
    }
}

/// Hypergeometric quantile: smallest `k` with `CDF(k) >= x`.
///
/// `x = 0` returns 0 and `x = 1` returns `n`. Probabilities outside `[0, 1]`,
/// NaN probabilities and invalid parameters produce NaN.
pub fn hygeinv(
    x: &ArrayD<f64>,
    t: &ArrayD<f64>,
    m: &ArrayD<f64>,
    n: &ArrayD<f64>,
) -> anyhow::Result<ArrayD<f64>> {
    let (shape, a) = resolve(&[x, t, m, n])?;
    let probs: Vec<f64> = a[0].iter().copied().collect();
    let mut out = vec![f64::NAN; probs.len()];

    if all_scalar(&[t, m, n]) {
        let first = |v: &ArrayD<f64>| v.iter().next().copied().unwrap_or(f64::NAN);
        if let Some(p) = HygeParams::new(first(t), first(m), first(n)) {
            let cdf = p.support_cdf();
            for (o, &x) in out.iter_mut().zip(&probs) {
                *o = match x {
                    x if x == 0.0 => 0.0,
                    x if x == 1.0 => p.n as f64,
                    x if x > 0.0 && x < 1.0 && !cdf.is_empty() => {
                        locate(&cdf, x, LookupRule::Inclusive) as f64
                    }
                    _ => f64::NAN,
                };
            }
        }
        return Ok(ArrayD::from_shape_vec(IxDyn(&shape), out)?);
    }

    let params: Vec<Option<HygeParams>> = Zip::from(&a[1])
        .and(&a[2])
        .and(&a[3])
        .map_collect(|&t, &m, &n| HygeParams::new(t, m, n))
        .iter()
        .copied()
        .collect();

    let mut pending = Vec::new();
    for (i, (&x, p)) in probs.iter().zip(&params).enumerate() {
        let Some(p) = p else { continue };
        if x == 0.0 {
            out[i] = 0.0;
        } else if x == 1.0 {
            out[i] = p.n as f64;
        } else if x > 0.0 && x < 1.0 {
            pending.push(i);
        }
    }

    let invalid = params.iter().filter(|p| p.is_none()).count();
    if invalid > 0 {
        debug!(invalid, "hypergeometric parameter sets are invalid");
    }

    invert_positions(&params, &probs, &pending, LookupRule::Inclusive, &mut out);
    Ok(ArrayD::from_shape_vec(IxDyn(&shape), out)?)
}

/// Resolve the requested output dimensions of [`hygernd`].
///
/// A single value means a square matrix, two or more values are taken as
/// explicit dimensions. Without a request the common parameter shape is used.
fn output_shape(size: Option<&[usize]>, param_shape: &[usize], scalar: bool) -> anyhow::Result<Vec<usize>> {
    let shape = match size {
        None => param_shape.to_vec(),
        Some([]) => {
            return Err(StatsError::InvalidSize("dimensions must not be empty".into()).into());
        }
        Some(&[s]) => vec![s, s],
        Some(dims) => dims.to_vec(),
    };

    if !scalar && shape != param_shape {
        return Err(StatsError::InvalidSize(format!(
            "T, M and N must be scalar or of size {:?}, got {:?}",
            shape, param_shape
        ))
        .into());
    }
    Ok(shape)
}

/// Draw hypergeometric variates by inverse-CDF sampling.
///
/// One uniform draw in `[0, 1)` is consumed per output cell, in logical order,
/// so a seeded generator reproduces the same array. Cells with invalid
/// parameters are NaN.
pub fn hygernd<R: Rng>(
    t: &ArrayD<f64>,
    m: &ArrayD<f64>,
    n: &ArrayD<f64>,
    size: Option<&[usize]>,
    rng: &mut R,
) -> anyhow::Result<ArrayD<f64>> {
    let scalar = all_scalar(&[t, m, n]);
    let (param_shape, a) = resolve(&[t, m, n])?;
    let shape = output_shape(size, &param_shape, scalar)?;
    let cells: usize = shape.iter().product();

    let draws: Vec<f64> = (0..cells).map(|_| rng.gen_range(0.0..1.0)).collect();
    let mut out = vec![f64::NAN; cells];

    if scalar {
        let first = |v: &ArrayD<f64>| v.iter().next().copied().unwrap_or(f64::NAN);
        if let Some(p) = HygeParams::new(first(&a[0]), first(&a[1]), first(&a[2])) {
            let cdf = p.support_cdf();
            if !cdf.is_empty() {
                for (o, &u) in out.iter_mut().zip(&draws) {
                    *o = locate(&cdf, u, LookupRule::Strict) as f64;
                }
            }
        }
        return Ok(ArrayD::from_shape_vec(IxDyn(&shape), out)?);
    }

    let params: Vec<Option<HygeParams>> = Zip::from(&a[0])
        .and(&a[1])
        .and(&a[2])
        .map_collect(|&t, &m, &n| HygeParams::new(t, m, n))
        .iter()
        .copied()
        .collect();
    let pending: Vec<usize> = (0..cells).collect();
    invert_positions(&params, &draws, &pending, LookupRule::Strict, &mut out);
    Ok(ArrayD::from_shape_vec(IxDyn(&shape), out)?)
}

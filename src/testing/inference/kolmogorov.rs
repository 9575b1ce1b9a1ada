//! Null distribution of the one-sample Kolmogorov–Smirnov statistic.
//!
//! Two-sided p-values use the Marsaglia–Tsang–Wang matrix-power method, or
//! its closed-form tail approximation when `n·d²` is large. One-sided
//! p-values use the exact Smirnov/Birnbaum–Tingey sum, computed in log-space.
//! Critical values are interpolated from exact tables for `n <= 20` and use
//! Miller's approximation above that.

use crate::testing::Tail;
use crate::testing::utils::natural_cubic_spline;
use nalgebra::DMatrix;
use statrs::function::gamma::ln_gamma;
use tracing::{debug, trace};

/// How a p-value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PValueMethod {
    /// `2·exp(-(2.000071 + 0.331/√n + 1.409/n)·n·d²)`
    TailApproximation,
    /// Exact two-sided distribution via a matrix power.
    MatrixPower,
    /// Exact one-sided distribution.
    OneSidedExact,
}

impl PValueMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PValueMethod::TailApproximation => "tail_approximation",
            PValueMethod::MatrixPower => "matrix_power",
            PValueMethod::OneSidedExact => "one_sided_exact",
        }
    }
}

/// Significance levels of the exact critical value table.
const TABLE_LEVELS: [f64; 5] = [0.005, 0.01, 0.025, 0.05, 0.10];

/// Exact one-sided critical values for `n = 1..=20` at [`TABLE_LEVELS`].
const EXACT_CRITICAL_VALUES: [[f64; 5]; 20] = [
    [0.99500, 0.99000, 0.97500, 0.95000, 0.90000],
    [0.92929, 0.90000, 0.84189, 0.77639, 0.68377],
    [0.82900, 0.78456, 0.70760, 0.63604, 0.56481],
    [0.73424, 0.68887, 0.62394, 0.56522, 0.49265],
    [0.66853, 0.62718, 0.56328, 0.50945, 0.44698],
    [0.61661, 0.57741, 0.51926, 0.46799, 0.41037],
    [0.57581, 0.53844, 0.48342, 0.43607, 0.38148],
    [0.54179, 0.50654, 0.45427, 0.40962, 0.35831],
    [0.51332, 0.47960, 0.43001, 0.38746, 0.33910],
    [0.48893, 0.45662, 0.40925, 0.36866, 0.32260],
    [0.46770, 0.43670, 0.39122, 0.35242, 0.30829],
    [0.44905, 0.41918, 0.37543, 0.33815, 0.29577],
    [0.43247, 0.40362, 0.36143, 0.32549, 0.28470],
    [0.41762, 0.38970, 0.34890, 0.31417, 0.27481],
    [0.40420, 0.37713, 0.33760, 0.30397, 0.26588],
    [0.39201, 0.36571, 0.32733, 0.29472, 0.25778],
    [0.38086, 0.35528, 0.31796, 0.28627, 0.25039],
    [0.37062, 0.34569, 0.30936, 0.27851, 0.24360],
    [0.36117, 0.33685, 0.30143, 0.27136, 0.23735],
    [0.35241, 0.32866, 0.29408, 0.26473, 0.23156],
];

/// Two-sided p-value `P(D_n >= d)` together with the method used.
pub fn ks_two_sided_pvalue(d: f64, n: usize) -> (f64, PValueMethod) {
    let nf = n as f64;
    let s = nf * d * d;
    if s > 7.24 || (s > 3.76 && n > 99) {
        let p = 2.0 * (-(2.000071 + 0.331 / nf.sqrt() + 1.409 / nf) * s).exp();
        trace!(n, s, p, "KS tail approximation");
        return (p.min(1.0), PValueMethod::TailApproximation);
    }
    (marsaglia_tsang_wang(d, n), PValueMethod::MatrixPower)
}

/// `1 - P(D_n < d)` from the `n`-th power of the Marsaglia–Tsang–Wang matrix.
fn marsaglia_tsang_wang(d: f64, n: usize) -> f64 {
    if n == 0 || d.is_nan() {
        return f64::NAN;
    }
    let nd = n as f64 * d;
    if nd <= 0.0 {
        return 1.0;
    }
    if d >= 1.0 {
        return 0.0;
    }

    let k = nd.ceil() as usize;
    let h = k as f64 - nd;
    let m = 2 * k - 1;

    let mut inv_fact = vec![1.0; m + 1];
    for g in 1..=m {
        inv_fact[g] = inv_fact[g - 1] / g as f64;
    }

    let mut hm = DMatrix::<f64>::from_fn(m, m, |i, j| if i + 1 >= j { 1.0 } else { 0.0 });
    for i in 0..m {
        hm[(i, 0)] -= h.powi(i as i32 + 1);
        hm[(m - 1, i)] -= h.powi((m - i) as i32);
    }
    if 2.0 * h - 1.0 > 0.0 {
        hm[(m - 1, 0)] += (2.0 * h - 1.0).powi(m as i32);
    }
    for i in 0..m {
        for j in 0..=i {
            hm[(i, j)] *= inv_fact[i - j + 1];
        }
    }

    let lambda = spectral_scale(&hm);
    let Ok(exp) = u32::try_from(n) else {
        debug!(n, "sample too large for the matrix power");
        return f64::NAN;
    };
    let power = (hm / lambda).pow(exp);

    let nf = n as f64;
    let log_factor = ln_gamma(nf + 1.0) + nf * lambda.ln() - nf * nf.ln();
    let p = 1.0 - log_factor.exp() * power[(k - 1, k - 1)];
    debug!(n, d, m, lambda, p, "KS matrix power p-value");
    p.clamp(0.0, 1.0)
}

/// Largest eigenvalue modulus of `hm`, used to keep `(hm/λ)^n` in range.
/// Falls back to the infinity norm when the Schur decomposition does not
/// converge, and to 1 for the zero matrix.
fn spectral_scale(hm: &DMatrix<f64>) -> f64 {
    let from_eigen = hm
        .clone()
        .try_schur(f64::EPSILON, 10_000)
        .map(|schur| {
            schur
                .complex_eigenvalues()
                .iter()
                .map(|c| c.norm())
                .fold(0.0_f64, f64::max)
        })
        .filter(|l| l.is_finite() && *l > 0.0);

    from_eigen.unwrap_or_else(|| {
        let norm = hm
            .row_iter()
            .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0_f64, f64::max);
        if norm > 0.0 && norm.is_finite() { norm } else { 1.0 }
    })
}

/// One-sided p-value `P(D+_n >= d)` (equivalently `P(D-_n >= d)`).
pub fn ks_one_sided_pvalue(d: f64, n: usize) -> f64 {
    if n == 0 || d.is_nan() {
        return f64::NAN;
    }
    let nf = n as f64;
    let t = nf * d;
    if t <= 0.0 {
        return 1.0;
    }
    if t >= nf {
        return 0.0;
    }

    let base = t.ln() - nf * nf.ln() + ln_gamma(nf + 1.0);
    let first = t.ceil() as usize;
    let p: f64 = (first..=n)
        .map(|k| {
            let kf = k as f64;
            if kf <= t {
                return 0.0;
            }
            let log_term = base - ln_gamma(kf + 1.0) - ln_gamma(nf - kf + 1.0)
                + kf * (kf - t).ln()
                + (nf - kf - 1.0) * (t + nf - kf).ln();
            log_term.exp()
        })
        .sum();
    p.clamp(0.0, 1.0)
}

/// p-value for the requested tail.
pub fn ks_pvalue(d: f64, n: usize, tail: Tail) -> (f64, PValueMethod) {
    match tail {
        Tail::Unequal => ks_two_sided_pvalue(d, n),
        Tail::Larger | Tail::Smaller => (ks_one_sided_pvalue(d, n), PValueMethod::OneSidedExact),
    }
}

/// Critical value of the statistic at level `alpha`.
///
/// Two-sided tests use `alpha / 2` as the one-sided level. The result is NaN
/// when that level falls outside `[0.005, 0.10]` or `n == 0`.
pub fn ks_critical_value(n: usize, alpha: f64, tail: Tail) -> f64 {
    let level = if tail.is_two_sided() { alpha / 2.0 } else { alpha };
    if n == 0 || !(0.005..=0.10).contains(&level) {
        debug!(n, level, "critical value not available for this level");
        return f64::NAN;
    }

    if n <= 20 {
        return natural_cubic_spline(&TABLE_LEVELS, &EXACT_CRITICAL_VALUES[n - 1], level);
    }

    let nf = n as f64;
    let log_level = level.log10();
    let a = 0.09037 * (-log_level).powf(1.5) + 0.01515 * log_level * log_level
        - 0.08467 * level
        - 0.11143;
    let asymptotic = (-0.5 * level.ln() / nf).sqrt();
    (asymptotic - 0.16693 / nf - a / nf.powf(1.5)).min(1.0 - level)
}

use single_utilities::traits::FloatOps;

/// Convert a sample to `f64`, dropping NaN entries.
pub fn remove_nan<T>(sample: &[T]) -> Vec<f64>
where
    T: FloatOps,
{
    sample
        .iter()
        .filter_map(|v| v.to_f64())
        .filter(|v| !v.is_nan())
        .collect()
}

/// Piecewise-linear interpolation of `(xs, ys)` at `at`.
///
/// `xs` must be strictly ascending and `at` must lie inside `[xs[0], xs[last]]`.
pub fn interp_linear(xs: &[f64], ys: &[f64], at: f64) -> f64 {
    let hi = xs.partition_point(|&x| x < at);
    if hi < xs.len() && xs[hi] == at {
        return ys[hi];
    }
    if hi == 0 || hi == xs.len() {
        return f64::NAN;
    }
    let lo = hi - 1;
    let w = (at - xs[lo]) / (xs[hi] - xs[lo]);
    ys[lo] + w * (ys[hi] - ys[lo])
}

/// Natural cubic spline through `(xs, ys)` evaluated at `at`.
///
/// `xs` must be strictly ascending with at least two knots. Second derivatives
/// vanish at both end knots; outside the knots the end polynomials are
/// extended.
pub fn natural_cubic_spline(xs: &[f64], ys: &[f64], at: f64) -> f64 {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return f64::NAN;
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

    // Tridiagonal system for the interior second derivatives (Thomas algorithm).
    let mut m = vec![0.0; n];
    if n > 2 {
        let k = n - 2;
        let mut diag = vec![0.0; k];
        let mut rhs = vec![0.0; k];
        for i in 0..k {
            diag[i] = 2.0 * (h[i] + h[i + 1]);
            rhs[i] = 6.0 * ((ys[i + 2] - ys[i + 1]) / h[i + 1] - (ys[i + 1] - ys[i]) / h[i]);
        }
        for i in 1..k {
            let w = h[i] / diag[i - 1];
            diag[i] -= w * h[i];
            rhs[i] -= w * rhs[i - 1];
        }
        m[k] = rhs[k - 1] / diag[k - 1];
        for i in (0..k - 1).rev() {
            m[i + 1] = (rhs[i] - h[i + 1] * m[i + 2]) / diag[i];
        }
    }

    let seg = xs.partition_point(|&x| x <= at).clamp(1, n - 1) - 1;
    let (x0, x1) = (xs[seg], xs[seg + 1]);
    let hs = h[seg];
    let a = (x1 - at) / hs;
    let b = (at - x0) / hs;
    a * ys[seg]
        + b * ys[seg + 1]
        + ((a * a * a - a) * m[seg] + (b * b * b - b) * m[seg + 1]) * hs * hs / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_remove_nan() {
        let v = remove_nan(&[1.0_f64, f64::NAN, 3.0, f64::NAN]);
        assert_eq!(v, vec![1.0, 3.0]);
        assert!(remove_nan(&[f64::NAN, f64::NAN]).is_empty());
    }

    #[test]
    fn test_interp_linear() {
        let xs = [0.0, 1.0, 3.0];
        let ys = [0.0, 0.5, 1.0];
        assert_relative_eq!(interp_linear(&xs, &ys, 0.5), 0.25);
        assert_relative_eq!(interp_linear(&xs, &ys, 2.0), 0.75);
        assert_eq!(interp_linear(&xs, &ys, 3.0), 1.0);
        assert_eq!(interp_linear(&xs, &ys, 0.0), 0.0);
        assert!(interp_linear(&xs, &ys, 3.5).is_nan());
    }

    #[test]
    fn test_spline_reproduces_knots() {
        let xs = [0.005, 0.01, 0.025, 0.05, 0.10];
        let ys = [0.40420, 0.37713, 0.33760, 0.30397, 0.26588];
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(natural_cubic_spline(&xs, &ys, *x), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spline_exact_for_lines() {
        // A natural spline through collinear points is the line itself.
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        assert_relative_eq!(natural_cubic_spline(&xs, &ys, 1.7), 4.4, epsilon = 1e-12);
        assert_relative_eq!(natural_cubic_spline(&xs, &ys, 3.2), 7.4, epsilon = 1e-12);
    }

    #[test]
    fn test_spline_two_knots_is_linear() {
        assert_relative_eq!(natural_cubic_spline(&[0.0, 2.0], &[1.0, 3.0], 0.5), 1.5);
    }
}

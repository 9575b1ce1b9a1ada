//! Common-size resolution for scalar-or-array arguments.
//!
//! Every argument is either a scalar (exactly one element, any dimensionality)
//! or an array. All arrays must share one shape; scalars are repeated to that
//! shape. The resolution happens once at the entry of each vectorised
//! function, downstream code only sees arrays of the common shape.

use crate::error::StatsError;
use ndarray::{ArrayD, IxDyn};

fn is_scalar(a: &ArrayD<f64>) -> bool {
    a.len() == 1
}

/// Compute the common shape of `args`.
///
/// Returns the shape shared by all non-scalar arguments, or the shape of the
/// first argument if every argument is scalar.
pub fn common_size(args: &[&ArrayD<f64>]) -> Result<Vec<usize>, StatsError> {
    let mut shape: Option<&[usize]> = None;
    for a in args.iter().filter(|a| !is_scalar(a)) {
        match shape {
            None => shape = Some(a.shape()),
            Some(s) if s == a.shape() => {}
            Some(s) => {
                return Err(StatsError::ShapeMismatch {
                    first: s.to_vec(),
                    second: a.shape().to_vec(),
                });
            }
        }
    }

    Ok(match shape {
        Some(s) => s.to_vec(),
        None => args.first().map(|a| a.shape().to_vec()).unwrap_or_default(),
    })
}

/// Materialise `a` at `shape`. Scalars are repeated, arrays are copied as-is
/// and must already have the requested number of elements.
pub fn expand(a: &ArrayD<f64>, shape: &[usize]) -> ArrayD<f64> {
    if is_scalar(a) && a.shape() != shape {
        let value = a.iter().next().copied().unwrap_or(f64::NAN);
        ArrayD::from_elem(IxDyn(shape), value)
    } else {
        a.clone()
    }
}

/// True when every argument is a scalar.
pub fn all_scalar(args: &[&ArrayD<f64>]) -> bool {
    args.iter().all(|a| is_scalar(a))
}

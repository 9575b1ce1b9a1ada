//! Probability distributions evaluated over scalar-or-array parameters.
//!
//! ## Available Distributions
//!
//! - **Hypergeometric** (`hypergeometric`): density, cumulative distribution,
//!   quantile, moments and inverse-CDF sampling, including the
//!   "vectorexpand" density used for row-wise inversion.
//!
//! Continuous null distributions used by the goodness-of-fit tests are taken
//! from `statrs` and wired up in
//! [`NullCdf`](crate::testing::inference::null_cdf::NullCdf).

pub mod broadcast;
pub mod hypergeometric;

pub use hypergeometric::{
    CdfTail, HygeParams, hygecdf, hygeinv, hygepdf, hygepdf_expand, hygernd, hygestat,
};

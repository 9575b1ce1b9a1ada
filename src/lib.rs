//! # single-stattools
//!
//! Probability distributions and goodness-of-fit tests for numeric samples, part of the single-rust ecosystem.
//!
//! The crate pairs a one-sample Kolmogorov–Smirnov test with the hypergeometric distribution family. Both
//! follow array-language conventions: samples may contain NaN (ignored), distribution parameters broadcast
//! against each other, and invalid parameter values produce NaN entries rather than errors.
//!
//! ## Core Features
//!
//! - **Kolmogorov–Smirnov Test**: Two-sided and one-sided alternatives against a callable, named or tabulated CDF,
//!   with exact and asymptotic p-values and optional critical values
//! - **Hypergeometric Distribution**: `hygepdf`, `hygecdf`, `hygeinv`, `hygernd` and `hygestat` over broadcast
//!   parameter arrays
//! - **Typed Errors**: every failure is a [`error::StatsError`] carried through `anyhow`
//!
//! ## Quick Start
//!
//! Use the [`testing::inference::SampleTests`] trait to run a test directly on a slice, or call
//! [`testing::inference::nonparametric::kstest`] with a [`testing::inference::options::KsOptions`].
//! Random variates take any `rand::Rng`, so seeded generators give reproducible draws.
//!
//! ## Module Organization
//!
//! - **[`testing`]**: Hypothesis tests, the Kolmogorov distribution and test results
//! - **[`distributions`]**: Hypergeometric distribution functions and parameter broadcasting
//! - **[`error`]**: Error taxonomy shared by both

pub mod distributions;
pub mod error;
pub mod testing;

pub use error::StatsError;
pub use testing::inference::nonparametric::kstest;
pub use testing::inference::options::KsOptions;
pub use testing::{Tail, TestResult};

use ndarray::{Array2, ArrayBase, Data, Ix1};
use single_utilities::traits::{FloatOps, FloatOpsTS};
use crate::testing::TestResult;
use crate::testing::inference::options::KsOptions;

pub mod kolmogorov;

pub mod nonparametric;

pub mod null_cdf;

pub mod options;

/// Goodness-of-fit tests on a single sample.
pub trait SampleTests<T>
where
    T: FloatOps,
{
    fn ks_test(&self, options: &KsOptions) -> anyhow::Result<TestResult<f64>>;
}

impl<T> SampleTests<T> for [T]
where
    T: FloatOps,
{
    fn ks_test(&self, options: &KsOptions) -> anyhow::Result<TestResult<f64>> {
        nonparametric::kstest(self, options)
    }
}

impl<T> SampleTests<T> for Vec<T>
where
    T: FloatOps,
{
    fn ks_test(&self, options: &KsOptions) -> anyhow::Result<TestResult<f64>> {
        nonparametric::kstest(self, options)
    }
}

impl<S, T> SampleTests<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
    T: FloatOps,
{
    fn ks_test(&self, options: &KsOptions) -> anyhow::Result<TestResult<f64>> {
        match self.as_slice() {
            Some(values) => nonparametric::kstest(values, options),
            None => {
                let values: Vec<T> = self.iter().copied().collect();
                nonparametric::kstest(&values, options)
            }
        }
    }
}

/// Column-wise tests on a dense matrix; each column is one sample.
pub trait MatrixStatTests<T>
where
    T: FloatOpsTS,
{
    fn ks_test_columns(&self, options: &KsOptions) -> anyhow::Result<Vec<TestResult<f64>>>;
}

impl<T> MatrixStatTests<T> for Array2<T>
where
    T: FloatOpsTS,
{
    fn ks_test_columns(&self, options: &KsOptions) -> anyhow::Result<Vec<TestResult<f64>>> {
        nonparametric::kstest_columns(self.view(), options)
    }
}

use crate::error::StatsError;
use single_utilities::traits::FloatOps;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub mod inference;

pub mod utils;

/// Alternative hypothesis of a goodness-of-fit test, phrased in terms of the
/// sample CDF relative to the hypothesised CDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tail {
    /// Sample CDF differs from the null CDF (two-sided).
    #[default]
    Unequal,
    /// Sample CDF is larger than the null CDF.
    Larger,
    /// Sample CDF is smaller than the null CDF.
    Smaller,
}

impl Tail {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tail::Unequal => "unequal",
            Tail::Larger => "larger",
            Tail::Smaller => "smaller",
        }
    }

    pub fn is_two_sided(&self) -> bool {
        matches!(self, Tail::Unequal)
    }
}

impl fmt::Display for Tail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tail {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unequal" => Ok(Tail::Unequal),
            "larger" => Ok(Tail::Larger),
            "smaller" => Ok(Tail::Smaller),
            other => Err(StatsError::InvalidOption {
                option: "tail".to_string(),
                reason: format!(
                    "expected one of 'unequal', 'larger', 'smaller', got '{}'",
                    other
                ),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// Whether the null hypothesis is rejected at the requested significance level
    pub reject: bool,
    /// The test statistic value (e.g. the KS distance)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Critical value of the statistic, if it was requested. NaN when the
    /// significance level is outside the range the approximation covers.
    pub critical_value: Option<T>,
    /// Numeric test-specific information (sample size, alpha, ...)
    pub metadata: HashMap<String, T>,
    /// Descriptive test-specific information (tail, p-value method, ...)
    pub labels: HashMap<String, String>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    /// Create a new test result with minimal information
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            reject: false,
            statistic,
            p_value,
            critical_value: None,
            metadata: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    /// Set the decision for significance level `alpha` (reject iff `p < alpha`)
    pub fn with_decision(mut self, alpha: T) -> Self {
        self.reject = self.is_significant(alpha);
        self
    }

    /// Add the critical value to the result
    pub fn with_critical_value(mut self, critical_value: T) -> Self {
        self.critical_value = Some(critical_value);
        self
    }

    /// Add additional metadata
    pub fn with_metadata(mut self, key: &str, value: T) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Add a descriptive label
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}

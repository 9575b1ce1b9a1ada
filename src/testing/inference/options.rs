//! Options of the one-sample Kolmogorov–Smirnov test.
//!
//! Options can be built in code with the `with_*` methods or parsed from
//! name/value pairs with [`KsOptions::from_pairs`]. Either way they are
//! validated once, before any computation starts.

use crate::error::StatsError;
use crate::testing::Tail;
use crate::testing::inference::null_cdf::NullCdf;

/// A loosely typed option value, as received from name/value pairs.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Number(f64),
    Text(String),
    Table(Vec<[f64; 2]>),
    Cdf(NullCdf),
}

impl OptionValue {
    fn kind(&self) -> &'static str {
        match self {
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "text",
            OptionValue::Table(_) => "table",
            OptionValue::Cdf(_) => "cdf",
        }
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Number(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<Vec<[f64; 2]>> for OptionValue {
    fn from(v: Vec<[f64; 2]>) -> Self {
        OptionValue::Table(v)
    }
}

impl From<NullCdf> for OptionValue {
    fn from(v: NullCdf) -> Self {
        OptionValue::Cdf(v)
    }
}

#[derive(Debug, Clone)]
pub struct KsOptions {
    /// Significance level in `(0, 1)`.
    pub alpha: f64,
    /// Alternative hypothesis.
    pub tail: Tail,
    /// Hypothesised CDF.
    pub cdf: NullCdf,
    /// Whether to compute the critical value of the statistic.
    pub critical_value: bool,
}

impl Default for KsOptions {
    fn default() -> Self {
        KsOptions {
            alpha: 0.05,
            tail: Tail::Unequal,
            cdf: NullCdf::standard_normal(),
            critical_value: false,
        }
    }
}

impl KsOptions {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_tail(mut self, tail: Tail) -> Self {
        self.tail = tail;
        self
    }

    pub fn with_cdf(mut self, cdf: NullCdf) -> Self {
        self.cdf = cdf;
        self
    }

    pub fn with_critical_value(mut self, requested: bool) -> Self {
        self.critical_value = requested;
        self
    }

    /// Parse name/value pairs on top of the defaults.
    ///
    /// Recognised names (case-insensitive): `alpha` (number), `tail` (text),
    /// `cdf` (distribution name, two-column table or [`NullCdf`]).
    pub fn from_pairs(pairs: &[(&str, OptionValue)]) -> anyhow::Result<Self> {
        let mut options = KsOptions::default();
        for (name, value) in pairs {
            match name.to_ascii_lowercase().as_str() {
                "alpha" => match value {
                    OptionValue::Number(a) => options.alpha = *a,
                    other => return Err(type_error("alpha", "a number", other).into()),
                },
                "tail" => match value {
                    OptionValue::Text(t) => options.tail = t.parse()?,
                    other => return Err(type_error("tail", "text", other).into()),
                },
                "cdf" => {
                    options.cdf = match value {
                        OptionValue::Text(name) => NullCdf::named(name, &[])?,
                        OptionValue::Table(rows) => NullCdf::table(rows)?,
                        OptionValue::Cdf(cdf) => cdf.clone(),
                        other => {
                            return Err(type_error(
                                "cdf",
                                "a distribution name, a two-column table or a CDF",
                                other,
                            )
                            .into());
                        }
                    }
                }
                _ => return Err(StatsError::UnknownOption(name.to_string()).into()),
            }
        }
        options.validate()?;
        Ok(options)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), StatsError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(StatsError::InvalidOption {
                option: "alpha".to_string(),
                reason: format!("must lie in (0, 1), got {}", self.alpha),
            });
        }
        Ok(())
    }
}

fn type_error(option: &str, expected: &'static str, got: &OptionValue) -> StatsError {
    tracing::trace!(option, got = got.kind(), "option has the wrong type");
    StatsError::OptionType {
        option: option.to_string(),
        expected,
    }
}

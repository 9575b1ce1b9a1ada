use thiserror::Error;

/// Errors raised by the distribution and testing routines.
///
/// Public functions return `anyhow::Result`, the concrete value is always one of
/// these variants so callers can `downcast_ref::<StatsError>()` to tell usage
/// mistakes apart from numerically infeasible requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    #[error("Option '{option}' must be {expected}")]
    OptionType {
        option: String,
        expected: &'static str,
    },

    #[error("Invalid value for option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("Sample must be a vector, got an array of shape {0:?}")]
    NotVector(Vec<usize>),

    #[error("Sample must be real-valued, element {index} has imaginary part {imaginary}")]
    NotReal { index: usize, imaginary: f64 },

    #[error("Sample contains no observations after removing NaN values")]
    EmptySample,

    #[error("Non-scalar arguments must share one shape, got {first:?} and {second:?}")]
    ShapeMismatch {
        first: Vec<usize>,
        second: Vec<usize>,
    },

    #[error("Invalid output size: {0}")]
    InvalidSize(String),

    #[error("Invalid CDF table: {0}")]
    InvalidCdfTable(String),

    #[error(
        "CDF table covers [{table_min}, {table_max}] but the sample spans [{sample_min}, {sample_max}]"
    )]
    CdfTableRange {
        table_min: f64,
        table_max: f64,
        sample_min: f64,
        sample_max: f64,
    },
}

impl StatsError {
    /// True for errors caused by how a function was called (arity, option
    /// keys/types, shapes) rather than by the data itself.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            StatsError::UnknownOption(_)
                | StatsError::OptionType { .. }
                | StatsError::InvalidOption { .. }
                | StatsError::NotVector(_)
                | StatsError::NotReal { .. }
                | StatsError::ShapeMismatch { .. }
                | StatsError::InvalidSize(_)
                | StatsError::InvalidCdfTable(_)
        )
    }
}

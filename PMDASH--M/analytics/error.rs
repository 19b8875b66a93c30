use thiserror::Error;

/// Result alias used across the analytics crate.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Failures that abort a single project's computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// A field in a loose field bag had the wrong shape.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Field name as supplied by the caller.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
    /// An entry of the risk-factor list was unusable.
    #[error("risk factor #{index} is invalid: {reason}")]
    InvalidRiskFactor {
        /// Position in the list.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// Scoring configuration failed validation.
    #[error("invalid scoring config: {0}")]
    Config(String),
}

impl AnalyticsError {
    /// Short machine-readable label used in log metadata.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidRiskFactor { .. } => "invalid_risk_factor",
            Self::Config(_) => "config",
        }
    }
}

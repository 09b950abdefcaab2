//! Error taxonomy for mortgage calculations
//!
//! Every failure is terminal for the request. Nothing here is retried
//! internally; callers pick their own retry policy.

use thiserror::Error;

/// Standard result type for all engine operations
pub type EngineResult<T> = Result<T, MortgageError>;

#[derive(Debug, Error)]
pub enum MortgageError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Leave exactly one field empty so it can be calculated (missing: {})", .missing.join(", "))]
    Underspecified { missing: Vec<String> },

    #[error("All loan fields were given; leave exactly one field empty so it can be calculated")]
    Overspecified,

    #[error("A fixed-rate loan needs an interest rate")]
    MissingRate,

    #[error("Reference rate unavailable for tenor {tenor}: {reason}")]
    RateUnavailable { tenor: String, reason: String },

    #[error("Monthly payment {payment:.2} does not cover the monthly interest {interest:.2}; the loan never amortizes")]
    DivergentLoan { payment: f64, interest: f64 },

    #[error("Calculated {field} would be negative ({value:.2})")]
    NegativeValue { field: String, value: f64 },

    #[error("Rate solve did not converge after {iterations} iterations (last delta: {last_delta:e})")]
    NoConvergence { iterations: u32, last_delta: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl MortgageError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        MortgageError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable kind name reported in structured failure responses
    pub fn kind(&self) -> &'static str {
        match self {
            MortgageError::InvalidInput { .. } => "InvalidInputError",
            MortgageError::Underspecified { .. } => "UnderspecifiedError",
            MortgageError::Overspecified => "OverspecifiedError",
            MortgageError::MissingRate => "MissingRateError",
            MortgageError::RateUnavailable { .. } => "RateUnavailableError",
            MortgageError::DivergentLoan { .. } => "DivergentLoanError",
            MortgageError::NegativeValue { .. } => "NegativeValueError",
            MortgageError::NoConvergence { .. } => "NoConvergenceError",
            MortgageError::Config(_) => "ConfigError",
            MortgageError::Data(_) | MortgageError::Io(_) | MortgageError::Csv(_) => "DataError",
        }
    }

    /// True for errors caused by the request itself rather than the environment
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            MortgageError::RateUnavailable { .. }
                | MortgageError::Config(_)
                | MortgageError::Data(_)
                | MortgageError::Io(_)
                | MortgageError::Csv(_)
        )
    }
}

impl From<serde_json::Error> for MortgageError {
    fn from(e: serde_json::Error) -> Self {
        MortgageError::Data(e.to_string())
    }
}

/// Structured failure body: `{ kind, message }`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl From<&MortgageError> for ErrorBody {
    fn from(e: &MortgageError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

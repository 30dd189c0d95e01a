//! Error types for the forecast pipeline.

use thiserror::Error;

/// Stable classification of a [`ForecastError`], for callers that only need
/// to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    InsufficientData,
    InvalidHorizon,
    ModelFit,
    IntervalViolation,
    InvalidConfig,
    Io,
}

/// Errors raised while reading, normalizing or forecasting a series.
///
/// Every variant is terminal for the run that produced it; the pipeline never
/// returns a partial forecast alongside an error.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Insufficient data: required {required} distinct time points, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Invalid horizon: {0} (must be between 1 and 30 days)")]
    InvalidHorizon(i64),

    #[error("Model fit failed: {0}")]
    ModelFit(String),

    #[error("Uncertainty interval out of order at {ds}: lower {lower}, yhat {yhat}, upper {upper}")]
    IntervalViolation {
        ds: chrono::NaiveDateTime,
        lower: f64,
        yhat: f64,
        upper: f64,
    },

    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::MalformedInput(_) => ErrorKind::MalformedInput,
            ForecastError::InsufficientData { .. } => ErrorKind::InsufficientData,
            ForecastError::InvalidHorizon(_) => ErrorKind::InvalidHorizon,
            ForecastError::ModelFit(_) => ErrorKind::ModelFit,
            ForecastError::IntervalViolation { .. } => ErrorKind::IntervalViolation,
            ForecastError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            ForecastError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

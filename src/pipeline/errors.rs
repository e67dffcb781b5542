//! Pipeline errors: Client faults vs. server faults
//!
//! - `InvalidCategory` / `InvalidNumeric`: the request is wrong, the caller can fix it
//! - `PredictionFailure`: tensor assembly or model invocation broke

use serde::Serialize;

/// Machine-readable error kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCategory,
    InvalidNumeric,
    PredictionFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCategory => "invalid_category",
            ErrorKind::InvalidNumeric => "invalid_numeric",
            ErrorKind::PredictionFailure => "prediction_failure",
        }
    }
}

/// Failure of a single prediction request
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid {field}: '{value}'. Valid options: {valid_options:?}")]
    InvalidCategory {
        field: &'static str,
        /// Normalized (lowercased, trimmed) value
        value: String,
        valid_options: Vec<String>,
    },

    #[error("Invalid {field}: {value} is not a finite number")]
    InvalidNumeric { field: &'static str, value: f64 },

    #[error("prediction failed: {cause}")]
    PredictionFailure { cause: String },
}

impl PipelineError {
    pub fn prediction_failure(cause: impl Into<String>) -> Self {
        PipelineError::PredictionFailure {
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidCategory { .. } => ErrorKind::InvalidCategory,
            PipelineError::InvalidNumeric { .. } => ErrorKind::InvalidNumeric,
            PipelineError::PredictionFailure { .. } => ErrorKind::PredictionFailure,
        }
    }

    /// True when the request itself was at fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PipelineError::PredictionFailure { .. })
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(error: candle_core::Error) -> Self {
        PipelineError::prediction_failure(error.to_string())
    }
}

//! Calculation error types

use reqwest::StatusCode;
use thiserror::Error;

/// Request-level errors; any of these aborts the whole request
#[derive(Debug, Error)]
pub enum CentileError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("No measurements provided")]
    MissingMeasurement,

    #[error("Invalid {field} value: {value}")]
    InvalidMeasurement { field: &'static str, value: String },

    #[error("Unsupported measurement method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl CentileError {
    /// HTTP-equivalent status reported with the failure envelope
    pub fn status(&self) -> StatusCode {
        match self {
            CentileError::MissingField(_) | CentileError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure of one remote calculation; scoped to a single measurement
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{message}")]
    Api { status: u16, message: String },
}

/// Result type for request-level operations
pub type CentileResult<T> = Result<T, CentileError>;

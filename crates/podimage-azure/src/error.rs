//! Azure provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArmError {
    #[error("credential error: {0}")]
    Credential(#[from] azure_core::Error),

    #[error("ARM request failed with status {status}: {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("operation {operation} finished with status {status}: {message}")]
    OperationFailed {
        operation: String,
        status: String,
        message: String,
    },

    #[error("unexpected ARM response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArmError>;

//! Registration client errors.

use funnel_core::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a structured error message.
    #[error("API error: {0}")]
    Api(String),

    /// Non-2xx response without a structured error.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response carried no data")]
    MissingData,
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api(message) => BackendError::Rejected(message),
            other => BackendError::Transport(other.to_string()),
        }
    }
}

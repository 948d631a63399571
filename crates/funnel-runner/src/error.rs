//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Client error: {0}")]
    Client(#[from] registration_client::ClientError),

    #[error("{0}")]
    Funnel(#[from] funnel_core::FunnelError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

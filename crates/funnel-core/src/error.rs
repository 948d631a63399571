//! Error types for the funnel core.

use crate::steps::{StepAction, StepId};
use thiserror::Error;

/// Failure reported by an external collaborator (backend, reference data,
/// analytics).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The call never produced a structured answer (connection refused,
    /// timeout, undecodable body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a structured error string.
    #[error("{0}")]
    Rejected(String),
}

impl BackendError {
    /// Raw error text, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            BackendError::Transport(msg) | BackendError::Rejected(msg) => msg,
        }
    }
}

/// Misuse of the sequencer by the presentation layer.
///
/// Validation and network failures are not errors at this level: they are
/// recorded in the funnel state and reported through transition outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunnelError {
    #[error("Action {action:?} is not available on step {step}")]
    ActionNotAllowed { step: StepId, action: StepAction },

    #[error("Cannot jump to step {0}: only previously completed steps are reachable")]
    InvalidJumpTarget(StepId),

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("The funnel is already complete")]
    FunnelComplete,

    #[error("The funnel has been torn down")]
    TornDown,

    #[error("Invalid funnel definition: {0}")]
    InvalidDefinition(String),
}

/// Result type alias for sequencer operations.
pub type FunnelResult<T> = Result<T, FunnelError>;

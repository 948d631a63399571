//! Wire types for the registration backend.

use serde::{Deserialize, Serialize};

/// Every endpoint answers with `{ "data": .., "error": ".." }`; either side
/// may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for ApiEnvelope<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationStatusResponse {
    pub verified: bool,
}

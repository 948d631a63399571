//! Classification of create-account failures.
//!
//! This is the only place that inspects raw backend error text.

use crate::error::BackendError;

pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "An account with this email already exists. Please log in instead.";
pub const INVALID_PHONE_MESSAGE: &str =
    "That mobile number doesn't look right. Please check it and try again.";
pub const WEAK_PASSWORD_MESSAGE: &str =
    "Your password doesn't meet our requirements. Please choose another one.";
pub const VALIDATION_MESSAGE: &str =
    "Some of your details couldn't be accepted. Please review them and try again.";
pub const GENERIC_MESSAGE: &str =
    "We couldn't create your account. Please try again.";

const CONNECTIVITY_TERMS: &[&str] = &[
    "network",
    "fetch",
    "connection",
    "timeout",
    "timed out",
    "unreachable",
];

/// How a failed create call is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// The request may or may not have landed; proceed as if it did.
    Connectivity,
    /// The backend refused the data; carries the user-facing message.
    Business { message: String },
}

pub fn classify_failure(error: &BackendError) -> FailureClass {
    match error {
        BackendError::Transport(_) => FailureClass::Connectivity,
        BackendError::Rejected(raw) => {
            let lowered = raw.to_lowercase();
            if mentions(&lowered, CONNECTIVITY_TERMS) {
                FailureClass::Connectivity
            } else {
                FailureClass::Business {
                    message: user_message(&lowered).to_string(),
                }
            }
        }
    }
}

fn user_message(lowered: &str) -> &'static str {
    if lowered.contains("email") && mentions(lowered, &["already", "exists", "duplicate", "taken"]) {
        DUPLICATE_EMAIL_MESSAGE
    } else if mentions(lowered, &["phone", "mobile"]) {
        INVALID_PHONE_MESSAGE
    } else if lowered.contains("password") {
        WEAK_PASSWORD_MESSAGE
    } else if mentions(lowered, &["invalid", "validation", "required"]) {
        VALIDATION_MESSAGE
    } else {
        GENERIC_MESSAGE
    }
}

fn mentions(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| haystack.contains(t))
}

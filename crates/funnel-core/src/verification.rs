//! Email verification: send, resend behind a cooldown, and confirm.
//!
//! Every network failure here is fail-open. A failed initial send or a
//! failed confirmation lets the user continue; a failed resend only surfaces
//! an inline, retryable message.

use crate::backend::VerificationBackend;
use crate::cooldown::CooldownTimer;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default seconds between resend requests.
pub const DEFAULT_RESEND_COOLDOWN_SECS: u32 = 30;

pub const RESEND_FAILED_MESSAGE: &str =
    "We couldn't resend the verification email. Please try again in a moment.";
pub const STILL_PENDING_MESSAGE: &str =
    "We haven't seen your verification yet. Check your inbox and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NotSent,
    Sent,
    Confirmed,
    StillPending,
}

/// Verification bookkeeping held inside the funnel state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationState {
    pub status: VerificationStatus,
    /// Address the last email went to.
    pub email: Option<String>,
    pub email_verified: bool,
    pub cooldown: CooldownTimer,
    /// Inline message for the verification step.
    pub message: Option<String>,
}

impl VerificationState {
    pub fn new(cooldown_ceiling: u32) -> Self {
        Self {
            status: VerificationStatus::NotSent,
            email: None,
            email_verified: false,
            cooldown: CooldownTimer::new(cooldown_ceiling),
            message: None,
        }
    }

    /// Whether an email has already gone to `email` in this funnel run.
    pub fn already_sent_to(&self, email: &str) -> bool {
        self.status != VerificationStatus::NotSent && self.email.as_deref() == Some(email)
    }

    /// Record the initial send to a (possibly new) address.
    pub fn mark_sent(&mut self, email: &str) {
        self.status = VerificationStatus::Sent;
        self.email = Some(email.to_string());
        self.email_verified = false;
        self.message = None;
        // The first email counts against the resend throttle too.
        self.cooldown = CooldownTimer::new(self.cooldown.ceiling());
        self.cooldown.try_start();
    }

    /// Gate a resend on the cooldown. On success the cooldown is reset to
    /// its ceiling and the caller must perform the network call.
    pub fn try_begin_resend(&mut self) -> bool {
        if !self.cooldown.try_start() {
            return false;
        }
        self.status = VerificationStatus::Sent;
        self.message = None;
        true
    }

    pub fn apply_resend(&mut self, outcome: &ResendOutcome) {
        if let ResendOutcome::Failed { message } = outcome {
            self.message = Some(message.clone());
        }
    }

    pub fn apply_confirm(&mut self, outcome: &ConfirmOutcome) {
        match outcome {
            ConfirmOutcome::Confirmed | ConfirmOutcome::FailedOpen { .. } => {
                self.status = VerificationStatus::Confirmed;
                self.email_verified = true;
                self.message = None;
            }
            ConfirmOutcome::StillPending => {
                self.status = VerificationStatus::StillPending;
                self.message = Some(STILL_PENDING_MESSAGE.to_string());
            }
        }
    }
}

/// Result of the initial send. Both variants let the funnel advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    FailedOpen { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ResendOutcome {
    Sent,
    /// Throttled; no network call was made.
    CoolingDown { remaining_secs: u32 },
    /// Retryable once the cooldown elapses.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    Confirmed,
    StillPending,
    /// The check failed and the address is treated as verified anyway.
    FailedOpen { reason: String },
}

/// Network side of the verification step.
#[derive(Clone)]
pub struct VerificationFlow {
    backend: Arc<dyn VerificationBackend>,
}

impl VerificationFlow {
    pub fn new(backend: Arc<dyn VerificationBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self))]
    pub async fn send(&self, email: &str) -> SendOutcome {
        match self.backend.send_verification_email(email).await {
            Ok(()) => {
                info!("Verification email sent");
                SendOutcome::Delivered
            }
            Err(e) => {
                warn!(error = %e, "Verification send failed, continuing");
                SendOutcome::FailedOpen {
                    reason: e.to_string(),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn resend(&self, email: &str) -> ResendOutcome {
        match self.backend.send_verification_email(email).await {
            Ok(()) => {
                info!("Verification email resent");
                ResendOutcome::Sent
            }
            Err(e) => {
                warn!(error = %e, "Verification resend failed");
                ResendOutcome::Failed {
                    message: RESEND_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn confirm(&self, email: &str) -> ConfirmOutcome {
        match self.backend.check_email_verified(email).await {
            Ok(true) => ConfirmOutcome::Confirmed,
            Ok(false) => {
                debug!("Email not verified yet");
                ConfirmOutcome::StillPending
            }
            Err(e) => {
                warn!(error = %e, "Verification check failed, treating email as verified");
                ConfirmOutcome::FailedOpen {
                    reason: e.to_string(),
                }
            }
        }
    }
}

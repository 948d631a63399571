//! Funnel configuration.

use crate::verification::DEFAULT_RESEND_COOLDOWN_SECS;
use serde::Deserialize;

/// Tunables for one funnel instance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunnelConfig {
    /// Verification configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Post-submit redirect targets
    #[serde(default)]
    pub redirects: RedirectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Seconds a user must wait between resend requests
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    /// Where a freshly registered user lands
    #[serde(default = "default_landing_url")]
    pub landing_url: String,

    /// Where to send users when the create call could not be confirmed
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Job confirmation page; `{job_id}` is replaced by the encoded id
    #[serde(default = "default_job_confirmation_url")]
    pub job_confirmation_url: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: default_resend_cooldown(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            landing_url: default_landing_url(),
            login_url: default_login_url(),
            job_confirmation_url: default_job_confirmation_url(),
        }
    }
}

fn default_resend_cooldown() -> u32 {
    DEFAULT_RESEND_COOLDOWN_SECS
}

fn default_landing_url() -> String {
    "/welcome".into()
}

fn default_login_url() -> String {
    "/login".into()
}

fn default_job_confirmation_url() -> String {
    "/jobs/{job_id}/applied".into()
}

//! Final-step submission: payload assembly, the create-account call, outcome
//! classification and the redirect decision.

mod classify;

pub use classify::{
    classify_failure, FailureClass, DUPLICATE_EMAIL_MESSAGE, GENERIC_MESSAGE,
    INVALID_PHONE_MESSAGE, VALIDATION_MESSAGE, WEAK_PASSWORD_MESSAGE,
};

use crate::backend::AccountBackend;
use crate::config::RedirectConfig;
use crate::external::ExternalIds;
use crate::fields::{Field, FieldMap};
use crate::validation::normalize_mobile;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use urlencoding::encode;

/// Payload sent to the create-account endpoint. Built fresh per attempt.
#[derive(Debug, Serialize)]
pub struct OutboundRegistration {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub province: String,
    pub city: String,
    pub journey_stage: String,
    pub marketing_opt_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attribution: BTreeMap<String, String>,
}

impl OutboundRegistration {
    pub fn build(fields: &FieldMap, external: &ExternalIds) -> Self {
        let mobile = fields.text(Field::Mobile);
        Self {
            email: fields.text(Field::Email).trim().to_string(),
            password: SecretString::new(fields.text(Field::Password).to_string()),
            first_name: fields.text(Field::FirstName).trim().to_string(),
            last_name: fields.text(Field::LastName).trim().to_string(),
            mobile: normalize_mobile(mobile).unwrap_or_else(|| mobile.trim().to_string()),
            province: fields.text(Field::Province).to_string(),
            city: fields.text(Field::City).to_string(),
            journey_stage: fields.text(Field::JourneyStage).to_string(),
            marketing_opt_in: fields.flag(Field::MarketingOptIn),
            job_id: external.job_id.clone(),
            campaign_id: external.campaign_id.clone(),
            landing_page_id: external.landing_page_id.clone(),
            attribution: external.attribution.clone(),
        }
    }
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Where the host should navigate after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Redirect {
    JobConfirmation { job_id: String, url: String },
    Landing { url: String },
    Login { url: String },
}

impl Redirect {
    pub fn url(&self) -> &str {
        match self {
            Redirect::JobConfirmation { url, .. }
            | Redirect::Landing { url }
            | Redirect::Login { url } => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success {
        account_id: Option<String>,
        redirect: Redirect,
    },
    /// The account may exist server-side; the user is redirected anyway.
    ConnectivityFailure { reason: String, redirect: Redirect },
    /// Rejected by the backend; the user stays on the final step.
    BusinessFailure { message: String },
}

impl SubmissionOutcome {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            SubmissionOutcome::Success { redirect, .. }
            | SubmissionOutcome::ConnectivityFailure { redirect, .. } => Some(redirect),
            SubmissionOutcome::BusinessFailure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutcomeKind {
    Success,
    Connectivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Landing,
    Login,
}

/// Fallback destination per outcome when no job id was carried in.
/// A carried job id always wins.
const REDIRECT_TABLE: &[(OutcomeKind, Destination)] = &[
    (OutcomeKind::Success, Destination::Landing),
    (OutcomeKind::Connectivity, Destination::Login),
];

/// Calls the create-account endpoint and turns the result into an outcome.
#[derive(Clone)]
pub struct SubmissionController {
    backend: Arc<dyn AccountBackend>,
    redirects: RedirectConfig,
}

impl SubmissionController {
    pub fn new(backend: Arc<dyn AccountBackend>, redirects: RedirectConfig) -> Self {
        Self { backend, redirects }
    }

    #[instrument(skip_all)]
    pub async fn submit(&self, fields: &FieldMap, external: &ExternalIds) -> SubmissionOutcome {
        let payload = OutboundRegistration::build(fields, external);

        match self.backend.create_account(&payload).await {
            Ok(created) => {
                info!(account_id = ?created.account_id, "Account created");
                SubmissionOutcome::Success {
                    account_id: created.account_id,
                    redirect: self.redirect_for(OutcomeKind::Success, external),
                }
            }
            Err(e) => match classify_failure(&e) {
                FailureClass::Connectivity => {
                    warn!(error = %e, "Account creation unconfirmed, redirecting anyway");
                    SubmissionOutcome::ConnectivityFailure {
                        reason: e.to_string(),
                        redirect: self.redirect_for(OutcomeKind::Connectivity, external),
                    }
                }
                FailureClass::Business { message } => {
                    warn!(error = %e, "Account creation rejected");
                    SubmissionOutcome::BusinessFailure { message }
                }
            },
        }
    }

    fn redirect_for(&self, kind: OutcomeKind, external: &ExternalIds) -> Redirect {
        if let Some(job_id) = &external.job_id {
            return Redirect::JobConfirmation {
                job_id: job_id.clone(),
                url: self
                    .redirects
                    .job_confirmation_url
                    .replace("{job_id}", &encode(job_id)),
            };
        }

        let destination = REDIRECT_TABLE
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| *d)
            .unwrap_or(Destination::Login);

        match destination {
            Destination::Landing => Redirect::Landing {
                url: self.redirects.landing_url.clone(),
            },
            Destination::Login => Redirect::Login {
                url: self.redirects.login_url.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccountCreated, MockAccountBackend};
    use crate::error::BackendError;

    fn filled_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.set(Field::Email, " jane@example.com ".into());
        fields.set(Field::Password, "abcdefghij".into());
        fields.set(Field::FirstName, "Jane".into());
        fields.set(Field::LastName, "Dela Cruz".into());
        fields.set(Field::Mobile, "0917 123 4567".into());
        fields.set(Field::Province, "cebu".into());
        fields.set(Field::City, "cebu-city".into());
        fields.set(Field::JourneyStage, "student".into());
        fields
    }

    fn controller(mock: MockAccountBackend) -> SubmissionController {
        SubmissionController::new(Arc::new(mock), RedirectConfig::default())
    }

    #[test]
    fn test_payload_normalizes_and_carries_ids() {
        let external = ExternalIds::from_query("job_id=J-42&utm_source=fb");
        let payload = OutboundRegistration::build(&filled_fields(), &external);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["mobile"], "+639171234567");
        assert_eq!(json["password"], "abcdefghij");
        assert_eq!(json["job_id"], "J-42");
        assert_eq!(json["attribution"]["utm_source"], "fb");
        assert!(json.get("campaign_id").is_none());
    }

    #[test]
    fn test_payload_debug_hides_password() {
        let payload = OutboundRegistration::build(&filled_fields(), &ExternalIds::default());
        assert!(!format!("{:?}", payload).contains("abcdefghij"));
    }

    #[tokio::test]
    async fn test_success_without_job_goes_to_landing() {
        let mut mock = MockAccountBackend::new();
        mock.expect_create_account().times(1).returning(|_| {
            Ok(AccountCreated {
                account_id: Some("acc-1".into()),
            })
        });

        let outcome = controller(mock)
            .submit(&filled_fields(), &ExternalIds::default())
            .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::Success {
                account_id: Some("acc-1".into()),
                redirect: Redirect::Landing {
                    url: "/welcome".into()
                },
            }
        );
    }

    #[tokio::test]
    async fn test_connectivity_failure_with_job_redirects_to_job() {
        let mut mock = MockAccountBackend::new();
        mock.expect_create_account()
            .returning(|_| Err(BackendError::Transport("connection refused".into())));

        let external = ExternalIds::from_query("job_id=J 42");
        let outcome = controller(mock).submit(&filled_fields(), &external).await;

        assert_eq!(
            outcome.redirect(),
            Some(&Redirect::JobConfirmation {
                job_id: "J 42".into(),
                url: "/jobs/J%2042/applied".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_connectivity_failure_without_job_goes_to_login() {
        let mut mock = MockAccountBackend::new();
        mock.expect_create_account()
            .returning(|_| Err(BackendError::Rejected("Failed to fetch".into())));

        let outcome = controller(mock)
            .submit(&filled_fields(), &ExternalIds::default())
            .await;

        assert!(matches!(
            outcome,
            SubmissionOutcome::ConnectivityFailure {
                redirect: Redirect::Login { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_business_failure_has_no_redirect() {
        let mut mock = MockAccountBackend::new();
        mock.expect_create_account()
            .returning(|_| Err(BackendError::Rejected("email already registered".into())));

        let outcome = controller(mock)
            .submit(&filled_fields(), &ExternalIds::from_query("job_id=J-1"))
            .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::BusinessFailure {
                message: DUPLICATE_EMAIL_MESSAGE.into()
            }
        );
        assert!(outcome.redirect().is_none());
    }
}

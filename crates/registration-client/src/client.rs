//! Registration backend HTTP client.

use crate::error::ClientError;
use crate::types::*;
use async_trait::async_trait;
use funnel_core::{
    AccountBackend, AccountCreated, AnalyticsEvent, AnalyticsSink, BackendError,
    OutboundRegistration, ReferenceCategory, ReferenceDataService, ReferenceRecord,
    VerificationBackend,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Client for the registration backend.
///
/// One instance serves all four collaborator contracts of the funnel.
#[derive(Clone)]
pub struct RegistrationClient {
    client: Client,
    base_url: String,
}

impl RegistrationClient {
    /// Create a new client. `base_url` is used without a trailing slash.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the backend is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        read_envelope(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<Option<T>, ClientError> {
        let response = self.client.get(url).send().await?;
        read_envelope(response).await
    }
}

/// Decode an `{data, error}` envelope.
///
/// A structured `error` wins regardless of status. A non-2xx response without
/// one is reported as a bare status failure.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    let parsed = if body.trim().is_empty() {
        Ok(ApiEnvelope::default())
    } else {
        serde_json::from_str::<ApiEnvelope<T>>(&body)
    };

    match parsed {
        Ok(ApiEnvelope {
            error: Some(message),
            ..
        }) => {
            warn!(status = %status, error = %message, "Backend rejected request");
            Err(ClientError::Api(message))
        }
        Ok(envelope) if status.is_success() => Ok(envelope.data),
        Ok(_) => Err(ClientError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(_) if !status.is_success() => Err(ClientError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(ClientError::Json(e)),
    }
}

#[async_trait]
impl VerificationBackend for RegistrationClient {
    #[instrument(skip(self))]
    async fn send_verification_email(&self, email: &str) -> Result<(), BackendError> {
        self.post::<_, serde_json::Value>("/v1/verification/send", &VerificationRequest { email })
            .await?;
        debug!("Verification email requested");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check_email_verified(&self, email: &str) -> Result<bool, BackendError> {
        let status: VerificationStatusResponse = self
            .post("/v1/verification/check", &VerificationRequest { email })
            .await?
            .ok_or(ClientError::MissingData)?;
        Ok(status.verified)
    }
}

#[async_trait]
impl AccountBackend for RegistrationClient {
    #[instrument(skip_all)]
    async fn create_account(
        &self,
        payload: &OutboundRegistration,
    ) -> Result<AccountCreated, BackendError> {
        let created: Option<AccountCreated> = self.post("/v1/accounts", payload).await?;
        Ok(created.unwrap_or_default())
    }
}

#[async_trait]
impl ReferenceDataService for RegistrationClient {
    #[instrument(skip(self))]
    async fn get_reference_data(
        &self,
        category: ReferenceCategory,
        parent_key: Option<&str>,
    ) -> Result<Vec<ReferenceRecord>, BackendError> {
        let mut url = format!("{}/v1/reference/{}", self.base_url, category);
        if let Some(parent) = parent_key {
            url = format!("{}?parent={}", url, encode(parent));
        }

        let records: Option<Vec<ReferenceRecord>> = self.get(url).await?;
        let records = records.unwrap_or_default();
        debug!(count = records.len(), "Fetched reference data");
        Ok(records)
    }
}

#[async_trait]
impl AnalyticsSink for RegistrationClient {
    async fn notify(&self, event: &AnalyticsEvent) -> Result<(), BackendError> {
        self.post::<_, serde_json::Value>("/v1/events", event)
            .await?;
        Ok(())
    }
}

//! Contracts for the external collaborators the funnel calls into.

use crate::analytics::AnalyticsEvent;
use crate::error::BackendError;
use crate::submission::OutboundRegistration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Email verification endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// Ask the backend to email a verification link.
    async fn send_verification_email(&self, email: &str) -> Result<(), BackendError>;

    /// Whether the address has been verified.
    async fn check_email_verified(&self, email: &str) -> Result<bool, BackendError>;
}

/// Account creation endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountBackend: Send + Sync {
    async fn create_account(
        &self,
        payload: &OutboundRegistration,
    ) -> Result<AccountCreated, BackendError>;
}

/// Live lookup lists (provinces, cities).
#[async_trait]
pub trait ReferenceDataService: Send + Sync {
    async fn get_reference_data(
        &self,
        category: ReferenceCategory,
        parent_key: Option<&str>,
    ) -> Result<Vec<ReferenceRecord>, BackendError>;
}

/// Best-effort event sink. Callers ignore the result.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn notify(&self, event: &AnalyticsEvent) -> Result<(), BackendError>;
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

#[async_trait]
impl AnalyticsSink for NoopAnalytics {
    async fn notify(&self, _event: &AnalyticsEvent) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Success payload of account creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Reference-data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceCategory {
    Province,
    City,
}

impl ReferenceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceCategory::Province => "province",
            ReferenceCategory::City => "city",
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `{id, name}` lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: String,
    pub name: String,
}

impl ReferenceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

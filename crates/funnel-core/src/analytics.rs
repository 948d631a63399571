//! Analytics events emitted by the funnel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventKind {
    StepStarted,
    StepCompleted,
    SubmissionCompleted,
}

/// A fire-and-forget notification keyed by a step's analytics key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub kind: AnalyticsEventKind,
    pub step_key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(kind: AnalyticsEventKind, step_key: impl Into<String>) -> Self {
        Self {
            kind,
            step_key: step_key.into(),
            attributes: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn step_started(step_key: impl Into<String>) -> Self {
        Self::new(AnalyticsEventKind::StepStarted, step_key)
    }

    pub fn step_completed(step_key: impl Into<String>) -> Self {
        Self::new(AnalyticsEventKind::StepCompleted, step_key)
    }

    pub fn submission_completed(step_key: impl Into<String>) -> Self {
        Self::new(AnalyticsEventKind::SubmissionCompleted, step_key)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

//! Funnel state owned by the sequencer, and the snapshot handed to the
//! presentation layer.

use crate::fields::{Field, FieldErrors, FieldMap};
use crate::reference::LocationCatalog;
use crate::steps::{FunnelDefinition, StepId};
use crate::submission::Redirect;
use crate::verification::{VerificationState, VerificationStatus};
use serde::Serialize;

#[derive(Debug, Clone)]
pub(crate) struct FunnelState {
    pub current: usize,
    pub fields: FieldMap,
    pub field_errors: FieldErrors,
    pub verification: VerificationState,
    pub catalog: LocationCatalog,
    pub is_submitting: bool,
    pub submit_error: Option<String>,
    pub completed: bool,
    pub redirect: Option<Redirect>,
    pub torn_down: bool,
    /// Bumped on every step change; async results captured under an older
    /// epoch are dropped.
    pub step_epoch: u64,
    /// Bumped on every province change; keys in-flight city loads.
    pub city_generation: u64,
}

impl FunnelState {
    pub fn new(cooldown_ceiling: u32) -> Self {
        Self {
            current: 0,
            fields: FieldMap::new(),
            field_errors: FieldErrors::new(),
            verification: VerificationState::new(cooldown_ceiling),
            catalog: LocationCatalog::default(),
            is_submitting: false,
            submit_error: None,
            completed: false,
            redirect: None,
            torn_down: false,
            step_epoch: 0,
            city_generation: 0,
        }
    }

    pub fn move_to(&mut self, index: usize) {
        self.current = index;
        self.step_epoch += 1;
    }

    /// Replace the errors for `fields` with `errors`.
    pub fn record_errors(&mut self, fields: &[Field], errors: &FieldErrors) {
        for field in fields {
            self.field_errors.remove(field);
        }
        self.field_errors
            .extend(errors.iter().map(|(f, m)| (*f, m.clone())));
    }

    pub fn snapshot(&self, definition: &FunnelDefinition) -> FunnelSnapshot {
        let current_step = definition
            .step(self.current)
            .map(|s| s.id)
            .unwrap_or(StepId::Account);

        FunnelSnapshot {
            current_step,
            current_step_index: self.current,
            step_count: definition.len(),
            fields: self.fields.clone(),
            field_errors: self.field_errors.clone(),
            email_verified: self.verification.email_verified,
            verification_status: self.verification.status,
            verification_message: self.verification.message.clone(),
            resend_cooldown_seconds: self.verification.cooldown.remaining(),
            catalog: self.catalog.clone(),
            is_submitting: self.is_submitting,
            submit_error: self.submit_error.clone(),
            completed: self.completed,
            redirect: self.redirect.clone(),
        }
    }
}

/// Read-only view of the funnel after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelSnapshot {
    pub current_step: StepId,
    pub current_step_index: usize,
    pub step_count: usize,
    pub fields: FieldMap,
    pub field_errors: FieldErrors,
    pub email_verified: bool,
    pub verification_status: VerificationStatus,
    pub verification_message: Option<String>,
    pub resend_cooldown_seconds: u32,
    pub catalog: LocationCatalog,
    pub is_submitting: bool,
    pub submit_error: Option<String>,
    pub completed: bool,
    pub redirect: Option<Redirect>,
}

//! The step sequencer: sole owner of funnel state and the only entry point
//! for the presentation layer.
//!
//! State lives behind an `RwLock`. Operations take the lock, decide, release
//! it across network calls, then re-take it and check that the context they
//! captured (step epoch, city generation) is still current before applying
//! a result. Late results are dropped.

use crate::analytics::AnalyticsEvent;
use crate::backend::{AccountBackend, AnalyticsSink, ReferenceDataService, VerificationBackend};
use crate::config::FunnelConfig;
use crate::error::{FunnelError, FunnelResult};
use crate::external::ExternalIds;
use crate::fields::{Field, FieldErrors, FieldValue};
use crate::reference::ReferenceDataLoader;
use crate::state::{FunnelSnapshot, FunnelState};
use crate::steps::{FunnelDefinition, StepAction, StepDefinition, StepExit, StepId};
use crate::submission::{SubmissionController, SubmissionOutcome};
use crate::validation::validate_step;
use crate::verification::{ConfirmOutcome, ResendOutcome, VerificationFlow};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// External collaborators the sequencer calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub verification: Arc<dyn VerificationBackend>,
    pub accounts: Arc<dyn AccountBackend>,
    pub reference: Arc<dyn ReferenceDataService>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

/// Result of a forward transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced { from: StepId, to: StepId },
    /// Validation failed; the step did not change.
    Blocked { errors: FieldErrors },
    /// The last step handed off to the submission controller.
    Submitted(SubmissionOutcome),
}

#[derive(Clone)]
pub struct StepSequencer {
    definition: Arc<FunnelDefinition>,
    state: Arc<RwLock<FunnelState>>,
    verification: VerificationFlow,
    loader: ReferenceDataLoader,
    submission: SubmissionController,
    analytics: Arc<dyn AnalyticsSink>,
    external: Arc<ExternalIds>,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl StepSequencer {
    /// Create a sequencer positioned on the first step.
    ///
    /// `external` holds the identifiers read from the hosting page when the
    /// funnel was opened; they are not re-read later.
    pub fn new(
        definition: FunnelDefinition,
        config: &FunnelConfig,
        collaborators: Collaborators,
        external: ExternalIds,
    ) -> Self {
        Self {
            definition: Arc::new(definition),
            state: Arc::new(RwLock::new(FunnelState::new(
                config.verification.resend_cooldown_secs,
            ))),
            verification: VerificationFlow::new(collaborators.verification),
            loader: ReferenceDataLoader::new(collaborators.reference),
            submission: SubmissionController::new(
                collaborators.accounts,
                config.redirects.clone(),
            ),
            analytics: collaborators.analytics,
            external: Arc::new(external),
            background: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn definition(&self) -> &FunnelDefinition {
        &self.definition
    }

    pub fn external_ids(&self) -> &ExternalIds {
        &self.external
    }

    /// Load provinces and announce the first step.
    pub async fn start(&self) {
        let provinces = self.loader.provinces().await;

        let step_key = {
            let mut state = self.state.write().await;
            state.catalog.provinces = provinces;
            self.step_at(state.current).analytics_key.clone()
        };

        info!(steps = self.definition.len(), "Funnel started");
        self.emit(AnalyticsEvent::step_started(step_key)).await;
    }

    pub async fn snapshot(&self) -> FunnelSnapshot {
        self.state.read().await.snapshot(&self.definition)
    }

    pub async fn current_step(&self) -> StepId {
        let state = self.state.read().await;
        self.step_at(state.current).id
    }

    /// Assign a field value and clear its inline error.
    ///
    /// Changing the province also clears the selected city and drops any
    /// city list tied to the previous province.
    pub async fn set_field(&self, field: Field, value: impl Into<FieldValue>) {
        let mut state = self.state.write().await;
        let changed = state.fields.set(field, value.into());
        state.field_errors.remove(&field);

        if changed && field == Field::Province {
            state.fields.set(Field::City, Field::City.default_value());
            state.field_errors.remove(&Field::City);
            state.catalog.clear_cities();
            state.city_generation += 1;
        }
    }

    /// Select a province and load its cities.
    ///
    /// Returns false if the loaded list was discarded because the province
    /// or the step changed before it arrived.
    pub async fn select_province(&self, province_id: &str) -> bool {
        self.set_field(Field::Province, province_id).await;

        let (generation, epoch) = {
            let state = self.state.read().await;
            (state.city_generation, state.step_epoch)
        };
        if province_id.trim().is_empty() {
            return false;
        }

        let cities = self.loader.cities(province_id).await;

        let mut state = self.state.write().await;
        let current = state.city_generation == generation
            && state.step_epoch == epoch
            && !state.torn_down
            && state.fields.text(Field::Province) == province_id;
        if !current {
            debug!(province = %province_id, "Discarding stale city list");
            return false;
        }

        state.catalog.set_cities(province_id, cities);
        true
    }

    /// Validate the current step and move forward.
    ///
    /// The step that collects the email also fires the verification send;
    /// the last step submits instead of advancing.
    pub async fn advance(&self) -> FunnelResult<AdvanceOutcome> {
        let mut state = self.state.write().await;
        self.ensure_open(&state)?;

        let step = self.step_at(state.current).clone();
        Self::ensure_allowed(&step, StepAction::Advance)?;

        let errors = validate_step(&step, &state.fields);
        state.record_errors(&step.fields, &errors);
        if !errors.is_empty() {
            debug!(step = %step.id, invalid = errors.len(), "Step validation failed");
            return Ok(AdvanceOutcome::Blocked { errors });
        }

        match step.exit {
            StepExit::Validate => {
                let to = self.move_forward(&mut state, &step).await;
                Ok(AdvanceOutcome::Advanced { from: step.id, to })
            }
            StepExit::ValidateAndSendVerification => {
                let email = state.fields.text(Field::Email).trim().to_string();
                if state.verification.already_sent_to(&email) {
                    debug!("Verification already sent to this address");
                } else {
                    state.verification.mark_sent(&email);
                    let flow = self.verification.clone();
                    self.spawn_background(async move {
                        // Fail-open: the outcome never touches funnel state.
                        flow.send(&email).await;
                    })
                    .await;
                }
                let to = self.move_forward(&mut state, &step).await;
                Ok(AdvanceOutcome::Advanced { from: step.id, to })
            }
            StepExit::ValidateAndSubmit => {
                state.is_submitting = true;
                state.submit_error = None;
                let fields = state.fields.clone();
                drop(state);

                let outcome = self.submission.submit(&fields, &self.external).await;
                self.apply_submission(&step, &outcome).await;
                Ok(AdvanceOutcome::Submitted(outcome))
            }
            StepExit::ConfirmVerification => Err(FunnelError::ActionNotAllowed {
                step: step.id,
                action: StepAction::Advance,
            }),
        }
    }

    /// Check verification with the backend and leave the verification step.
    ///
    /// A failed check counts as verified.
    pub async fn confirm_verification(&self) -> FunnelResult<ConfirmOutcome> {
        let mut state = self.state.write().await;
        self.ensure_open(&state)?;

        let step = self.step_at(state.current).clone();
        Self::ensure_allowed(&step, StepAction::Confirm)?;

        if state.verification.email_verified {
            self.move_forward(&mut state, &step).await;
            return Ok(ConfirmOutcome::Confirmed);
        }

        let email = self.verification_email(&state);
        let epoch = state.step_epoch;
        drop(state);

        let outcome = self.verification.confirm(&email).await;

        let mut state = self.state.write().await;
        if state.step_epoch != epoch || state.torn_down {
            debug!("Ignoring verification result for a step that was left");
            return Ok(outcome);
        }

        state.verification.apply_confirm(&outcome);
        if state.verification.email_verified {
            self.move_forward(&mut state, &step).await;
        }
        Ok(outcome)
    }

    /// Resend the verification email unless the cooldown is running.
    pub async fn resend_verification(&self) -> FunnelResult<ResendOutcome> {
        let mut state = self.state.write().await;
        self.ensure_open(&state)?;

        let step = self.step_at(state.current).clone();
        Self::ensure_allowed(&step, StepAction::Resend)?;

        if !state.verification.try_begin_resend() {
            return Ok(ResendOutcome::CoolingDown {
                remaining_secs: state.verification.cooldown.remaining(),
            });
        }

        let email = self.verification_email(&state);
        let epoch = state.step_epoch;
        drop(state);

        let outcome = self.verification.resend(&email).await;

        let mut state = self.state.write().await;
        if state.step_epoch == epoch && !state.torn_down {
            state.verification.apply_resend(&outcome);
        } else {
            debug!("Ignoring resend result for a step that was left");
        }
        Ok(outcome)
    }

    /// Go back one step without validating. A no-op on the first step.
    pub async fn retreat(&self) -> FunnelResult<StepId> {
        let mut state = self.state.write().await;
        self.ensure_open(&state)?;

        let step = self.step_at(state.current).clone();
        Self::ensure_allowed(&step, StepAction::Retreat)?;

        if state.current == 0 {
            return Ok(step.id);
        }

        let target = state.current - 1;
        Ok(self.enter(&mut state, target).await)
    }

    /// Return to an earlier, already completed step, clearing transient
    /// errors.
    pub async fn jump_to(&self, target: StepId) -> FunnelResult<StepId> {
        let mut state = self.state.write().await;
        self.ensure_open(&state)?;

        let step = self.step_at(state.current).clone();
        Self::ensure_allowed(&step, StepAction::JumpTo)?;

        let index = self
            .definition
            .position(target)
            .filter(|index| *index < state.current)
            .ok_or(FunnelError::InvalidJumpTarget(target))?;

        state.field_errors.clear();
        state.verification.message = None;
        state.submit_error = None;

        Ok(self.enter(&mut state, index).await)
    }

    /// One second of cooldown. Ignored unless the verification step is
    /// showing.
    pub async fn tick(&self) {
        let mut state = self.state.write().await;
        if state.torn_down || state.completed {
            return;
        }
        if self.step_at(state.current).exit == StepExit::ConfirmVerification {
            state.verification.cooldown.tick();
        }
    }

    /// Wait for fire-and-forget work (verification sends, analytics).
    pub async fn settle(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.background.lock().await);
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Background task failed");
            }
        }
    }

    /// Stop ticks, reject further actions and abort background work.
    pub async fn teardown(&self) {
        self.state.write().await.torn_down = true;
        for handle in self.background.lock().await.drain(..) {
            handle.abort();
        }
        info!("Funnel torn down");
    }

    fn step_at(&self, index: usize) -> &StepDefinition {
        // `current` is only ever set to a valid index of this definition.
        &self.definition.steps()[index]
    }

    fn ensure_open(&self, state: &FunnelState) -> FunnelResult<()> {
        if state.torn_down {
            return Err(FunnelError::TornDown);
        }
        if state.completed {
            return Err(FunnelError::FunnelComplete);
        }
        if state.is_submitting {
            return Err(FunnelError::SubmissionInProgress);
        }
        Ok(())
    }

    fn ensure_allowed(step: &StepDefinition, action: StepAction) -> FunnelResult<()> {
        if step.exit.allows(action) {
            Ok(())
        } else {
            Err(FunnelError::ActionNotAllowed {
                step: step.id,
                action,
            })
        }
    }

    fn verification_email(&self, state: &FunnelState) -> String {
        state
            .verification
            .email
            .clone()
            .unwrap_or_else(|| state.fields.text(Field::Email).trim().to_string())
    }

    async fn move_forward(&self, state: &mut FunnelState, from: &StepDefinition) -> StepId {
        self.emit(AnalyticsEvent::step_completed(from.analytics_key.clone()))
            .await;
        let next = (state.current + 1).min(self.definition.len() - 1);
        self.enter(state, next).await
    }

    async fn enter(&self, state: &mut FunnelState, index: usize) -> StepId {
        state.move_to(index);
        let step = self.step_at(index);
        info!(step = %step.id, index, "Entered step");
        self.emit(AnalyticsEvent::step_started(step.analytics_key.clone()))
            .await;
        step.id
    }

    async fn apply_submission(&self, step: &StepDefinition, outcome: &SubmissionOutcome) {
        let mut state = self.state.write().await;
        state.is_submitting = false;
        if state.torn_down {
            debug!("Ignoring submission result after teardown");
            return;
        }

        match outcome {
            SubmissionOutcome::Success { redirect, .. } => {
                state.completed = true;
                state.redirect = Some(redirect.clone());
                drop(state);

                self.emit(AnalyticsEvent::step_completed(step.analytics_key.clone()))
                    .await;
                let mut event = AnalyticsEvent::submission_completed(step.analytics_key.clone());
                if let Some(job_id) = &self.external.job_id {
                    event = event.with_attribute("job_id", job_id.clone());
                }
                self.emit(event).await;
            }
            SubmissionOutcome::ConnectivityFailure { redirect, .. } => {
                state.completed = true;
                state.redirect = Some(redirect.clone());
            }
            SubmissionOutcome::BusinessFailure { message } => {
                state.submit_error = Some(message.clone());
            }
        }
    }

    async fn emit(&self, event: AnalyticsEvent) {
        let sink = self.analytics.clone();
        self.spawn_background(async move {
            if let Err(e) = sink.notify(&event).await {
                debug!(error = %e, kind = ?event.kind, "Analytics notification dropped");
            }
        })
        .await;
    }

    async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut background = self.background.lock().await;
        background.retain(|handle| !handle.is_finished());
        background.push(tokio::spawn(task));
    }
}

//! Common test utilities for funnel integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use funnel_core::{
    AccountBackend, AccountCreated, AnalyticsEvent, AnalyticsEventKind, AnalyticsSink,
    BackendError, Collaborators, ExternalIds, Field, FunnelConfig, FunnelDefinition,
    OutboundRegistration, ReferenceCategory, ReferenceDataService, ReferenceRecord,
    StepSequencer, VerificationBackend,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// In-memory stand-in for every backend the funnel talks to.
///
/// Results are scripted up front; calls are counted and recorded.
pub struct FakeBackend {
    pub send_result: Mutex<Result<(), BackendError>>,
    pub check_result: Mutex<Result<bool, BackendError>>,
    pub create_result: Mutex<Result<AccountCreated, BackendError>>,
    pub reference_result: Mutex<Option<BackendError>>,
    pub sends: AtomicUsize,
    pub checks: AtomicUsize,
    pub city_lookups: AtomicUsize,
    pub sent_to: Mutex<Vec<String>>,
    pub payloads: Mutex<Vec<serde_json::Value>>,
    pub events: Mutex<Vec<AnalyticsEvent>>,
    city_gates: Mutex<HashMap<String, Arc<Notify>>>,
    send_gate: Mutex<Option<Arc<Notify>>>,
    check_gate: Mutex<Option<Arc<Notify>>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            send_result: Mutex::new(Ok(())),
            check_result: Mutex::new(Ok(true)),
            create_result: Mutex::new(Ok(AccountCreated {
                account_id: Some("acc-1".into()),
            })),
            reference_result: Mutex::new(None),
            sends: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
            city_lookups: AtomicUsize::new(0),
            sent_to: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            city_gates: Mutex::new(HashMap::new()),
            send_gate: Mutex::new(None),
            check_gate: Mutex::new(None),
            create_gate: Mutex::new(None),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_send(&self, error: BackendError) {
        *self.send_result.lock().unwrap() = Err(error);
    }

    pub fn set_check(&self, result: Result<bool, BackendError>) {
        *self.check_result.lock().unwrap() = result;
    }

    pub fn fail_create(&self, error: BackendError) {
        *self.create_result.lock().unwrap() = Err(error);
    }

    pub fn fail_reference(&self, error: BackendError) {
        *self.reference_result.lock().unwrap() = Some(error);
    }

    /// Hold city lookups for `province_id` until the returned handle is
    /// notified.
    pub fn gate_cities(&self, province_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.city_gates
            .lock()
            .unwrap()
            .insert(province_id.to_string(), gate.clone());
        gate
    }

    /// Hold every later verification send until the handle is notified.
    pub fn gate_sends(&self) -> Arc<Notify> {
        install_gate(&self.send_gate)
    }

    /// Hold every later verification check until the handle is notified.
    pub fn gate_checks(&self) -> Arc<Notify> {
        install_gate(&self.check_gate)
    }

    /// Hold account creation after the payload is recorded.
    pub fn gate_creates(&self) -> Arc<Notify> {
        install_gate(&self.create_gate)
    }

    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn city_lookup_count(&self) -> usize {
        self.city_lookups.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn last_payload(&self) -> Option<serde_json::Value> {
        self.payloads.lock().unwrap().last().cloned()
    }

    pub fn event_kinds(&self) -> Vec<(AnalyticsEventKind, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.kind, e.step_key.clone()))
            .collect()
    }
}

fn install_gate(slot: &Mutex<Option<Arc<Notify>>>) -> Arc<Notify> {
    let gate = Arc::new(Notify::new());
    *slot.lock().unwrap() = Some(gate.clone());
    gate
}

async fn wait_at(slot: &Mutex<Option<Arc<Notify>>>) {
    let gate = slot.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

/// Yield until `done` holds; pairs with the gates above.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    while !done() {
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl VerificationBackend for FakeBackend {
    async fn send_verification_email(&self, email: &str) -> Result<(), BackendError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.sent_to.lock().unwrap().push(email.to_string());
        wait_at(&self.send_gate).await;
        self.send_result.lock().unwrap().clone()
    }

    async fn check_email_verified(&self, _email: &str) -> Result<bool, BackendError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        wait_at(&self.check_gate).await;
        self.check_result.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountBackend for FakeBackend {
    async fn create_account(
        &self,
        payload: &OutboundRegistration,
    ) -> Result<AccountCreated, BackendError> {
        let json = serde_json::to_value(payload).map_err(|e| BackendError::Transport(e.to_string()))?;
        self.payloads.lock().unwrap().push(json);
        wait_at(&self.create_gate).await;
        self.create_result.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferenceDataService for FakeBackend {
    async fn get_reference_data(
        &self,
        category: ReferenceCategory,
        parent_key: Option<&str>,
    ) -> Result<Vec<ReferenceRecord>, BackendError> {
        let failure = self.reference_result.lock().unwrap().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        match (category, parent_key) {
            (ReferenceCategory::Province, _) => Ok(vec![
                ReferenceRecord::new("north", "North Province"),
                ReferenceRecord::new("south", "South Province"),
            ]),
            (ReferenceCategory::City, Some(parent)) => {
                self.city_lookups.fetch_add(1, Ordering::SeqCst);
                let gate = self.city_gates.lock().unwrap().get(parent).cloned();
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                Ok(vec![
                    ReferenceRecord::new(format!("{parent}-capital"), format!("{parent} Capital")),
                    ReferenceRecord::new(format!("{parent}-port"), format!("{parent} Port")),
                ])
            }
            (ReferenceCategory::City, None) => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl AnalyticsSink for FakeBackend {
    async fn notify(&self, event: &AnalyticsEvent) -> Result<(), BackendError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn collaborators(fake: &Arc<FakeBackend>) -> Collaborators {
    Collaborators {
        verification: fake.clone(),
        accounts: fake.clone(),
        reference: fake.clone(),
        analytics: fake.clone(),
    }
}

/// A started sequencer over the standard five steps.
pub async fn test_sequencer(fake: &Arc<FakeBackend>, query: &str) -> StepSequencer {
    let sequencer = StepSequencer::new(
        FunnelDefinition::standard(),
        &FunnelConfig::default(),
        collaborators(fake),
        ExternalIds::from_query(query),
    );
    sequencer.start().await;
    sequencer
}

pub async fn fill_account(sequencer: &StepSequencer, email: &str) {
    sequencer.set_field(Field::Email, email).await;
    sequencer.set_field(Field::Password, "abcdefghij").await;
    sequencer.set_field(Field::ConfirmPassword, "abcdefghij").await;
}

pub async fn fill_personal(sequencer: &StepSequencer, mobile: &str) {
    sequencer.set_field(Field::FirstName, "Maria").await;
    sequencer.set_field(Field::LastName, "Santos").await;
    sequencer.set_field(Field::Mobile, mobile).await;
}

pub async fn fill_location(sequencer: &StepSequencer) {
    sequencer.select_province("north").await;
    sequencer.set_field(Field::City, "north-capital").await;
}

pub async fn fill_journey(sequencer: &StepSequencer) {
    sequencer.set_field(Field::JourneyStage, "student").await;
    sequencer.set_field(Field::MarketingOptIn, true).await;
}

/// Walk a fresh sequencer to the final step with valid data.
pub async fn walk_to_final_step(sequencer: &StepSequencer, mobile: &str) {
    fill_account(sequencer, "maria@example.com").await;
    sequencer.advance().await.unwrap();
    sequencer.confirm_verification().await.unwrap();
    fill_personal(sequencer, mobile).await;
    sequencer.advance().await.unwrap();
    fill_location(sequencer).await;
    sequencer.advance().await.unwrap();
    fill_journey(sequencer).await;
}

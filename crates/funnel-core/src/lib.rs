//! Client-side registration funnel.
//!
//! A [`StepSequencer`] walks a user through a fixed list of steps, validates
//! each step's fields, drives email verification with a resend cooldown,
//! loads location lists with a static fallback and finally submits the
//! collected registration. Network failures on the verification path are
//! fail-open; a create-account call that cannot be confirmed still redirects.

pub mod analytics;
pub mod backend;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod external;
pub mod fields;
pub mod reference;
mod sequencer;
mod state;
pub mod steps;
pub mod submission;
pub mod validation;
pub mod verification;

pub use analytics::{AnalyticsEvent, AnalyticsEventKind};
pub use backend::{
    AccountBackend, AccountCreated, AnalyticsSink, NoopAnalytics, ReferenceCategory,
    ReferenceDataService, ReferenceRecord, VerificationBackend,
};
pub use config::{FunnelConfig, RedirectConfig, VerificationConfig};
pub use cooldown::CooldownTimer;
pub use error::{BackendError, FunnelError, FunnelResult};
pub use external::ExternalIds;
pub use fields::{Field, FieldErrors, FieldMap, FieldValue};
pub use reference::{LocationCatalog, ReferenceDataLoader};
pub use sequencer::{AdvanceOutcome, Collaborators, StepSequencer};
pub use state::FunnelSnapshot;
pub use steps::{FunnelDefinition, StepAction, StepDefinition, StepExit, StepId};
pub use submission::{OutboundRegistration, Redirect, SubmissionOutcome};
pub use verification::{ConfirmOutcome, ResendOutcome, VerificationStatus};

//! Step definitions and the per-step transition table.

use crate::error::FunnelError;
use crate::fields::Field;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Step variants known to the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Account,
    VerifyEmail,
    Personal,
    Location,
    Journey,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Account => "account",
            StepId::VerifyEmail => "verify_email",
            StepId::Personal => "personal",
            StepId::Location => "location",
            StepId::Journey => "journey",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account" => Ok(StepId::Account),
            "verify_email" => Ok(StepId::VerifyEmail),
            "personal" => Ok(StepId::Personal),
            "location" => Ok(StepId::Location),
            "journey" => Ok(StepId::Journey),
            other => Err(format!("Unknown step: {}", other)),
        }
    }
}

/// User-initiated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Advance,
    Confirm,
    Resend,
    Retreat,
    JumpTo,
}

/// How a step is left in the forward direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepExit {
    /// Validate, then move to the next step.
    Validate,
    /// Validate, fire the verification email, then move on.
    ValidateAndSendVerification,
    /// Left only through a verification confirmation.
    ConfirmVerification,
    /// Validate, then hand the funnel to the submission controller.
    ValidateAndSubmit,
}

impl StepExit {
    /// Actions available while a step with this exit rule is current.
    pub fn allowed_actions(&self) -> &'static [StepAction] {
        use StepAction::*;
        match self {
            StepExit::Validate | StepExit::ValidateAndSendVerification => {
                &[Advance, Retreat, JumpTo]
            }
            StepExit::ConfirmVerification => &[Confirm, Resend, Retreat, JumpTo],
            StepExit::ValidateAndSubmit => &[Advance, Retreat, JumpTo],
        }
    }

    pub fn allows(&self, action: StepAction) -> bool {
        self.allowed_actions().contains(&action)
    }
}

/// One screen of the funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub display_label: String,
    pub analytics_key: String,
    /// Fields validated when the step is left forward.
    pub fields: Vec<Field>,
    pub exit: StepExit,
}

impl StepDefinition {
    pub fn new(
        id: StepId,
        display_label: impl Into<String>,
        analytics_key: impl Into<String>,
        fields: Vec<Field>,
        exit: StepExit,
    ) -> Self {
        Self {
            id,
            display_label: display_label.into(),
            analytics_key: analytics_key.into(),
            fields,
            exit,
        }
    }
}

/// Ordered, validated list of steps for one funnel variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelDefinition {
    steps: Vec<StepDefinition>,
}

impl FunnelDefinition {
    /// Build a funnel variant, checking that its steps form a usable sequence.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, FunnelError> {
        if steps.is_empty() {
            return Err(FunnelError::InvalidDefinition(
                "a funnel needs at least one step".into(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id) {
                return Err(FunnelError::InvalidDefinition(format!(
                    "step {} appears more than once",
                    step.id
                )));
            }
        }

        let submit_steps = steps
            .iter()
            .filter(|s| s.exit == StepExit::ValidateAndSubmit)
            .count();
        let last_submits = steps
            .last()
            .map(|s| s.exit == StepExit::ValidateAndSubmit)
            .unwrap_or(false);
        if submit_steps != 1 || !last_submits {
            return Err(FunnelError::InvalidDefinition(
                "exactly one submit step is required and it must be last".into(),
            ));
        }

        for (index, step) in steps.iter().enumerate() {
            if step.exit == StepExit::ConfirmVerification {
                let sent_before = steps[..index]
                    .iter()
                    .any(|s| s.exit == StepExit::ValidateAndSendVerification);
                if !sent_before {
                    return Err(FunnelError::InvalidDefinition(format!(
                        "step {} confirms a verification that no earlier step sends",
                        step.id
                    )));
                }
            }
        }

        Ok(Self { steps })
    }

    /// The default five-step registration funnel.
    pub fn standard() -> Self {
        let steps = vec![
            StepDefinition::new(
                StepId::Account,
                "Create your account",
                "registration_account",
                vec![Field::Email, Field::Password, Field::ConfirmPassword],
                StepExit::ValidateAndSendVerification,
            ),
            StepDefinition::new(
                StepId::VerifyEmail,
                "Verify your email",
                "registration_verify_email",
                vec![],
                StepExit::ConfirmVerification,
            ),
            StepDefinition::new(
                StepId::Personal,
                "About you",
                "registration_personal",
                vec![Field::FirstName, Field::LastName, Field::Mobile],
                StepExit::Validate,
            ),
            StepDefinition::new(
                StepId::Location,
                "Where are you based?",
                "registration_location",
                vec![Field::Province, Field::City],
                StepExit::Validate,
            ),
            StepDefinition::new(
                StepId::Journey,
                "Your career journey",
                "registration_journey",
                vec![Field::JourneyStage],
                StepExit::ValidateAndSubmit,
            ),
        ];

        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}

impl Default for FunnelDefinition {
    fn default() -> Self {
        Self::standard()
    }
}

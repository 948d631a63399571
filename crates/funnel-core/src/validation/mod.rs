//! Per-step validation.
//!
//! Each step names the fields it owns; validating a step runs every rule for
//! those fields and returns the full error map in one pass.

pub mod rules;

pub use rules::{normalize_mobile, MIN_PASSWORD_LEN};

use crate::fields::{Field, FieldErrors, FieldMap};
use crate::steps::StepDefinition;

/// Run the rule for a single field against the current field state.
///
/// Returns `None` for fields without rules (e.g. opt-in checkboxes).
pub fn validate_field(field: Field, fields: &FieldMap) -> Option<Result<(), String>> {
    let result = match field {
        Field::Email => rules::validate_email(fields.text(Field::Email)),
        Field::Password => rules::validate_password(fields.text(Field::Password)),
        Field::ConfirmPassword => rules::validate_password_confirmation(
            fields.text(Field::Password),
            fields.text(Field::ConfirmPassword),
        ),
        Field::FirstName => rules::validate_name("First name", fields.text(Field::FirstName)),
        Field::LastName => rules::validate_name("Last name", fields.text(Field::LastName)),
        Field::Mobile => rules::validate_mobile(fields.text(Field::Mobile)),
        Field::Province => rules::validate_selection("province", fields.text(Field::Province)),
        Field::City => rules::validate_selection("city", fields.text(Field::City)),
        Field::JourneyStage => {
            rules::validate_selection("journey stage", fields.text(Field::JourneyStage))
        }
        Field::MarketingOptIn => return None,
    };
    Some(result)
}

/// Validate all fields a step declares.
///
/// An empty map means the step passed.
pub fn validate_step(step: &StepDefinition, fields: &FieldMap) -> FieldErrors {
    step.fields
        .iter()
        .filter_map(|field| match validate_field(*field, fields) {
            Some(Err(message)) => Some((*field, message)),
            _ => None,
        })
        .collect()
}

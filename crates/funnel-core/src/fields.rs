//! Field names, values and the accumulated field state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Every field collected anywhere in the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
    FirstName,
    LastName,
    Mobile,
    Province,
    City,
    JourneyStage,
    MarketingOptIn,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Email,
        Field::Password,
        Field::ConfirmPassword,
        Field::FirstName,
        Field::LastName,
        Field::Mobile,
        Field::Province,
        Field::City,
        Field::JourneyStage,
        Field::MarketingOptIn,
    ];

    /// Wire name used by the presentation layer.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm_password",
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Mobile => "mobile",
            Field::Province => "province",
            Field::City => "city",
            Field::JourneyStage => "journey_stage",
            Field::MarketingOptIn => "marketing_opt_in",
        }
    }

    /// Value a field holds before the user touches it.
    pub fn default_value(&self) -> FieldValue {
        match self {
            Field::MarketingOptIn => FieldValue::Flag(false),
            _ => FieldValue::Text(String::new()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// A field value: free text (including selections) or a checkbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Text content, or empty for flags.
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Flag(_) => "",
        }
    }

    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => matches!(s.as_str(), "true" | "yes" | "1"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// Field name → inline error message.
pub type FieldErrors = BTreeMap<Field, String>;

/// Accumulated values for every field in the funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    values: BTreeMap<Field, FieldValue>,
}

impl FieldMap {
    /// All fields at their default values.
    pub fn new() -> Self {
        Self {
            values: Field::ALL
                .iter()
                .map(|f| (*f, f.default_value()))
                .collect(),
        }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        // Every field is seeded in `new`, so the lookup always hits.
        &self.values[&field]
    }

    pub fn text(&self, field: Field) -> &str {
        self.get(field).as_text()
    }

    pub fn flag(&self, field: Field) -> bool {
        self.get(field).as_flag()
    }

    /// Store a value, returning whether it differs from the previous one.
    pub fn set(&mut self, field: Field, value: FieldValue) -> bool {
        let changed = self.values.get(&field) != Some(&value);
        self.values.insert(field, value);
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &FieldValue)> {
        self.values.iter()
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::new()
    }
}

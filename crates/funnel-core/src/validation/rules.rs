//! Field-level validation rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 10;

/// Country prefix used for the canonical mobile form.
pub const MOBILE_COUNTRY_PREFIX: &str = "+63";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L} '-]+$").expect("valid name regex"));

// Optional +63 or trunk 0, then a ten-digit subscriber number starting with 9.
static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+63|0)?(9\d{9})$").expect("valid mobile regex"));

pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".into());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Please enter a valid email address".into());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".into());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), String> {
    if confirmation.is_empty() {
        return Err("Please confirm your password".into());
    }
    if password != confirmation {
        return Err("Passwords do not match".into());
    }
    Ok(())
}

/// `label` is the human name of the field, e.g. "First name".
pub fn validate_name(label: &str, name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("{} is required", label));
    }
    if !NAME_RE.is_match(name) {
        return Err(format!(
            "{} can only contain letters, spaces, hyphens and apostrophes",
            label
        ));
    }
    Ok(())
}

pub fn validate_mobile(mobile: &str) -> Result<(), String> {
    let compact = strip_whitespace(mobile);
    if compact.is_empty() {
        return Err("Mobile number is required".into());
    }
    if !MOBILE_RE.is_match(&compact) {
        return Err("Please enter a valid mobile number, e.g. 0917 123 4567".into());
    }
    Ok(())
}

pub fn validate_selection(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("Please select your {}", label));
    }
    Ok(())
}

/// Rewrite any accepted mobile shape into `+639XXXXXXXXX`.
///
/// Returns `None` if the input does not match the numbering plan.
pub fn normalize_mobile(mobile: &str) -> Option<String> {
    let compact = strip_whitespace(mobile);
    MOBILE_RE
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|subscriber| format!("{}{}", MOBILE_COUNTRY_PREFIX, subscriber.as_str()))
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

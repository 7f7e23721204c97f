//! Input validation utilities
//!
//! Field checks return `Result<(), String>` so they can be unit tested on
//! their own; payload validators collect every failure into
//! [`ValidationErrors`] instead of stopping at the first one.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;
use std::{fmt, sync::OnceLock};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const SPECIALIZATION_MAX: usize = 50;
pub const AGE_MAX: i64 = 150;
pub const EMAIL_MAX: usize = 100;
pub const PHONE_MAX: usize = 20;
pub const ADDRESS_MAX: usize = 500;
pub const NOTES_MAX: usize = 1000;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field rejected while validating one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a failure on exactly one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Record `result` against `field` if it failed
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    /// `Ok(value)` when nothing was recorded
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Trim an optional text field, mapping blank input to `None`
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

/// Validate a person's display name (already trimmed)
pub fn validate_name(name: &str) -> Result<(), String> {
    let length = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&length) {
        return Err(format!(
            "Name must be between {NAME_MIN} and {NAME_MAX} characters"
        ));
    }
    Ok(())
}

/// Validate a doctor's specialization (already trimmed)
pub fn validate_specialization(specialization: &str) -> Result<(), String> {
    let length = specialization.chars().count();
    if !(NAME_MIN..=SPECIALIZATION_MAX).contains(&length) {
        return Err(format!(
            "Specialization must be between {NAME_MIN} and {SPECIALIZATION_MAX} characters"
        ));
    }
    Ok(())
}

/// Validate a patient's age in whole years
pub fn validate_age(age: i64) -> Result<(), String> {
    if !(0..=AGE_MAX).contains(&age) {
        return Err(format!(
            "Age must be a valid number between 0 and {AGE_MAX}"
        ));
    }
    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > EMAIL_MAX {
        return Err(format!("Email must be at most {EMAIL_MAX} characters long"));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Email must be valid".to_string());
    }

    Ok(())
}

/// Validate phone
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.len() > PHONE_MAX {
        return Err(format!("Phone must be at most {PHONE_MAX} characters long"));
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 ()-]+$").expect("Failed to compile phone regex"));

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !regex.is_match(phone) || digits < 7 {
        return Err("Phone must be a valid phone number".to_string());
    }

    Ok(())
}

/// Validate the length of a free-text field
pub fn validate_max_len(value: &str, max: usize, label: &str) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{label} must be less than {max} characters"));
    }
    Ok(())
}

/// Validate a referenced row id
pub fn validate_reference(id: i64, label: &str) -> Result<(), String> {
    if id < 1 {
        return Err(format!("{label} must be a positive integer"));
    }
    Ok(())
}

/// Parse a calendar date in `YYYY-MM-DD` form
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Date must be valid (YYYY-MM-DD)".to_string())
}

/// Parse a 24h time of day in `HH:MM` form; seconds are always zero
pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    static TIME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TIME_REGEX.get_or_init(|| {
        Regex::new(r"^([0-1]?[0-9]|2[0-3]):([0-5][0-9])$").expect("Failed to compile time regex")
    });

    let invalid = || "Time must be valid (HH:MM)".to_string();
    let captures = regex.captures(value.trim()).ok_or_else(invalid)?;
    let hour = captures[1].parse().map_err(|_| invalid())?;
    let minute = captures[2].parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

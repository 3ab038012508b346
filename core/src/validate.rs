//! Field rules shared by entity drafts and patches.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};

/// Trim and require a non-empty value.
///
/// # Errors
///
/// [`ValidationError::Empty`] when only whitespace remains.
pub fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

/// Trim an optional value, collapsing blank strings to `None`.
#[must_use]
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalise an email address (trimmed, lower-cased) and check its shape.
///
/// # Errors
///
/// [`ValidationError::Empty`] or [`ValidationError::InvalidEmail`].
pub fn email(field: &'static str, value: String) -> Result<String, ValidationError> {
    let value = required(field, value)?.to_lowercase();
    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace) =>
        {
            Ok(value)
        }
        _ => Err(ValidationError::InvalidEmail { field }),
    }
}

/// Check an ISO-4217-shaped currency code and upper-case it.
///
/// # Errors
///
/// [`ValidationError::InvalidCurrency`] unless exactly three ASCII letters.
pub fn currency(field: &'static str, value: String) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(value.to_ascii_uppercase())
    } else {
        Err(ValidationError::InvalidCurrency { field })
    }
}

/// Require `end >= start`.
///
/// # Errors
///
/// [`ValidationError::EndBeforeStart`].
pub fn time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}

/// Trim every entry and drop blanks and duplicates, keeping first occurrence.
#[must_use]
pub fn tags(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|existing| existing == value) {
            out.push(value.to_string());
        }
    }
    out
}

// ABOUTME: Boundary validation for user-supplied fields
// ABOUTME: Rejects empty, oversized, malformed, or control-character input before storage is touched

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{
    DEFAULT_PAGE_SIZE, MAX_CHECKLIST_ITEM_LENGTH, MAX_NOTES_LENGTH, MAX_PAGE_SIZE,
    MAX_TAG_NAME_LENGTH, MAX_TITLE_LENGTH, MAX_TOKEN_NAME_LENGTH, START_DATE_FORMAT,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains control characters")]
    ControlCharacters { field: &'static str },

    #[error("too many {field} (maximum {max})")]
    TooMany { field: &'static str, max: usize },

    #[error("invalid {kind} ID format")]
    InvalidId { kind: &'static str },

    #[error("invalid start_date format: expected YYYY-MM-DD")]
    InvalidDate,

    #[error("{0}")]
    Invalid(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Fails when the value is empty after trimming whitespace
pub fn validate_not_empty(value: &str, field: &'static str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Fails when the value has more than `max` characters
pub fn validate_length(value: &str, field: &'static str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub fn validate_title(title: &str) -> ValidationResult<()> {
    validate_not_empty(title, "title")?;
    validate_length(title, "title", MAX_TITLE_LENGTH)
}

pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    validate_length(notes, "notes", MAX_NOTES_LENGTH)
}

pub fn validate_checklist_content(content: &str) -> ValidationResult<()> {
    validate_not_empty(content, "content")?;
    validate_length(content, "content", MAX_CHECKLIST_ITEM_LENGTH)
}

pub fn validate_token_name(name: &str) -> ValidationResult<()> {
    validate_not_empty(name, "name")?;
    validate_length(name, "name", MAX_TOKEN_NAME_LENGTH)
}

/// Validates a tag name and returns it trimmed.
///
/// Control characters (below 0x20 and DEL) are rejected so names stay printable.
pub fn normalize_tag_name(name: &str) -> ValidationResult<String> {
    let trimmed = name.trim();
    validate_not_empty(trimmed, "tag name")?;
    validate_length(trimmed, "tag name", MAX_TAG_NAME_LENGTH)?;
    if trimmed.chars().any(|c| (c as u32) < 32 || c as u32 == 127) {
        return Err(ValidationError::ControlCharacters { field: "tag name" });
    }
    Ok(trimmed.to_string())
}

/// Normalizes a list of tag names, dropping repeats while keeping first-seen order
pub fn normalize_tag_names(names: &[String], max: usize) -> ValidationResult<Vec<String>> {
    if names.len() > max {
        return Err(ValidationError::TooMany {
            field: "tag names",
            max,
        });
    }

    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = normalize_tag_name(name)?;
        if !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    Ok(normalized)
}

/// Parses a UUID string, reporting which kind of ID was malformed
pub fn parse_id(value: &str, kind: &'static str) -> ValidationResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidId { kind })
}

/// Parses an optional start date. An empty string means "no date".
pub fn parse_start_date(value: &str) -> ValidationResult<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, START_DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate)
}

/// Clamps a requested page size into (0, MAX_PAGE_SIZE], falling back to the default
pub fn clamp_page_size(requested: i64) -> u32 {
    if requested <= 0 || requested > i64::from(MAX_PAGE_SIZE) {
        DEFAULT_PAGE_SIZE
    } else {
        requested as u32
    }
}

//! Field rules shared by the action forms.
//!
//! Forms arrive as plain strings. Each form trims itself, runs its
//! `validator` schema, and only then converts into the typed service input
//! using the same parsers the schema checked with.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

use super::{ActionError, ActionResult};
use crate::models::{Language, TaskStatus, Theme, WeeklyTaskStatus};
use crate::week::parse_day;

pub const TITLE_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field:   String,
    pub message: String,
}

/// Flatten validator output to one message per field, sorted by field name.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| FieldError {
                field:   field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Convert a parse failure after validation into a one-field validation error.
pub fn parsed<T>(field: &str, result: Result<T, ValidationError>) -> ActionResult<T> {
    result.map_err(|err| {
        ActionError::validation(vec![FieldError {
            field:   field.to_string(),
            message: err.message.map(|m| m.to_string()).unwrap_or_else(|| "Invalid value".into()),
        }])
    })
}

// ── Normalizing ──────────────────────────────────────────────

pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

/// Empty means "not provided".
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

/// Remove script/style blocks with their content, then every remaining tag.
pub fn strip_markup(input: &str) -> String {
    let mut text = input.to_owned();
    for tag in ["script", "style"] {
        text = remove_blocks(&text, tag);
    }
    remove_tags(&text)
}

fn remove_blocks(input: &str, tag: &str) -> String {
    // ASCII lowercasing keeps byte offsets identical to `input`.
    let lower = input.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open).map(|i| i + pos) {
        out.push_str(&input[pos..start]);
        pos = match lower[start..].find(&close).map(|i| i + start) {
            Some(end) => lower[end..].find('>').map_or(input.len(), |gt| end + gt + 1),
            None => input.len(),
        };
    }
    out.push_str(&input[pos..]);
    out
}

fn remove_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_tag = false;
    while let Some(c) = chars.next() {
        if in_tag {
            if c == '>' {
                in_tag = false;
            }
            continue;
        }
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == '/' || *next == '!');
        if opens_tag {
            in_tag = true;
        } else {
            out.push(c);
        }
    }
    out
}

// ── Parsers (shared by schema and conversion) ────────────────

pub fn parse_priority(raw: &str) -> Result<i32, ValidationError> {
    if raw.is_empty() {
        return Err(invalid("required", "Priority is required"));
    }
    let value: i32 = raw
        .parse()
        .map_err(|_| invalid("integer", "Priority must be a whole number"))?;
    if !(1..=3).contains(&value) {
        return Err(invalid("range", "Priority must be 1, 2 or 3"));
    }
    Ok(value)
}

pub fn parse_deadline(raw: &str) -> Result<NaiveDate, ValidationError> {
    parse_day(raw).ok_or_else(|| invalid("date", "Deadline must be a valid date"))
}

pub fn parse_week_start(raw: &str) -> Result<NaiveDate, ValidationError> {
    parse_day(raw).ok_or_else(|| invalid("date", "Week start date must be a valid date"))
}

/// Empty input means "not provided".
fn parse_choice<T: FromStr>(raw: &str, message: &'static str) -> Result<Option<T>, ValidationError> {
    if raw.is_empty() {
        return Ok(None);
    }
    T::from_str(raw).map(Some).map_err(|_| invalid("choice", message))
}

pub fn parse_task_status(raw: &str) -> Result<Option<TaskStatus>, ValidationError> {
    parse_choice(raw, "Status must be one of: active, incomplete, completed")
}

pub fn parse_weekly_status(raw: &str) -> Result<Option<WeeklyTaskStatus>, ValidationError> {
    parse_choice(raw, "Status must be one of: pending, in_progress, completed")
}

pub fn parse_language(raw: &str) -> Result<Option<Language>, ValidationError> {
    parse_choice(raw, "Language must be one of: en, de")
}

pub fn parse_theme(raw: &str) -> Result<Option<Theme>, ValidationError> {
    parse_choice(raw, "Theme must be one of: light, dark, system")
}

// ── Custom schema rules ──────────────────────────────────────

pub fn validate_title(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Title is required"));
    }
    if value.chars().count() > TITLE_MAX {
        return Err(invalid("length", "Title must be at most 200 characters"));
    }
    Ok(())
}

pub fn validate_priority(value: &str) -> Result<(), ValidationError> {
    parse_priority(value).map(|_| ())
}

pub fn validate_deadline(value: &str) -> Result<(), ValidationError> {
    parse_deadline(value).map(|_| ())
}

pub fn validate_week_start(value: &str) -> Result<(), ValidationError> {
    parse_week_start(value).map(|_| ())
}

pub fn validate_task_status(value: &str) -> Result<(), ValidationError> {
    parse_task_status(value).map(|_| ())
}

pub fn validate_weekly_status(value: &str) -> Result<(), ValidationError> {
    parse_weekly_status(value).map(|_| ())
}

pub fn validate_language(value: &str) -> Result<(), ValidationError> {
    parse_language(value).map(|_| ())
}

pub fn validate_theme(value: &str) -> Result<(), ValidationError> {
    parse_theme(value).map(|_| ())
}

/// Status fields that must be present (the dedicated status actions).
pub fn validate_required_task_status(value: &str) -> Result<(), ValidationError> {
    match parse_task_status(value)? {
        Some(_) => Ok(()),
        None => Err(invalid("required", "Status is required")),
    }
}

pub fn validate_required_weekly_status(value: &str) -> Result<(), ValidationError> {
    match parse_weekly_status(value)? {
        Some(_) => Ok(()),
        None => Err(invalid("required", "Status is required")),
    }
}

//! Intake form validation.
//!
//! [`validate`] checks every field independently and collects all problems,
//! so the form can highlight everything in one round trip. It is pure: no I/O,
//! no clock. Server-side defaults (`id`, `timestamp`) are filled in by the
//! caller before validation, see [`with_submission_defaults`].

pub mod fields;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{is_safe_identifier, HealthRecord};
use fields::{
    BLANK_OPTION_MESSAGE, EMPTY_SELECTION_MESSAGE, NUMERIC_FIELDS, OPTIONAL_SELECTION_FIELD,
    REQUIRED_SELECTION_FIELDS, REQUIRED_TEXT_FIELDS,
};

/// Key used when the input cannot be checked field by field.
pub const GENERAL_ERROR_KEY: &str = "general";
pub const GENERAL_ERROR_MESSAGE: &str = "An unexpected error occurred during validation";

const REQUIRED_MESSAGE: &str = "Required";

/// Field name → messages. Fields are keyed by name; each list keeps check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn general() -> Self {
        let mut errors = Self::default();
        errors.push(GENERAL_ERROR_KEY, GENERAL_ERROR_MESSAGE);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(HealthRecord),
    Invalid(ValidationErrors),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_result(self) -> Result<HealthRecord, ValidationErrors> {
        match self {
            Validation::Valid(record) => Ok(record),
            Validation::Invalid(errors) => Err(errors),
        }
    }
}

/// Validates a raw submission and, on success, returns it as a typed record.
///
/// Numeric answers stay strings in the returned record; only their range is
/// checked here.
///
/// `id` and `timestamp` are required at this layer because they key the
/// stored record. Form submissions do not carry them; run the input through
/// [`with_submission_defaults`] first.
pub fn validate(raw: &Value) -> Validation {
    let Some(fields) = raw.as_object() else {
        return Validation::Invalid(ValidationErrors::general());
    };

    let mut errors = ValidationErrors::default();

    check_identifier(fields, &mut errors);
    check_timestamp(fields, &mut errors);

    for field in NUMERIC_FIELDS.iter() {
        if let Some(value) = text_field(fields, field.key, &mut errors) {
            if !field.accepts(value) {
                errors.push(field.key, field.message);
            }
        }
    }

    for (key, label) in REQUIRED_TEXT_FIELDS {
        if let Some(value) = text_field(fields, key, &mut errors) {
            if value.is_empty() {
                errors.push(key, format!("{label} is required"));
            }
        }
    }

    for key in REQUIRED_SELECTION_FIELDS {
        if let Some(tags) = selection_field(fields, key, &mut errors) {
            if tags == 0 {
                errors.push(key, EMPTY_SELECTION_MESSAGE);
            }
        }
    }

    if fields.contains_key(OPTIONAL_SELECTION_FIELD) {
        selection_field(fields, OPTIONAL_SELECTION_FIELD, &mut errors);
    }

    if !errors.is_empty() {
        return Validation::Invalid(errors);
    }

    match HealthRecord::from_fields(fields.clone()) {
        Ok(record) => Validation::Valid(record),
        Err(_) => Validation::Invalid(ValidationErrors::general()),
    }
}

/// Fills the server-assigned fields a client may leave out: a v4 `id` and
/// the submission `timestamp`. Existing values are kept untouched.
pub fn with_submission_defaults(mut raw: Value, now: DateTime<Utc>) -> Value {
    if let Some(fields) = raw.as_object_mut() {
        if !fields.contains_key("id") {
            fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        if !fields.contains_key("timestamp") {
            fields.insert("timestamp".into(), Value::String(now.to_rfc3339()));
        }
    }
    raw
}

fn check_identifier(fields: &Map<String, Value>, errors: &mut ValidationErrors) {
    if let Some(id) = text_field(fields, "id", errors) {
        if id.is_empty() {
            errors.push("id", "Identifier is required");
        } else if !is_safe_identifier(id) {
            errors.push("id", "Identifier contains invalid characters");
        }
    }
}

fn check_timestamp(fields: &Map<String, Value>, errors: &mut ValidationErrors) {
    if let Some(timestamp) = text_field(fields, "timestamp", errors) {
        if DateTime::parse_from_rfc3339(timestamp).is_err() {
            errors.push("timestamp", "Timestamp must be an ISO 8601 date-time");
        }
    }
}

/// Returns the string value of `key`, recording a type or presence error otherwise.
fn text_field<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match fields.get(key) {
        None => {
            errors.push(key, REQUIRED_MESSAGE);
            None
        }
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            errors.push(key, format!("Expected string, received {}", json_type(other)));
            None
        }
    }
}

/// Returns the tag count of a multi-select answer when every element is a
/// non-blank string. Absence is spelled with the "None" tag, never an empty one.
fn selection_field(
    fields: &Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<usize> {
    match fields.get(key) {
        None => {
            errors.push(key, REQUIRED_MESSAGE);
            None
        }
        Some(Value::Array(items)) => {
            let mut well_formed = true;
            for item in items {
                match item {
                    Value::String(tag) if tag.trim().is_empty() => {
                        errors.push(key, BLANK_OPTION_MESSAGE);
                        well_formed = false;
                    }
                    Value::String(_) => {}
                    other => {
                        errors.push(key, format!("Expected string, received {}", json_type(other)));
                        well_formed = false;
                    }
                }
            }
            well_formed.then_some(items.len())
        }
        Some(other) => {
            errors.push(key, format!("Expected array, received {}", json_type(other)));
            None
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

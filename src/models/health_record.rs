//! Health-survey submission model.
//!
//! A record is a fixed typed core plus an open `extra` map. Keys that are not
//! part of the core (for example the `height` in centimetres added by the form)
//! land in `extra` and are written back out unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag used inside a multi-select field to record an explicit "none of the above".
pub const NONE_SENTINEL: &str = "None";

/// JSON keys of the multi-select fields, stored as comma-joined cells in the workbook.
pub const LIST_FIELDS: [&str; 3] = ["exerciseTypes", "familyHistory", "existingConditions"];

const MAX_ID_LENGTH: usize = 255;

/// Identifiers double as file names in the record store, so they must be a
/// single, non-special path component.
pub fn is_safe_identifier(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id != "."
        && id != ".."
        && !id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub age: String,
    pub gender: String,
    pub weight: String,
    pub height_feet: String,
    pub height_inches: String,
    pub exercise_frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_types: Option<Vec<String>>,
    pub sleep_hours: String,
    pub sleep_quality: String,
    pub diet_type: String,
    pub water_intake: String,
    pub stress_level: String,
    pub smoking_status: String,
    pub alcohol_consumption: String,
    pub anxiety_frequency: String,
    pub depression_frequency: String,
    pub social_connections: String,
    pub work_life_balance: String,
    pub mindfulness_practice: String,
    pub blood_pressure: String,
    pub cholesterol_levels: String,
    pub blood_sugar_level: String,
    pub family_history: Vec<String>,
    pub existing_conditions: Vec<String>,
    /// Untyped key/value pairs that accompanied the submission.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthRecord {
    /// Flattens the record into a JSON object whose key order is the core
    /// field order followed by the extension keys in insertion order.
    pub fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            // A struct always serializes to an object.
            other => Err(serde::ser::Error::custom(format!(
                "record serialized to non-object {other}"
            ))),
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(fields))
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::HealthRecord;
use crate::validation::fields::parse_number;

const CM_PER_FOOT: f64 = 30.48;
const CM_PER_INCH: f64 = 2.54;

/// Extension key the intake form fills with the height in centimetres.
const HEIGHT_CM_KEY: &str = "height";

/// Converts a feet/inches answer to whole centimetres.
///
/// Each part is read as a leading integer ("5.9" is 5); anything without one
/// counts as 0.
pub fn height_cm(feet: &str, inches: &str) -> u32 {
    let feet = leading_integer(feet).unwrap_or(0) as f64;
    let inches = leading_integer(inches).unwrap_or(0) as f64;
    let cm = feet * CM_PER_FOOT + inches * CM_PER_INCH;
    cm.round().max(0.0) as u32
}

/// Body-mass index, or `None` when either measurement is not positive.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !(weight_kg > 0.0 && height_cm > 0.0) {
        return None;
    }
    let meters = height_cm / 100.0;
    Some(weight_kg / (meters * meters))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub height_cm: u32,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
}

impl DerivedMetrics {
    pub fn from_record(record: &HealthRecord) -> Self {
        let height = height_cm(&record.height_feet, &record.height_inches);
        let bmi = parse_number(&record.weight).and_then(|weight| bmi(weight, f64::from(height)));
        Self {
            height_cm: height,
            bmi,
            bmi_category: bmi.map(BmiCategory::from_bmi),
        }
    }
}

/// A record with its numeric answers converted for analysis and export.
/// Unparsable numbers become 0; every other answer is carried as submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub age: f64,
    pub gender: String,
    pub weight: f64,
    pub height_feet: String,
    pub height_inches: String,
    /// Centimetres.
    pub height: f64,
    pub exercise_frequency: String,
    pub exercise_types: Vec<String>,
    pub sleep_hours: f64,
    pub sleep_quality: String,
    pub diet_type: String,
    pub water_intake: String,
    pub stress_level: f64,
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
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessedRecord {
    pub fn from_record(record: &HealthRecord) -> Self {
        let mut extra = record.extra.clone();
        let height = match extra.remove(HEIGHT_CM_KEY) {
            Some(value) => number_or_zero(&value),
            None => f64::from(height_cm(&record.height_feet, &record.height_inches)),
        };

        Self {
            id: record.id.clone(),
            timestamp: record.timestamp,
            age: text_or_zero(&record.age),
            gender: record.gender.clone(),
            weight: text_or_zero(&record.weight),
            height_feet: record.height_feet.clone(),
            height_inches: record.height_inches.clone(),
            height,
            exercise_frequency: record.exercise_frequency.clone(),
            exercise_types: record.exercise_types.clone().unwrap_or_default(),
            sleep_hours: text_or_zero(&record.sleep_hours),
            sleep_quality: record.sleep_quality.clone(),
            diet_type: record.diet_type.clone(),
            water_intake: record.water_intake.clone(),
            stress_level: text_or_zero(&record.stress_level),
            smoking_status: record.smoking_status.clone(),
            alcohol_consumption: record.alcohol_consumption.clone(),
            anxiety_frequency: record.anxiety_frequency.clone(),
            depression_frequency: record.depression_frequency.clone(),
            social_connections: record.social_connections.clone(),
            work_life_balance: record.work_life_balance.clone(),
            mindfulness_practice: record.mindfulness_practice.clone(),
            blood_pressure: record.blood_pressure.clone(),
            cholesterol_levels: record.cholesterol_levels.clone(),
            blood_sugar_level: record.blood_sugar_level.clone(),
            family_history: record.family_history.clone(),
            existing_conditions: record.existing_conditions.clone(),
            extra,
        }
    }

    /// Flattened to one export row, keys in serialization order.
    pub fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(serde::ser::Error::custom("processed record is not an object")),
        }
    }
}

fn text_or_zero(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

fn number_or_zero(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()).unwrap_or(0.0),
        Value::String(text) => text_or_zero(text),
        _ => 0.0,
    }
}

/// The optionally signed run of digits at the start of `raw`, after leading
/// whitespace.
pub(super) fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

/// The longest decimal number at the start of `raw` ("7.5 hours" is 7.5).
pub(super) fn leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !matches!(c, '0'..='9' | '.' | '+' | '-' | 'e' | 'E'))
        .unwrap_or(trimmed.len());
    (1..=end)
        .rev()
        .filter_map(|len| trimmed.get(..len))
        .find_map(|prefix| prefix.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_record;
    use serde_json::json;

    #[test]
    fn height_from_feet_and_inches() {
        assert_eq!(height_cm("5", "9"), 175);
        assert_eq!(height_cm("6", "0"), 183);
        assert_eq!(height_cm("5.9", "11.5"), 180);
        assert_eq!(height_cm("", "abc"), 0);
        assert_eq!(height_cm(" 5ft", "2in"), 157);
    }

    #[test]
    fn leading_integer_matches_form_parsing() {
        assert_eq!(leading_integer("42"), Some(42));
        assert_eq!(leading_integer("  7 inches"), Some(7));
        assert_eq!(leading_integer("-3"), Some(-3));
        assert_eq!(leading_integer(".5"), None);
        assert_eq!(leading_integer(""), None);
    }

    #[test]
    fn leading_float_reads_number_prefix() {
        assert_eq!(leading_float("7.5"), Some(7.5));
        assert_eq!(leading_float(" 6 hours"), Some(6.0));
        assert_eq!(leading_float("1e2x"), Some(100.0));
        assert_eq!(leading_float("5."), Some(5.0));
        assert_eq!(leading_float("1e"), Some(1.0));
        assert_eq!(leading_float("about 7"), None);
        assert_eq!(leading_float(""), None);
    }

    #[test]
    fn bmi_categories() {
        let value = bmi(70.0, 175.0).unwrap();
        assert!((value - 22.857).abs() < 0.001);
        assert_eq!(BmiCategory::from_bmi(value), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
        assert_eq!(bmi(70.0, 0.0), None);
        assert_eq!(bmi(0.0, 175.0), None);
    }

    #[test]
    fn derived_metrics_for_sample() {
        let metrics = DerivedMetrics::from_record(&sample_record("a"));
        assert_eq!(metrics.height_cm, 175);
        assert_eq!(metrics.bmi_category, Some(BmiCategory::Normal));

        let serialized = serde_json::to_value(&metrics).unwrap();
        assert_eq!(serialized["heightCm"], json!(175));
        assert_eq!(serialized["bmiCategory"], json!("normal"));
    }

    #[test]
    fn processed_record_prefers_submitted_height() {
        let mut record = sample_record("a");
        assert_eq!(ProcessedRecord::from_record(&record).height, 175.0);

        record.extra.insert("height".into(), json!("180"));
        assert_eq!(ProcessedRecord::from_record(&record).height, 180.0);

        record.extra.insert("height".into(), json!(172.5));
        assert_eq!(ProcessedRecord::from_record(&record).height, 172.5);

        record.extra.insert("height".into(), json!("tall"));
        assert_eq!(ProcessedRecord::from_record(&record).height, 0.0);
    }

    #[test]
    fn processed_record_carries_every_answer() {
        let mut record = sample_record("a");
        record.extra.insert("height".into(), json!("180"));
        record.extra.insert("referral".into(), json!("clinic"));

        let fields = ProcessedRecord::from_record(&record).to_fields().unwrap();
        let mut expected: Vec<String> = record.to_fields().unwrap().keys().cloned().collect();
        expected.retain(|key| key != "height" && key != "referral");
        let after_inches = expected.iter().position(|key| key == "heightInches").unwrap() + 1;
        expected.insert(after_inches, "height".into());
        expected.push("referral".into());

        let keys: Vec<&String> = fields.keys().collect();
        assert_eq!(keys, expected.iter().collect::<Vec<_>>());
        assert_eq!(fields["height"], json!(180.0));
        assert_eq!(fields["sleepHours"], json!(7.0));
        assert_eq!(fields["waterIntake"], json!("2-3-liters"));
        assert_eq!(fields["referral"], json!("clinic"));
        assert_eq!(fields["timestamp"], json!("2024-05-01T10:30:00Z"));
    }

    #[test]
    fn processed_record_zeroes_unparsable_numbers() {
        let mut record = sample_record("a");
        record.age = "unknown".into();
        record.exercise_types = None;

        let processed = ProcessedRecord::from_record(&record);
        assert_eq!(processed.age, 0.0);
        assert_eq!(processed.weight, 70.0);
        assert_eq!(processed.stress_level, 4.0);
        assert!(processed.exercise_types.is_empty());
    }
}

//! Field tables for the intake form.

/// Inclusive or exclusive bound on a numeric answer.
#[derive(Debug, Clone, Copy)]
pub enum Bound {
    Inclusive(f64),
    Exclusive(f64),
}

impl Bound {
    fn allows_above(self, value: f64) -> bool {
        match self {
            Bound::Inclusive(limit) => value >= limit,
            Bound::Exclusive(limit) => value > limit,
        }
    }

    fn allows_below(self, value: f64) -> bool {
        match self {
            Bound::Inclusive(limit) => value <= limit,
            Bound::Exclusive(limit) => value < limit,
        }
    }
}

/// A string-typed answer that must parse as a number inside `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct NumericField {
    pub key: &'static str,
    pub min: Bound,
    pub max: Bound,
    pub message: &'static str,
}

impl NumericField {
    pub fn accepts(&self, raw: &str) -> bool {
        parse_number(raw)
            .map(|value| self.min.allows_above(value) && self.max.allows_below(value))
            .unwrap_or(false)
    }
}

pub const NUMERIC_FIELDS: [NumericField; 6] = [
    NumericField {
        key: "age",
        min: Bound::Inclusive(0.0),
        max: Bound::Inclusive(120.0),
        message: "Age must be a positive number between 0 and 120",
    },
    NumericField {
        key: "weight",
        min: Bound::Exclusive(0.0),
        max: Bound::Inclusive(500.0),
        message: "Weight must be a positive number (in kg)",
    },
    NumericField {
        key: "heightFeet",
        min: Bound::Inclusive(0.0),
        max: Bound::Inclusive(10.0),
        message: "Height (feet) must be a positive number between 0 and 10",
    },
    NumericField {
        key: "heightInches",
        min: Bound::Inclusive(0.0),
        max: Bound::Exclusive(12.0),
        message: "Height (inches) must be a number between 0 and 11",
    },
    NumericField {
        key: "sleepHours",
        min: Bound::Inclusive(0.0),
        max: Bound::Inclusive(24.0),
        message: "Sleep hours must be a positive number between 0 and 24",
    },
    NumericField {
        key: "stressLevel",
        min: Bound::Inclusive(1.0),
        max: Bound::Inclusive(10.0),
        message: "Stress level must be a number between 1 and 10",
    },
];

/// Single-select answers that only need to be present: (key, label).
pub const REQUIRED_TEXT_FIELDS: [(&str, &str); 15] = [
    ("gender", "Gender"),
    ("exerciseFrequency", "Exercise frequency"),
    ("sleepQuality", "Sleep quality"),
    ("dietType", "Diet type"),
    ("waterIntake", "Water intake"),
    ("smokingStatus", "Smoking status"),
    ("alcoholConsumption", "Alcohol consumption"),
    ("anxietyFrequency", "Anxiety frequency"),
    ("depressionFrequency", "Depression frequency"),
    ("socialConnections", "Social connections"),
    ("workLifeBalance", "Work-life balance"),
    ("mindfulnessPractice", "Mindfulness practice"),
    ("bloodPressure", "Blood pressure"),
    ("cholesterolLevels", "Cholesterol levels"),
    ("bloodSugarLevel", "Blood sugar level"),
];

/// Multi-select answers that need at least one tag.
pub const REQUIRED_SELECTION_FIELDS: [&str; 2] = ["familyHistory", "existingConditions"];

pub const OPTIONAL_SELECTION_FIELD: &str = "exerciseTypes";

pub const EMPTY_SELECTION_MESSAGE: &str =
    "Please select at least one option or 'None of the above'";

pub const BLANK_OPTION_MESSAGE: &str = "Options must not be blank";

/// Parses a form answer as a finite decimal number.
///
/// Surrounding whitespace is ignored; blank input does not parse.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

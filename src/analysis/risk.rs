//! Heuristic risk scores for six health areas.
//!
//! Each area starts at 0, adds or subtracts points per answer and is clamped
//! to `[5, cap]`. Up to five contributing factors are reported per area, in
//! the order they were found.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::metrics::{self, leading_float, leading_integer};
use crate::models::{HealthRecord, NONE_SENTINEL};

const MIN_RISK: i32 = 5;
const MAX_FACTORS: usize = 5;

const CARDIOVASCULAR_CAP: i32 = 85;
const METABOLIC_CAP: i32 = 80;
const SLEEP_CAP: i32 = 75;
const MENTAL_CAP: i32 = 80;
const IMMUNE_CAP: i32 = 75;
const CHRONIC_CAP: i32 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Impact {
    #[serde(rename = "High negative impact")]
    HighNegative,
    #[serde(rename = "Medium negative impact")]
    MediumNegative,
    #[serde(rename = "Low negative impact")]
    LowNegative,
    #[serde(rename = "High positive impact")]
    HighPositive,
    #[serde(rename = "Medium positive impact")]
    MediumPositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    Immediate,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Evidence {
    Strong,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskFactor {
    pub name: &'static str,
    pub impact: Impact,
    pub suggestion: &'static str,
    pub timeframe: Timeframe,
    pub difficulty: Difficulty,
    pub evidence: Evidence,
    pub details: &'static str,
}

const fn factor(
    name: &'static str,
    impact: Impact,
    suggestion: &'static str,
    timeframe: Timeframe,
    difficulty: Difficulty,
    evidence: Evidence,
    details: &'static str,
) -> RiskFactor {
    RiskFactor {
        name,
        impact,
        suggestion,
        timeframe,
        difficulty,
        evidence,
        details,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn from_score(score: i32) -> Self {
        if score < 25 {
            RiskLevel::Low
        } else if score < 50 {
            RiskLevel::Moderate
        } else if score < 75 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub risk: i32,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskPredictions {
    pub cardiovascular: RiskAssessment,
    pub metabolic: RiskAssessment,
    pub sleep: RiskAssessment,
    pub mental: RiskAssessment,
    pub immune: RiskAssessment,
    pub chronic: RiskAssessment,
}

impl RiskPredictions {
    pub fn assess(profile: &RiskProfile) -> Self {
        let bmi = profile.bmi();
        Self {
            cardiovascular: cardiovascular(profile, bmi),
            metabolic: metabolic(profile, bmi),
            sleep: sleep(profile, bmi),
            mental: mental(profile),
            immune: immune(profile, bmi),
            chronic: chronic(profile, bmi),
        }
    }

    /// Rounded mean of the six area scores.
    pub fn overall(&self) -> i32 {
        let scores = [
            self.cardiovascular.risk,
            self.metabolic.risk,
            self.sleep.risk,
            self.mental.risk,
            self.immune.risk,
            self.chronic.risk,
        ];
        let total: i32 = scores.iter().sum();
        (f64::from(total) / scores.len() as f64).round() as i32
    }
}

/// The answers the scores read. Numbers may arrive as JSON numbers or text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskProfile {
    #[serde(deserialize_with = "text")]
    pub age: String,
    #[serde(deserialize_with = "text")]
    pub gender: String,
    #[serde(deserialize_with = "text")]
    pub weight: String,
    /// Centimetres.
    #[serde(deserialize_with = "text")]
    pub height: String,
    #[serde(deserialize_with = "text")]
    pub height_feet: String,
    #[serde(deserialize_with = "text")]
    pub height_inches: String,
    #[serde(deserialize_with = "text")]
    pub sleep_hours: String,
    #[serde(deserialize_with = "text")]
    pub sleep_quality: String,
    #[serde(deserialize_with = "text")]
    pub stress_level: String,
    #[serde(deserialize_with = "text")]
    pub anxiety_level: String,
    #[serde(deserialize_with = "text")]
    pub exercise_frequency: String,
    #[serde(deserialize_with = "text")]
    pub diet_type: String,
    #[serde(deserialize_with = "text")]
    pub smoking_status: String,
    #[serde(deserialize_with = "text")]
    pub alcohol_consumption: String,
    #[serde(deserialize_with = "text")]
    pub blood_pressure: String,
    #[serde(deserialize_with = "text")]
    pub cholesterol_levels: String,
    #[serde(deserialize_with = "text")]
    pub blood_sugar_level: String,
    #[serde(deserialize_with = "text")]
    pub screen_time: String,
    #[serde(deserialize_with = "text")]
    pub last_checkup: String,
    #[serde(deserialize_with = "tags")]
    pub family_history: Vec<String>,
    #[serde(deserialize_with = "tags")]
    pub existing_conditions: Vec<String>,
}

impl RiskProfile {
    /// Profile of a stored submission. The optional answers the survey does
    /// not type (`height`, `anxietyLevel`, `screenTime`, `lastCheckup`) are
    /// taken from its extension fields.
    pub fn from_record(record: &HealthRecord) -> Self {
        let extension = |key: &str| match record.extra.get(key) {
            Some(value) => value_text(value),
            None => String::new(),
        };

        Self {
            age: record.age.clone(),
            gender: record.gender.clone(),
            weight: record.weight.clone(),
            height: extension("height"),
            height_feet: record.height_feet.clone(),
            height_inches: record.height_inches.clone(),
            sleep_hours: record.sleep_hours.clone(),
            sleep_quality: record.sleep_quality.clone(),
            stress_level: record.stress_level.clone(),
            anxiety_level: extension("anxietyLevel"),
            exercise_frequency: record.exercise_frequency.clone(),
            diet_type: record.diet_type.clone(),
            smoking_status: record.smoking_status.clone(),
            alcohol_consumption: record.alcohol_consumption.clone(),
            blood_pressure: record.blood_pressure.clone(),
            cholesterol_levels: record.cholesterol_levels.clone(),
            blood_sugar_level: record.blood_sugar_level.clone(),
            screen_time: extension("screenTime"),
            last_checkup: extension("lastCheckup"),
            family_history: record.family_history.clone(),
            existing_conditions: record.existing_conditions.clone(),
        }
    }

    /// Age, gender, weight and some height answer are all present.
    pub fn has_required_fields(&self) -> bool {
        let present = |raw: &str| !raw.trim().is_empty();
        present(&self.age)
            && present(&self.gender)
            && present(&self.weight)
            && (present(&self.height) || present(&self.height_feet))
    }

    /// `height` in centimetres, else the feet/inches answer converted.
    pub fn height_cm(&self) -> Option<f64> {
        if !self.height.trim().is_empty() {
            return leading_float(&self.height);
        }
        let cm = metrics::height_cm(&self.height_feet, &self.height_inches);
        (cm > 0).then(|| f64::from(cm))
    }

    pub fn bmi(&self) -> Option<f64> {
        metrics::bmi(leading_float(&self.weight)?, self.height_cm()?)
    }

    fn age(&self) -> Option<i64> {
        leading_integer(&self.age)
    }

    fn stress(&self) -> Option<i64> {
        leading_integer(&self.stress_level)
    }

    fn sleep_hours(&self) -> Option<f64> {
        leading_float(&self.sleep_hours)
    }

    fn exercises_regularly(&self) -> bool {
        matches!(self.exercise_frequency.as_str(), "daily" | "4-6-times-week")
    }

    fn is_inactive(&self) -> bool {
        matches!(self.exercise_frequency.as_str(), "rarely" | "never")
    }

    fn smokes(&self) -> bool {
        matches!(self.smoking_status.as_str(), "regular" | "occasional")
    }

    fn eats_well(&self) -> bool {
        matches!(self.diet_type.as_str(), "mediterranean" | "vegetarian")
    }

    fn diabetic_sugar(&self) -> bool {
        matches!(self.blood_sugar_level.as_str(), "126+" | "200+")
    }

    fn prediabetic_sugar(&self) -> bool {
        matches!(self.blood_sugar_level.as_str(), "101-125" | "140-199")
    }

    fn poor_sleep(&self) -> bool {
        matches!(self.sleep_quality.as_str(), "poor" | "very-poor")
    }

    fn high_cholesterol(&self) -> bool {
        matches!(self.cholesterol_levels.as_str(), "high" | "very-high")
    }

    fn family_has(&self, condition: &str) -> bool {
        self.family_history.iter().any(|tag| tag == condition)
    }

    fn has_condition(&self, condition: &str) -> bool {
        self.existing_conditions.iter().any(|tag| tag == condition)
    }
}

fn is_none_tag(tag: &str) -> bool {
    tag.eq_ignore_ascii_case(NONE_SENTINEL)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_text(&Value::deserialize(deserializer)?))
}

fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Default)]
struct Tally {
    risk: i32,
    factors: Vec<RiskFactor>,
}

impl Tally {
    fn add(&mut self, points: i32) {
        self.risk += points;
    }

    fn flag(&mut self, points: i32, factor: RiskFactor) {
        self.risk += points;
        self.factors.push(factor);
    }

    fn finish(mut self, cap: i32) -> RiskAssessment {
        let risk = self.risk.min(cap).max(MIN_RISK);
        self.factors.truncate(MAX_FACTORS);
        RiskAssessment {
            risk,
            level: RiskLevel::from_score(risk),
            factors: self.factors,
        }
    }
}

fn at_least(value: Option<i64>, bound: i64) -> bool {
    value.is_some_and(|value| value >= bound)
}

fn bmi_at_least(bmi: Option<f64>, bound: f64) -> bool {
    bmi.is_some_and(|bmi| bmi >= bound)
}

fn cardiovascular(profile: &RiskProfile, bmi: Option<f64>) -> RiskAssessment {
    let mut tally = Tally::default();
    let age = profile.age();

    if at_least(age, 65) {
        tally.flag(25, factor(
            "Advanced Age",
            Impact::HighNegative,
            "Regular cardiovascular monitoring and preventive care are essential at your age",
            Timeframe::Immediate,
            Difficulty::Easy,
            Evidence::Strong,
            "Age is the strongest predictor of cardiovascular disease. After 65, risk increases significantly due to arterial stiffening and accumulated damage.",
        ));
    } else if at_least(age, 55) {
        tally.flag(15, factor(
            "Age-Related Risk",
            Impact::MediumNegative,
            "Begin more frequent cardiovascular health monitoring",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Cardiovascular risk begins to increase significantly after age 55, making prevention strategies more important.",
        ));
    } else if at_least(age, 45) {
        tally.add(8);
    }

    if profile.gender == "male" && at_least(age, 45) {
        tally.flag(8, factor(
            "Male Gender Risk",
            Impact::MediumNegative,
            "Men have higher cardiovascular risk at younger ages - focus on prevention",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Men develop cardiovascular disease 7-10 years earlier than women on average, making early prevention crucial.",
        ));
    } else if profile.gender == "female" && at_least(age, 55) {
        tally.flag(6, factor(
            "Post-Menopausal Risk",
            Impact::MediumNegative,
            "Post-menopausal women have increased cardiovascular risk - discuss hormone therapy with your doctor",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "After menopause, women's cardiovascular risk increases due to hormonal changes affecting cholesterol and blood pressure.",
        ));
    }

    if bmi_at_least(bmi, 35.0) {
        tally.flag(15, factor(
            "Severe Obesity",
            Impact::HighNegative,
            "Urgent weight management needed - consider medical supervision for weight loss",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Severe obesity (BMI ≥35) significantly increases cardiovascular risk through multiple mechanisms including hypertension, diabetes, and inflammation.",
        ));
    } else if bmi_at_least(bmi, 30.0) {
        tally.flag(10, factor(
            "Obesity",
            Impact::MediumNegative,
            "Aim for 5-10% weight reduction through diet and exercise",
            Timeframe::MediumTerm,
            Difficulty::Challenging,
            Evidence::Strong,
            "Even modest weight loss of 5-10% can significantly reduce cardiovascular risk factors.",
        ));
    } else if bmi_at_least(bmi, 25.0) {
        tally.add(5);
    }

    let pressure = match profile.blood_pressure.as_str() {
        "elevated" | "unknown" => 5,
        "stage1" => 12,
        "stage2" => 20,
        _ => 0,
    };
    if pressure >= 12 {
        tally.flag(pressure, factor(
            "High Blood Pressure",
            Impact::HighNegative,
            "Immediate medical attention needed for blood pressure management",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "High blood pressure is a major modifiable risk factor. Treatment can reduce cardiovascular events by 20-25%.",
        ));
    } else if pressure >= 5 {
        tally.flag(pressure, factor(
            "Elevated Blood Pressure",
            Impact::MediumNegative,
            "Lifestyle modifications to prevent progression to hypertension",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "Elevated blood pressure often progresses to hypertension. Early intervention can prevent this progression.",
        ));
    }

    let cholesterol = match profile.cholesterol_levels.as_str() {
        "borderline" => 8,
        "high" => 15,
        "very-high" => 20,
        "unknown" => 5,
        _ => 0,
    };
    if cholesterol >= 15 {
        tally.flag(cholesterol, factor(
            "High Cholesterol",
            Impact::HighNegative,
            "Consider statin therapy and intensive dietary changes",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "High cholesterol contributes to atherosclerosis. Statin therapy can reduce cardiovascular events by 25-35%.",
        ));
    } else {
        tally.add(cholesterol);
    }

    let smoking = match profile.smoking_status.as_str() {
        "former" => 5,
        "occasional" => 12,
        "regular" => 20,
        _ => 0,
    };
    if smoking >= 12 {
        tally.flag(smoking, factor(
            "Smoking Cessation",
            Impact::HighNegative,
            "Quit smoking immediately - consider nicotine replacement therapy",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Smoking increases cardiovascular risk by 2-4 times. Quitting reduces risk by 50% within one year.",
        ));
    } else {
        tally.add(smoking);
    }

    if profile.diabetic_sugar() || profile.has_condition("diabetes") {
        tally.flag(18, factor(
            "Diabetes Management",
            Impact::HighNegative,
            "Strict diabetes management with HbA1c target <7% for most patients",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Diabetes increases cardiovascular risk by 2-4 times. Good glycemic control can reduce cardiovascular complications by 42%.",
        ));
    } else if profile.prediabetic_sugar() {
        tally.flag(8, factor(
            "Prediabetes Management",
            Impact::MediumNegative,
            "Lifestyle intervention to prevent progression to diabetes",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "Prediabetes significantly increases cardiovascular risk. Lifestyle interventions can reduce diabetes risk by 58%.",
        ));
    }

    if profile.family_has("heart-disease") {
        tally.flag(10, factor(
            "Family History of Heart Disease",
            Impact::MediumNegative,
            "Earlier and more frequent cardiovascular screening recommended",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Family history of premature heart disease doubles your risk. Screening should begin 10 years earlier than the age of affected family member.",
        ));
    }

    if profile.exercises_regularly() {
        tally.flag(-8, factor(
            "Regular Exercise",
            Impact::HighPositive,
            "Continue your excellent exercise routine",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular exercise reduces cardiovascular risk by 30-35%. Your current routine provides significant protection.",
        ));
    } else if profile.exercise_frequency == "2-3-times-week" {
        tally.add(-5);
    } else if profile.is_inactive() {
        tally.flag(8, factor(
            "Physical Inactivity",
            Impact::HighNegative,
            "Start with 150 minutes of moderate aerobic activity weekly",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Physical inactivity is a major risk factor. Even modest increases in activity provide significant cardiovascular benefits.",
        ));
    }

    if at_least(profile.stress(), 8) {
        tally.flag(6, factor(
            "Chronic Stress",
            Impact::MediumNegative,
            "Stress management techniques and consider professional counseling",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Moderate,
            "Chronic stress contributes to cardiovascular disease through multiple pathways including inflammation and unhealthy behaviors.",
        ));
    }

    if tally.factors.len() < MAX_FACTORS {
        tally.flag(0, factor(
            "Heart-Healthy Diet",
            Impact::MediumPositive,
            "Follow a Mediterranean-style diet rich in fruits, vegetables, and healthy fats",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "A heart-healthy diet can reduce cardiovascular risk by 20-30%. Focus on whole foods and limit processed foods.",
        ));
    }

    tally.finish(CARDIOVASCULAR_CAP)
}

fn metabolic(profile: &RiskProfile, bmi: Option<f64>) -> RiskAssessment {
    let mut tally = Tally::default();

    if bmi_at_least(bmi, 35.0) {
        tally.flag(20, factor(
            "Severe Obesity",
            Impact::HighNegative,
            "Medical weight management program recommended",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Severe obesity significantly increases insulin resistance and metabolic syndrome risk. Medical supervision may be needed for safe weight loss.",
        ));
    } else if bmi_at_least(bmi, 30.0) {
        tally.flag(15, factor(
            "Obesity",
            Impact::HighNegative,
            "Target 5-10% weight loss through caloric deficit and exercise",
            Timeframe::MediumTerm,
            Difficulty::Challenging,
            Evidence::Strong,
            "Obesity is strongly linked to insulin resistance and metabolic syndrome. Even modest weight loss improves metabolic health.",
        ));
    } else if bmi_at_least(bmi, 25.0) {
        tally.add(8);
    }

    if profile.diabetic_sugar() {
        tally.flag(25, factor(
            "Diabetes",
            Impact::HighNegative,
            "Comprehensive diabetes management with medication and lifestyle changes",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Diabetes is a major metabolic disorder requiring comprehensive management including medication, diet, and exercise.",
        ));
    } else if profile.prediabetic_sugar() {
        tally.flag(15, factor(
            "Prediabetes",
            Impact::HighNegative,
            "Intensive lifestyle intervention to prevent diabetes progression",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Prediabetes indicates significant insulin resistance. Lifestyle interventions can prevent or delay diabetes by up to 58%.",
        ));
    }

    tally.add(match profile.blood_pressure.as_str() {
        "stage2" => 18,
        "stage1" => 12,
        "elevated" => 5,
        _ => 0,
    });

    if profile.high_cholesterol() {
        tally.flag(12, factor(
            "Dyslipidemia",
            Impact::MediumNegative,
            "Lipid management through diet and possibly medication",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "Abnormal cholesterol levels are part of metabolic syndrome and increase cardiovascular risk.",
        ));
    } else if profile.cholesterol_levels == "borderline" {
        tally.add(6);
    }

    let age = profile.age();
    if at_least(age, 60) {
        tally.add(10);
    } else if at_least(age, 45) {
        tally.add(5);
    }

    if profile.family_has("diabetes") {
        tally.flag(12, factor(
            "Genetic Predisposition",
            Impact::MediumNegative,
            "Regular metabolic screening and aggressive prevention strategies",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Family history of diabetes significantly increases your risk. Early intervention is crucial.",
        ));
    }

    if profile.exercises_regularly() {
        tally.flag(-10, factor(
            "Regular Exercise",
            Impact::HighPositive,
            "Continue your excellent exercise routine, include both cardio and strength training",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular exercise is one of the most effective ways to improve insulin sensitivity and metabolic health.",
        ));
    } else if profile.is_inactive() {
        tally.flag(15, factor(
            "Physical Inactivity",
            Impact::HighNegative,
            "Start with 150 minutes of moderate exercise weekly plus 2 days of strength training",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Physical inactivity is a major risk factor for metabolic syndrome. Both aerobic and resistance exercise improve insulin sensitivity.",
        ));
    }

    if profile.eats_well() {
        tally.flag(-8, factor(
            "Healthy Diet Pattern",
            Impact::MediumPositive,
            "Continue your healthy diet pattern",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Your diet pattern supports metabolic health through improved insulin sensitivity and reduced inflammation.",
        ));
    } else {
        tally.flag(0, factor(
            "Metabolic Diet Optimization",
            Impact::MediumNegative,
            "Adopt a low-glycemic diet rich in fiber and healthy fats",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "A Mediterranean-style diet can improve insulin sensitivity and reduce metabolic syndrome risk by 30%.",
        ));
    }

    if profile.sleep_hours().is_some_and(|hours| hours < 6.0) {
        tally.flag(10, factor(
            "Sleep Deprivation",
            Impact::MediumNegative,
            "Prioritize 7-9 hours of quality sleep for metabolic health",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Insufficient sleep disrupts hormones that regulate hunger and glucose metabolism, increasing diabetes risk.",
        ));
    }

    tally.finish(METABOLIC_CAP)
}

fn sleep(profile: &RiskProfile, bmi: Option<f64>) -> RiskAssessment {
    let mut tally = Tally::default();

    match profile.sleep_hours() {
        Some(hours) if hours < 5.0 => tally.flag(25, factor(
            "Severe Sleep Deprivation",
            Impact::HighNegative,
            "Immediate sleep hygiene intervention and possible medical evaluation",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Less than 5 hours of sleep significantly increases risk of cardiovascular disease, diabetes, and cognitive impairment.",
        )),
        Some(hours) if hours < 6.0 => tally.flag(15, factor(
            "Sleep Deprivation",
            Impact::HighNegative,
            "Gradually increase sleep duration to 7-9 hours nightly",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Chronic sleep deprivation affects immune function, metabolism, and mental health.",
        )),
        Some(hours) if hours < 7.0 => tally.add(8),
        Some(hours) if hours > 9.0 => tally.flag(10, factor(
            "Excessive Sleep",
            Impact::MediumNegative,
            "Evaluate for underlying sleep disorders or health conditions",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Moderate,
            "Consistently sleeping more than 9 hours may indicate underlying health issues or poor sleep quality.",
        )),
        _ => {}
    }

    if profile.poor_sleep() {
        tally.flag(20, factor(
            "Poor Sleep Quality",
            Impact::HighNegative,
            "Comprehensive sleep hygiene program and possible sleep study",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Poor sleep quality can indicate sleep disorders like sleep apnea and significantly impacts health outcomes.",
        ));
    } else if profile.sleep_quality == "fair" {
        tally.flag(12, factor(
            "Suboptimal Sleep Quality",
            Impact::MediumNegative,
            "Improve sleep environment and establish consistent bedtime routine",
            Timeframe::Immediate,
            Difficulty::Easy,
            Evidence::Strong,
            "Sleep quality is as important as sleep duration for health outcomes.",
        ));
    }

    if at_least(profile.age(), 65) {
        tally.flag(8, factor(
            "Age-Related Sleep Changes",
            Impact::MediumNegative,
            "Adapt sleep strategies for age-related changes",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Sleep architecture changes with age, making sleep optimization strategies more important.",
        ));
    }

    if bmi_at_least(bmi, 35.0) {
        tally.flag(15, factor(
            "Sleep Apnea Risk",
            Impact::HighNegative,
            "Sleep study evaluation for sleep apnea",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Severe obesity significantly increases sleep apnea risk, which can cause fragmented sleep and health complications.",
        ));
    } else if bmi_at_least(bmi, 30.0) {
        tally.add(10);
    }

    let stress = profile.stress();
    if at_least(stress, 8) {
        tally.flag(12, factor(
            "Stress-Related Sleep Issues",
            Impact::MediumNegative,
            "Stress management and relaxation techniques before bedtime",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "High stress levels interfere with sleep initiation and maintenance through elevated cortisol levels.",
        ));
    } else if at_least(stress, 6) {
        tally.add(6);
    }

    if matches!(profile.screen_time.as_str(), "more-than-9" | "7-9") {
        tally.flag(8, factor(
            "Excessive Screen Time",
            Impact::MediumNegative,
            "Implement digital curfew 1-2 hours before bedtime",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Blue light exposure from screens suppresses melatonin production and delays sleep onset.",
        ));
    }

    if profile.exercises_regularly() {
        tally.flag(-8, factor(
            "Regular Exercise",
            Impact::MediumPositive,
            "Continue regular exercise but avoid intense workouts 3 hours before bedtime",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular exercise improves sleep quality and duration, but timing matters for optimal sleep.",
        ));
    }

    tally.finish(SLEEP_CAP)
}

fn mental(profile: &RiskProfile) -> RiskAssessment {
    let mut tally = Tally::default();

    let stress = profile.stress();
    if at_least(stress, 9) {
        tally.flag(25, factor(
            "Severe Stress",
            Impact::HighNegative,
            "Immediate professional mental health support recommended",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Severe chronic stress significantly increases risk of anxiety, depression, and physical health problems.",
        ));
    } else if at_least(stress, 7) {
        tally.flag(15, factor(
            "High Stress",
            Impact::HighNegative,
            "Stress management techniques and consider counseling",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "High stress levels require active management to prevent mental health deterioration.",
        ));
    } else if at_least(stress, 5) {
        tally.add(8);
    }

    let anxiety = leading_integer(&profile.anxiety_level);
    if at_least(anxiety, 8) {
        tally.flag(20, factor(
            "High Anxiety",
            Impact::HighNegative,
            "Professional anxiety treatment and coping strategies",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "High anxiety levels significantly impact quality of life and can lead to other mental health conditions.",
        ));
    } else if at_least(anxiety, 6) {
        tally.add(12);
    }

    if profile.poor_sleep() {
        tally.flag(15, factor(
            "Sleep-Mental Health Connection",
            Impact::HighNegative,
            "Address sleep issues as they significantly impact mental health",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Poor sleep quality is both a symptom and cause of mental health issues, creating a cycle that needs intervention.",
        ));
    } else if profile.sleep_quality == "fair" {
        tally.add(8);
    }

    match profile.sleep_hours() {
        Some(hours) if hours < 6.0 => tally.add(12),
        Some(hours) if hours > 9.0 => tally.add(8),
        _ => {}
    }

    match profile.age() {
        Some(18..=25) => tally.flag(8, factor(
            "Young Adult Mental Health",
            Impact::MediumNegative,
            "Focus on stress management and healthy coping strategies during this high-risk period",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Young adults face unique stressors and have higher rates of mental health issues. Early intervention is crucial.",
        )),
        Some(45..=65) => tally.add(5),
        _ => {}
    }

    if profile.gender == "female" {
        tally.flag(5, factor(
            "Gender-Specific Risk",
            Impact::LowNegative,
            "Be aware of higher prevalence of anxiety and depression in women",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Women have twice the rate of depression and anxiety disorders. Hormonal factors and social stressors contribute to this difference.",
        ));
    }

    if profile.family_has("mental-health") {
        tally.flag(15, factor(
            "Genetic Predisposition",
            Impact::MediumNegative,
            "Regular mental health check-ins and early intervention strategies",
            Timeframe::ShortTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Family history of mental health conditions increases your risk. Early recognition and treatment are important.",
        ));
    }

    if profile.has_condition("mental-health") {
        tally.flag(20, factor(
            "Existing Mental Health Condition",
            Impact::HighNegative,
            "Continue treatment and maintain regular follow-up with mental health professionals",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Existing mental health conditions require ongoing management and monitoring for optimal outcomes.",
        ));
    }

    if profile.exercises_regularly() {
        tally.flag(-10, factor(
            "Regular Exercise",
            Impact::HighPositive,
            "Continue your excellent exercise routine for mental health benefits",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular exercise is as effective as medication for mild to moderate depression and significantly reduces anxiety.",
        ));
    } else if profile.is_inactive() {
        tally.flag(10, factor(
            "Physical Inactivity",
            Impact::MediumNegative,
            "Start with 30 minutes of moderate exercise most days of the week",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Physical activity has powerful antidepressant and anxiolytic effects through multiple biological mechanisms.",
        ));
    }

    if profile.smokes() {
        tally.flag(8, factor(
            "Smoking and Mental Health",
            Impact::MediumNegative,
            "Smoking cessation with mental health support",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Smoking is associated with higher rates of mental health issues and can interfere with treatment effectiveness.",
        ));
    }

    if matches!(profile.alcohol_consumption.as_str(), "daily" | "weekly") {
        tally.flag(8, factor(
            "Alcohol and Mental Health",
            Impact::MediumNegative,
            "Monitor alcohol use as it can worsen mental health symptoms",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "Regular alcohol use can worsen depression and anxiety and interfere with sleep and medication effectiveness.",
        ));
    }

    tally.flag(0, factor(
        "Social Connection",
        Impact::MediumPositive,
        "Maintain and strengthen social relationships for mental health protection",
        Timeframe::LongTerm,
        Difficulty::Easy,
        Evidence::Strong,
        "Strong social connections are one of the most important protective factors for mental health and overall wellbeing.",
    ));

    tally.finish(MENTAL_CAP)
}

fn immune(profile: &RiskProfile, bmi: Option<f64>) -> RiskAssessment {
    let mut tally = Tally::default();

    let age = profile.age();
    if at_least(age, 75) {
        tally.flag(20, factor(
            "Immune Aging",
            Impact::HighNegative,
            "Enhanced preventive care and vaccination schedule for older adults",
            Timeframe::Immediate,
            Difficulty::Easy,
            Evidence::Strong,
            "Immune function naturally declines with age, making prevention strategies and vaccinations more important.",
        ));
    } else if at_least(age, 65) {
        tally.add(12);
    } else if at_least(age, 50) {
        tally.add(6);
    }

    if profile.has_condition("diabetes") || profile.has_condition("heart-disease") {
        tally.flag(10, factor(
            "Chronic Disease Impact",
            Impact::MediumNegative,
            "Optimal management of chronic conditions to support immune function",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Chronic diseases can compromise immune function, making infection prevention and management more important.",
        ));
    }

    if profile.smokes() {
        tally.flag(15, factor(
            "Smoking-Induced Immunosuppression",
            Impact::HighNegative,
            "Smoking cessation to restore immune function",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Smoking significantly impairs immune function and increases susceptibility to respiratory infections and other diseases.",
        ));
    }

    match profile.alcohol_consumption.as_str() {
        "daily" => tally.flag(12, factor(
            "Alcohol-Related Immune Suppression",
            Impact::MediumNegative,
            "Reduce alcohol consumption to support immune function",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "Excessive alcohol consumption impairs immune cell function and increases infection risk.",
        )),
        "weekly" => tally.add(6),
        _ => {}
    }

    if profile.sleep_hours().is_some_and(|hours| hours < 6.0) {
        tally.flag(12, factor(
            "Sleep and Immunity",
            Impact::HighNegative,
            "Prioritize 7-9 hours of quality sleep for optimal immune function",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Sleep is when the body produces infection-fighting cells and antibodies. Chronic sleep deprivation significantly impairs immune response.",
        ));
    } else if profile.sleep_quality == "poor" {
        tally.add(8);
    }

    let stress = profile.stress();
    if at_least(stress, 8) {
        tally.flag(10, factor(
            "Chronic Stress",
            Impact::MediumNegative,
            "Stress management to support immune function",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Strong,
            "Chronic stress elevates cortisol levels, which suppresses immune function and increases susceptibility to infections.",
        ));
    } else if at_least(stress, 6) {
        tally.add(5);
    }

    if profile.exercises_regularly() {
        tally.flag(-10, factor(
            "Regular Exercise",
            Impact::HighPositive,
            "Continue moderate exercise routine for immune benefits",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular moderate exercise enhances immune function and reduces infection risk. Avoid overtraining which can suppress immunity.",
        ));
    } else if profile.is_inactive() {
        tally.flag(8, factor(
            "Physical Inactivity",
            Impact::MediumNegative,
            "Start moderate exercise routine to boost immune function",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Regular moderate exercise enhances immune cell circulation and function, reducing infection risk.",
        ));
    }

    if profile.eats_well() {
        tally.flag(-8, factor(
            "Immune-Supporting Diet",
            Impact::MediumPositive,
            "Continue your nutrient-rich diet for immune support",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Your diet provides important nutrients for immune function including vitamins, minerals, and antioxidants.",
        ));
    } else {
        tally.flag(0, factor(
            "Immune-Supporting Nutrition",
            Impact::MediumNegative,
            "Eat a variety of colorful fruits and vegetables rich in immune-supporting nutrients",
            Timeframe::Immediate,
            Difficulty::Easy,
            Evidence::Strong,
            "A diverse diet rich in vitamins C, D, zinc, and antioxidants supports optimal immune function.",
        ));
    }

    if bmi_at_least(bmi, 35.0) {
        tally.flag(12, factor(
            "Obesity and Immune Function",
            Impact::MediumNegative,
            "Weight management to improve immune function",
            Timeframe::MediumTerm,
            Difficulty::Challenging,
            Evidence::Strong,
            "Obesity creates chronic inflammation and impairs immune cell function, increasing infection risk.",
        ));
    } else if bmi_at_least(bmi, 30.0) {
        tally.add(8);
    }

    tally.finish(IMMUNE_CAP)
}

fn chronic(profile: &RiskProfile, bmi: Option<f64>) -> RiskAssessment {
    let mut tally = Tally::default();

    let age = profile.age();
    if at_least(age, 70) {
        tally.flag(25, factor(
            "Advanced Age",
            Impact::HighNegative,
            "Comprehensive preventive care and regular health monitoring",
            Timeframe::Immediate,
            Difficulty::Easy,
            Evidence::Strong,
            "Age is the strongest risk factor for chronic diseases. Regular screening and preventive care become increasingly important.",
        ));
    } else if at_least(age, 60) {
        tally.add(18);
    } else if at_least(age, 50) {
        tally.add(12);
    } else if at_least(age, 40) {
        tally.add(6);
    }

    if !profile.family_history.iter().any(|tag| is_none_tag(tag)) {
        let hereditary = ["heart-disease", "diabetes", "cancer"]
            .into_iter()
            .filter(|condition| profile.family_has(condition))
            .count() as i32;
        if hereditary > 0 {
            tally.flag(hereditary * 8, factor(
                "Genetic Predisposition",
                Impact::HighNegative,
                "Enhanced screening and prevention strategies based on family history",
                Timeframe::ShortTerm,
                Difficulty::Easy,
                Evidence::Strong,
                "Strong family history significantly increases chronic disease risk. Early and frequent screening can enable prevention or early treatment.",
            ));
        }
    }

    let conditions = profile
        .existing_conditions
        .iter()
        .filter(|tag| !is_none_tag(tag))
        .count() as i32;
    if conditions > 0 {
        tally.flag(conditions * 10, factor(
            "Existing Health Conditions",
            Impact::HighNegative,
            "Optimal management of existing conditions to prevent complications",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Existing chronic conditions increase risk for additional conditions and complications. Comprehensive management is essential.",
        ));
    }

    if profile.smokes() {
        tally.flag(15, factor(
            "Smoking",
            Impact::HighNegative,
            "Immediate smoking cessation with professional support",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Smoking is linked to numerous chronic diseases including cancer, heart disease, COPD, and diabetes complications.",
        ));
    } else if profile.smoking_status == "former" {
        tally.add(5);
    }

    match profile.alcohol_consumption.as_str() {
        "daily" => tally.flag(10, factor(
            "Excessive Alcohol Use",
            Impact::MediumNegative,
            "Reduce alcohol consumption to recommended limits",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Excessive alcohol consumption increases risk for liver disease, certain cancers, and cardiovascular disease.",
        )),
        "weekly" => tally.add(5),
        _ => {}
    }

    if profile.is_inactive() {
        tally.flag(15, factor(
            "Physical Inactivity",
            Impact::HighNegative,
            "Start with 150 minutes of moderate activity weekly",
            Timeframe::Immediate,
            Difficulty::Moderate,
            Evidence::Strong,
            "Physical inactivity is a major risk factor for chronic diseases. Regular activity can reduce risk by 30-50%.",
        ));
    } else if profile.exercises_regularly() {
        tally.flag(-12, factor(
            "Regular Physical Activity",
            Impact::HighPositive,
            "Continue your excellent exercise routine",
            Timeframe::LongTerm,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular physical activity is one of the most effective ways to prevent chronic diseases and maintain health.",
        ));
    }

    match bmi {
        Some(bmi) if bmi >= 35.0 => tally.flag(15, factor(
            "Severe Obesity",
            Impact::HighNegative,
            "Comprehensive weight management program with medical supervision",
            Timeframe::Immediate,
            Difficulty::Challenging,
            Evidence::Strong,
            "Severe obesity significantly increases risk for multiple chronic diseases including diabetes, heart disease, and certain cancers.",
        )),
        Some(bmi) if bmi >= 30.0 => tally.add(10),
        Some(bmi) if bmi < 18.5 => tally.add(8),
        _ => {}
    }

    if matches!(profile.blood_pressure.as_str(), "stage1" | "stage2") {
        tally.add(10);
    }
    if profile.high_cholesterol() {
        tally.add(8);
    }
    if profile.diabetic_sugar() || profile.prediabetic_sugar() {
        tally.add(12);
    }

    if profile.sleep_hours().is_some_and(|hours| hours < 6.0) || profile.sleep_quality == "poor" {
        tally.add(8);
    }

    if at_least(profile.stress(), 8) {
        tally.flag(8, factor(
            "Chronic Stress",
            Impact::MediumNegative,
            "Stress management for chronic disease prevention",
            Timeframe::ShortTerm,
            Difficulty::Moderate,
            Evidence::Moderate,
            "Chronic stress contributes to inflammation and unhealthy behaviors that increase chronic disease risk.",
        ));
    }

    if matches!(profile.last_checkup.as_str(), "more-than-5-years" | "never") {
        tally.flag(8, factor(
            "Lack of Preventive Care",
            Impact::MediumNegative,
            "Schedule comprehensive health screening and establish regular care",
            Timeframe::Immediate,
            Difficulty::Easy,
            Evidence::Strong,
            "Regular preventive care enables early detection and treatment of chronic diseases when they're most manageable.",
        ));
    }

    tally.finish(CHRONIC_CAP)
}

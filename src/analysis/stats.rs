use std::collections::BTreeMap;

use serde::Serialize;

use super::metrics::ProcessedRecord;
use crate::models::HealthRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactorCounts {
    pub smoking: usize,
    pub alcohol: usize,
    pub high_blood_pressure: usize,
    pub high_cholesterol: usize,
}

impl RiskFactorCounts {
    fn count(&mut self, record: &ProcessedRecord) {
        if matches!(record.smoking_status.as_str(), "regular" | "occasional") {
            self.smoking += 1;
        }
        if matches!(record.alcohol_consumption.as_str(), "heavy" | "moderate") {
            self.alcohol += 1;
        }
        if matches!(record.blood_pressure.as_str(), "high-stage1" | "high-stage2") {
            self.high_blood_pressure += 1;
        }
        if record.cholesterol_levels == "high" {
            self.high_cholesterol += 1;
        }
    }
}

/// Summary of a dataset. Averages are rounded to whole units and are 0 for
/// an empty dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_records: usize,
    pub average_age: i64,
    pub average_weight: i64,
    pub average_height: i64,
    pub gender_distribution: BTreeMap<String, usize>,
    pub exercise_frequency_distribution: BTreeMap<String, usize>,
    pub diet_type_distribution: BTreeMap<String, usize>,
    pub risk_factors: RiskFactorCounts,
}

impl DatasetStats {
    pub fn from_records(records: &[HealthRecord]) -> Self {
        let processed: Vec<ProcessedRecord> =
            records.iter().map(ProcessedRecord::from_record).collect();
        Self::from_processed(&processed)
    }

    pub fn from_processed(records: &[ProcessedRecord]) -> Self {
        let mut stats = DatasetStats {
            total_records: records.len(),
            ..Default::default()
        };
        if records.is_empty() {
            return stats;
        }

        let (mut total_age, mut total_weight, mut total_height) = (0.0, 0.0, 0.0);
        for record in records {
            total_age += record.age;
            total_weight += record.weight;
            total_height += record.height;

            *stats
                .gender_distribution
                .entry(record.gender.clone())
                .or_default() += 1;
            *stats
                .exercise_frequency_distribution
                .entry(record.exercise_frequency.clone())
                .or_default() += 1;
            *stats
                .diet_type_distribution
                .entry(record.diet_type.clone())
                .or_default() += 1;

            stats.risk_factors.count(record);
        }

        let count = records.len() as f64;
        stats.average_age = rounded_mean(total_age, count);
        stats.average_weight = rounded_mean(total_weight, count);
        stats.average_height = rounded_mean(total_height, count);
        stats
    }
}

fn rounded_mean(total: f64, count: f64) -> i64 {
    (total / count).round() as i64
}

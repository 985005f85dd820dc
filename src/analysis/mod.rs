//! Derived numbers over submitted records: height and BMI for one record,
//! heuristic risk scores, a numeric projection for export, and aggregate
//! statistics for a dataset.

mod metrics;
mod risk;
mod stats;

pub use metrics::{bmi, height_cm, BmiCategory, DerivedMetrics, ProcessedRecord};
pub use risk::{
    Difficulty, Evidence, Impact, RiskAssessment, RiskFactor, RiskLevel, RiskPredictions,
    RiskProfile, Timeframe,
};
pub use stats::{DatasetStats, RiskFactorCounts};

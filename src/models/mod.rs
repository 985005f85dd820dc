pub mod health_record;

pub use health_record::{is_safe_identifier, HealthRecord, LIST_FIELDS, NONE_SENTINEL};

#[cfg(test)]
pub(crate) use health_record::fixtures;

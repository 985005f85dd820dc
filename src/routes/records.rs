use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::{
    blocking, data_response, saved_response, validated_submission, ApiError, RECORD_NOT_FOUND,
};
use crate::{analysis::DerivedMetrics, AppState};

/// POST /api/data/save
pub async fn save_record(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let record = validated_submission(&body)?;
    let records = state.records.clone();
    let id = record.id.clone();

    blocking(move || records.save(&record))
        .await
        .map_err(ApiError::save_failed)?;

    Ok(saved_response(&id))
}

/// GET /api/data
pub async fn list_records(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.records.clone();
    let all = blocking(move || records.list_all())
        .await
        .map_err(|err| ApiError::read_failed(err, RECORD_NOT_FOUND))?;
    Ok(data_response(all))
}

/// GET /api/data/:id
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let records = state.records.clone();
    let record = blocking(move || records.read(&id))
        .await
        .map_err(|err| ApiError::read_failed(err, RECORD_NOT_FOUND))?;
    Ok(data_response(record))
}

/// GET /api/data/:id/metrics
pub async fn record_metrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let records = state.records.clone();
    let record = blocking(move || records.read(&id))
        .await
        .map_err(|err| ApiError::read_failed(err, RECORD_NOT_FOUND))?;
    Ok(data_response(DerivedMetrics::from_record(&record)))
}

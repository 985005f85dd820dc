use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use super::{blocking, data_response, saved_response, validated_submission, ApiError};
use crate::AppState;

/// POST /api/validate
pub async fn validate_submission(body: Bytes) -> Result<Json<Value>, ApiError> {
    let record = validated_submission(&body)?;
    Ok(data_response(record))
}

/// POST /api/submissions
///
/// Saves the record file, then appends the workbook row. The two writes are
/// independent: a failed append leaves the record file in place.
pub async fn submit(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let record = validated_submission(&body)?;
    let id = record.id.clone();

    let records = state.records.clone();
    let to_save = record.clone();
    blocking(move || records.save(&to_save))
        .await
        .map_err(ApiError::save_failed)?;

    state
        .workbook
        .append_row(record)
        .await
        .map_err(ApiError::save_failed)?;

    Ok(saved_response(&id))
}

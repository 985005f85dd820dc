use axum::{body::Bytes, extract::State, response::Response, Json};
use serde_json::Value;

use super::{data_response, saved_response, validated_submission, xlsx_attachment, ApiError};
use crate::{storage::WORKBOOK_FILE_NAME, AppState};

/// POST /api/excel/save
pub async fn save_row(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let record = validated_submission(&body)?;
    let id = record.id.clone();

    state
        .workbook
        .append_row(record)
        .await
        .map_err(ApiError::save_failed)?;

    Ok(saved_response(&id))
}

/// GET /api/excel/read
pub async fn download(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bytes = state
        .workbook
        .read_raw()
        .await
        .map_err(|err| ApiError::read_failed(err, "File not found"))?;
    Ok(xlsx_attachment(WORKBOOK_FILE_NAME, bytes))
}

/// GET /api/excel/rows
pub async fn rows(State(state): State<AppState>) -> Json<Value> {
    data_response(state.workbook.read_all().await)
}

use axum::{extract::State, response::Response, Json};
use serde_json::Value;

use super::{blocking, data_response, xlsx_attachment, ApiError};
use crate::{
    analysis::{DatasetStats, ProcessedRecord},
    storage::{export_rows, PROCESSED_FILE_NAME, PROCESSED_SHEET_NAME},
    AppState,
};

/// GET /api/analysis/stats
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let rows = state.workbook.read_all().await;
    data_response(DatasetStats::from_records(&rows))
}

/// GET /api/analysis/processed
pub async fn processed(State(state): State<AppState>) -> Json<Value> {
    let rows = state.workbook.read_all().await;
    let processed: Vec<ProcessedRecord> = rows.iter().map(ProcessedRecord::from_record).collect();
    data_response(processed)
}

/// GET /api/analysis/processed/download
pub async fn download_processed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let rows = state.workbook.read_all().await;
    if rows.is_empty() {
        return Err(ApiError::NotFound("No data available"));
    }

    let bytes = blocking(move || {
        let fields = rows
            .iter()
            .map(|record| ProcessedRecord::from_record(record).to_fields())
            .collect::<serde_json::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)?;
        Ok(export_rows(&fields, PROCESSED_SHEET_NAME)?)
    })
    .await
    .map_err(|err| ApiError::read_failed(err, "No data available"))?;

    Ok(xlsx_attachment(PROCESSED_FILE_NAME, bytes))
}

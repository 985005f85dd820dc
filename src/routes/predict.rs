use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::{blocking, data_response, parse_body, ApiError, PARSE_FAILED, RECORD_NOT_FOUND};
use crate::{
    analysis::{RiskPredictions, RiskProfile},
    AppState,
};

const MISSING_REQUIRED: &str = "Missing required fields";

/// POST /api/predict
pub async fn predict(body: Bytes) -> Result<Json<Value>, ApiError> {
    let profile: RiskProfile = serde_json::from_value(parse_body(&body)?).map_err(|err| {
        log::warn!("Error reading prediction input: {err}");
        ApiError::BadRequest(PARSE_FAILED)
    })?;
    if !profile.has_required_fields() {
        return Err(ApiError::BadRequest(MISSING_REQUIRED));
    }
    Ok(data_response(RiskPredictions::assess(&profile)))
}

/// GET /api/data/:id/risk
pub async fn record_risk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let records = state.records.clone();
    let record = blocking(move || records.read(&id))
        .await
        .map_err(|err| ApiError::read_failed(err, RECORD_NOT_FOUND))?;
    let profile = RiskProfile::from_record(&record);
    Ok(data_response(RiskPredictions::assess(&profile)))
}

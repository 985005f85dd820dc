//! HTTP routes.
//!
//! Every response body is a JSON envelope with a `success` flag, except the
//! workbook download. Store failures are logged here and reach the client
//! only as a generic message.

mod analysis;
mod predict;
mod records;
mod submissions;
mod workbook;

use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::{StoreError, StoreResult},
    models::HealthRecord,
    storage::WORKBOOK_CONTENT_TYPE,
    validation::{validate, with_submission_defaults, ValidationErrors},
    AppState,
};

pub const SAVED_MESSAGE: &str = "Data saved successfully";
const RECORD_NOT_FOUND: &str = "Record not found";
const PARSE_FAILED: &str = "Failed to parse request data";
const SAVE_FAILED: &str = "Failed to save data";
const READ_FAILED: &str = "Failed to read data";
const VALIDATION_FAILED: &str = "Validation failed";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/validate", post(submissions::validate_submission))
        .route("/api/submissions", post(submissions::submit))
        .route("/api/data", get(records::list_records))
        .route("/api/data/save", post(records::save_record))
        .route("/api/data/:id", get(records::get_record))
        .route("/api/data/:id/metrics", get(records::record_metrics))
        .route("/api/data/:id/risk", get(predict::record_risk))
        .route("/api/excel/save", post(workbook::save_row))
        .route("/api/excel/read", get(workbook::download))
        .route("/api/excel/rows", get(workbook::rows))
        .route("/api/analysis/stats", get(analysis::stats))
        .route("/api/analysis/processed", get(analysis::processed))
        .route(
            "/api/analysis/processed/download",
            get(analysis::download_processed),
        )
        .route("/api/predict", post(predict::predict))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    "OK"
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Invalid(ValidationErrors),
    NotFound(&'static str),
    Internal {
        message: &'static str,
        source: anyhow::Error,
    },
}

impl ApiError {
    fn from_store(err: StoreError, failure: &'static str, missing: &'static str) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(missing),
            StoreError::InvalidIdentifier(_) => ApiError::BadRequest("Invalid record identifier"),
            StoreError::Storage(source) => ApiError::Internal {
                message: failure,
                source,
            },
        }
    }

    pub fn save_failed(err: StoreError) -> Self {
        Self::from_store(err, SAVE_FAILED, RECORD_NOT_FOUND)
    }

    pub fn read_failed(err: StoreError, missing: &'static str) -> Self {
        Self::from_store(err, READ_FAILED, missing)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": message }),
            ),
            ApiError::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": VALIDATION_FAILED, "errors": errors }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": message }),
            ),
            ApiError::Internal { message, source } => {
                log::error!("{message}: {source:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": message }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// `{ "success": true, "data": ... }`
fn data_response(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn saved_response(id: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": SAVED_MESSAGE, "id": id }))
}

/// An xlsx download named `file_name`.
fn xlsx_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename={file_name}");
    (
        [
            (header::CONTENT_TYPE, WORKBOOK_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        log::warn!("Error parsing request data: {err}");
        ApiError::BadRequest(PARSE_FAILED)
    })
}

/// Parses a submission, fills server-assigned fields and validates it.
fn validated_submission(body: &Bytes) -> Result<HealthRecord, ApiError> {
    let raw = with_submission_defaults(parse_body(body)?, Utc::now());
    validate(&raw).into_result().map_err(ApiError::Invalid)
}

/// Runs file IO or workbook encoding on the blocking pool.
async fn blocking<F, T>(task: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| StoreError::from(anyhow::anyhow!("blocking task failed: {err}")))?
}

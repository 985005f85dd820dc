use std::io::Cursor;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use calamine::{open_workbook_from_rs, Reader, Xlsx};
use health_intake_lib::{config::Config, router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BODY_LIMIT: usize = 4 * 1024 * 1024;

struct TestApp {
    _dir: TempDir,
    data_dir: std::path::PathBuf,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let state = AppState::open(&Config::with_data_dir(&data_dir)).unwrap();
        Self {
            _dir: dir,
            data_dir,
            router: router(state),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }
}

fn submission(id: &str) -> Value {
    json!({
        "id": id,
        "timestamp": "2024-05-01T10:30:00.000Z",
        "age": "34",
        "gender": "female",
        "weight": "70",
        "height": "175",
        "heightFeet": "5",
        "heightInches": "9",
        "exerciseFrequency": "3-4-times",
        "exerciseTypes": ["running", "yoga"],
        "sleepHours": "7",
        "sleepQuality": "good",
        "dietType": "balanced",
        "waterIntake": "2-3-liters",
        "stressLevel": "4",
        "smokingStatus": "occasional",
        "alcoholConsumption": "moderate",
        "anxietyFrequency": "rarely",
        "depressionFrequency": "never",
        "socialConnections": "strong",
        "workLifeBalance": "good",
        "mindfulnessPractice": "weekly",
        "bloodPressure": "high-stage1",
        "cholesterolLevels": "normal",
        "bloodSugarLevel": "70-99",
        "familyHistory": ["Diabetes", "Heart disease"],
        "existingConditions": ["None"]
    })
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn validate_returns_normalized_record() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/validate", &submission("v1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["age"], json!("34"));
    assert_eq!(body["data"]["height"], json!("175"));
}

#[tokio::test]
async fn validate_reports_every_bad_field() {
    let app = TestApp::new();
    let mut raw = submission("v2");
    raw["age"] = json!("130");
    raw["weight"] = json!("0");
    raw["familyHistory"] = json!([]);

    let (status, body) = app.post("/api/validate", &raw).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    let errors = body["errors"].as_object().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(
        errors["familyHistory"],
        json!(["Please select at least one option or 'None of the above'"])
    );
}

#[tokio::test]
async fn blank_history_tag_is_refused_before_storage() {
    let app = TestApp::new();
    let mut raw = submission("b1");
    raw["familyHistory"] = json!([""]);

    let (status, body) = app.post("/api/excel/save", &raw).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["familyHistory"], json!(["Options must not be blank"]));
    let (_, body) = app.get("/api/excel/rows").await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn unparsable_body_is_rejected() {
    let app = TestApp::new();
    for uri in ["/api/validate", "/api/submissions", "/api/data/save", "/api/excel/save"] {
        let (status, body) = app.post_raw(uri, "{ not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], json!("Failed to parse request data"));
    }
}

#[tokio::test]
async fn submission_without_id_gets_one_assigned() {
    let app = TestApp::new();
    let mut raw = submission("ignored");
    let fields = raw.as_object_mut().unwrap();
    fields.remove("id");
    fields.remove("timestamp");

    let (status, body) = app.post("/api/data/save", &raw).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 36);

    let (status, body) = app.get(&format!("/api/data/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id));
}

#[tokio::test]
async fn submit_writes_record_and_workbook_row() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/submissions", &submission("s1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Data saved successfully"));

    assert!(app.data_dir.join("s1.json").is_file());
    assert!(app.data_dir.join("health_data.xlsx").is_file());

    let (_, listed) = app.get("/api/data").await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let (_, rows) = app.get("/api/excel/rows").await;
    let rows = rows["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["familyHistory"], json!(["Diabetes", "Heart disease"]));
    assert_eq!(rows[0]["height"], json!("175"));
}

#[tokio::test]
async fn record_round_trips_through_api() {
    let app = TestApp::new();
    let mut raw = submission("r1");
    raw["referral"] = json!({ "source": "clinic" });
    app.post("/api/data/save", &raw).await;

    let (status, body) = app.get("/api/data/r1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["referral"], json!({ "source": "clinic" }));
    assert_eq!(body["data"]["exerciseTypes"], json!(["running", "yoga"]));
}

#[tokio::test]
async fn unknown_record_is_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/data/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn list_on_empty_store_is_empty() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn malformed_record_file_is_a_generic_500() {
    let app = TestApp::new();
    std::fs::write(app.data_dir.join("broken.json"), "{ nope").unwrap();

    let (status, body) = app.get("/api/data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "success": false, "message": "Failed to read data" }));
}

#[tokio::test]
async fn record_metrics_are_derived() {
    let app = TestApp::new();
    app.post("/api/data/save", &submission("m1")).await;

    let (status, body) = app.get("/api/data/m1/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["heightCm"], json!(175));
    assert_eq!(body["data"]["bmiCategory"], json!("normal"));
}

#[tokio::test]
async fn workbook_download_before_any_row_is_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/excel/read").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "File not found" }));
}

#[tokio::test]
async fn workbook_download_has_attachment_headers() {
    let app = TestApp::new();
    let (status, _) = app.post("/api/excel/save", &submission("x1")).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::get("/api/excel/read").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=health_data.xlsx"
    );
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(
        bytes.to_vec(),
        std::fs::read(app.data_dir.join("health_data.xlsx")).unwrap()
    );
}

#[tokio::test]
async fn workbook_rows_keep_extension_values() {
    let app = TestApp::new();
    let mut raw = submission("e1");
    raw["address"] = json!({"city": "Oslo"});
    raw["referrer"] = json!(null);
    raw["notes"] = json!("");
    raw["ratio"] = json!(3.0);
    raw["exerciseTypes"] = json!([]);
    app.post("/api/excel/save", &raw).await;

    let (status, body) = app.get("/api/excel/rows").await;
    assert_eq!(status, StatusCode::OK);
    let row = &body["data"][0];
    assert_eq!(row["address"], json!({"city": "Oslo"}));
    assert_eq!(row["referrer"], json!(null));
    assert!(row.as_object().unwrap().contains_key("referrer"));
    assert_eq!(row["notes"], json!(""));
    assert_eq!(row["ratio"], json!(3.0));
    assert_eq!(row["exerciseTypes"], json!([]));
}

#[tokio::test]
async fn analysis_over_workbook_rows() {
    let app = TestApp::new();
    app.post("/api/excel/save", &submission("a1")).await;
    let mut second = submission("a2");
    second["age"] = json!("40");
    second["gender"] = json!("male");
    second["smokingStatus"] = json!("never");
    app.post("/api/excel/save", &second).await;

    let (status, body) = app.get("/api/analysis/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["totalRecords"], json!(2));
    assert_eq!(stats["averageAge"], json!(37));
    assert_eq!(stats["averageHeight"], json!(175));
    assert_eq!(stats["riskFactors"]["smoking"], json!(1));
    assert_eq!(stats["riskFactors"]["alcohol"], json!(2));
    assert_eq!(stats["riskFactors"]["highBloodPressure"], json!(2));

    let (_, body) = app.get("/api/analysis/processed").await;
    let processed = body["data"].as_array().unwrap();
    assert_eq!(processed.len(), 2);
    assert_eq!(processed[1]["age"], json!(40.0));
    assert_eq!(processed[0]["height"], json!(175.0));
    assert_eq!(processed[0]["waterIntake"], json!("2-3-liters"));
    assert_eq!(processed[0]["timestamp"], json!("2024-05-01T10:30:00Z"));
}

#[tokio::test]
async fn processed_download_is_a_processed_data_sheet() {
    let app = TestApp::new();
    app.post("/api/excel/save", &submission("p1")).await;
    app.post("/api/excel/save", &submission("p2")).await;

    let request = Request::get("/api/analysis/processed/download")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=processed_health_data.xlsx"
    );

    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["ProcessedData".to_string()]);
    let range = workbook.worksheet_range("ProcessedData").unwrap();
    let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
    assert_eq!(&header[..3], &["id", "timestamp", "age"]);
    assert!(header.contains(&"height".to_string()));
    assert!(header.contains(&"mindfulnessPractice".to_string()));
    assert_eq!(range.height(), 3);
}

#[tokio::test]
async fn processed_download_without_rows_is_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/analysis/processed/download").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("No data available"));
}

#[tokio::test]
async fn predict_scores_a_profile() {
    let app = TestApp::new();
    let profile = json!({
        "age": 70,
        "gender": "male",
        "weight": "120",
        "height": "175",
        "bloodPressure": "stage2",
        "cholesterolLevels": "very-high",
        "smokingStatus": "regular",
        "exerciseFrequency": "never",
        "sleepHours": "4",
        "sleepQuality": "poor",
        "stressLevel": "9"
    });

    let (status, body) = app.post("/api/predict", &profile).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    for area in ["cardiovascular", "metabolic", "sleep", "mental", "immune", "chronic"] {
        let risk = data[area]["risk"].as_i64().unwrap();
        assert!((5..=85).contains(&risk), "{area} risk {risk}");
        assert!(data[area]["factors"].as_array().unwrap().len() <= 5);
    }
    assert_eq!(data["cardiovascular"]["risk"], json!(85));
    assert_eq!(data["cardiovascular"]["level"], json!("veryHigh"));
    assert_eq!(
        data["cardiovascular"]["factors"][0]["name"],
        json!("Advanced Age")
    );
    assert_eq!(data["sleep"]["risk"], json!(75));
}

#[tokio::test]
async fn predict_requires_core_answers() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/predict", &json!({"age": "40", "gender": "female", "height": "160"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Missing required fields"));

    let (status, body) = app.post("/api/predict", &json!("just text")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Failed to parse request data"));
}

#[tokio::test]
async fn stored_record_can_be_scored() {
    let app = TestApp::new();
    app.post("/api/data/save", &submission("k1")).await;

    let (status, body) = app.get("/api/data/k1/risk").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mental"]["risk"], json!(13));
    assert_eq!(
        body["data"]["mental"]["factors"][1]["name"],
        json!("Smoking and Mental Health")
    );

    let (status, _) = app.get("/api/data/missing/risk").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analysis_on_empty_workbook() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/analysis/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalRecords"], json!(0));
    assert_eq!(body["data"]["averageAge"], json!(0));
}

#[tokio::test]
async fn unsafe_identifier_is_rejected_by_validation() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/data/save", &submission("../etc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["id"].is_array());
}

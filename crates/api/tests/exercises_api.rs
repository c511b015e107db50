//! Integration tests for `GET /api/v1/exercises`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};

// ---------------------------------------------------------------------------
// Test: catalogue lists every exercise with its configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_all_exercises() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/exercises").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = json["data"].as_array().expect("data must be an array");
    let slugs: Vec<&str> = data.iter().filter_map(|e| e["slug"].as_str()).collect();
    assert_eq!(slugs, ["squat", "shoulder_press", "plank"]);
}

// ---------------------------------------------------------------------------
// Test: rep exercises carry thresholds, timed ones a hold band
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tracking_fields_match_exercise_kind() {
    let app = common::build_test_app();
    let json = body_json(get(app, "/api/v1/exercises").await).await;
    let data = json["data"].as_array().unwrap();

    let squat = &data[0];
    assert_eq!(squat["timed"], false);
    assert!(squat["rep_thresholds"].is_object());
    assert!(squat["hold_band"].is_null());
    assert_eq!(squat["feedback_policy"]["depth_ceiling"], 110.0);

    let plank = &data[2];
    assert_eq!(plank["timed"], true);
    assert!(plank["rep_thresholds"].is_null());
    assert_eq!(plank["hold_band"]["min"], 160.0);
    assert_eq!(plank["hold_band"]["max"], 180.0);
}

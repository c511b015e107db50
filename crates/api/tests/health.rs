//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, StubLlm};
use repcoach_coach::LlmClient;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app();
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["coach_enabled"], false);
    assert_eq!(json["pose_service_enabled"], false);
    assert_eq!(json["active_sessions"], 0);
    assert_eq!(json["recording_sessions"], 0);
}

// ---------------------------------------------------------------------------
// Test: health reports an enabled coach
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_reports_coach_enabled() {
    let app = common::build_test_app_with(Some(StubLlm::replying("hi") as Arc<dyn LlmClient>), None);
    let json = body_json(get(app, "/health").await).await;

    assert_eq!(json["coach_enabled"], true);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app();
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: every response carries a generated request id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn responses_carry_request_id() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/exercises").await;

    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "not a UUID: {id}");
}

// ---------------------------------------------------------------------------
// Test: browser preflight from the dev origin is allowed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preflight_from_dev_origin_is_allowed() {
    let app = common::build_test_app();
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/chat")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    assert_eq!(header("access-control-allow-origin"), "http://localhost:5173");
    assert!(header("access-control-allow-methods").contains("POST"));
}

#[tokio::test]
async fn preflight_from_unknown_origin_gets_no_allow_header() {
    let app = common::build_test_app();
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/chat")
        .header("origin", "http://evil.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(preflight).await.unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

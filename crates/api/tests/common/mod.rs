#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use repcoach_api::config::ServerConfig;
use repcoach_api::pose::{PoseError, PoseEstimator};
use repcoach_api::routes;
use repcoach_api::state::AppState;
use repcoach_api::ws::WsManager;
use repcoach_coach::{CoachConfig, CoachError, CoachPrompt, LlmClient, PromptKind};
use repcoach_core::landmarks::{BodyPart, Joint, Landmark, LandmarkLayout, LandmarkSet, Side};
use repcoach_core::metrics::AngleSpace;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        pose_service_url: None,
        pose_timeout_ms: 2000,
        min_visibility: 0.5,
        angle_space: AngleSpace::Spatial,
        coach: CoachConfig {
            timeout_secs: 5,
            ..CoachConfig::default()
        },
    }
}

/// App with coaching and the pose service both disabled.
pub fn build_test_app() -> Router {
    build_test_app_with(None, None)
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app_with(
    coach: Option<Arc<dyn LlmClient>>,
    pose: Option<Arc<dyn PoseEstimator>>,
) -> Router {
    let state = AppState {
        config: Arc::new(test_config()),
        ws_manager: Arc::new(WsManager::new()),
        coach,
        pose,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Serve `app` on an ephemeral port for socket-level tests.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// LLM double returning a fixed reply (or a fixed failure) and counting calls.
pub struct StubLlm {
    pub reply: Option<String>,
    pub calls: AtomicUsize,
    pub kinds: std::sync::Mutex<Vec<PromptKind>>,
    pub images: std::sync::Mutex<Vec<Option<String>>>,
}

impl StubLlm {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            kinds: std::sync::Mutex::new(Vec::new()),
            images: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
            kinds: std::sync::Mutex::new(Vec::new()),
            images: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(&self, prompt: &CoachPrompt) -> Result<String, CoachError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.kinds.lock().unwrap().push(prompt.kind);
        self.images
            .lock()
            .unwrap()
            .push(prompt.image.as_deref().map(str::to_string));
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(CoachError::Api {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }
}

/// Pose double that answers every image with the same skeleton.
pub struct StubPose {
    pub landmarks: Option<LandmarkSet>,
}

#[async_trait]
impl PoseEstimator for StubPose {
    async fn estimate(&self, _image_data_url: &str) -> Result<Option<LandmarkSet>, PoseError> {
        Ok(self.landmarks.clone())
    }
}

// ---------------------------------------------------------------------------
// Landmark fixtures
// ---------------------------------------------------------------------------

/// Side-view squat skeleton with the given knee angle, BlazePose layout.
///
/// Knee at (0.5, 0.6), vertical shank, thigh rotated `180 - knee_angle`
/// away from the shank, vertical trunk.
pub fn squat_landmarks(knee_angle: f64) -> Vec<Landmark> {
    let layout = LandmarkLayout::BlazePose33;
    let mut points = vec![Landmark::new(0.5, 0.5); layout.point_count()];
    let theta = (180.0 - knee_angle).to_radians();
    let knee = (0.5, 0.6);
    let ankle = (0.5, 0.85);
    let hip = (knee.0 + 0.3 * theta.sin(), knee.1 - 0.3 * theta.cos());
    let shoulder = (hip.0, hip.1 - 0.35);

    for side in Side::BOTH {
        let dx = match side {
            Side::Left => -0.08,
            Side::Right => 0.08,
        };
        let mut place = |part: BodyPart, x: f64, y: f64| {
            let index = layout.index(Joint::on(side, part)).unwrap();
            points[index] = Landmark::new(x + dx, y);
        };
        place(BodyPart::Ear, shoulder.0, shoulder.1 - 0.08);
        place(BodyPart::Shoulder, shoulder.0, shoulder.1);
        place(BodyPart::Hip, hip.0, hip.1);
        place(BodyPart::Knee, knee.0, knee.1);
        place(BodyPart::Ankle, ankle.0, ankle.1);
        place(BodyPart::Heel, ankle.0 - 0.02, ankle.1 + 0.03);
        place(BodyPart::FootIndex, ankle.0 + 0.06, ankle.1 + 0.03);
    }
    points
}

pub fn squat_set(knee_angle: f64) -> LandmarkSet {
    LandmarkSet::new(LandmarkLayout::BlazePose33, squat_landmarks(knee_angle)).unwrap()
}

/// One client-side landmark frame as sent over the socket.
pub fn landmark_frame_json(knee_angle: f64, timestamp_ms: f64) -> String {
    serde_json::json!({
        "landmarks": squat_landmarks(knee_angle),
        "layout": "blazepose33",
        "timestamp_ms": timestamp_ms,
    })
    .to_string()
}

/// Knee angles of one clean squat rep: stand, descend, bottom out, stand.
pub const CLEAN_REP: [f64; 8] = [170.0, 170.0, 80.0, 70.0, 62.0, 90.0, 160.0, 170.0];

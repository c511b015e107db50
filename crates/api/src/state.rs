use std::sync::Arc;

use repcoach_coach::LlmClient;

use crate::config::ServerConfig;
use crate::pose::PoseEstimator;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (one entry per live exercise session).
    pub ws_manager: Arc<WsManager>,
    /// LLM client. `None` when coaching is disabled.
    pub coach: Option<Arc<dyn LlmClient>>,
    /// Remote pose model. `None` when clients send landmarks themselves.
    pub pose: Option<Arc<dyn PoseEstimator>>,
}

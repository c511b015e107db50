use std::time::Duration;

use repcoach_coach::CoachConfig;
use repcoach_core::landmarks::DEFAULT_MIN_VISIBILITY;
use repcoach_core::metrics::AngleSpace;
use repcoach_core::session::SessionConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Remote pose model. When unset, clients must send landmarks.
    pub pose_service_url: Option<String>,
    /// Per-frame pose request timeout in milliseconds (default: `2000`).
    pub pose_timeout_ms: u64,
    /// Landmarks below this visibility count as undetected (default: `0.5`).
    pub min_visibility: f64,
    /// Whether joint angles use depth when available (default: `spatial`).
    pub angle_space: AngleSpace,
    /// LLM coaching settings.
    pub coach: CoachConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `POSE_SERVICE_URL`     | unset                      |
    /// | `POSE_TIMEOUT_MS`      | `2000`                     |
    /// | `MIN_VISIBILITY`       | `0.5`                      |
    /// | `ANGLE_SPACE`          | `spatial`                  |
    ///
    /// Coaching variables are documented on [`CoachConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let pose_service_url = std::env::var("POSE_SERVICE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let pose_timeout_ms: u64 = std::env::var("POSE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("POSE_TIMEOUT_MS must be a valid u64");

        let min_visibility: f64 = std::env::var("MIN_VISIBILITY")
            .unwrap_or_else(|_| DEFAULT_MIN_VISIBILITY.to_string())
            .parse()
            .expect("MIN_VISIBILITY must be a number");
        assert!(
            (0.0..=1.0).contains(&min_visibility),
            "MIN_VISIBILITY must be within 0..=1"
        );

        let angle_space: AngleSpace = std::env::var("ANGLE_SPACE")
            .unwrap_or_else(|_| "spatial".into())
            .parse()
            .unwrap_or_else(|e| panic!("Invalid ANGLE_SPACE: {e}"));

        let coach = CoachConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            pose_service_url,
            pose_timeout_ms,
            min_visibility,
            angle_space,
            coach,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            angle_space: self.angle_space,
            min_visibility: self.min_visibility,
        }
    }

    pub fn pose_timeout(&self) -> Duration {
        Duration::from_millis(self.pose_timeout_ms)
    }
}

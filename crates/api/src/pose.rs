//! Pose-model boundary.
//!
//! The server never runs a pose model itself. Frames either arrive with
//! landmarks already attached, or are forwarded to an external service
//! through a [`PoseEstimator`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use repcoach_core::error::CoreError;
use repcoach_core::landmarks::{Landmark, LandmarkLayout, LandmarkSet};

/// Errors from the pose service layer.
#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The pose service returned a non-2xx status code.
    #[error("Pose service error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The service answered with a landmark list that does not fit its layout.
    #[error(transparent)]
    InvalidLandmarks(#[from] CoreError),
}

/// Turns a camera frame into landmarks.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    /// `Ok(None)` means the model ran and found nobody.
    async fn estimate(&self, image_data_url: &str) -> Result<Option<LandmarkSet>, PoseError>;
}

#[derive(Debug, Serialize)]
struct EstimateRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct EstimateResponse {
    #[serde(default)]
    pub landmarks: Option<Vec<Landmark>>,
    #[serde(default)]
    pub layout: LandmarkLayout,
}

impl EstimateResponse {
    pub fn into_landmarks(self) -> Result<Option<LandmarkSet>, CoreError> {
        match self.landmarks {
            None => Ok(None),
            Some(points) if points.is_empty() => Ok(None),
            Some(points) => LandmarkSet::new(self.layout, points).map(Some),
        }
    }
}

/// HTTP client for a pose service accepting `POST {"image": <data url>}`.
pub struct HttpPoseEstimator {
    client: reqwest::Client,
    url: String,
}

impl HttpPoseEstimator {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: String, timeout: Duration) -> Result<Self, PoseError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Ensure the response has a success status code.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PoseError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PoseError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PoseEstimator for HttpPoseEstimator {
    async fn estimate(&self, image_data_url: &str) -> Result<Option<LandmarkSet>, PoseError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EstimateRequest {
                image: image_data_url,
            })
            .send()
            .await?;

        let body: EstimateResponse = Self::ensure_success(response).await?.json().await?;
        Ok(body.into_landmarks()?)
    }
}

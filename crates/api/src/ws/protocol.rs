//! Wire protocol for exercise sessions.
//!
//! Inbound text frames are either plain control commands, JSON landmark
//! frames, JSON camera frames, or a bare image (data URL or raw base64).
//! Outbound frames are JSON objects tagged by `type`.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};

use repcoach_core::error::CoreError;
use repcoach_core::landmarks::{Landmark, LandmarkLayout, LandmarkSet};
use repcoach_core::profile::ExerciseProfile;

const SET_EXERCISE_PREFIX: &str = "SET_EXERCISE:";

/// Raw base64 shorter than this is not taken for an image.
const MIN_RAW_IMAGE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    StartRecording,
    StopRecording,
    Reset,
    SetExercise(String),
    /// Landmarks computed on the client.
    Landmarks(LandmarkFrame),
    /// Camera frame as a data URL, for the pose service.
    Image(String),
}

/// A frame whose landmarks were computed client-side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LandmarkFrame {
    /// `null` when the client's model found nobody.
    pub landmarks: Option<Vec<Landmark>>,
    #[serde(default)]
    pub layout: LandmarkLayout,
    #[serde(default)]
    pub timestamp_ms: Option<f64>,
    /// Optional camera frame forwarded to the coach at the lowest point.
    #[serde(default)]
    pub image: Option<String>,
}

impl LandmarkFrame {
    pub fn landmark_set(&self) -> Result<Option<LandmarkSet>, CoreError> {
        match &self.landmarks {
            None => Ok(None),
            Some(points) if points.is_empty() => Ok(None),
            Some(points) => LandmarkSet::new(self.layout, points.clone()).map(Some),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CameraFrame {
    #[serde(default)]
    front: Option<String>,
    #[serde(default)]
    side: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed JSON frame: {0}")]
    MalformedJson(String),

    #[error("Unrecognized message")]
    Unrecognized,
}

/// Classify one inbound text frame.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let text = text.trim();

    match text {
        "START_RECORDING" => return Ok(ClientMessage::StartRecording),
        "STOP_RECORDING" => return Ok(ClientMessage::StopRecording),
        "RESET" => return Ok(ClientMessage::Reset),
        _ => {}
    }
    if let Some(name) = text.strip_prefix(SET_EXERCISE_PREFIX) {
        return Ok(ClientMessage::SetExercise(name.trim().to_string()));
    }

    if text.starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;

        if value.get("landmarks").is_some() {
            let frame: LandmarkFrame = serde_json::from_value(value)
                .map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;
            return Ok(ClientMessage::Landmarks(frame));
        }

        let camera: CameraFrame = serde_json::from_value(value)
            .map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;
        // The side view shows depth and torso lean best.
        return camera
            .side
            .or(camera.front)
            .filter(|image| !image.trim().is_empty())
            .map(|image| ClientMessage::Image(to_data_url(&image)))
            .ok_or(ProtocolError::Unrecognized);
    }

    if text.starts_with("data:image") || looks_like_base64(text) {
        return Ok(ClientMessage::Image(to_data_url(text)));
    }

    Err(ProtocolError::Unrecognized)
}

/// Prefix raw base64 with a JPEG data-URL header; data URLs pass through.
pub fn to_data_url(image: &str) -> String {
    let image = image.trim();
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{image}")
    }
}

fn looks_like_base64(text: &str) -> bool {
    text.len() >= MIN_RAW_IMAGE_LEN
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Per-frame status pushed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackFrame {
    pub reps: u32,
    /// Posture warnings for this frame, or the last rule verdict.
    pub instant_feedback: String,
    /// Latest coach comment.
    pub coach_feedback: String,
    pub is_recording: bool,
    pub exercise: ExerciseProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Feedback(FeedbackFrame),
    Report { content: String },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_message(&self) -> Message {
        match serde_json::to_string(self) {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize server message");
                Message::Text(r#"{"type":"ERROR","message":"internal error"}"#.into())
            }
        }
    }
}

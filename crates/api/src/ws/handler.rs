use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use repcoach_coach::report::session_report;
use repcoach_core::profile::ExerciseProfile;
use repcoach_core::session::{FrameInput, SessionSummary};

use crate::state::AppState;
use crate::ws::live::{coach_dispatcher, LiveSession};
use crate::ws::protocol::{
    parse_client_message, to_data_url, ClientMessage, LandmarkFrame, ServerMessage,
};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Each connection is one exercise session, owned by the connection's task.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound frames strictly in arrival order on this task.
///   4. Cancels outstanding report work and cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let mut live = LiveSession::new(
        ExerciseProfile::default(),
        state.config.session_config(),
        coach_dispatcher(state.coach.as_ref(), &state.config.coach),
    );
    let cancel = CancellationToken::new();

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = handle_text(&state, conn_id, &mut live, &cancel, text.as_str()).await;
                if let Some(reply) = reply {
                    state.ws_manager.send_to(conn_id, &reply).await;
                }
            }
            Ok(Message::Binary(_)) => {
                let reply = ServerMessage::error("Binary frames are not supported");
                state.ws_manager.send_to(conn_id, &reply).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Ping(_)) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: stop report work, remove connection and abort sender task.
    cancel.cancel();
    state.ws_manager.remove(conn_id).await;
    send_task.abort();
    tracing::info!(
        conn_id = %conn_id,
        reps = live.session().reps(),
        "WebSocket disconnected",
    );
}

/// Apply one inbound text frame. Returns the direct reply, if any.
async fn handle_text(
    state: &AppState,
    conn_id: Uuid,
    live: &mut LiveSession,
    cancel: &CancellationToken,
    text: &str,
) -> Option<ServerMessage> {
    let message = match parse_client_message(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Rejected client frame");
            return Some(ServerMessage::error(e.to_string()));
        }
    };

    match message {
        ClientMessage::StartRecording => {
            live.start_recording();
        }
        ClientMessage::StopRecording => {
            let summary = live.stop_recording();
            // The stopped state goes out before the report can.
            sync_status(state, conn_id, live).await;
            state.ws_manager.send_to(conn_id, &live.feedback()).await;
            spawn_report(state.clone(), conn_id, summary, cancel.child_token());
            return None;
        }
        ClientMessage::Reset => live.reset(),
        ClientMessage::SetExercise(name) => match name.parse::<ExerciseProfile>() {
            Ok(profile) => live.set_exercise(profile),
            Err(e) => return Some(ServerMessage::error(e.to_string())),
        },
        ClientMessage::Landmarks(frame) => return Some(landmark_frame(live, frame)),
        ClientMessage::Image(image) => return Some(image_frame(state, conn_id, live, image).await),
    }

    sync_status(state, conn_id, live).await;
    Some(live.feedback())
}

async fn sync_status(state: &AppState, conn_id: Uuid, live: &LiveSession) {
    let session = live.session();
    state
        .ws_manager
        .set_status(conn_id, session.profile(), session.is_recording())
        .await;
}

fn landmark_frame(live: &mut LiveSession, frame: LandmarkFrame) -> ServerMessage {
    let landmarks = match frame.landmark_set() {
        Ok(landmarks) => landmarks,
        Err(e) => return ServerMessage::error(e.to_string()),
    };
    let input = FrameInput {
        landmarks,
        timestamp_ms: frame.timestamp_ms.unwrap_or_else(|| live.elapsed_ms()),
        image: frame.image.map(|image| Arc::from(to_data_url(&image))),
    };
    live.handle_frame(input)
}

/// Run a camera frame through the pose service. A failed estimate counts
/// as a frame with nobody in it.
async fn image_frame(
    state: &AppState,
    conn_id: Uuid,
    live: &mut LiveSession,
    image: String,
) -> ServerMessage {
    let Some(pose) = &state.pose else {
        return ServerMessage::error("No pose service configured; send landmarks instead");
    };

    let timestamp_ms = live.elapsed_ms();
    let landmarks = match pose.estimate(&image).await {
        Ok(landmarks) => landmarks,
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Pose estimation failed");
            None
        }
    };

    live.handle_frame(FrameInput {
        landmarks,
        timestamp_ms,
        image: Some(Arc::from(image)),
    })
}

/// Generate the session report off the frame loop and push it as a
/// `REPORT` frame. Dropped if the connection closes first.
fn spawn_report(
    state: AppState,
    conn_id: Uuid,
    summary: SessionSummary,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let timeout = state.config.coach.timeout();
        let content = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(conn_id = %conn_id, "Report cancelled, connection closed");
                return;
            }
            content = session_report(state.coach.as_deref(), &summary, timeout) => content,
        };

        let message = ServerMessage::Report { content };
        if !state.ws_manager.send_to(conn_id, &message).await {
            tracing::debug!(conn_id = %conn_id, "Report ready after disconnect");
        }
    });
}

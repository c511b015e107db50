use std::collections::HashMap;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ws::Message;
use repcoach_core::profile::ExerciseProfile;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::ws::protocol::ServerMessage;

/// Outbound queue of one socket, drained by its sender task.
pub type Outbox = mpsc::UnboundedSender<Message>;

/// What the registry knows about one open session socket.
///
/// The exercise state itself lives with the connection's task; this is a
/// status copy for monitoring.
struct SessionEntry {
    outbox: Outbox,
    opened_at: Instant,
    exercise: ExerciseProfile,
    recording: bool,
}

/// Registry of open session sockets.
///
/// Shared behind an `Arc`. Handlers push frames to a socket by id through
/// its outbox, so work spawned off the frame loop (reports) can still reach
/// the client.
pub struct WsManager {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a socket and hand back the receiving end of its outbox.
    pub async fn add(&self, id: Uuid) -> mpsc::UnboundedReceiver<Message> {
        let (outbox, rx) = mpsc::unbounded_channel();
        let entry = SessionEntry {
            outbox,
            opened_at: Instant::now(),
            exercise: ExerciseProfile::default(),
            recording: false,
        };
        self.sessions.write().await.insert(id, entry);
        rx
    }

    pub async fn remove(&self, id: Uuid) {
        if let Some(entry) = self.sessions.write().await.remove(&id) {
            tracing::debug!(
                conn_id = %id,
                open_secs = entry.opened_at.elapsed().as_secs(),
                exercise = %entry.exercise,
                "Session socket removed",
            );
        }
    }

    /// Record the session's current exercise and recording flag.
    pub async fn set_status(&self, id: Uuid, exercise: ExerciseProfile, recording: bool) {
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.exercise = exercise;
            entry.recording = recording;
        }
    }

    /// Queue a server frame for one socket.
    ///
    /// Returns `false` when the socket is gone or its sender task has ended.
    pub async fn send_to(&self, id: Uuid, message: &ServerMessage) -> bool {
        self.push(id, message.to_message()).await
    }

    /// Queue a raw WebSocket message for one socket.
    pub async fn push(&self, id: Uuid, message: Message) -> bool {
        self.sessions
            .read()
            .await
            .get(&id)
            .is_some_and(|entry| entry.outbox.send(message).is_ok())
    }

    pub async fn connection_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Sessions with a recorded set in progress.
    pub async fn recording_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.recording)
            .count()
    }

    /// Send a Close frame to every socket and forget them all. Returns how
    /// many sockets were open.
    pub async fn shutdown_all(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        for entry in sessions.values() {
            let _ = entry.outbox.send(Message::Close(None));
        }
        sessions.clear();
        tracing::info!(count, "Closed all session sockets");
        count
    }

    /// Ping every socket. Returns how many outboxes accepted the ping.
    pub async fn ping_all(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.outbox.send(Message::Ping(Bytes::new())).is_ok())
            .count()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

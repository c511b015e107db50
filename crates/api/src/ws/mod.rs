//! WebSocket exercise sessions.
//!
//! One connection is one exercise session. Provides connection management,
//! heartbeat pings, the wire protocol, the per-connection session driver and
//! the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod live;
pub mod manager;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use live::LiveSession;
pub use manager::WsManager;

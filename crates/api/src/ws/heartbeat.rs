use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every open session socket on a fixed interval so idle clients (a
/// user resting between sets) are not dropped by proxies. Abort the
/// returned handle to stop it.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let reached = ws_manager.ping_all().await;
            if reached > 0 {
                tracing::trace!(reached, "Heartbeat ping");
            }
        }
    })
}

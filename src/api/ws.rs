//! Session-gated WebSocket push channel for operational snapshots.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::{debug, warn};

use super::{ApiError, AppState, auth};
use crate::services::broadcaster;
use crate::state::SharedState;

/// GET /admin/ws
///
/// The session lookup happens here, during the upgrade handshake: an
/// unauthenticated attempt gets a plain 401 and the upgrade is never
/// completed, so no frames are exchanged with anonymous peers.
pub async fn admin_ws(
    State(state): State<Arc<AppState>>,
    session: Session,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if !auth::session_is_admin(&session).await? {
        return Err(ApiError::Unauthorized);
    }

    let shared = state.shared.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, shared)))
}

async fn handle_socket(socket: WebSocket, shared: Arc<SharedState>) {
    shared.telemetry.ws_connected();
    debug!("Snapshot subscriber connected");

    let (mut sender, mut receiver) = socket.split();

    // One immediate snapshot outside the regular cadence.
    match broadcaster::build_snapshot(&shared.telemetry).await {
        Ok(snapshot) => {
            if let Ok(frame) = serde_json::to_string(&snapshot)
                && sender.send(Message::Text(frame.into())).await.is_err()
            {
                shared.telemetry.ws_disconnected();
                return;
            }
        }
        Err(e) => warn!("Failed to build initial snapshot: {}", e),
    }

    let mut rx = shared.snapshot_tx.subscribe();

    loop {
        tokio::select! {
            // The channel is push-only; client frames are drained solely to
            // notice closure and answer pings.
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            frame = rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if sender.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!("Snapshot subscriber lagged by {} frames", count);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    shared.telemetry.ws_disconnected();
    debug!("Snapshot subscriber disconnected");
}

//! Realtime WebSocket handler
//!
//! Upgrades the HTTP connection and runs the per-connection event loop: one
//! session per connection, sequential dispatch, a dedicated sender task for
//! outbound events, and idle-timeout housekeeping. The session exists in
//! the store from accept to teardown and is removed exactly once on any
//! exit path.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::dispatch::{EventContext, dispatch_event};
use super::messages::{ErrorInfo, ServerEvent, decode_client_event};
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Outbound event channel depth per connection
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Maximum WebSocket frame size (16 MB; append chunks are capped at 8 MB of
/// base64 plus JSON overhead)
const MAX_WS_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Maximum WebSocket message size (16 MB)
const MAX_WS_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// How often the connection is checked for staleness
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum idle time before the connection is closed
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Realtime WebSocket handler
///
/// `GET /ws/realtime` - upgrades to the realtime event protocol. The
/// connection-limit middleware injects `ClientIp` so the slot can be
/// released on teardown; the extension is optional so the handler also runs
/// unwrapped in tests.
pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    info!("realtime WebSocket connection upgrade requested");

    let client_ip = client_ip.map(|Extension(ClientIp(ip))| ip);
    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_realtime_socket(socket, state, client_ip))
}

/// Run one realtime connection to completion.
async fn handle_realtime_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    client_ip: Option<std::net::IpAddr>,
) {
    let session_id = format!("sess_{}", Uuid::new_v4().simple());

    let session = match state.sessions.create(&session_id) {
        Ok(session) => session,
        Err(e) => {
            // Generated ids are unique; hitting this means the store is
            // corrupt, so refuse the connection rather than share state.
            error!(session_id, error = %e, "failed to create session");
            if let Some(ip) = client_ip {
                state.release_connection(ip);
            }
            return;
        }
    };
    info!(session_id, "realtime WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing events. Exits when the client is gone or the
    // connection loop drops `tx`.
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("failed to serialize outgoing event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Implicit session.create: acknowledge the connection with a config
    // snapshot before reading any frames.
    let created = {
        let session = session.lock().await;
        ServerEvent::SessionCreated {
            event_id: format!("event_{session_id}_created"),
            session: session.config.clone(),
        }
    };
    let _ = tx.send(created).await;

    let ctx = EventContext {
        session,
        encoder: state.encoder.clone(),
        inference: state.inference.clone(),
        call_timeout: state.config.external_call_timeout,
    };

    let mut last_activity = Instant::now();

    loop {
        select! {
            frame = receiver.next() => {
                last_activity = Instant::now();

                match frame {
                    Some(Ok(Message::Text(text))) => {
                        // Dispatch is raced against the outbound channel
                        // closing: if the client disconnects mid-call the
                        // in-flight collaborator future is dropped, not
                        // leaked.
                        let client_gone = select! {
                            biased;
                            _ = process_frame(&ctx, &session_id, &text, &tx) => false,
                            _ = tx.closed() => true,
                        };
                        if client_gone {
                            warn!(session_id, "client disconnected during dispatch");
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(session_id, "binary frame rejected");
                        let _ = tx
                            .send(ServerEvent::error(
                                generate_event_id(),
                                ErrorInfo::invalid_payload(),
                            ))
                            .await;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!(session_id, "realtime WebSocket close received");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(session_id, "realtime WebSocket error: {e}");
                        break;
                    }
                    None => {
                        info!(session_id, "realtime WebSocket connection closed by client");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if last_activity.elapsed() > IDLE_TIMEOUT {
                    warn!(
                        session_id,
                        idle_secs = last_activity.elapsed().as_secs(),
                        "closing stale realtime connection"
                    );
                    let _ = tx
                        .send(ServerEvent::error(
                            generate_event_id(),
                            ErrorInfo::idle_timeout(),
                        ))
                        .await;
                    break;
                }
                debug!(session_id, "realtime connection idle check - still active");
            }
        }
    }

    // Teardown: session removal is idempotent and happens exactly here.
    sender_task.abort();
    state.sessions.remove(&session_id);
    if let Some(ip) = client_ip {
        state.release_connection(ip);
    }
    info!(session_id, "realtime WebSocket connection terminated");
}

/// Decode one text frame and dispatch it, or answer with the matching
/// protocol error event.
async fn process_frame(
    ctx: &EventContext,
    session_id: &str,
    text: &str,
    tx: &mpsc::Sender<ServerEvent>,
) {
    match decode_client_event(text) {
        Ok(decoded) => {
            let event_id = decoded.event_id.unwrap_or_else(generate_event_id);
            debug!(session_id, event_id, "dispatching realtime event");
            dispatch_event(ctx, &event_id, decoded.event, tx).await;
        }
        Err(failure) => {
            warn!(session_id, error = ?failure.error, "rejected inbound frame");
            let event_id = failure.event_id.unwrap_or_else(generate_event_id);
            let _ = tx
                .send(ServerEvent::error(event_id, ErrorInfo::from(&failure.error)))
                .await;
        }
    }
}

fn generate_event_id() -> String {
    format!("event_{}", Uuid::new_v4().simple())
}

//! Realtime WebSocket route configuration.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::realtime::realtime_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the realtime WebSocket router
///
/// # Endpoint
///
/// `GET /ws/realtime` - WebSocket upgrade for realtime multimodal inference
///
/// # Protocol
///
/// On connect the server creates a session and sends `session.created` with
/// the default configuration. Clients then send JSON events:
///
/// ```json
/// {"type": "session.update", "session": {"instructions": "Summarize"}}
/// {"type": "input_audio_buffer.append", "audio": "<base64 pcm16>"}
/// {"type": "input_audio_buffer.commit"}
/// ```
///
/// The server acknowledges every event: `session.updated`,
/// `input_audio_buffer.appended`, then on commit `response.done` (or
/// `error`) followed by `input_audio_buffer.cleared`.
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/realtime", get(realtime_handler))
        .layer(TraceLayer::new_for_http())
}

//! Realtime WebSocket session manager.
//!
//! - `messages` - the wire protocol (tagged event unions + decode)
//! - `dispatch` - the per-event state machine
//! - `handler` - the axum WebSocket endpoint and connection loop

pub mod dispatch;
pub mod handler;
pub mod messages;

pub use dispatch::{EventContext, dispatch_event};
pub use handler::realtime_handler;

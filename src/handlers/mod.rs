//! HTTP and WebSocket request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - health, status and configuration endpoints
//! - `media` - media encoding endpoints (no inference)
//! - `llm` - inference endpoints (upload + analyze in one call)
//! - `realtime` - realtime multimodal WebSocket endpoint
//! - `upload` - shared multipart helpers

pub mod api;
pub mod llm;
pub mod media;
pub mod realtime;
pub mod upload;

// Re-export commonly used handlers for convenient access
pub use realtime::realtime_handler;

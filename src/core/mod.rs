//! Core gateway functionality
//!
//! - `media` - media encoding collaborator (ffmpeg-backed transcoding to
//!   base64 payloads)
//! - `inference` - inference collaborator (Gemini REST client)
//! - `session` - realtime session state and the session store

pub mod inference;
pub mod media;
pub mod session;

//! Google Gemini inference provider.
//!
//! REST client for the `generateContent` endpoint of the Generative
//! Language API.

mod client;
mod config;
pub mod messages;

pub use client::GeminiClient;
pub use config::GeminiConfig;

//! Error types shared across the gateway
//!
//! Collaborator-specific errors (`EncodingError`, `InferenceError`,
//! `SessionError`) live next to their modules under `core`; this module
//! holds the crate-level error that HTTP handlers return.

pub mod app_error;

pub use app_error::{AppError, AppResult};

pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod utils;

// Re-export commonly used items for convenience
pub use crate::config::ServerConfig;
pub use crate::core::inference::{InferenceClient, InferenceError, InferenceRequest};
pub use crate::core::media::{EncodingError, MediaEncoder, MediaKind};
pub use crate::core::session::{Session, SessionError, SessionStore};
pub use crate::errors::app_error::{AppError, AppResult};
pub use crate::state::AppState;

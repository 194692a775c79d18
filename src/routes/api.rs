//! REST API route configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, llm, media};
use crate::state::AppState;
use std::sync::Arc;

/// Create the REST API router.
///
/// System endpoints report health and configuration; `encode-*` endpoints
/// transcode uploads to base64 without inference; `invoke-*` endpoints run
/// upload → encode → inference in one call.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // System
        .route("/api/health", get(api::health_check))
        .route("/api/status", get(api::get_status))
        .route("/api/config", get(api::get_config))
        .route("/api/realtime/status", get(api::realtime_status))
        // Media encoding (no inference)
        .route("/api/encode-audio", post(media::encode_audio))
        .route("/api/encode-image", post(media::encode_image))
        .route("/api/encode-video", post(media::encode_video))
        .route("/api/encode-multimodal", post(media::encode_multimodal))
        .route("/api/video-info", post(media::video_info))
        // Inference
        .route("/api/invoke-text", post(llm::invoke_text))
        .route("/api/invoke-audio", post(llm::invoke_audio))
        .route("/api/invoke-image", post(llm::invoke_image))
        .route("/api/invoke-video", post(llm::invoke_video))
        .route("/api/invoke-video-base64", post(llm::invoke_video_base64))
        .route("/api/invoke-multimodal", post(llm::invoke_multimodal))
        .layer(TraceLayer::new_for_http())
}

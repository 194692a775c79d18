//! System endpoints: health checks, status, and configuration.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::core::inference::BackendInfo;
use crate::core::session::Modality;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub details: BackendInfo,
}

/// Health check endpoint for monitoring.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let details = state.inference.backend_info();
    let status = if details.has_api_key {
        "healthy"
    } else {
        "unhealthy"
    };
    Json(HealthResponse {
        status,
        backend: details.backend,
        details,
    })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub server_status: &'static str,
    pub message: &'static str,
    pub backend: &'static str,
}

/// Server status and backend information.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let info = state.inference.backend_info();
    Json(StatusResponse {
        server_status: "running",
        message: "Processing ready",
        backend: info.backend,
    })
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub backend: &'static str,
    pub model: String,
    /// Whether a backend API key is loaded; never the key itself
    pub api_key: &'static str,
    pub has_key: bool,
    pub server: &'static str,
}

/// Sanitized configuration snapshot.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let info = state.inference.backend_info();
    Json(ConfigResponse {
        backend: info.backend,
        model: info.model,
        api_key: if info.has_api_key {
            "Loaded"
        } else {
            "Not loaded"
        },
        has_key: info.has_api_key,
        server: "modality-gateway",
    })
}

#[derive(Debug, Serialize)]
pub struct RealtimeEndpoints {
    pub multimodal: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RealtimeStatusResponse {
    pub status: &'static str,
    pub active_connections: usize,
    pub sessions: Vec<String>,
    pub endpoints: RealtimeEndpoints,
    pub supported_modalities: Vec<Modality>,
}

/// Realtime WebSocket status: live connection count and session ids.
pub async fn realtime_status(State(state): State<Arc<AppState>>) -> Json<RealtimeStatusResponse> {
    Json(RealtimeStatusResponse {
        status: "active",
        active_connections: state.active_ws_connections(),
        sessions: state.sessions.ids(),
        endpoints: RealtimeEndpoints {
            multimodal: "/ws/realtime",
        },
        supported_modalities: vec![
            Modality::Text,
            Modality::Audio,
            Modality::Image,
            Modality::Video,
        ],
    })
}

//! Media encoding endpoints.
//!
//! Upload → transcode → base64, without inference. The inference endpoints
//! live in `handlers::llm`.

use std::sync::Arc;

use axum::{extract::Multipart, extract::State, response::Json};
use serde::Serialize;

use super::upload::{FormPayload, validate_upload};
use crate::core::media::{MediaKind, VideoInfo};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_b64: Option<String>,
    pub size_bytes: usize,
}

impl EncodeResponse {
    fn new(kind: MediaKind, encoded: String, size_bytes: usize) -> Self {
        let mut response = Self {
            status: "success",
            message: format!("{} encoded successfully", capitalize(kind)),
            audio_b64: None,
            image_b64: None,
            video_b64: None,
            size_bytes,
        };
        match kind {
            MediaKind::Audio => response.audio_b64 = Some(encoded),
            MediaKind::Image => response.image_b64 = Some(encoded),
            MediaKind::Video => response.video_b64 = Some(encoded),
        }
        response
    }
}

fn capitalize(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "Audio",
        MediaKind::Image => "Image",
        MediaKind::Video => "Video",
    }
}

/// Shared upload → encode flow for the single-file endpoints.
async fn encode_single(
    state: &AppState,
    multipart: Multipart,
    kind: MediaKind,
) -> AppResult<EncodeResponse> {
    let payload = FormPayload::read(multipart).await?;
    let file = payload.require_file(&kind.to_string())?;
    validate_upload(kind, file)?;

    let size_bytes = file.data.len();
    let encoded = state
        .encoder
        .encode(kind, file.data.clone(), &file.filename)
        .await?;
    Ok(EncodeResponse::new(kind, encoded, size_bytes))
}

/// Encode an uploaded audio file to base64.
pub async fn encode_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<EncodeResponse>> {
    Ok(Json(encode_single(&state, multipart, MediaKind::Audio).await?))
}

/// Encode an uploaded image file to base64.
pub async fn encode_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<EncodeResponse>> {
    Ok(Json(encode_single(&state, multipart, MediaKind::Image).await?))
}

/// Encode an uploaded video file to base64.
pub async fn encode_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<EncodeResponse>> {
    Ok(Json(encode_single(&state, multipart, MediaKind::Video).await?))
}

#[derive(Debug, Serialize)]
pub struct VideoInfoResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub video_info: VideoInfo,
    pub size_bytes: usize,
}

/// Extract video metadata without transcoding.
pub async fn video_info(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<VideoInfoResponse>> {
    let payload = FormPayload::read(multipart).await?;
    let file = payload.require_file("video")?;
    validate_upload(MediaKind::Video, file)?;

    let size_bytes = file.data.len();
    let video_info = state
        .encoder
        .probe_video(file.data.clone(), &file.filename)
        .await?;

    Ok(Json(VideoInfoResponse {
        status: "success",
        message: "Video information extracted",
        video_info,
        size_bytes,
    }))
}

#[derive(Debug, Serialize)]
pub struct MultimodalEncodeResponse {
    pub status: &'static str,
    pub message: String,
    pub audio_b64: Option<String>,
    pub image_b64: Option<String>,
    pub video_b64: Option<String>,
    pub total_size_bytes: usize,
    pub content_types: Vec<String>,
}

/// Encode any subset of audio/image/video uploads in one call.
pub async fn encode_multimodal(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<MultimodalEncodeResponse>> {
    let payload = FormPayload::read(multipart).await?;

    let mut response = MultimodalEncodeResponse {
        status: "success",
        message: String::new(),
        audio_b64: None,
        image_b64: None,
        video_b64: None,
        total_size_bytes: 0,
        content_types: Vec::new(),
    };

    for kind in [MediaKind::Audio, MediaKind::Image, MediaKind::Video] {
        if let Some(file) = payload.file(&kind.to_string()) {
            validate_upload(kind, file)?;
            response.total_size_bytes += file.data.len();
            response.content_types.push(kind.to_string());
            let encoded = state
                .encoder
                .encode(kind, file.data.clone(), &file.filename)
                .await?;
            match kind {
                MediaKind::Audio => response.audio_b64 = Some(encoded),
                MediaKind::Image => response.image_b64 = Some(encoded),
                MediaKind::Video => response.video_b64 = Some(encoded),
            }
        }
    }

    if response.content_types.is_empty() {
        return Err(AppError::InvalidRequest(
            "At least one file must be provided".to_string(),
        ));
    }

    response.message = format!(
        "Multimodal encoding successful ({})",
        response.content_types.join(" + ")
    );
    Ok(Json(response))
}

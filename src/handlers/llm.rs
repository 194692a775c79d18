//! Inference endpoints.
//!
//! Each endpoint uploads media (or accepts text/base64), runs it through the
//! media encoder, and relays the result to the inference backend in one
//! call. Conversation mode swaps in short prompts and brief answers.

use std::sync::Arc;

use axum::{extract::Multipart, extract::State, response::Json};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::upload::{FormPayload, validate_upload};
use crate::core::inference::{
    CONVERSATION_AUDIO_PROMPT, CONVERSATION_IMAGE_PROMPT, CONVERSATION_MULTIMODAL_PROMPT,
    CONVERSATION_VIDEO_PROMPT, DEFAULT_AUDIO_PROMPT, DEFAULT_IMAGE_PROMPT,
    DEFAULT_MULTIMODAL_PROMPT, DEFAULT_VIDEO_PROMPT, InferenceRequest,
};
use crate::core::media::MediaKind;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::preview;

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub status: &'static str,
    pub message: String,
    pub content_type: String,
    pub size_bytes: usize,
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// Transcription plus any additional insights
    pub transcription: String,
    pub size_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default)]
    pub conversation_mode: bool,
}

fn default_prompt() -> String {
    DEFAULT_MULTIMODAL_PROMPT.to_string()
}

/// Analyze plain text.
pub async fn invoke_text(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> AppResult<Json<AnalysisResponse>> {
    let size_bytes = request.text.len();
    info!(size_bytes, "starting text analysis");

    let response = state
        .inference
        .generate(InferenceRequest {
            text: Some(format!("{}\n\n{}", request.text, request.prompt)),
            brief: request.conversation_mode,
            ..Default::default()
        })
        .await?;

    info!(size_bytes, analysis = %preview(&response.text), "text analysis complete");
    Ok(Json(AnalysisResponse {
        status: "success",
        message: "Text analyzed successfully".to_string(),
        content_type: "text/plain".to_string(),
        size_bytes,
        analysis: response.text,
    }))
}

/// Upload audio and analyze it.
pub async fn invoke_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<TranscriptionResponse>> {
    let payload = FormPayload::read(multipart).await?;
    let file = payload.require_file("audio")?;
    validate_upload(MediaKind::Audio, file)?;

    let conversation_mode = payload.flag("conversation_mode");
    let prompt = effective_prompt(&payload, conversation_mode, CONVERSATION_AUDIO_PROMPT, DEFAULT_AUDIO_PROMPT);
    let size_bytes = file.data.len();
    info!(filename = file.filename, size_bytes, "starting audio analysis");

    let encoded = state
        .encoder
        .encode(MediaKind::Audio, file.data.clone(), &file.filename)
        .await?;
    let response = state
        .inference
        .generate(InferenceRequest {
            text: Some(prompt),
            audio: vec![encoded],
            brief: conversation_mode,
            ..Default::default()
        })
        .await?;

    info!(size_bytes, transcription = %preview(&response.text), "audio analysis complete");
    Ok(Json(TranscriptionResponse {
        status: "success",
        message: "Audio analyzed successfully",
        transcription: response.text,
        size_bytes,
    }))
}

/// Upload an image and analyze it.
pub async fn invoke_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let payload = FormPayload::read(multipart).await?;
    let file = payload.require_file("image")?;
    validate_upload(MediaKind::Image, file)?;

    let conversation_mode = payload.flag("conversation_mode");
    let prompt = effective_prompt(&payload, conversation_mode, CONVERSATION_IMAGE_PROMPT, DEFAULT_IMAGE_PROMPT);
    let size_bytes = file.data.len();
    info!(filename = file.filename, size_bytes, "starting image analysis");

    let encoded = state
        .encoder
        .encode(MediaKind::Image, file.data.clone(), &file.filename)
        .await?;
    let response = state
        .inference
        .generate(InferenceRequest {
            text: Some(prompt),
            images: vec![encoded],
            brief: conversation_mode,
            ..Default::default()
        })
        .await?;

    info!(size_bytes, analysis = %preview(&response.text), "image analysis complete");
    Ok(Json(AnalysisResponse {
        status: "success",
        message: "Image analyzed successfully".to_string(),
        content_type: "image".to_string(),
        size_bytes,
        analysis: response.text,
    }))
}

/// Upload a video and analyze it.
pub async fn invoke_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let payload = FormPayload::read(multipart).await?;
    let file = payload.require_file("video")?;
    validate_upload(MediaKind::Video, file)?;

    let conversation_mode = payload.flag("conversation_mode");
    let prompt = effective_prompt(&payload, conversation_mode, CONVERSATION_VIDEO_PROMPT, DEFAULT_VIDEO_PROMPT);

    analyze_video(
        &state,
        file.data.clone(),
        &file.filename,
        prompt,
        conversation_mode,
        "Video analyzed successfully",
    )
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct VideoBase64Request {
    pub video_b64: String,
    pub filename: String,
    #[serde(default = "default_video_prompt")]
    pub prompt: String,
    #[serde(default)]
    pub conversation_mode: bool,
}

fn default_video_prompt() -> String {
    DEFAULT_VIDEO_PROMPT.to_string()
}

/// Analyze base64 video data (no multipart upload).
pub async fn invoke_video_base64(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VideoBase64Request>,
) -> AppResult<Json<AnalysisResponse>> {
    let data = BASE64
        .decode(&request.video_b64)
        .map_err(|_| AppError::InvalidRequest("video_b64 is not valid base64".to_string()))?;

    let prompt = if request.conversation_mode {
        CONVERSATION_VIDEO_PROMPT.to_string()
    } else {
        request.prompt
    };

    analyze_video(
        &state,
        data,
        &request.filename,
        prompt,
        request.conversation_mode,
        "Base64 video analyzed successfully",
    )
    .await
    .map(Json)
}

async fn analyze_video(
    state: &AppState,
    data: Vec<u8>,
    filename: &str,
    prompt: String,
    brief: bool,
    message: &str,
) -> AppResult<AnalysisResponse> {
    let size_bytes = data.len();
    info!(filename, size_bytes, "starting video analysis");

    let encoded = state.encoder.encode(MediaKind::Video, data, filename).await?;
    let response = state
        .inference
        .generate(InferenceRequest {
            text: Some(prompt),
            videos: vec![encoded],
            brief,
            ..Default::default()
        })
        .await?;

    info!(size_bytes, analysis = %preview(&response.text), "video analysis complete");
    Ok(AnalysisResponse {
        status: "success",
        message: message.to_string(),
        content_type: "video".to_string(),
        size_bytes,
        analysis: response.text,
    })
}

/// Upload any subset of audio/image/video and analyze them together.
pub async fn invoke_multimodal(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let payload = FormPayload::read(multipart).await?;

    let conversation_mode = payload.flag("conversation_mode");
    let prompt = effective_prompt(
        &payload,
        conversation_mode,
        CONVERSATION_MULTIMODAL_PROMPT,
        DEFAULT_MULTIMODAL_PROMPT,
    );

    let mut request = InferenceRequest {
        text: Some(prompt),
        brief: conversation_mode,
        ..Default::default()
    };
    let mut size_bytes = 0;
    let mut content_types = Vec::new();

    for kind in [MediaKind::Audio, MediaKind::Image, MediaKind::Video] {
        if let Some(file) = payload.file(&kind.to_string()) {
            validate_upload(kind, file)?;
            size_bytes += file.data.len();
            content_types.push(kind.to_string());
            let encoded = state
                .encoder
                .encode(kind, file.data.clone(), &file.filename)
                .await?;
            match kind {
                MediaKind::Audio => request.audio.push(encoded),
                MediaKind::Image => request.images.push(encoded),
                MediaKind::Video => request.videos.push(encoded),
            }
        }
    }

    if content_types.is_empty() {
        return Err(AppError::InvalidRequest(
            "At least one file (audio, image or video) must be provided".to_string(),
        ));
    }

    let content_type = content_types.join(" + ");
    info!(content_type, size_bytes, "starting multimodal analysis");

    let response = state.inference.generate(request).await?;

    info!(size_bytes, analysis = %preview(&response.text), "multimodal analysis complete");
    Ok(Json(AnalysisResponse {
        status: "success",
        message: format!("Multimodal processing successful ({content_type})"),
        content_type,
        size_bytes,
        analysis: response.text,
    }))
}

/// Pick the prompt: explicit form field, or the conversation/default preset.
fn effective_prompt(
    payload: &FormPayload,
    conversation_mode: bool,
    conversation_prompt: &str,
    default_prompt: &str,
) -> String {
    if conversation_mode {
        conversation_prompt.to_string()
    } else {
        payload
            .text("prompt")
            .unwrap_or(default_prompt)
            .to_string()
    }
}

//! Media encoding collaborator.
//!
//! Turns uploaded or streamed media bytes into base64 payloads the inference
//! backend accepts. All transcoding is delegated to an external ffmpeg
//! binary; this module only stages bytes, drives the subprocess, and encodes
//! the result. The `MediaEncoder` trait is the seam the rest of the gateway
//! (and the test suites) program against.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod ffmpeg;
pub mod formats;
pub mod wav;

pub use ffmpeg::FfmpegEncoder;

/// Media modality handled by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Image,
    Video,
}

impl MediaKind {
    /// MIME type used when embedding this kind in an inference request.
    /// The backend accepts one canonical type per kind since the encoder
    /// normalizes everything (audio to mp3, video to mp4, images pass
    /// through and are declared as png).
    pub fn inference_mime_type(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio/mp3",
            MediaKind::Image => "image/png",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Fallback file extension when an upload carries no usable filename.
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Audio => ".webm",
            MediaKind::Image => ".jpg",
            MediaKind::Video => ".mp4",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Errors that can occur while encoding media.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// File extension is not accepted for this kind
    #[error("unsupported {kind} format: {extension}")]
    UnsupportedFormat { kind: MediaKind, extension: String },

    /// The external tool could not be launched (missing binary, permissions)
    #[error("failed to launch {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        source: std::io::Error,
    },

    /// The external tool ran but exited with an error
    #[error("{kind} conversion failed: {detail}")]
    ToolFailed { kind: MediaKind, detail: String },

    /// PCM data could not be wrapped into a WAV container
    #[error("wav wrapping failed: {0}")]
    WavEncoding(String),

    /// Temp-file staging failed
    #[error("media staging failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Video metadata extracted via ffprobe.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    pub file_size_mb: f64,
    pub duration_seconds: f64,
}

/// Media encoding collaborator.
///
/// Implementations must be stateless between calls: encoding the same input
/// twice yields the same result and no call depends on a previous one.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Encode uploaded media bytes into a base64 payload for the inference
    /// backend. `filename` is a hint used to pick the container format.
    async fn encode(
        &self,
        kind: MediaKind,
        data: Vec<u8>,
        filename: &str,
    ) -> Result<String, EncodingError>;

    /// Wrap raw PCM16 capture data (mono, 16 kHz) in a WAV container and
    /// encode it. This is the realtime audio-buffer path.
    async fn encode_pcm(&self, data: Vec<u8>) -> Result<String, EncodingError>;

    /// Extract size and duration metadata from a video upload.
    async fn probe_video(&self, data: Vec<u8>, filename: &str) -> Result<VideoInfo, EncodingError>;
}

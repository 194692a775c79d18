//! ffmpeg-backed implementation of the media encoding collaborator.
//!
//! Input bytes are staged in a temp file, an ffmpeg/ffprobe subprocess runs
//! against it, and the converted output is read back from stdout. The temp
//! file is removed when the guard drops, including on error paths.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::formats::{is_extension_supported, normalized_extension};
use super::wav::pcm16_to_wav;
use super::{EncodingError, MediaEncoder, MediaKind, VideoInfo};
use crate::config::ServerConfig;

/// Audio is optimized for the inference backend: mono, low bitrate, 16 kHz.
/// The backend downsamples to 16 Kbps anyway, so higher bitrates only cost
/// transfer size.
const AUDIO_ARGS: &[&str] = &[
    "-f",
    "mp3",
    "-codec:a",
    "libmp3lame",
    "-b:a",
    "32k",
    "-ac",
    "1",
    "-ar",
    "16000",
];

/// Video is normalized to fragmented mp4 so it can be piped without a
/// seekable output.
const VIDEO_ARGS: &[&str] = &[
    "-f",
    "mp4",
    "-c:v",
    "libx264",
    "-c:a",
    "aac",
    "-preset",
    "medium",
    "-crf",
    "28",
    "-movflags",
    "frag_keyframe+empty_moov",
];

/// Media encoder shelling out to ffmpeg/ffprobe.
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
    }

    /// Stage bytes in a temp file with the given suffix so ffmpeg can infer
    /// the container format from the extension.
    async fn stage(&self, data: &[u8], suffix: &str) -> Result<NamedTempFile, EncodingError> {
        let file = tempfile::Builder::new().suffix(suffix).tempfile()?;
        tokio::fs::write(file.path(), data).await?;
        Ok(file)
    }

    /// Run ffmpeg against a staged input and capture converted bytes from
    /// stdout.
    async fn transcode(
        &self,
        kind: MediaKind,
        data: &[u8],
        suffix: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, EncodingError> {
        let staged = self.stage(data, suffix).await?;
        debug!(%kind, bytes = data.len(), "running ffmpeg conversion");

        let output = Command::new(&self.ffmpeg)
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(staged.path())
            .args(args)
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EncodingError::ToolUnavailable {
                tool: self.ffmpeg.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EncodingError::ToolFailed { kind, detail });
        }

        debug!(%kind, bytes = output.stdout.len(), "ffmpeg conversion complete");
        Ok(output.stdout)
    }

    fn suffix_for(kind: MediaKind, filename: &str) -> String {
        normalized_extension(filename).unwrap_or_else(|| kind.default_extension().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        kind: MediaKind,
        data: Vec<u8>,
        filename: &str,
    ) -> Result<String, EncodingError> {
        let size = data.len();
        let converted = match kind {
            MediaKind::Image => {
                // Images go to the backend as-is; only the format is checked.
                let extension = Self::suffix_for(kind, filename);
                if !is_extension_supported(MediaKind::Image, &extension) {
                    return Err(EncodingError::UnsupportedFormat { kind, extension });
                }
                data
            }
            MediaKind::Audio => {
                // Always optimize, even for directly-supported formats.
                let suffix = Self::suffix_for(kind, filename);
                self.transcode(kind, &data, &suffix, AUDIO_ARGS).await?
            }
            MediaKind::Video => {
                let suffix = Self::suffix_for(kind, filename);
                self.transcode(kind, &data, &suffix, VIDEO_ARGS).await?
            }
        };

        let encoded = BASE64.encode(&converted);
        info!(%kind, input_bytes = size, encoded_chars = encoded.len(), "media encoded");
        Ok(encoded)
    }

    async fn encode_pcm(&self, data: Vec<u8>) -> Result<String, EncodingError> {
        let wav = pcm16_to_wav(&data)?;
        let converted = self
            .transcode(MediaKind::Audio, &wav, ".wav", AUDIO_ARGS)
            .await?;
        Ok(BASE64.encode(&converted))
    }

    async fn probe_video(&self, data: Vec<u8>, filename: &str) -> Result<VideoInfo, EncodingError> {
        let size_bytes = data.len();
        let suffix = Self::suffix_for(MediaKind::Video, filename);
        let staged = self.stage(&data, &suffix).await?;

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(staged.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EncodingError::ToolUnavailable {
                tool: self.ffprobe.display().to_string(),
                source,
            })?;

        // A failed probe still yields usable size info; duration falls back
        // to zero, matching the upload endpoints' tolerance for exotic files.
        let duration_seconds = if output.status.success() {
            serde_json::from_slice::<ProbeOutput>(&output.stdout)
                .ok()
                .and_then(|p| p.format)
                .and_then(|f| f.duration)
                .and_then(|d| d.parse::<f64>().ok())
                .unwrap_or_else(|| {
                    warn!("could not determine video duration");
                    0.0
                })
        } else {
            warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "ffprobe failed, reporting zero duration"
            );
            0.0
        };

        Ok(VideoInfo {
            file_size_mb: size_bytes as f64 / (1024.0 * 1024.0),
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder_with_missing_tools() -> FfmpegEncoder {
        FfmpegEncoder::new(
            PathBuf::from("/nonexistent/ffmpeg-for-tests"),
            PathBuf::from("/nonexistent/ffprobe-for-tests"),
        )
    }

    #[tokio::test]
    async fn image_passthrough_skips_ffmpeg() {
        // The ffmpeg path is bogus; images must still encode.
        let encoder = encoder_with_missing_tools();
        let encoded = encoder
            .encode(MediaKind::Image, b"fake png bytes".to_vec(), "photo.png")
            .await
            .unwrap();
        assert_eq!(encoded, BASE64.encode(b"fake png bytes"));
    }

    #[tokio::test]
    async fn unsupported_image_extension_is_rejected() {
        let encoder = encoder_with_missing_tools();
        let err = encoder
            .encode(MediaKind::Image, vec![1, 2, 3], "scan.tiff")
            .await
            .unwrap_err();
        match err {
            EncodingError::UnsupportedFormat { kind, extension } => {
                assert_eq!(kind, MediaKind::Image);
                assert_eq!(extension, ".tiff");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_ffmpeg_binary_reports_tool_unavailable() {
        let encoder = encoder_with_missing_tools();
        let err = encoder
            .encode(MediaKind::Audio, vec![0u8; 64], "clip.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, EncodingError::ToolUnavailable { .. }));
    }

    #[test]
    fn suffix_falls_back_per_kind() {
        assert_eq!(FfmpegEncoder::suffix_for(MediaKind::Audio, "voice.OGG"), ".ogg");
        assert_eq!(FfmpegEncoder::suffix_for(MediaKind::Audio, "capture"), ".webm");
        assert_eq!(FfmpegEncoder::suffix_for(MediaKind::Video, "clip"), ".mp4");
    }
}

//! Shared multipart upload helpers.

use std::collections::HashMap;

use axum::extract::Multipart;
use tracing::{debug, warn};

use crate::core::media::formats::is_mime_supported;
use crate::core::media::MediaKind;
use crate::errors::{AppError, AppResult};

/// One file received in a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A fully-read multipart form: file parts keyed by field name, plus plain
/// text fields.
#[derive(Debug, Default)]
pub struct FormPayload {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl FormPayload {
    /// Drain a multipart stream into memory.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut payload = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name() {
                Some(filename) => {
                    let file = UploadedFile {
                        filename: filename.to_string(),
                        content_type: field.content_type().map(str::to_string),
                        data: field.bytes().await?.to_vec(),
                    };
                    debug!(field = name, filename = file.filename, bytes = file.data.len(), "received upload");
                    payload.files.insert(name, file);
                }
                None => {
                    payload.fields.insert(name, field.text().await?);
                }
            }
        }

        Ok(payload)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        // An empty filename means the form slot was submitted without a file
        self.files.get(name).filter(|f| !f.filename.is_empty())
    }

    pub fn require_file(&self, name: &str) -> AppResult<&UploadedFile> {
        self.file(name)
            .ok_or_else(|| AppError::InvalidRequest("Please select a file to upload.".to_string()))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Boolean form field ("true"/"1"/"yes", case-insensitive).
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }
}

/// Validate an upload's declared content type. Unusual types are logged and
/// tolerated; the encoder decides what it can actually convert.
pub fn validate_upload(kind: MediaKind, file: &UploadedFile) -> AppResult<()> {
    if let Some(content_type) = &file.content_type
        && !is_mime_supported(kind, content_type)
    {
        warn!(%kind, content_type, "unusual content type, proceeding anyway");
    }
    Ok(())
}

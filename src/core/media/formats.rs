//! Media format tables and validation.
//!
//! The accepted format sets mirror what the inference backend supports;
//! audio formats outside the directly-supported set are still accepted
//! because the encoder converts everything to mp3 anyway.

use std::path::Path;

use phf::{phf_map, phf_set};

use super::MediaKind;

/// Image formats the backend accepts directly.
pub static SUPPORTED_IMAGE_FORMATS: phf::Set<&'static str> =
    phf_set! {".png", ".jpeg", ".jpg", ".webp", ".heic", ".heif"};

/// Audio formats the backend accepts directly.
pub static SUPPORTED_AUDIO_FORMATS: phf::Set<&'static str> =
    phf_set! {".wav", ".mp3", ".aiff", ".aac", ".ogg", ".flac"};

/// Audio formats accepted for upload because ffmpeg can convert them.
pub static CONVERTIBLE_AUDIO_FORMATS: phf::Set<&'static str> = phf_set! {".webm", ".m4a"};

/// Video formats the backend accepts.
pub static SUPPORTED_VIDEO_FORMATS: phf::Set<&'static str> =
    phf_set! {".mp4", ".mpeg", ".mov", ".avi", ".flv", ".mpg", ".webm", ".wmv", ".3gp"};

/// MIME type to extension mappings for web uploads.
pub static IMAGE_MIME_EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "image/png" => ".png",
    "image/jpeg" => ".jpg",
    "image/jpg" => ".jpg",
    "image/webp" => ".webp",
    "image/heic" => ".heic",
    "image/heif" => ".heif",
};

pub static AUDIO_MIME_EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "audio/webm" => ".webm",
    "audio/wav" => ".wav",
    "audio/mp3" => ".mp3",
    "audio/mpeg" => ".mp3",
    "audio/flac" => ".flac",
    "audio/ogg" => ".ogg",
    "audio/m4a" => ".m4a",
    "audio/aac" => ".aac",
    "audio/aiff" => ".aiff",
};

pub static VIDEO_MIME_EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "video/mp4" => ".mp4",
    "video/mpeg" => ".mpeg",
    "video/mov" => ".mov",
    "video/avi" => ".avi",
    "video/x-flv" => ".flv",
    "video/mpg" => ".mpg",
    "video/webm" => ".webm",
    "video/wmv" => ".wmv",
    "video/3gpp" => ".3gp",
};

/// Lowercased extension of a filename, including the leading dot.
pub fn normalized_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Whether the given MIME type is a recognized upload type for `kind`.
pub fn is_mime_supported(kind: MediaKind, mime: &str) -> bool {
    match kind {
        MediaKind::Audio => AUDIO_MIME_EXTENSIONS.contains_key(mime),
        MediaKind::Image => IMAGE_MIME_EXTENSIONS.contains_key(mime),
        MediaKind::Video => VIDEO_MIME_EXTENSIONS.contains_key(mime),
    }
}

/// Whether the given file extension is accepted for `kind`.
pub fn is_extension_supported(kind: MediaKind, extension: &str) -> bool {
    match kind {
        MediaKind::Audio => {
            SUPPORTED_AUDIO_FORMATS.contains(extension)
                || CONVERTIBLE_AUDIO_FORMATS.contains(extension)
        }
        MediaKind::Image => SUPPORTED_IMAGE_FORMATS.contains(extension),
        MediaKind::Video => SUPPORTED_VIDEO_FORMATS.contains(extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_and_dotted() {
        assert_eq!(normalized_extension("clip.MP4"), Some(".mp4".to_string()));
        assert_eq!(normalized_extension("photo.jpeg"), Some(".jpeg".to_string()));
        assert_eq!(normalized_extension("no_extension"), None);
    }

    #[test]
    fn image_formats() {
        assert!(is_extension_supported(MediaKind::Image, ".png"));
        assert!(is_extension_supported(MediaKind::Image, ".heif"));
        assert!(!is_extension_supported(MediaKind::Image, ".tiff"));
    }

    #[test]
    fn convertible_audio_is_accepted() {
        assert!(is_extension_supported(MediaKind::Audio, ".mp3"));
        assert!(is_extension_supported(MediaKind::Audio, ".webm"));
        assert!(is_extension_supported(MediaKind::Audio, ".m4a"));
        assert!(!is_extension_supported(MediaKind::Audio, ".mid"));
    }

    #[test]
    fn mime_lookup_matches_kind() {
        assert!(is_mime_supported(MediaKind::Audio, "audio/mpeg"));
        assert!(is_mime_supported(MediaKind::Video, "video/3gpp"));
        assert!(!is_mime_supported(MediaKind::Image, "audio/wav"));
    }
}

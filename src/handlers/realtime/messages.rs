//! Realtime WebSocket message types
//!
//! Inbound and outbound events are tagged unions over the fixed protocol
//! event set; the `type` field selects the variant at decode time. Decoding
//! is two-stage so the error taxonomy stays exact: malformed JSON, an
//! unknown discriminator, and a bad payload for a known discriminator each
//! produce a distinct error code.

use phf::phf_set;
use serde::Serialize;

use crate::core::session::{BufferKind, ContentPart, ConversationItem, Role, SessionConfig};

/// Maximum allowed size for session instructions (100 KB)
pub const MAX_INSTRUCTIONS_SIZE: usize = 100 * 1024;

/// Maximum allowed size for one base64 buffer chunk (8 MB)
pub const MAX_CHUNK_BASE64_SIZE: usize = 8 * 1024 * 1024;

/// Maximum allowed size for one conversation media part (20 MB base64)
pub const MAX_CONTENT_PART_SIZE: usize = 20 * 1024 * 1024;

/// Every inbound discriminator the protocol defines.
static CLIENT_EVENT_TYPES: phf::Set<&'static str> = phf_set! {
    "session.update",
    "input_audio_buffer.append",
    "input_audio_buffer.commit",
    "input_video_buffer.append",
    "input_video_buffer.commit",
    "conversation.item.create",
    "response.create",
};

// =============================================================================
// Incoming Events (Client -> Server)
// =============================================================================

/// Inbound WebSocket events from the client.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Replace the session configuration wholesale
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    /// Append a base64 audio chunk to the session's audio buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },

    /// Process and clear the audio buffer
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Append a base64 video chunk to the session's video buffer
    #[serde(rename = "input_video_buffer.append")]
    InputVideoBufferAppend { video: String },

    /// Process and clear the video buffer
    #[serde(rename = "input_video_buffer.commit")]
    InputVideoBufferCommit,

    /// Append an item to the conversation history
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    /// Generate a response from the most recent user conversation item
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Validate field sizes to prevent resource exhaustion.
    pub fn validate_size(&self) -> Result<(), ProtocolError> {
        match self {
            ClientEvent::SessionUpdate { session } => {
                if let Some(instructions) = &session.instructions
                    && instructions.len() > MAX_INSTRUCTIONS_SIZE
                {
                    return Err(ProtocolError::Oversized {
                        what: "instructions",
                        size: instructions.len(),
                        max: MAX_INSTRUCTIONS_SIZE,
                    });
                }
            }
            ClientEvent::InputAudioBufferAppend { audio: chunk }
            | ClientEvent::InputVideoBufferAppend { video: chunk } => {
                if chunk.len() > MAX_CHUNK_BASE64_SIZE {
                    return Err(ProtocolError::Oversized {
                        what: "buffer chunk",
                        size: chunk.len(),
                        max: MAX_CHUNK_BASE64_SIZE,
                    });
                }
            }
            ClientEvent::ConversationItemCreate { item } => {
                for part in &item.content {
                    let size = match part {
                        ContentPart::Text { text } => text.len(),
                        ContentPart::Audio { audio } => audio.len(),
                        ContentPart::Image { image } => image.len(),
                        ContentPart::Video { video } => video.len(),
                    };
                    if size > MAX_CONTENT_PART_SIZE {
                        return Err(ProtocolError::Oversized {
                            what: "content part",
                            size,
                            max: MAX_CONTENT_PART_SIZE,
                        });
                    }
                }
            }
            ClientEvent::InputAudioBufferCommit
            | ClientEvent::InputVideoBufferCommit
            | ClientEvent::ResponseCreate => {}
        }
        Ok(())
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Why an inbound frame could not be dispatched.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    /// Frame is not valid JSON
    InvalidJson,
    /// JSON object has no `type` field
    MissingEventType,
    /// `type` value is not a protocol event
    UnknownEventType { event_type: String },
    /// Known event with a structurally invalid payload
    InvalidPayload { event_type: String, detail: String },
    /// Field exceeds its size limit
    Oversized {
        what: &'static str,
        size: usize,
        max: usize,
    },
}

/// A decoded inbound frame: the client correlation id (if any) plus the event.
#[derive(Debug)]
pub struct DecodedEvent {
    pub event_id: Option<String>,
    pub event: ClientEvent,
}

/// A rejected inbound frame. The correlation id is preserved when it could
/// be extracted so the error ack still correlates.
#[derive(Debug)]
pub struct DecodeFailure {
    pub event_id: Option<String>,
    pub error: ProtocolError,
}

/// Decode one inbound text frame.
pub fn decode_client_event(text: &str) -> Result<DecodedEvent, DecodeFailure> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => {
            return Err(DecodeFailure {
                event_id: None,
                error: ProtocolError::InvalidJson,
            });
        }
    };

    let event_id = value
        .get("event_id")
        .and_then(|id| id.as_str())
        .map(str::to_string);

    let Some(event_type) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(DecodeFailure {
            event_id,
            error: ProtocolError::MissingEventType,
        });
    };

    if !CLIENT_EVENT_TYPES.contains(event_type) {
        return Err(DecodeFailure {
            event_id,
            error: ProtocolError::UnknownEventType {
                event_type: event_type.to_string(),
            },
        });
    }

    let event_type = event_type.to_string();
    let event: ClientEvent = serde_json::from_value(value).map_err(|e| DecodeFailure {
        event_id: event_id.clone(),
        error: ProtocolError::InvalidPayload {
            event_type,
            detail: e.to_string(),
        },
    })?;

    event.validate_size().map_err(|error| DecodeFailure {
        event_id: event_id.clone(),
        error,
    })?;

    Ok(DecodedEvent { event_id, event })
}

// =============================================================================
// Outgoing Events (Server -> Client)
// =============================================================================

/// Error payload carried by an outbound `error` event. Messages are generic
/// by contract; internals stay in the server logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl ErrorInfo {
    pub fn processing_failed(message: &str) -> Self {
        Self {
            error_type: "server_error",
            code: "processing_failed",
            message: message.to_string(),
        }
    }

    /// Contract for `response.create` without a prior user item.
    pub fn no_user_message() -> Self {
        Self {
            error_type: "invalid_request_error",
            code: "no_user_message",
            message: "No user message to respond to.".to_string(),
        }
    }

    pub fn invalid_payload() -> Self {
        Self {
            error_type: "invalid_request_error",
            code: "invalid_payload",
            message: "Invalid request payload. Please try again.".to_string(),
        }
    }

    pub fn idle_timeout() -> Self {
        Self {
            error_type: "server_error",
            code: "idle_timeout",
            message: "Connection closed due to inactivity.".to_string(),
        }
    }
}

impl From<&ProtocolError> for ErrorInfo {
    fn from(error: &ProtocolError) -> Self {
        match error {
            ProtocolError::InvalidJson => Self {
                error_type: "invalid_request_error",
                code: "invalid_json",
                message: "Invalid JSON format".to_string(),
            },
            ProtocolError::MissingEventType => Self {
                error_type: "invalid_request_error",
                code: "invalid_request_error",
                message: "Missing event type".to_string(),
            },
            ProtocolError::UnknownEventType { .. } => Self {
                error_type: "invalid_request_error",
                code: "unknown_event_type",
                message: "Invalid request format. Please try again.".to_string(),
            },
            ProtocolError::InvalidPayload { .. } => Self::invalid_payload(),
            ProtocolError::Oversized { what, size, max } => Self {
                error_type: "invalid_request_error",
                code: "validation_error",
                message: format!("{what} too large: {size} bytes (max: {max} bytes)"),
            },
        }
    }
}

/// The `response` object carried by `response.done`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub object: &'static str,
    pub status: &'static str,
    pub output: Vec<ResponseItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseItem {
    pub id: String,
    pub object: &'static str,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ResponseEnvelope {
    /// A completed response with one assistant text item, ids derived from
    /// the triggering event.
    pub fn completed(event_id: &str, text: String) -> Self {
        Self {
            id: format!("resp_{event_id}"),
            object: "realtime.response",
            status: "completed",
            output: vec![ResponseItem {
                id: format!("item_{event_id}"),
                object: "realtime.item",
                item_type: "message",
                role: Role::Assistant,
                content: vec![ContentPart::Text { text }],
            }],
        }
    }
}

/// Outbound WebSocket events to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "session.created")]
    SessionCreated {
        event_id: String,
        session: SessionConfig,
    },

    #[serde(rename = "session.updated")]
    SessionUpdated {
        event_id: String,
        session: SessionConfig,
    },

    #[serde(rename = "input_audio_buffer.appended")]
    InputAudioBufferAppended { event_id: String },

    #[serde(rename = "input_audio_buffer.cleared")]
    InputAudioBufferCleared { event_id: String },

    #[serde(rename = "input_video_buffer.appended")]
    InputVideoBufferAppended { event_id: String },

    #[serde(rename = "input_video_buffer.cleared")]
    InputVideoBufferCleared { event_id: String },

    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated {
        event_id: String,
        item: ConversationItem,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        event_id: String,
        response: ResponseEnvelope,
    },

    #[serde(rename = "error")]
    Error { event_id: String, error: ErrorInfo },
}

impl ServerEvent {
    pub fn buffer_appended(kind: BufferKind, event_id: String) -> Self {
        match kind {
            BufferKind::Audio => Self::InputAudioBufferAppended { event_id },
            BufferKind::Video => Self::InputVideoBufferAppended { event_id },
        }
    }

    pub fn buffer_cleared(kind: BufferKind, event_id: String) -> Self {
        match kind {
            BufferKind::Audio => Self::InputAudioBufferCleared { event_id },
            BufferKind::Video => Self::InputVideoBufferCleared { event_id },
        }
    }

    pub fn error(event_id: String, error: ErrorInfo) -> Self {
        Self::Error { event_id, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_update_deserializes() {
        let decoded = decode_client_event(
            r#"{"type": "session.update", "event_id": "evt_1",
                "session": {"instructions": "Be brief", "temperature": 0.9}}"#,
        )
        .expect("should decode");

        assert_eq!(decoded.event_id.as_deref(), Some("evt_1"));
        match decoded.event {
            ClientEvent::SessionUpdate { session } => {
                assert_eq!(session.instructions.as_deref(), Some("Be brief"));
                assert_eq!(session.temperature, 0.9);
            }
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
    }

    #[test]
    fn append_and_commit_deserialize() {
        let decoded =
            decode_client_event(r#"{"type": "input_audio_buffer.append", "audio": "QUJD"}"#)
                .unwrap();
        assert!(matches!(
            decoded.event,
            ClientEvent::InputAudioBufferAppend { audio } if audio == "QUJD"
        ));

        let decoded = decode_client_event(r#"{"type": "input_video_buffer.commit"}"#).unwrap();
        assert!(matches!(decoded.event, ClientEvent::InputVideoBufferCommit));
    }

    #[test]
    fn invalid_json_is_classified() {
        let failure = decode_client_event("{not json").unwrap_err();
        assert!(matches!(failure.error, ProtocolError::InvalidJson));
        assert!(failure.event_id.is_none());
    }

    #[test]
    fn unknown_type_is_classified_and_keeps_event_id() {
        let failure =
            decode_client_event(r#"{"type": "session.delete", "event_id": "evt_9"}"#).unwrap_err();
        assert_eq!(failure.event_id.as_deref(), Some("evt_9"));
        assert!(matches!(
            failure.error,
            ProtocolError::UnknownEventType { event_type } if event_type == "session.delete"
        ));
    }

    #[test]
    fn known_type_with_bad_payload_is_classified() {
        // append without its chunk field
        let failure = decode_client_event(r#"{"type": "input_audio_buffer.append"}"#).unwrap_err();
        assert!(matches!(
            failure.error,
            ProtocolError::InvalidPayload { event_type, .. }
                if event_type == "input_audio_buffer.append"
        ));
    }

    #[test]
    fn missing_type_is_classified() {
        let failure = decode_client_event(r#"{"event_id": "evt_2"}"#).unwrap_err();
        assert!(matches!(failure.error, ProtocolError::MissingEventType));
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let chunk = "A".repeat(MAX_CHUNK_BASE64_SIZE + 1);
        let frame =
            format!(r#"{{"type": "input_audio_buffer.append", "audio": "{chunk}"}}"#);
        let failure = decode_client_event(&frame).unwrap_err();
        assert!(matches!(failure.error, ProtocolError::Oversized { .. }));
    }

    #[test]
    fn server_events_serialize_with_protocol_discriminators() {
        let event = ServerEvent::buffer_cleared(BufferKind::Audio, "evt_3".to_string());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"input_audio_buffer.cleared""#));
        assert!(json.contains(r#""event_id":"evt_3""#));

        let event = ServerEvent::SessionCreated {
            event_id: "evt_0".to_string(),
            session: SessionConfig::default(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"session.created""#));
        assert!(json.contains(r#""input_audio_format":"pcm16""#));
    }

    #[test]
    fn response_envelope_wraps_assistant_text() {
        let envelope = ResponseEnvelope::completed("evt_5", "done".to_string());
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains(r#""id":"resp_evt_5""#));
        assert!(json.contains(r#""object":"realtime.response""#));
        assert!(json.contains(r#""role":"assistant""#));
        assert!(json.contains(r#""text":"done""#));
    }

    #[test]
    fn protocol_errors_map_to_stable_codes() {
        let info = ErrorInfo::from(&ProtocolError::InvalidJson);
        assert_eq!(info.code, "invalid_json");

        let info = ErrorInfo::from(&ProtocolError::UnknownEventType {
            event_type: "x".to_string(),
        });
        assert_eq!(info.code, "unknown_event_type");
        assert_eq!(info.error_type, "invalid_request_error");
    }
}

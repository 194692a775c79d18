//! Realtime session state.
//!
//! A `Session` is the server-side state for one live WebSocket connection:
//! its configuration, per-modality input buffers, and conversation history.
//! Sessions live in the `SessionStore` from connect to disconnect and are
//! never persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod store;

pub use store::{SessionHandle, SessionStore};

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session id already present at create time. Should not occur with
    /// generated ids, but the store checks anyway.
    #[error("session already exists: {0}")]
    DuplicateSession(String),

    /// Referenced session id is not in the store
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Modalities a session can exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
    Image,
    Video,
}

/// Which streaming input buffer an event addresses. Audio and video buffers
/// are independent state tracks within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Audio,
    Video,
}

impl BufferKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BufferKind::Audio => "audio",
            BufferKind::Video => "video",
        }
    }
}

/// Session configuration.
///
/// Replaced wholesale by `session.update`: omitted fields fall back to the
/// serde defaults below, never to the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub modalities: Vec<Modality>,
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub input_audio_format: String,
    pub output_audio_format: String,
    pub temperature: f32,
    pub max_response_output_tokens: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            modalities: vec![Modality::Text],
            instructions: None,
            voice: Some("alloy".to_string()),
            input_audio_format: "pcm16".to_string(),
            output_audio_format: "pcm16".to_string(),
            temperature: 0.6,
            max_response_output_tokens: None,
        }
    }
}

/// Speaker role of a conversation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One typed content part of a conversation item. Media parts carry base64
/// data as received from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Audio { audio: String },
    Image { image: String },
    Video { video: String },
}

/// One entry in a session's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default = "default_item_type")]
    pub item_type: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

fn default_item_type() -> String {
    "message".to_string()
}

/// Server-side state for one connected client.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub config: SessionConfig,
    pub audio_buffer: Vec<u8>,
    pub video_buffer: Vec<u8>,
    pub conversation: Vec<ConversationItem>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: SessionConfig::default(),
            audio_buffer: Vec::new(),
            video_buffer: Vec::new(),
            conversation: Vec::new(),
        }
    }

    pub fn buffer_mut(&mut self, kind: BufferKind) -> &mut Vec<u8> {
        match kind {
            BufferKind::Audio => &mut self.audio_buffer,
            BufferKind::Video => &mut self.video_buffer,
        }
    }

    /// Drain the named buffer, leaving it empty. Commit handling relies on
    /// this clearing exactly once regardless of what happens downstream.
    pub fn take_buffer(&mut self, kind: BufferKind) -> Vec<u8> {
        std::mem::take(self.buffer_mut(kind))
    }

    /// Most recent user item in the conversation, if any.
    pub fn last_user_item(&self) -> Option<&ConversationItem> {
        self.conversation
            .iter()
            .rev()
            .find(|item| item.role == Role::User)
    }
}

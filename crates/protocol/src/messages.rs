use serde::{Deserialize, Serialize};

use crate::constants::{MAX_TEXT_CHARS, MessageType};
use crate::error::ProtocolError;
use crate::types::{AnimationAction, EmotionState};

// ---------------------------------------------------------------------------
// Client to backend
// ---------------------------------------------------------------------------

/// Every message the client may send, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "user.message")]
    UserMessage(UserMessage),
}

impl OutgoingMessage {
    pub fn msg_type(&self) -> MessageType {
        match self {
            Self::UserMessage(_) => MessageType::UserMessage,
        }
    }

    /// Request id carried by this message.
    pub fn request_id(&self) -> &str {
        match self {
            Self::UserMessage(m) => &m.request_id,
        }
    }
}

/// A line of user chat text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    pub request_id: String,
}

impl UserMessage {
    /// Builds a user message from raw input.
    ///
    /// The text is trimmed and must be between 1 and [`MAX_TEXT_CHARS`]
    /// characters, the same bounds the backend enforces.
    pub fn new(text: &str, request_id: impl Into<String>) -> Result<Self, ProtocolError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ProtocolError::EmptyText);
        }
        let len = text.chars().count();
        if len > MAX_TEXT_CHARS {
            return Err(ProtocolError::TextTooLong {
                len,
                max: MAX_TEXT_CHARS,
            });
        }
        Ok(Self {
            text: text.to_string(),
            request_id: request_id.into(),
        })
    }
}

impl From<UserMessage> for OutgoingMessage {
    fn from(m: UserMessage) -> Self {
        Self::UserMessage(m)
    }
}

// ---------------------------------------------------------------------------
// Backend to client
// ---------------------------------------------------------------------------

/// Every message the backend may push, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    #[serde(rename = "response.text")]
    ResponseText(ResponseText),
    #[serde(rename = "emotion.update")]
    EmotionUpdate(EmotionState),
    #[serde(rename = "animation.command")]
    AnimationCommand(AnimationCommand),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

impl IncomingMessage {
    pub fn msg_type(&self) -> MessageType {
        match self {
            Self::ResponseText(_) => MessageType::ResponseText,
            Self::EmotionUpdate(_) => MessageType::EmotionUpdate,
            Self::AnimationCommand(_) => MessageType::AnimationCommand,
            Self::Error(_) => MessageType::Error,
        }
    }
}

/// The companion's reply to a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseText {
    pub request_id: String,
    pub text: String,
}

/// Switches the explicit animation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationCommand {
    pub action: AnimationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Application-level failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub detail: String,
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path of the chat WebSocket endpoint, relative to the host URL.
pub const WS_CHAT_PATH: &str = "/ws/chat";

/// Query parameter carrying the session identifier.
pub const WS_SESSION_QUERY: &str = "session_id";

/// Path of the backend health endpoint, relative to the host URL.
pub const HEALTH_PATH: &str = "/health";

/// Timeout for a single health probe.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Read deadline: if nothing arrives within this window (no pong, no
/// response, no push event), the connection is considered dead.
pub const WS_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// How often to send keepalive pings (must be well below the read timeout).
pub const WS_PING_PERIOD: Duration = Duration::from_secs(20);

/// Maximum inbound message size in bytes (1 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Maximum length of a user message, in characters, after trimming.
pub const MAX_TEXT_CHARS: usize = 2_000;

/// Maximum length of a session identifier.
pub const MAX_SESSION_ID_LEN: usize = 100;

/// Wire identifier of every message the chat endpoint exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // Client to backend
    #[serde(rename = "user.message")]
    UserMessage,

    // Backend to client
    #[serde(rename = "response.text")]
    ResponseText,
    #[serde(rename = "emotion.update")]
    EmotionUpdate,
    #[serde(rename = "animation.command")]
    AnimationCommand,
    #[serde(rename = "error")]
    Error,
}

impl MessageType {
    /// The `type` discriminator as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserMessage => "user.message",
            Self::ResponseText => "response.text",
            Self::EmotionUpdate => "emotion.update",
            Self::AnimationCommand => "animation.command",
            Self::Error => "error",
        }
    }
}

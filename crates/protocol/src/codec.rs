//! Text-frame codec for the chat WebSocket.
//!
//! One JSON object per frame. Decoding fails closed: callers are expected to
//! drop anything that does not decode rather than treat it as a connection
//! error.

use crate::constants::WS_MAX_MESSAGE_SIZE;
use crate::error::ProtocolError;
use crate::messages::{IncomingMessage, OutgoingMessage};

/// Serializes an outgoing message into a text frame.
pub fn encode(msg: &OutgoingMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

/// Parses a text frame into a typed incoming message.
pub fn decode(text: &str) -> Result<IncomingMessage, ProtocolError> {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge {
            size: text.len(),
            max: WS_MAX_MESSAGE_SIZE,
        });
    }
    Ok(serde_json::from_str(text)?)
}

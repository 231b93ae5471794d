//! Wire protocol for the companion chat WebSocket.
//!
//! Typed outgoing/incoming messages, the text-frame codec, and the
//! session-id rules shared by every client component.

pub mod codec;
pub mod constants;
pub mod error;
pub mod messages;
pub mod session;
pub mod types;

// Re-export primary types for convenience.
pub use codec::{decode, encode};
pub use constants::MessageType;
pub use error::ProtocolError;
pub use messages::{
    AnimationCommand, ErrorMessage, IncomingMessage, OutgoingMessage, ResponseText, UserMessage,
};
pub use types::{AnimationAction, EmotionState};

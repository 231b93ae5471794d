//! Companion chat client core.
//!
//! Applies decoded backend messages to the transcript, emotion and action
//! state, and wires a connection, an animation player and a visual
//! broadcaster into one [`CompanionSession`].

pub mod error;
pub mod session;
pub mod state;
pub mod transcript;

pub use error::ChatError;
pub use session::{CompanionSession, SessionUpdate};
pub use state::{Applied, CompanionState};
pub use transcript::{ChatEntry, Role, Transcript};

//! Animation state resolution for the companion character.
//!
//! [`resolve`] maps the explicit action command and the emotion reading to
//! an [`AnimState`]; [`AnimationPlayer`] turns that state into a looping
//! frame index at the state's own rate.

pub mod frames;
pub mod player;
pub mod resolver;
pub mod state;

pub use frames::{FrameSequence, PoseFrame, sequence};
pub use player::{AnimationPlayer, FramePosition};
pub use resolver::resolve;
pub use state::AnimState;

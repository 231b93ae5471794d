//! Visual state for rendering surfaces.
//!
//! The core pushes emotion and animation changes into a
//! [`VisualBroadcaster`]; any number of surfaces subscribe to the resulting
//! [`VisualState`] snapshots.

pub mod broadcaster;
pub mod state;

pub use broadcaster::VisualBroadcaster;
pub use state::{RenderStyle, Size, UnknownVariant, VisualState};

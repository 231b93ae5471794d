//! Snapshot consumed by rendering surfaces.

use serde::{Deserialize, Serialize};

use companion_animation::AnimState;
use companion_protocol::EmotionState;

/// How the character is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    #[default]
    Vector,
    Sprite,
}

impl RenderStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Sprite => "sprite",
        }
    }
}

impl std::str::FromStr for RenderStyle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" => Ok(Self::Vector),
            "sprite" => Ok(Self::Sprite),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// On-screen size of the character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

impl Size {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl std::str::FromStr for Size {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// A string that names no variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0:?}")]
pub struct UnknownVariant(pub String);

/// Everything a rendering surface needs to draw the character.
///
/// Last write wins; no history is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    pub emotion: EmotionState,
    pub anim_state: AnimState,
    pub render_style: RenderStyle,
    pub size: Size,
    /// Selected character, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    pub visible: bool,
}

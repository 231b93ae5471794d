use serde::{Deserialize, Deserializer, Serialize};

/// Label the backend reports when it has no stronger reading.
pub const NEUTRAL_LABEL: &str = "neutral";

/// Continuous emotion reading pushed by the backend.
///
/// `valence` and `arousal` are kept within `[-1, 1]`; out-of-range values
/// are clamped on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionState {
    #[serde(deserialize_with = "unit_interval")]
    pub valence: f64,
    #[serde(deserialize_with = "unit_interval")]
    pub arousal: f64,
    pub label: String,
}

impl EmotionState {
    /// Creates an emotion reading, clamping both axes into `[-1, 1]`.
    pub fn new(valence: f64, arousal: f64, label: impl Into<String>) -> Self {
        Self {
            valence: clamp_unit(valence),
            arousal: clamp_unit(arousal),
            label: label.into(),
        }
    }
}

impl Default for EmotionState {
    fn default() -> Self {
        Self::new(0.0, 0.0, NEUTRAL_LABEL)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

fn unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_unit)
}

/// Explicit action command sent by the backend around a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationAction {
    #[default]
    Idle,
    Thinking,
    Talking,
}

impl AnimationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Talking => "talking",
        }
    }
}

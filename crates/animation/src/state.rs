use serde::{Deserialize, Serialize};

/// Resolved animation identity driving pose selection.
///
/// Derived from the action command and the emotion reading; never set
/// directly by the wire protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimState {
    #[default]
    Idle,
    Talking,
    Thinking,
    Happy,
    Sad,
    Surprised,
    Angry,
    Confused,
    Neutral,
    Calm,
    Excited,
    Curious,
    Anxious,
}

impl AnimState {
    /// Every state, in table order.
    pub const ALL: [AnimState; 13] = [
        AnimState::Idle,
        AnimState::Talking,
        AnimState::Thinking,
        AnimState::Happy,
        AnimState::Sad,
        AnimState::Surprised,
        AnimState::Angry,
        AnimState::Confused,
        AnimState::Neutral,
        AnimState::Calm,
        AnimState::Excited,
        AnimState::Curious,
        AnimState::Anxious,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Talking => "talking",
            Self::Thinking => "thinking",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprised => "surprised",
            Self::Angry => "angry",
            Self::Confused => "confused",
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Excited => "excited",
            Self::Curious => "curious",
            Self::Anxious => "anxious",
        }
    }

    /// Case-insensitive lookup of a state by name. Surrounding whitespace
    /// is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for AnimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

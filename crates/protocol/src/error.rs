/// Errors from encoding, decoding or validating chat messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("message text is empty")]
    EmptyText,

    #[error("message text too long ({len} chars, max {max})")]
    TextTooLong { len: usize, max: usize },
}

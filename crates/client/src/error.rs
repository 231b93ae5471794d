use companion_protocol::ProtocolError;

/// Errors from sending chat text.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The text failed validation; nothing was sent.
    #[error("invalid message: {0}")]
    Invalid(#[from] ProtocolError),

    /// No open socket; the message was dropped.
    #[error("not connected, message dropped")]
    NotConnected,
}

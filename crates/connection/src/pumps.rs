//! Background tasks serving one tungstenite connection.

pub(crate) mod ping;
pub(crate) mod read;
pub(crate) mod write;

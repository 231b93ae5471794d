//! Resilient WebSocket connection to the companion chat backend.
//!
//! Provides the [`ConnectionManager`] state machine with exponential-backoff
//! reconnection, the tungstenite transport behind the [`Connector`] seam,
//! URL derivation and a health probe.

pub mod health;
pub mod manager;
mod pumps;
pub(crate) mod reconnection;
pub mod socket;
pub mod types;
pub mod url;
pub mod ws_client;

pub use health::{Reachability, probe};
pub use manager::ConnectionManager;
pub use socket::{Connector, Socket};
pub use types::{ConnectionIdentity, ConnectionStatus, ReconnectConfig};
pub use ws_client::{WsConnector, WsError};

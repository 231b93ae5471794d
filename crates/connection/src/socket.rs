//! Transport seam between the manager and the WebSocket library.

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ws_client::WsError;

/// An open text-frame socket.
///
/// The transport ends `inbound` (the receiver yields `None`) when the peer
/// closes, the read deadline expires or a read fails. Cancelling `close`,
/// or dropping `outbound`, asks the transport to shut down.
#[derive(Debug)]
pub struct Socket {
    /// Text frames to send, in order.
    pub outbound: mpsc::Sender<String>,
    /// Text frames received, in arrival order.
    pub inbound: mpsc::Receiver<String>,
    /// Closes the socket when cancelled.
    pub close: CancellationToken,
}

/// Opens sockets. Implemented by [`WsConnector`](crate::WsConnector) for
/// real connections; tests substitute scripted transports.
pub trait Connector: Send + Sync + 'static {
    /// Resolves once the handshake completes (the socket is open) or fails.
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Socket, WsError>>;
}

//! WebSocket transport built on tokio-tungstenite.

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use companion_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PING_PERIOD};

use crate::pumps::{ping::ping_pump, read::read_pump, write::write_pump};
use crate::socket::{Connector, Socket};

/// Frames buffered in each direction before senders see back-pressure.
const CHANNEL_CAPACITY: usize = 256;

/// Errors from the WebSocket transport.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("connection closed")]
    Closed,
}

/// Production [`Connector`]: one tungstenite connection per call, served by
/// read, write and ping pumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    async fn open(url: &str) -> Result<Socket, WsError> {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();
        debug!(url, "websocket handshake complete");

        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (control_tx, control_rx) = mpsc::channel::<tungstenite::Message>(16);
        let cancel = CancellationToken::new();

        tokio::spawn(write_pump(write, outbound_rx, control_rx, cancel.clone()));
        tokio::spawn(read_pump(read, inbound_tx, control_tx.clone(), cancel.clone()));
        tokio::spawn(ping_pump(control_tx, WS_PING_PERIOD, cancel.clone()));

        Ok(Socket {
            outbound: outbound_tx,
            inbound: inbound_rx,
            close: cancel,
        })
    }
}

impl Connector for WsConnector {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Socket, WsError>> {
        Box::pin(Self::open(url))
    }
}

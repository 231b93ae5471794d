//! WebSocket write pump: serialises outbound frames.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Writes text frames from `outbound_rx` and control frames (pong, ping)
/// from `control_rx` until cancelled or the outbound side is dropped, then
/// sends a close frame.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut outbound_rx: mpsc::Receiver<String>,
    mut control_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            ctrl = control_rx.recv() => match ctrl {
                Some(m) => m,
                None => break,
            },
            text = outbound_rx.recv() => match text {
                Some(t) => tungstenite::Message::Text(t.into()),
                None => break,
            },
        };
        if let Err(e) = write.send(msg).await {
            error!("WebSocket write error: {e}");
            break;
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
    cancel.cancel();
}

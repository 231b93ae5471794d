//! WebSocket read pump: forwards text frames and enforces the read deadline.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use companion_protocol::constants::WS_READ_TIMEOUT;

/// Reads frames until the peer closes, a read fails, the deadline expires
/// or `cancel` fires.
///
/// Any incoming frame resets the deadline, so the periodic pings keep an
/// idle but healthy connection alive. Dropping `inbound_tx` on exit is what
/// tells the manager the socket is gone; `cancel` is fired so the sibling
/// pumps stop too.
pub(crate) async fn read_pump<S>(
    mut read: S,
    inbound_tx: mpsc::Sender<String>,
    control_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_READ_TIMEOUT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut deadline => {
                warn!("read deadline expired, closing connection");
                break;
            }

            msg = read.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                };
                deadline.as_mut().reset(tokio::time::Instant::now() + WS_READ_TIMEOUT);

                match msg {
                    tungstenite::Message::Text(text) => {
                        trace!(len = text.len(), "received text frame");
                        if inbound_tx.send(text.as_str().to_owned()).await.is_err() {
                            debug!("inbound receiver dropped");
                            break;
                        }
                    }
                    tungstenite::Message::Ping(data) => {
                        trace!("received ping, sending pong");
                        let _ = control_tx.send(tungstenite::Message::Pong(data)).await;
                    }
                    tungstenite::Message::Pong(_) => trace!("received pong"),
                    tungstenite::Message::Close(frame) => {
                        debug!(?frame, "received close frame");
                        break;
                    }
                    _ => trace!("ignoring non-text frame"),
                }
            }
        }
    }

    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::stream;

    use super::*;

    type Frame = Result<tungstenite::Message, tungstenite::Error>;

    fn text(s: &str) -> Frame {
        Ok(tungstenite::Message::Text(s.into()))
    }

    #[tokio::test]
    async fn forwards_text_in_order_and_ends_on_stream_end() {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(16);
        let (control_tx, _control_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let frames = stream::iter(vec![text("a"), text("b"), text("c")]);
        read_pump(frames, inbound_tx, control_tx, cancel.clone()).await;

        assert_eq!(inbound_rx.recv().await.as_deref(), Some("a"));
        assert_eq!(inbound_rx.recv().await.as_deref(), Some("b"));
        assert_eq!(inbound_rx.recv().await.as_deref(), Some("c"));
        assert_eq!(inbound_rx.recv().await, None);
        assert!(cancel.is_cancelled(), "exit must stop sibling pumps");
    }

    #[tokio::test]
    async fn answers_ping_with_pong() {
        let (inbound_tx, _inbound_rx) = mpsc::channel(16);
        let (control_tx, mut control_rx) = mpsc::channel(16);

        let frames = stream::iter(vec![Ok(tungstenite::Message::Ping(vec![7u8].into()))]);
        read_pump(frames, inbound_tx, control_tx, CancellationToken::new()).await;

        match control_rx.recv().await {
            Some(tungstenite::Message::Pong(data)) => assert_eq!(&data[..], &[7u8]),
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_frame_stops_reading() {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(16);
        let (control_tx, _control_rx) = mpsc::channel(16);

        let frames = stream::iter(vec![
            text("before"),
            Ok(tungstenite::Message::Close(None)),
            text("after"),
        ]);
        read_pump(frames, inbound_tx, control_tx, CancellationToken::new()).await;

        assert_eq!(inbound_rx.recv().await.as_deref(), Some("before"));
        assert_eq!(inbound_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_expires_the_deadline() {
        let (inbound_tx, _inbound_rx) = mpsc::channel(16);
        let (control_tx, _control_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let start = tokio::time::Instant::now();
        read_pump(stream::pending::<Frame>(), inbound_tx, control_tx, cancel.clone()).await;

        assert!(start.elapsed() >= WS_READ_TIMEOUT);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn any_frame_extends_the_deadline() {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(16);
        let (control_tx, _control_rx) = mpsc::channel(16);

        let late = WS_READ_TIMEOUT - Duration::from_secs(1);
        let delayed = stream::once(async move {
            tokio::time::sleep(late).await;
            text("late")
        });
        let frames = Box::pin(delayed.chain(stream::pending()));

        let start = tokio::time::Instant::now();
        read_pump(frames, inbound_tx, control_tx, CancellationToken::new()).await;

        assert_eq!(inbound_rx.recv().await.as_deref(), Some("late"));
        assert!(start.elapsed() >= late + WS_READ_TIMEOUT);
    }
}

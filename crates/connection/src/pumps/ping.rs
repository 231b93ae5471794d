//! Keepalive pings for an open socket.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Queues a ping on the control channel every `period`, first one after a
/// full period. A ping is skipped rather than queued behind a full channel.
/// Exits on cancel or once the write side is gone.
pub(crate) async fn ping_pump(
    control_tx: mpsc::Sender<Message>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticks.tick() => {}
        }
        match control_tx.try_send(Message::Ping(Vec::new().into())) {
            Ok(()) => trace!("ping queued"),
            Err(TrySendError::Full(_)) => trace!("control channel full, ping skipped"),
            Err(TrySendError::Closed(_)) => return,
        }
    }
}

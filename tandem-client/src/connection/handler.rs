//! Outbound envelope handle

use tandem_protocol::Envelope;
use tandem_utils::Result;
use tokio::sync::mpsc;
use tracing::debug;

/// Clonable handle for emitting envelopes toward the relay.
///
/// The engine uses [`EnvelopeSender::send_nowait`] exclusively: a send
/// attempted while the connection is down or the buffer is full is
/// dropped, not queued or retried. Delivery is at-most-once,
/// best-effort.
#[derive(Clone)]
pub struct EnvelopeSender {
    tx: mpsc::Sender<Envelope>,
}

impl EnvelopeSender {
    pub fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, envelope: Envelope) -> Result<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| tandem_utils::TandemError::ConnectionClosed)?;
        Ok(())
    }

    /// Send without waiting; drops the envelope if it cannot be queued.
    pub fn send_nowait(&self, envelope: Envelope) {
        if let Err(e) = self.tx.try_send(envelope) {
            debug!("Dropping outbound envelope: {}", e);
        }
    }
}

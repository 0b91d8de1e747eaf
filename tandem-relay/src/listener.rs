//! TCP accept loop and per-peer frame pumping
//!
//! One task per connection. Inbound frames go to the registry for
//! fan-out; the relay never looks inside them.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use tandem_protocol::FrameCodec;
use tandem_utils::Result;

use crate::registry::PeerRegistry;

/// Bound relay listener
pub struct RelayListener {
    listener: TcpListener,
    registry: Arc<PeerRegistry>,
    peer_buffer: usize,
}

impl RelayListener {
    /// Bind the listen address. The registry is shared so tests and the
    /// daemon can observe membership.
    pub async fn bind(addr: &str, registry: Arc<PeerRegistry>, peer_buffer: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Relay listening on {}", addr);
        Ok(Self {
            listener,
            registry,
            peer_buffer,
        })
    }

    /// The address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until a shutdown signal arrives.
    pub async fn run(self, shutdown_tx: broadcast::Sender<()>) {
        let mut shutdown_rx = shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            debug!("New connection from {}", peer_addr);
                            let registry = Arc::clone(&self.registry);
                            let peer_buffer = self.peer_buffer;
                            let shutdown = shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                handle_peer(stream, peer_addr, registry, peer_buffer, shutdown).await;
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping accept loop");
                    break;
                }
            }
        }
    }
}

/// Pump one peer connection: inbound frames fan out through the
/// registry, outbound frames drain from the peer's channel.
async fn handle_peer(
    stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<PeerRegistry>,
    peer_buffer: usize,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut framed = Framed::new(stream, FrameCodec::new());
    let (tx, mut rx) = mpsc::channel::<Bytes>(peer_buffer);
    let peer_id = registry.register(tx);
    info!(
        "{} joined from {} ({} connected)",
        peer_id,
        peer_addr,
        registry.peer_count()
    );

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if let Err(e) = framed.send(frame).await {
                            warn!("{} send failed: {}", peer_id, e);
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = framed.next() => {
                match inbound {
                    Some(Ok(frame)) => {
                        let delivered = registry.broadcast_except(peer_id, frame);
                        debug!("{} frame relayed to {} peers", peer_id, delivered);
                    }
                    Some(Err(e)) => {
                        warn!("{} receive failed: {}", peer_id, e);
                        break;
                    }
                    None => {
                        debug!("{} disconnected", peer_id);
                        break;
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    registry.unregister(peer_id);
    info!("{} left", peer_id);
}

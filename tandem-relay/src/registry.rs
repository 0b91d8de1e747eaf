//! Peer Connection Registry
//!
//! Tracks connected session members and their outbound channels,
//! enabling fan-out broadcasting that never echoes a frame back to its
//! sender.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Unique peer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(u64);

impl PeerId {
    /// Create a PeerId from a raw value (mainly for testing)
    #[cfg(test)]
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Peer({})", self.0)
    }
}

/// Entry for a connected peer
pub struct PeerEntry {
    /// Channel for frames destined to this peer
    pub sender: mpsc::Sender<Bytes>,
}

impl std::fmt::Debug for PeerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerEntry")
            .field("sender_closed", &self.sender.is_closed())
            .finish()
    }
}

/// Registry tracking all session members.
///
/// Thread-safe for concurrent access from the per-connection tasks.
pub struct PeerRegistry {
    peers: DashMap<PeerId, PeerEntry>,
    next_peer_id: AtomicU64,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            next_peer_id: AtomicU64::new(1),
        }
    }

    /// Register a new peer connection, returning its assigned id.
    pub fn register(&self, sender: mpsc::Sender<Bytes>) -> PeerId {
        let id = PeerId(self.next_peer_id.fetch_add(1, Ordering::SeqCst));
        self.peers.insert(id, PeerEntry { sender });
        debug!("Registered {}", id);
        id
    }

    /// Remove a peer connection.
    pub fn unregister(&self, peer_id: PeerId) {
        if self.peers.remove(&peer_id).is_some() {
            debug!("Unregistered {}", peer_id);
        }
    }

    /// Number of connected peers
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Send one frame to one peer without blocking.
    ///
    /// A closed channel means the peer disconnected; it is unregistered
    /// on the spot. A full channel drops the frame (the peer is slow,
    /// delivery is best-effort).
    pub fn try_send_to(&self, peer_id: PeerId, frame: Bytes) -> bool {
        let sender = match self.peers.get(&peer_id) {
            Some(entry) => entry.sender.clone(),
            None => return false,
        };

        match sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("{} channel closed, removing from registry", peer_id);
                self.unregister(peer_id);
                false
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("{} channel full, frame dropped", peer_id);
                false
            }
        }
    }

    /// Deliver a frame to every member except its sender.
    ///
    /// Returns the number of peers that accepted the frame.
    pub fn broadcast_except(&self, except: PeerId, frame: Bytes) -> usize {
        let peer_ids: Vec<PeerId> = self
            .peers
            .iter()
            .map(|entry| *entry.key())
            .filter(|&id| id != except)
            .collect();

        if peer_ids.is_empty() {
            return 0;
        }

        debug!("Broadcasting from {} to {} peers", except, peer_ids.len());

        let mut success_count = 0;
        for peer_id in peer_ids {
            if self.try_send_to(peer_id, frame.clone()) {
                success_count += 1;
            }
        }
        success_count
    }
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("peer_count", &self.peers.len())
            .field("next_peer_id", &self.next_peer_id.load(Ordering::SeqCst))
            .finish()
    }
}

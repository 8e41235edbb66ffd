//! # Connection Registry
//!
//! Thread-safe set of currently connected peers. The registry is the only
//! state shared between relay sessions, so every access — register,
//! unregister, snapshot — serializes on a single mutex; no caller touches the
//! underlying container directly.
//!
//! Broadcast iterates over a point-in-time snapshot taken under the lock, so a
//! peer disconnecting mid-broadcast can never corrupt or skip iteration over
//! the others.

use crate::error::{RelayError, RelayResult};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Write side of a peer connection.
///
/// Boxed as a trait object so sessions hand over a TCP write half while tests
/// can substitute in-memory streams.
type PeerWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Handle to one connected peer: identity plus the locked write half of its
/// stream. Cloning the handle shares the same underlying connection.
#[derive(Clone)]
pub struct Peer {
    id: Uuid,
    addr: SocketAddr,
    connected_at: DateTime<Utc>,
    writer: Arc<Mutex<PeerWriter>>,
}

impl Peer {
    pub fn new(addr: SocketAddr, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            addr,
            connected_at: Utc::now(),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Write a complete buffer to this peer.
    ///
    /// The writer lock makes the write atomic with respect to concurrent
    /// broadcasts, so two frames can never interleave on the wire.
    pub async fn send(&self, bytes: &[u8]) -> RelayResult<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await.map_err(RelayError::Transport)?;
        writer.flush().await.map_err(RelayError::Transport)?;
        Ok(())
    }

    /// Best-effort close of the write half. Errors are ignored: the peer is
    /// already being discarded when this is called.
    pub async fn shutdown(&self) {
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

/// The set of live peer connections, guarded by one mutex.
#[derive(Default)]
pub struct ConnectionRegistry {
    peers: Mutex<Vec<Peer>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly accepted connection.
    pub async fn register(&self, peer: Peer) {
        self.peers.lock().await.push(peer);
    }

    /// Remove a connection if present.
    ///
    /// Returns whether the peer was still registered. Absent peers are a
    /// no-op so that the session teardown path and a failing broadcast can
    /// race to remove the same connection.
    pub async fn unregister(&self, id: Uuid) -> bool {
        let mut peers = self.peers.lock().await;
        let before = peers.len();
        peers.retain(|peer| peer.id != id);
        peers.len() < before
    }

    /// Point-in-time copy of the live connection set, in registration order.
    pub async fn snapshot(&self) -> Vec<Peer> {
        self.peers.lock().await.clone()
    }

    /// Number of currently registered connections.
    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_peer() -> Peer {
        Peer::new("127.0.0.1:0".parse().unwrap(), tokio::io::sink())
    }

    #[tokio::test]
    async fn test_register_then_unregister_removes_from_snapshot() {
        let registry = ConnectionRegistry::new();
        let peer = test_peer();
        let id = peer.id();

        registry.register(peer).await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.snapshot().await.iter().any(|p| p.id() == id));

        assert!(registry.unregister(id).await);
        assert_eq!(registry.len().await, 0);
        assert!(!registry.snapshot().await.iter().any(|p| p.id() == id));
    }

    #[tokio::test]
    async fn test_double_unregister_is_noop() {
        let registry = ConnectionRegistry::new();
        let peer = test_peer();
        let id = peer.id();
        registry.register(peer).await;

        assert!(registry.unregister(id).await);
        assert!(!registry.unregister(id).await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_preserves_registration_order() {
        let registry = ConnectionRegistry::new();
        let peers: Vec<Peer> = (0..3).map(|_| test_peer()).collect();
        let ids: Vec<Uuid> = peers.iter().map(Peer::id).collect();
        for peer in peers {
            registry.register(peer).await;
        }

        let snapshot_ids: Vec<Uuid> = registry.snapshot().await.iter().map(Peer::id).collect();
        assert_eq!(snapshot_ids, ids);
    }

    #[tokio::test]
    async fn test_concurrent_register_and_unregister_stays_consistent() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        // Half the tasks register and immediately unregister, the other half
        // register and stay.
        let mut kept_ids = Vec::new();
        for i in 0..32 {
            let peer = test_peer();
            let id = peer.id();
            if i % 2 == 0 {
                kept_ids.push(id);
            }
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.register(peer).await;
                if i % 2 != 0 {
                    assert!(registry.unregister(id).await);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 16);

        // No duplicates, no dangling entries.
        let mut seen: Vec<Uuid> = snapshot.iter().map(Peer::id).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 16);
        for id in kept_ids {
            assert!(snapshot.iter().any(|p| p.id() == id));
        }
    }
}

//! # Broadcast Dispatcher
//!
//! Fans an encoded frame out to every registered peer except the one it came
//! from. Iteration runs over a registry snapshot taken at call time, so
//! concurrent connects and disconnects cannot disturb an in-flight broadcast.
//!
//! ## Partial-Failure Isolation:
//! A peer that fails to accept the write is unregistered and its stream shut
//! down, and delivery continues to the remaining peers — one unreachable peer
//! never stops fan-out to the rest. No ordering is guaranteed across peers
//! beyond snapshot order.

use crate::relay::registry::ConnectionRegistry;
use tracing::{debug, warn};
use uuid::Uuid;

/// Send `frame` to every registered connection except `exclude` (the sender).
///
/// Returns the number of peers that accepted the frame.
pub async fn broadcast(registry: &ConnectionRegistry, frame: &[u8], exclude: Uuid) -> usize {
    let snapshot = registry.snapshot().await;
    let mut delivered = 0;

    for peer in snapshot {
        if peer.id() == exclude {
            continue;
        }

        match peer.send(frame).await {
            Ok(()) => delivered += 1,
            Err(err) => {
                warn!("dropping peer {} after failed send: {}", peer.addr(), err);
                registry.unregister(peer.id()).await;
                peer.shutdown().await;
            }
        }
    }

    debug!("broadcast {} bytes to {} peer(s)", frame.len(), delivered);
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::registry::Peer;
    use tokio::io::AsyncReadExt;

    /// Fresh peer backed by an in-memory pipe; the returned stream is the
    /// remote end that observes whatever the dispatcher writes.
    fn piped_peer() -> (Peer, tokio::io::DuplexStream) {
        let (local, remote) = tokio::io::duplex(4096);
        let peer = Peer::new("127.0.0.1:0".parse().unwrap(), local);
        (peer, remote)
    }

    async fn read_all(mut remote: tokio::io::DuplexStream) -> Vec<u8> {
        let mut buf = Vec::new();
        remote.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone_but_the_sender() {
        let registry = ConnectionRegistry::new();
        let (a, a_remote) = piped_peer();
        let (b, b_remote) = piped_peer();
        let (c, c_remote) = piped_peer();
        let sender = a.id();
        registry.register(a).await;
        registry.register(b).await;
        registry.register(c).await;

        let delivered = broadcast(&registry, b"\x00\x00\x00\x02hi", sender).await;
        assert_eq!(delivered, 2);

        // Dropping the registry closes the write halves so the reads finish.
        drop(registry);
        assert_eq!(read_all(a_remote).await, b"");
        assert_eq!(read_all(b_remote).await, b"\x00\x00\x00\x02hi");
        assert_eq!(read_all(c_remote).await, b"\x00\x00\x00\x02hi");
    }

    #[tokio::test]
    async fn test_failed_peer_is_removed_without_aborting_fanout() {
        let registry = ConnectionRegistry::new();
        let (a, _a_remote) = piped_peer();
        let (b, b_remote) = piped_peer();
        let (c, c_remote) = piped_peer();
        let sender = a.id();
        let failed = b.id();
        registry.register(a).await;
        registry.register(b).await;
        registry.register(c).await;

        // Closing B's remote end makes the next write to B fail.
        drop(b_remote);

        let delivered = broadcast(&registry, b"payload", sender).await;
        assert_eq!(delivered, 1);

        // B is gone from the registry; A and C remain.
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.iter().any(|p| p.id() == failed));

        // The snapshot's peer clones hold C's write half open; release them
        // along with the registry so the read below sees EOF.
        drop(snapshot);
        drop(registry);
        assert_eq!(read_all(c_remote).await, b"payload");
    }

    #[tokio::test]
    async fn test_broadcast_with_only_the_sender_delivers_nothing() {
        let registry = ConnectionRegistry::new();
        let (a, a_remote) = piped_peer();
        let sender = a.id();
        registry.register(a).await;

        assert_eq!(broadcast(&registry, b"solo", sender).await, 0);
        drop(registry);
        assert_eq!(read_all(a_remote).await, b"");
    }
}

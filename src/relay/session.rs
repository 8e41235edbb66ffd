//! # Relay Session
//!
//! Per-connection loop: read a frame, hand the payload to the translation
//! pipeline, and on success broadcast the re-framed result to every other
//! peer. One session runs per accepted connection, concurrently with all
//! others and with the accept loop.
//!
//! ## Session Lifecycle:
//! 1. **Register**: the connection joins the registry on entry
//! 2. **Relay loop**: frames are processed strictly in arrival order; a frame
//!    that produces no translation simply yields no broadcast and the session
//!    waits for the next one
//! 3. **Teardown**: on clean disconnect, mid-frame close, or any I/O error the
//!    session unregisters exactly once and shuts the stream down — a failure
//!    here never propagates to other sessions or the accept loop

use crate::error::RelayResult;
use crate::framing::{encode_frame, read_frame};
use crate::relay::broadcast::broadcast;
use crate::relay::registry::Peer;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Drive one peer connection from accept to teardown.
pub async fn run_session(stream: TcpStream, addr: SocketAddr, state: Arc<AppState>) {
    let (mut read_half, write_half) = stream.into_split();
    let peer = Peer::new(addr, write_half);
    let id = peer.id();

    state.registry.register(peer.clone()).await;
    info!("new connection from {}", addr);

    match relay_loop(&mut read_half, id, &state).await {
        Ok(()) => info!("{} disconnected", addr),
        Err(err) => warn!("lost connection to {}: {}", addr, err),
    }

    // Every exit path funnels through here: unregister exactly once and
    // release the stream, even when the failure came from the translation
    // side rather than the socket.
    state.registry.unregister(id).await;
    peer.shutdown().await;
    let connected_secs = chrono::Utc::now()
        .signed_duration_since(peer.connected_at())
        .num_seconds();
    info!(
        "{} removed after {}s; {} client(s) connected",
        addr,
        connected_secs,
        state.registry.len().await
    );
}

/// Read-translate-broadcast loop. Returns `Ok(())` on clean disconnect.
async fn relay_loop<R>(reader: &mut R, sender: Uuid, state: &AppState) -> RelayResult<()>
where
    R: AsyncRead + Unpin,
{
    let max_frame_bytes = state.config.relay.max_frame_bytes;

    loop {
        let payload = match read_frame(reader, max_frame_bytes).await? {
            Some(payload) => payload,
            None => return Ok(()),
        };
        debug!("received {} bytes of audio", payload.len());

        // No translation result is an expected outcome (unintelligible audio,
        // unknown language, collaborator failure): skip the broadcast and keep
        // the session open. A synthesis result too large to frame is the same
        // kind of outcome, not a fault on this connection.
        if let Some(audio) = state.pipeline.translate_audio(payload).await {
            match encode_frame(&audio, max_frame_bytes) {
                Ok(frame) => {
                    info!("relaying {} bytes of translated audio", audio.len());
                    broadcast(&state.registry, &frame, sender).await;
                }
                Err(err) => warn!("discarding translated audio: {}", err),
            }
        }
    }
}

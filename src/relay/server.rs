//! # Listener / Acceptor
//!
//! Binds the relay's listening socket and spawns one independent session task
//! per accepted connection. The accept loop never waits on session work; it
//! terminates only on an unrecoverable bind or accept failure, which is fatal
//! and surfaced to the operator.

use crate::error::{RelayError, RelayResult};
use crate::relay::session::run_session;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct RelayServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl RelayServer {
    /// Bind the listening socket from the configured host and port.
    ///
    /// Bind failure is the one startup error fatal to the whole process.
    pub async fn bind(state: Arc<AppState>) -> RelayResult<Self> {
        let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(RelayError::Bind)?;
        info!(
            "listening on {}",
            listener.local_addr().map_err(RelayError::Bind)?
        );
        Ok(Self { listener, state })
    }

    /// Address the listener actually bound to (resolves port 0 in tests).
    pub fn local_addr(&self) -> RelayResult<SocketAddr> {
        self.listener.local_addr().map_err(RelayError::Bind)
    }

    /// Accept connections forever, one session task per connection.
    pub async fn run(self) -> RelayResult<()> {
        loop {
            let (stream, addr) = self.listener.accept().await.map_err(RelayError::Bind)?;
            tokio::spawn(run_session(stream, addr, Arc::clone(&self.state)));
        }
    }
}

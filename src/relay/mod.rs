//! # Relay Transport
//!
//! The concurrent core of the server: the connection registry, the
//! per-connection relay session, the broadcast dispatcher, and the TCP
//! acceptor. One session task runs per peer; the registry is the only state
//! they share.

pub mod broadcast;
pub mod registry;
pub mod server;
pub mod session;

pub use registry::{ConnectionRegistry, Peer};
pub use server::RelayServer;

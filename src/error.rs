//! # Error Handling
//!
//! Custom error types for the relay transport and how they propagate.
//!
//! ## Error Categories:
//! - **Framing**: `MalformedHeader` and `PayloadTooLarge` — a frame that cannot
//!   be parsed or that exceeds the configured cap
//! - **Connection**: `ConnectionClosed` (peer went away mid-frame) and
//!   `Transport` (any other socket read/write failure)
//! - **Startup**: `Bind` — the listener could not be created; the only error
//!   that is fatal to the process
//!
//! ## Propagation Policy:
//! Per-connection errors are contained at the session boundary: the session
//! logs them, tears itself down, and the rest of the server keeps running.
//! `Bind` surfaces all the way to `main` and aborts startup.

use std::fmt;
use std::io;

/// Errors produced by the relay transport.
#[derive(Debug)]
pub enum RelayError {
    /// Fewer than 4 header bytes were supplied to the header parser.
    MalformedHeader(usize),

    /// A frame length exceeded the configured maximum.
    PayloadTooLarge { len: u64, max: u32 },

    /// The peer closed the stream in the middle of a frame.
    ///
    /// A close *between* frames (zero bytes at a header boundary) is a normal
    /// disconnect and is reported as `Ok(None)` by the framer, never as this
    /// error.
    ConnectionClosed,

    /// A socket read or write failed for a reason other than clean close.
    Transport(io::Error),

    /// The listening socket could not be bound to or accepted on. Fatal.
    Bind(io::Error),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::MalformedHeader(got) => {
                write!(f, "malformed frame header: expected 4 bytes, got {}", got)
            }
            RelayError::PayloadTooLarge { len, max } => {
                write!(f, "frame payload of {} bytes exceeds maximum of {}", len, max)
            }
            RelayError::ConnectionClosed => {
                write!(f, "connection closed mid-frame")
            }
            RelayError::Transport(err) => write!(f, "transport error: {}", err),
            RelayError::Bind(err) => write!(f, "listener failure: {}", err),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Transport(err) | RelayError::Bind(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RelayError {
    fn from(err: io::Error) -> Self {
        // An EOF surfaced by read_exact means the peer vanished mid-frame;
        // everything else is a transport fault.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            RelayError::ConnectionClosed
        } else {
            RelayError::Transport(err)
        }
    }
}

/// Shorthand for Results carrying a `RelayError`.
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_maps_to_connection_closed() {
        let err: RelayError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, RelayError::ConnectionClosed));
    }

    #[test]
    fn test_other_io_errors_map_to_transport() {
        let err: RelayError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, RelayError::Transport(_)));
    }

    #[test]
    fn test_display_includes_sizes() {
        let err = RelayError::PayloadTooLarge { len: 100, max: 10 };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("10"));
    }
}

//! # Wire Framing
//!
//! Implements the length-prefixed framing used on every relay connection.
//! Each message on the stream is a 4-byte big-endian unsigned length followed
//! by exactly that many bytes of opaque audio payload, repeated indefinitely
//! for the life of the connection. There is no handshake, no message type tag,
//! and no checksum.
//!
//! ## Key Properties:
//! - **Exact reads**: a frame is only surfaced once all `length` payload bytes
//!   have arrived; a truncated frame is never handed to the caller
//! - **Clean vs. dirty close**: end-of-stream at a frame boundary is a normal
//!   disconnect (`Ok(None)`); end-of-stream inside a frame is
//!   `RelayError::ConnectionClosed`
//! - **Bounded allocation**: the 32-bit length comes from an untrusted peer,
//!   so it is checked against a configured cap before any payload buffer is
//!   allocated

use crate::error::{RelayError, RelayResult};
use byteorder::{BigEndian, ByteOrder};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Length of the frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Encode a payload as a single wire frame: big-endian length header followed
/// by the payload bytes.
///
/// Fails with `PayloadTooLarge` if the payload exceeds `max_frame_bytes`.
pub fn encode_frame(payload: &[u8], max_frame_bytes: u32) -> RelayResult<Vec<u8>> {
    if payload.len() as u64 > u64::from(max_frame_bytes) {
        return Err(RelayError::PayloadTooLarge {
            len: payload.len() as u64,
            max: max_frame_bytes,
        });
    }

    let mut frame = vec![0u8; HEADER_LEN];
    BigEndian::write_u32(&mut frame, payload.len() as u32);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Parse a frame header into a payload length.
///
/// Pure function; fails with `MalformedHeader` when fewer than 4 bytes are
/// supplied. Extra bytes beyond the first 4 are ignored.
pub fn decode_header(bytes: &[u8]) -> RelayResult<u32> {
    if bytes.len() < HEADER_LEN {
        return Err(RelayError::MalformedHeader(bytes.len()));
    }
    Ok(BigEndian::read_u32(&bytes[..HEADER_LEN]))
}

/// Read one complete frame from the stream.
///
/// ## Returns:
/// - `Ok(Some(payload))` — a full frame arrived
/// - `Ok(None)` — the peer closed the stream cleanly between frames (zero
///   bytes read before any header byte); the caller should treat this as a
///   normal disconnect
/// - `Err(ConnectionClosed)` — the stream ended after a partial header or
///   partial payload
/// - `Err(PayloadTooLarge)` — the header announced a length beyond
///   `max_frame_bytes`; no payload bytes are consumed
/// - `Err(Transport)` — any other I/O failure
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: u32) -> RelayResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;

    // Read the header byte-wise so that EOF before the first byte can be
    // distinguished from EOF inside the header.
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None); // Clean disconnect at a frame boundary
            }
            return Err(RelayError::ConnectionClosed);
        }
        filled += n;
    }

    let len = decode_header(&header)?;
    if len > max_frame_bytes {
        return Err(RelayError::PayloadTooLarge {
            len: u64::from(len),
            max: max_frame_bytes,
        });
    }

    let mut payload = vec![0u8; len as usize];
    // read_exact reports EOF as UnexpectedEof, which From maps to
    // ConnectionClosed.
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

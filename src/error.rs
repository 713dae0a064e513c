use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::transport::SessionState;

/// Convenience alias used throughout the protocol engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the BattlEye RCon protocol engine.
///
/// Every variant is fatal to the call that produced it. Only
/// [`Error::Transport`] leaves the session disconnected; after any other
/// failure a fresh `run` may be attempted on the same client.
#[derive(Debug, Error)]
pub enum Error {
  /// The datagram is too short for a header or the framing bytes are wrong.
  #[error("malformed packet: {0}")]
  MalformedPacket(&'static str),

  /// The CRC32 carried in the header does not match the packet body.
  #[error("checksum mismatch: header says {expected:#010x}, body hashes to {actual:#010x}")]
  ChecksumMismatch { expected: u32, actual: u32 },

  /// The header's type byte is not a known packet type.
  #[error("unknown message type: 0x{0:02X}")]
  UnknownMessageType(u8),

  /// The body is shorter than the decoded variant requires.
  #[error("truncated {kind} payload: need at least {needed} bytes, got {available}")]
  TruncatedPayload {
    kind: &'static str,
    needed: usize,
    available: usize,
  },

  /// The server rejected the supplied password.
  #[error("authentication rejected by server")]
  AuthenticationFailed,

  /// A reply of the wrong kind terminated the receive loop.
  #[error("unexpected {received} while waiting for {expected}")]
  UnexpectedResponse {
    expected: &'static str,
    received: &'static str,
  },

  /// The operation is not allowed in the session's current state.
  #[error("cannot {operation} while session is {state}")]
  InvalidState {
    operation: &'static str,
    state: SessionState,
  },

  /// No datagram arrived within the configured receive timeout.
  #[error("no response from server within {} ms", .0.as_millis())]
  Timeout(Duration),

  /// The underlying socket failed (resolution, send or receive).
  #[error("transport error: {0}")]
  Transport(#[from] io::Error),
}

impl Error {
  /// Whether the error left the socket unusable.
  pub fn is_transport(&self) -> bool {
    matches!(self, Self::Transport(_))
  }
}

//! Packet framing for the BattlEye RCon wire protocol.
//!
//! Every datagram, in either direction, has the layout:
//!
//! ```text
//! 'B' 'E' | crc32 (u32, little-endian) | 0xFF | type | payload ...
//! ```
//!
//! The checksum covers everything after itself: the `0xFF` delimiter, the
//! type byte and the payload.

use std::fmt;

use crate::error::{Error, Result};

/// Sync marker opening every packet.
pub const SYNC_MARKER: [u8; 2] = *b"BE";

/// Delimiter between the checksum and the type byte.
pub const DELIMITER: u8 = 0xFF;

/// Size of the fixed packet prefix.
pub const HEADER_LEN: usize = 8;

/// Packet types understood by BattlEye servers.
///
/// Requests and replies share a type byte; the direction decides whether a
/// `Login` packet carries a password or a success flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
  /// Login request (password) or login response (success flag).
  Login = 0x00,
  /// Command request or command response.
  Command = 0x01,
  /// Server-pushed message or its acknowledgement.
  ServerMessage = 0x02,
}

impl PacketType {
  /// Returns a human readable name for log output.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Login => "login",
      Self::Command => "command",
      Self::ServerMessage => "server message",
    }
  }

  /// Returns the wire representation.
  pub const fn as_byte(self) -> u8 {
    self as u8
  }
}

impl fmt::Display for PacketType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl TryFrom<u8> for PacketType {
  type Error = Error;

  fn try_from(byte: u8) -> Result<Self> {
    match byte {
      0x00 => Ok(Self::Login),
      0x01 => Ok(Self::Command),
      0x02 => Ok(Self::ServerMessage),
      other => Err(Error::UnknownMessageType(other)),
    }
  }
}

/// Parsed packet prefix.
///
/// The type byte is kept raw so that framing errors and unknown types are
/// reported separately; see [`Header::packet_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  checksum: u32,
  kind: u8,
}

impl Header {
  /// Builds the header for an outgoing packet.
  pub fn for_payload(packet_type: PacketType, payload: &[u8]) -> Self {
    Self {
      checksum: checksum(packet_type.as_byte(), payload),
      kind: packet_type.as_byte(),
    }
  }

  pub fn checksum(&self) -> u32 {
    self.checksum
  }

  /// Raw type byte as found on the wire.
  pub fn kind(&self) -> u8 {
    self.kind
  }

  /// Resolves the type byte, failing with [`Error::UnknownMessageType`].
  pub fn packet_type(&self) -> Result<PacketType> {
    PacketType::try_from(self.kind)
  }

  /// Encodes the header into its 8-byte wire form.
  pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
    let crc = self.checksum.to_le_bytes();
    [
      SYNC_MARKER[0],
      SYNC_MARKER[1],
      crc[0],
      crc[1],
      crc[2],
      crc[3],
      DELIMITER,
      self.kind,
    ]
  }
}

/// CRC32 over `0xFF + type + payload`.
pub fn checksum(kind: u8, payload: &[u8]) -> u32 {
  let mut hasher = crc32fast::Hasher::new();
  hasher.update(&[DELIMITER, kind]);
  hasher.update(payload);
  hasher.finalize()
}

/// Frames `payload` into a complete datagram.
pub fn serialize(packet_type: PacketType, payload: &[u8]) -> Vec<u8> {
  let header = Header::for_payload(packet_type, payload);
  let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
  buf.extend_from_slice(&header.to_bytes());
  buf.extend_from_slice(payload);
  buf
}

/// Reads the fixed prefix of a datagram.
pub fn parse_header(bytes: &[u8]) -> Result<Header> {
  let Some(prefix) = bytes.get(..HEADER_LEN) else {
    return Err(Error::MalformedPacket("datagram shorter than header"));
  };

  if prefix[..2] != SYNC_MARKER {
    return Err(Error::MalformedPacket("missing BE sync marker"));
  }

  if prefix[6] != DELIMITER {
    return Err(Error::MalformedPacket("missing 0xFF delimiter"));
  }

  Ok(Header {
    checksum: u32::from_le_bytes([prefix[2], prefix[3], prefix[4], prefix[5]]),
    kind: prefix[7],
  })
}

/// Recomputes the checksum of `payload` and compares it with the header.
pub fn verify_checksum(header: &Header, payload: &[u8]) -> bool {
  checksum(header.kind, payload) == header.checksum
}

/// Splits a datagram into its header and verified payload.
pub fn parse(bytes: &[u8]) -> Result<(Header, &[u8])> {
  let header = parse_header(bytes)?;
  let payload = &bytes[HEADER_LEN..];

  if !verify_checksum(&header, payload) {
    return Err(Error::ChecksumMismatch {
      expected: header.checksum,
      actual: checksum(header.kind, payload),
    });
  }

  Ok((header, payload))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serialize_then_parse_returns_type_and_payload() {
    for packet_type in
      [PacketType::Login, PacketType::Command, PacketType::ServerMessage]
    {
      for payload in [&b""[..], b"\x00", b"\x07players"] {
        let bytes = serialize(packet_type, payload);
        let (header, body) = parse(&bytes).expect("parse packet");
        assert_eq!(header.packet_type().unwrap(), packet_type);
        assert_eq!(body, payload);
      }
    }
  }

  #[test]
  fn login_packet_matches_reference_bytes() {
    let bytes = serialize(PacketType::Login, b"secret");
    assert_eq!(&bytes[..2], b"BE");
    assert_eq!(bytes[6], 0xFF);
    assert_eq!(bytes[7], 0x00);
    assert_eq!(&bytes[8..], b"secret");

    let expected = crc32fast::hash(b"\xFF\x00secret");
    assert_eq!(&bytes[2..6], &expected.to_le_bytes());
    assert_eq!(parse_header(&bytes).unwrap().checksum(), expected);
  }

  #[test]
  fn flipping_any_payload_bit_breaks_checksum() {
    let bytes = serialize(PacketType::Command, b"\x05say -1 hello world");
    let header = parse_header(&bytes).unwrap();

    for index in HEADER_LEN..bytes.len() {
      for bit in 0..8 {
        let mut corrupted = bytes.clone();
        corrupted[index] ^= 1 << bit;
        assert!(!verify_checksum(&header, &corrupted[HEADER_LEN..]));
        assert!(matches!(
          parse(&corrupted),
          Err(Error::ChecksumMismatch { .. })
        ));
      }
    }
  }

  #[test]
  fn short_buffer_is_malformed() {
    let err = parse_header(b"BE\x00").unwrap_err();
    assert!(matches!(err, Error::MalformedPacket(_)));
    assert!(matches!(parse_header(&[]), Err(Error::MalformedPacket(_))));
  }

  #[test]
  fn wrong_framing_is_malformed() {
    let mut bytes = serialize(PacketType::Login, b"\x01");
    bytes[0] = b'X';
    assert!(matches!(parse_header(&bytes), Err(Error::MalformedPacket(_))));

    let mut bytes = serialize(PacketType::Login, b"\x01");
    bytes[6] = 0x00;
    assert!(matches!(parse_header(&bytes), Err(Error::MalformedPacket(_))));
  }

  #[test]
  fn unknown_type_survives_framing_but_not_resolution() {
    let payload = b"\x00";
    let mut bytes = vec![b'B', b'E'];
    bytes.extend_from_slice(&checksum(0x09, payload).to_le_bytes());
    bytes.extend_from_slice(&[DELIMITER, 0x09]);
    bytes.extend_from_slice(payload);

    let (header, _) = parse(&bytes).expect("framing is valid");
    assert_eq!(header.kind(), 0x09);
    assert!(matches!(
      header.packet_type(),
      Err(Error::UnknownMessageType(0x09))
    ));
  }
}

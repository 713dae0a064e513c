//! Typed BattlEye messages and the rules for building and decoding them.

use crate::error::{Error, Result};
use crate::protocol::{self, Header, PacketType};

/// Anything the client can put on the wire.
pub trait Request {
  /// Packet type written into the header.
  fn packet_type(&self) -> PacketType;

  /// Type-specific body following the header.
  fn payload(&self) -> Vec<u8>;

  /// Text used in logs in place of the payload.
  fn describe(&self) -> String;

  /// Complete datagram including header.
  fn to_bytes(&self) -> Vec<u8> {
    protocol::serialize(self.packet_type(), &self.payload())
  }
}

/// Login handshake carrying the plaintext password.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
  password: String,
}

impl LoginRequest {
  pub fn from_password(password: impl Into<String>) -> Self {
    Self {
      password: password.into(),
    }
  }
}

impl std::fmt::Debug for LoginRequest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoginRequest")
      .field("password", &"<redacted>")
      .finish()
  }
}

impl Request for LoginRequest {
  fn packet_type(&self) -> PacketType {
    PacketType::Login
  }

  fn payload(&self) -> Vec<u8> {
    self.password.as_bytes().to_vec()
  }

  fn describe(&self) -> String {
    "LOGIN <redacted>".to_owned()
  }
}

/// A console command tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  sequence: u8,
  command: String,
}

impl Command {
  /// Joins `name` and `args` with single spaces into one command line.
  ///
  /// ```
  /// use bercon::message::Command;
  ///
  /// let command = Command::from_command(5, "say", &["-1", "hello"]);
  /// assert_eq!(command.command(), "say -1 hello");
  /// assert_eq!(command.sequence(), 5);
  /// ```
  pub fn from_command<S: AsRef<str>>(
    sequence: u8,
    name: &str,
    args: &[S],
  ) -> Self {
    let mut command = name.to_owned();
    for arg in args {
      command.push(' ');
      command.push_str(arg.as_ref());
    }

    Self { sequence, command }
  }

  /// An empty command; servers answer it with an empty reply.
  pub fn keep_alive(sequence: u8) -> Self {
    Self {
      sequence,
      command: String::new(),
    }
  }

  pub fn sequence(&self) -> u8 {
    self.sequence
  }

  pub fn command(&self) -> &str {
    &self.command
  }
}

impl Request for Command {
  fn packet_type(&self) -> PacketType {
    PacketType::Command
  }

  fn payload(&self) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + self.command.len());
    payload.push(self.sequence);
    payload.extend_from_slice(self.command.as_bytes());
    payload
  }

  fn describe(&self) -> String {
    format!("#{} {}", self.sequence, self.command)
  }
}

/// Receipt for a server message; without it the server keeps resending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
  sequence: u8,
}

impl Acknowledgement {
  pub fn for_message(message: &ServerMessage) -> Self {
    Self {
      sequence: message.sequence,
    }
  }

  pub fn sequence(&self) -> u8 {
    self.sequence
  }
}

impl Request for Acknowledgement {
  fn packet_type(&self) -> PacketType {
    PacketType::ServerMessage
  }

  fn payload(&self) -> Vec<u8> {
    vec![self.sequence]
  }

  fn describe(&self) -> String {
    format!("ACK #{}", self.sequence)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginResponse {
  pub success: bool,
}

/// Position of one packet within a multi-packet command reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
  pub total: u8,
  pub index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
  pub sequence: u8,
  pub part: Option<Part>,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
  pub sequence: u8,
  pub message: String,
}

/// Exactly one of these is produced per datagram received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
  Login(LoginResponse),
  Command(CommandResponse),
  ServerMessage(ServerMessage),
}

impl Response {
  /// Decodes a verified payload according to the header's type byte.
  pub fn decode(header: &Header, payload: &[u8]) -> Result<Self> {
    match header.packet_type()? {
      PacketType::Login => decode_login(payload).map(Self::Login),
      PacketType::Command => decode_command(payload).map(Self::Command),
      PacketType::ServerMessage => {
        decode_server_message(payload).map(Self::ServerMessage)
      }
    }
  }

  /// Frames, verifies and decodes a whole datagram.
  pub fn from_datagram(bytes: &[u8]) -> Result<Self> {
    let (header, payload) = protocol::parse(bytes)?;
    Self::decode(&header, payload)
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::Login(_) => "login response",
      Self::Command(_) => "command response",
      Self::ServerMessage(_) => "server message",
    }
  }
}

fn require(kind: &'static str, payload: &[u8], needed: usize) -> Result<()> {
  if payload.len() < needed {
    return Err(Error::TruncatedPayload {
      kind,
      needed,
      available: payload.len(),
    });
  }
  Ok(())
}

fn text(bytes: &[u8]) -> String {
  String::from_utf8_lossy(bytes).into_owned()
}

fn decode_login(payload: &[u8]) -> Result<LoginResponse> {
  require("login response", payload, 1)?;
  Ok(LoginResponse {
    success: payload[0] == 0x01,
  })
}

fn decode_command(payload: &[u8]) -> Result<CommandResponse> {
  require("command response", payload, 1)?;
  let sequence = payload[0];
  let body = &payload[1..];

  // Multi-packet replies insert `0x00 total index` before the text.
  if body.first() == Some(&0x00) {
    require("multi-part command response", payload, 4)?;
    let part = Part {
      total: body[1],
      index: body[2],
    };

    if part.total == 0 || part.index >= part.total {
      return Err(Error::MalformedPacket("multi-part index out of range"));
    }

    return Ok(CommandResponse {
      sequence,
      part: Some(part),
      message: text(&body[3..]),
    });
  }

  Ok(CommandResponse {
    sequence,
    part: None,
    message: text(body),
  })
}

fn decode_server_message(payload: &[u8]) -> Result<ServerMessage> {
  require("server message", payload, 1)?;
  Ok(ServerMessage {
    sequence: payload[0],
    message: text(&payload[1..]),
  })
}

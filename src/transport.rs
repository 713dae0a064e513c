use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{UdpSocket, lookup_host};
use tokio::time::{Instant, timeout_at};

use crate::error::{Error, Result};
use crate::message::{
  Acknowledgement, Command, CommandResponse, LoginRequest, LoginResponse,
  Request, Response, ServerMessage,
};
use crate::sequence::SequenceCounter;

/// Receive buffer size used unless overridden.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Number of recently dispatched server message sequences remembered.
const RECENT_MESSAGES: usize = 16;

/// Callback receiving server-pushed messages.
pub type MessageHandler = Box<dyn FnMut(&ServerMessage) + Send>;

/// Default handler: log the message at INFO level.
pub fn log_message(message: &ServerMessage) {
  tracing::info!(
    target: "server_message",
    sequence = message.sequence,
    "{}",
    message.message
  );
}

/// Lifecycle of a BattlEye session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Disconnected,
  Connecting,
  Authenticated,
  Idle,
  AwaitingReply,
}

impl SessionState {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Disconnected => "disconnected",
      Self::Connecting => "connecting",
      Self::Authenticated => "authenticated",
      Self::Idle => "idle",
      Self::AwaitingReply => "awaiting a reply",
    }
  }

  /// Whether commands may be issued.
  pub const fn is_logged_in(self) -> bool {
    matches!(self, Self::Authenticated | Self::Idle)
  }
}

impl fmt::Display for SessionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Client speaking the BattlEye RCon protocol over UDP.
///
/// One request may be outstanding at a time. While waiting for a reply,
/// server messages are acknowledged and handed to the message handler in
/// arrival order; the first datagram of any other kind ends the wait.
pub struct Client {
  socket: UdpSocket,
  peer: SocketAddr,
  state: SessionState,
  sequence: SequenceCounter,
  handler: MessageHandler,
  timeout: Option<Duration>,
  buffer: Vec<u8>,
  recent: VecDeque<u8>,
}

impl fmt::Debug for Client {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Client")
      .field("peer", &self.peer)
      .field("state", &self.state)
      .field("sequence", &self.sequence)
      .field("timeout", &self.timeout)
      .finish_non_exhaustive()
  }
}

impl Client {
  /// Resolve `host`, bind an ephemeral UDP socket and connect it to the server.
  ///
  /// Nothing is exchanged with the server yet; the session starts in
  /// [`SessionState::Connecting`].
  pub async fn connect(host: &str, port: u16) -> Result<Self> {
    let mut last_error = None;

    for peer in lookup_host((host, port)).await? {
      match bind_connected(peer).await {
        Ok(socket) => {
          tracing::debug!(%peer, "udp socket connected");
          return Ok(Self {
            socket,
            peer,
            state: SessionState::Connecting,
            sequence: SequenceCounter::new(),
            handler: Box::new(log_message),
            timeout: None,
            buffer: vec![0; DEFAULT_BUFFER_SIZE],
            recent: VecDeque::with_capacity(RECENT_MESSAGES),
          });
        }
        Err(err) => {
          tracing::debug!(%peer, error = %err, "failed to connect udp socket");
          last_error = Some(err);
        }
      }
    }

    Err(Error::Transport(last_error.unwrap_or_else(|| {
      io::Error::new(
        io::ErrorKind::NotFound,
        format!("no addresses found for {host}:{port}"),
      )
    })))
  }

  /// Route server messages to `handler` instead of the log.
  pub fn with_message_handler<F>(mut self, handler: F) -> Self
  where
    F: FnMut(&ServerMessage) + Send + 'static,
  {
    self.handler = Box::new(handler);
    self
  }

  /// Bound the total time a call waits for its reply, including time spent
  /// on server messages that arrive meanwhile; `None` waits indefinitely.
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  /// Largest datagram accepted; longer ones fail their checksum.
  pub fn with_buffer_size(mut self, size: usize) -> Self {
    self.buffer = vec![0; size];
    self
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn peer_addr(&self) -> SocketAddr {
    self.peer
  }

  /// Authenticate with the server's RCon password.
  ///
  /// A rejected password fails with [`Error::AuthenticationFailed`] and leaves
  /// the session disconnected; reconnect before trying again.
  pub async fn login(&mut self, password: &str) -> Result<bool> {
    self.require("log in", |state| state == SessionState::Connecting)?;

    let request = LoginRequest::from_password(password);
    let response = match self.communicate(&request, None).await {
      Ok(response) => response,
      Err(err) => return Err(self.fail(err, SessionState::Connecting)),
    };

    match response {
      Response::Login(LoginResponse { success: true }) => {
        self.state = SessionState::Authenticated;
        tracing::info!(peer = %self.peer, "logged in");
        Ok(true)
      }
      Response::Login(LoginResponse { success: false }) => {
        self.state = SessionState::Disconnected;
        Err(Error::AuthenticationFailed)
      }
      other => Err(Error::UnexpectedResponse {
        expected: "login response",
        received: other.kind(),
      }),
    }
  }

  /// Execute a console command and return its output.
  ///
  /// Not cancel safe: dropping the future abandons the request. The next
  /// call on this client picks the session up again, but a late reply to the
  /// abandoned command may still arrive.
  pub async fn run<S: AsRef<str>>(
    &mut self,
    command: &str,
    args: &[S],
  ) -> Result<String> {
    self.recover_abandoned();
    self.require("run a command", SessionState::is_logged_in)?;
    let request = Command::from_command(self.sequence.next(), command, args);
    self.execute(request).await
  }

  /// Send an empty command so the server keeps the session open.
  ///
  /// BattlEye drops clients that stay silent for more than 45 seconds.
  pub async fn keep_alive(&mut self) -> Result<()> {
    self.recover_abandoned();
    self.require("send a keep-alive", SessionState::is_logged_in)?;
    let request = Command::keep_alive(self.sequence.next());
    self.execute(request).await.map(drop)
  }

  /// Wait for one datagram while no request is outstanding.
  ///
  /// Server messages are dispatched and acknowledged; stray replies are
  /// discarded. Cancelling the returned future before a datagram arrives
  /// loses nothing. The receive timeout does not apply here.
  pub async fn listen(&mut self) -> Result<()> {
    self.recover_abandoned();
    self.require("listen", SessionState::is_logged_in)?;

    let result = match self.receive(None).await {
      Ok(Response::ServerMessage(message)) => {
        self.dispatch(message).await
      }
      Ok(other) => {
        tracing::warn!(kind = other.kind(), "discarding unsolicited reply");
        Ok(())
      }
      Err(err) => Err(err),
    };

    let state = self.state;
    result.map_err(|err| self.fail(err, state))
  }

  /// Release the socket.
  pub fn close(self) {
    tracing::debug!(peer = %self.peer, state = %self.state, "session closed");
  }

  async fn execute(&mut self, request: Command) -> Result<String> {
    self.state = SessionState::AwaitingReply;

    let expected = Some(request.sequence());
    let response = match self.communicate(&request, expected).await {
      Ok(response) => response,
      Err(err) => return Err(self.fail(err, SessionState::Idle)),
    };
    self.state = SessionState::Idle;

    match response {
      Response::Command(CommandResponse {
        sequence, message, ..
      }) => {
        if sequence != request.sequence() {
          tracing::warn!(
            expected = request.sequence(),
            received = sequence,
            "reply sequence does not match request"
          );
        }
        Ok(message)
      }
      other => Err(Error::UnexpectedResponse {
        expected: "command response",
        received: other.kind(),
      }),
    }
  }

  async fn communicate<R: Request>(
    &mut self,
    request: &R,
    expected: Option<u8>,
  ) -> Result<Response> {
    self.send(request).await?;
    self.receive_reply(expected).await
  }

  async fn send<R: Request>(&mut self, request: &R) -> Result<()> {
    tracing::debug!("--> {}", request.describe());
    self.socket.send(&request.to_bytes()).await?;
    Ok(())
  }

  /// Receive until something other than a server message arrives.
  ///
  /// Multi-packet command replies are collected and joined in index order.
  /// Parts carrying a sequence other than `expected` belong to an earlier
  /// request and are dropped.
  async fn receive_reply(&mut self, expected: Option<u8>) -> Result<Response> {
    let deadline = self.timeout.map(|limit| Instant::now() + limit);
    let mut parts: Vec<Option<String>> = Vec::new();

    loop {
      match self.receive(deadline).await? {
        Response::ServerMessage(message) => self.dispatch(message).await?,
        Response::Command(CommandResponse {
          sequence,
          part: Some(part),
          message,
        }) => {
          if expected.is_some_and(|expected| expected != sequence) {
            tracing::warn!(
              expected = ?expected,
              received = sequence,
              "dropping reply part of an earlier request"
            );
            continue;
          }

          let total = usize::from(part.total);
          if parts.is_empty() {
            parts.resize(total, None);
          } else if parts.len() != total {
            return Err(Error::MalformedPacket(
              "multi-part total changed within one reply",
            ));
          }

          tracing::trace!(index = part.index, total, "received reply part");
          parts[usize::from(part.index)] = Some(message);

          if parts.iter().all(Option::is_some) {
            return Ok(Response::Command(CommandResponse {
              sequence,
              part: None,
              message: parts.drain(..).flatten().collect(),
            }));
          }
        }
        reply => return Ok(reply),
      }
    }
  }

  async fn receive(&mut self, deadline: Option<Instant>) -> Result<Response> {
    let limit = self.timeout.unwrap_or_default();
    let len = match deadline {
      Some(deadline) => timeout_at(deadline, self.socket.recv(&mut self.buffer))
        .await
        .map_err(|_| Error::Timeout(limit))??,
      None => self.socket.recv(&mut self.buffer).await?,
    };

    let response = Response::from_datagram(&self.buffer[..len])?;
    tracing::debug!("<-- {} ({len} bytes)", response.kind());
    Ok(response)
  }

  /// Hand a server message to the handler, then acknowledge it.
  ///
  /// A resend of any of the last few messages is acknowledged again but not
  /// dispatched twice.
  async fn dispatch(&mut self, message: ServerMessage) -> Result<()> {
    if self.recent.contains(&message.sequence) {
      tracing::debug!(sequence = message.sequence, "duplicate server message");
    } else {
      if self.recent.len() == RECENT_MESSAGES {
        self.recent.pop_front();
      }
      self.recent.push_back(message.sequence);
      (self.handler)(&message);
    }

    self.send(&Acknowledgement::for_message(&message)).await
  }

  /// A session left awaiting a reply belongs to a dropped call, since
  /// `&mut self` rules out a concurrent one.
  fn recover_abandoned(&mut self) {
    if self.state == SessionState::AwaitingReply {
      tracing::warn!("previous request was abandoned before its reply");
      self.state = SessionState::Idle;
    }
  }

  fn require(
    &self,
    operation: &'static str,
    allowed: impl Fn(SessionState) -> bool,
  ) -> Result<()> {
    if allowed(self.state) {
      Ok(())
    } else {
      Err(Error::InvalidState {
        operation,
        state: self.state,
      })
    }
  }

  /// Record the state after a failed call and hand the error back.
  fn fail(&mut self, err: Error, otherwise: SessionState) -> Error {
    self.state = if err.is_transport() {
      SessionState::Disconnected
    } else {
      otherwise
    };
    err
  }
}

async fn bind_connected(peer: SocketAddr) -> io::Result<UdpSocket> {
  let local: SocketAddr = if peer.is_ipv4() {
    (Ipv4Addr::UNSPECIFIED, 0).into()
  } else {
    (Ipv6Addr::UNSPECIFIED, 0).into()
  };

  let socket = UdpSocket::bind(local).await?;
  socket.connect(peer).await?;
  Ok(socket)
}

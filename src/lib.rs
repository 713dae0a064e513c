//! Client for the BattlEye RCon protocol.
//!
//! [`Client`] owns a UDP socket, logs in with the server's RCon password and
//! runs console commands while acknowledging and dispatching the messages
//! the server pushes in between.

pub mod cli;
pub mod core;
pub mod error;
pub mod logging;
pub mod message;
pub mod protocol;
pub mod runtime;
pub mod sequence;
pub mod transport;
pub mod ui;
pub mod util;

pub use cli::Cli;
pub use crate::core::run;
pub use error::{Error, Result};
pub use message::{
  Acknowledgement, Command, CommandResponse, LoginRequest, LoginResponse,
  Request, Response, ServerMessage,
};
pub use protocol::{Header, PacketType};
pub use runtime::Runtime;
pub use transport::{Client, MessageHandler, SessionState, log_message};
pub use util::command;

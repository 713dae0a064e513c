use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::util::target::Target;

/// Command-line arguments for the BattlEye RCon client.
#[derive(Parser, Debug, Clone)]
#[command(
  author,
  version,
  about = "Administer a game server over BattlEye RCon",
  trailing_var_arg = true
)]
pub struct Cli {
  /// Hostname or IP address of the game server.
  #[arg(long, env = "BERCON_HOST", default_value = "127.0.0.1")]
  pub host: String,

  /// UDP port of the server's BattlEye RCon listener.
  #[arg(long, env = "BERCON_PORT", default_value_t = 2306)]
  pub port: u16,

  /// RCon password configured in the server's BEServer.cfg.
  #[arg(long, env = "BERCON_PASSWORD")]
  pub password: Option<String>,

  /// Server as `[password@]host[:port]`; overrides the options above.
  #[arg(short, long, value_name = "SERVER")]
  pub server: Option<Target>,

  /// Reply timeout in milliseconds (0 waits forever).
  #[arg(long, default_value_t = 8_000, value_name = "MILLISECONDS")]
  pub timeout_ms: u64,

  /// Increase logging verbosity (repeat for TRACE).
  #[arg(short, long, action = ArgAction::Count)]
  pub verbose: u8,

  /// Disable ANSI color output.
  #[arg(long)]
  pub plain: bool,

  /// One-shot command executed instead of starting the REPL.
  #[arg(value_name = "COMMAND")]
  pub command: Vec<String>,
}

impl Cli {
  /// Host, port and password after applying `--server`.
  pub fn endpoint(&self) -> (String, u16, Option<String>) {
    match &self.server {
      Some(target) => (
        target.host.clone(),
        target.port.unwrap_or(self.port),
        target.password.clone().or_else(|| self.password.clone()),
      ),
      None => (self.host.clone(), self.port, self.password.clone()),
    }
  }

  pub fn timeout(&self) -> Option<Duration> {
    (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
  }
}

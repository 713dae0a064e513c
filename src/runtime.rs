use crate::{Cli, Error, run};
use owo_colors::OwoColorize;

/// Exit code reported when the server rejects the password.
pub const EXIT_AUTH_FAILED: i32 = 3;

/// High-level wrapper that executes the client lifecycle and reports errors uniformly.
pub struct Runtime {
  cli: Cli,
}

impl Runtime {
  /// Construct a new [`Runtime`] from parsed CLI arguments.
  #[must_use]
  pub fn new(cli: Cli) -> Self {
    Self { cli }
  }

  /// Execute the client and return the desired process exit code.
  ///
  /// Errors are printed with their cause chain. A rejected password maps to
  /// [`EXIT_AUTH_FAILED`] so wrapper scripts can prompt again; anything else
  /// maps to `1`.
  pub async fn execute(self) -> i32 {
    match run(self.cli).await {
      Ok(code) => code,
      Err(err) => {
        log_error_chain(&err);
        exit_code_for(&err)
      }
    }
  }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
  let rejected = err.chain().any(|cause| {
    matches!(cause.downcast_ref::<Error>(), Some(Error::AuthenticationFailed))
  });

  if rejected { EXIT_AUTH_FAILED } else { 1 }
}

fn log_error_chain(err: &anyhow::Error) {
  eprintln!("{} {}", "error:".red().bold(), err.to_string().red().bold());

  for cause in err.chain().skip(1) {
    eprintln!("  {} {}", "↳".red(), cause);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::Context;

  #[test]
  fn rejected_password_has_its_own_exit_code() {
    let err = Err::<(), _>(Error::AuthenticationFailed)
      .context("failed to log in to 127.0.0.1:2306")
      .unwrap_err();
    assert_eq!(exit_code_for(&err), EXIT_AUTH_FAILED);
  }

  #[test]
  fn other_failures_exit_with_one() {
    let err = Err::<(), _>(Error::UnknownMessageType(0x09))
      .context("command `players` failed")
      .unwrap_err();
    assert_eq!(exit_code_for(&err), 1);
    assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
  }
}

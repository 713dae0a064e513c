use bercon::{Cli, Runtime};
use clap::Parser;
use std::env;

/// Settings that may be given as either `RCON_*` or `BERCON_*`.
const SHARED_SETTINGS: [&str; 3] = ["HOST", "PORT", "PASSWORD"];

/// Copy `RCON_*` settings to their `BERCON_*` names (and back) so clap's
/// `env` fallbacks see whichever spelling the user exported.
fn mirror_env_aliases() {
  for setting in SHARED_SETTINGS {
    let generic = format!("RCON_{setting}");
    let specific = format!("BERCON_{setting}");

    let (from, to) = match (env::var_os(&generic), env::var_os(&specific)) {
      (Some(value), None) => (value, specific),
      (None, Some(value)) => (value, generic),
      _ => continue,
    };

    // SAFETY: the current-thread runtime has not spawned any task or thread
    // yet, and the value came from the process environment itself.
    unsafe {
      env::set_var(to, from);
    }
  }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
  mirror_env_aliases();

  let cli = Cli::parse();
  let exit_code = Runtime::new(cli).execute().await;
  std::process::exit(exit_code);
}

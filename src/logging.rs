use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Map the `-v/--verbose` count to the crate's base log level.
///
///   * `0` → INFO
///   * `1` → DEBUG (datagrams in both directions)
///   * `2+` → TRACE (multi-part reassembly)
pub fn level_for(verbosity: u8) -> Level {
  match verbosity {
    0 => Level::INFO,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  }
}

/// Initialise structured logging for the client.
///
/// `RUST_LOG` overrides the computed level. Log output goes to stderr so that
/// command output on stdout stays clean for scripting.
pub fn init(verbosity: u8, use_color: bool) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity).as_str()));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_level(true)
    .with_ansi(use_color)
    .compact()
    .init();
}

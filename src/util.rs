/// Utilities shared across the BattlEye RCon client front end.
///
/// Input normalisation for the REPL and parsing of `[password@]host[:port]`
/// server strings.
pub mod command {
  /// Sanitise a line of user input before it is sent to the server.
  ///
  /// Trailing carriage-return (`\r`) and line-feed (`\n`) characters are
  /// removed. An empty or whitespace-only input yields `None`, signalling
  /// that no command should be dispatched.
  ///
  /// # Examples
  ///
  /// ```
  /// use bercon::util::command::sanitize;
  ///
  /// assert_eq!(sanitize("say -1 Hello\n"), Some("say -1 Hello".to_string()));
  /// assert_eq!(sanitize("\n\n"), None);
  /// ```
  #[must_use]
  pub fn sanitize(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
      None
    } else {
      Some(trimmed.to_string())
    }
  }

  /// Determine whether the input asks to leave the shell.
  ///
  /// BattlEye has no logout packet, so `quit`, `exit` and `logout` are
  /// handled locally. Case and surrounding whitespace are ignored.
  #[must_use]
  pub fn is_exit_command(raw: &str) -> bool {
    sanitize(raw).is_some_and(|cmd| {
      let cmd = cmd.trim();
      ["quit", "exit", "logout"]
        .iter()
        .any(|verb| cmd.eq_ignore_ascii_case(verb))
    })
  }
}

pub mod target {
  use std::fmt;
  use std::str::FromStr;

  /// Server address given as `[password@]host[:port]`.
  #[derive(Clone, PartialEq, Eq)]
  pub struct Target {
    pub host: String,
    pub port: Option<u16>,
    pub password: Option<String>,
  }

  impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Target")
        .field("host", &self.host)
        .field("port", &self.port)
        .field("password", &self.password.as_ref().map(|_| "<redacted>"))
        .finish()
    }
  }

  /// Error returned when a server string cannot be parsed.
  #[derive(Debug, Clone, PartialEq, Eq)]
  pub struct ParseTargetError {
    input: String,
    reason: &'static str,
  }

  impl ParseTargetError {
    fn new(input: &str, reason: &'static str) -> Self {
      Self {
        input: input.to_owned(),
        reason,
      }
    }

    pub fn reason(&self) -> &'static str {
      self.reason
    }
  }

  impl fmt::Display for ParseTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "invalid server `{}`: {}", self.input, self.reason)
    }
  }

  impl std::error::Error for ParseTargetError {}

  impl FromStr for Target {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
      // The password may itself contain `@` and `:`, so split on the last `@`.
      let (password, address) = match s.rsplit_once('@') {
        Some((password, address)) => (Some(password.to_owned()), address),
        None => (None, s),
      };

      let (host, port) = split_host_port(address)
        .ok_or_else(|| ParseTargetError::new(s, "port is not a number"))?;

      if host.is_empty() {
        return Err(ParseTargetError::new(s, "host is empty"));
      }

      Ok(Self {
        host: host.to_owned(),
        port,
        password,
      })
    }
  }

  fn split_host_port(address: &str) -> Option<(&str, Option<u16>)> {
    if let Some(rest) = address.strip_prefix('[') {
      let (host, tail) = rest.split_once(']')?;
      return match tail.strip_prefix(':') {
        Some(port) => Some((host, Some(port.parse().ok()?))),
        None if tail.is_empty() => Some((host, None)),
        None => None,
      };
    }

    match address.rsplit_once(':') {
      Some((host, _)) if host.contains(':') => Some((address, None)),
      Some((host, port)) => Some((host, Some(port.parse().ok()?))),
      None => Some((address, None)),
    }
  }
}

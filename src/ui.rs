use owo_colors::OwoColorize;
use tokio::io::{self, AsyncWriteExt, Stdout};

use crate::message::ServerMessage;

/// Render the interactive prompt prefix to the provided stdout handle.
pub async fn render_prompt(
  stdout: &mut Stdout,
  use_color: bool,
) -> io::Result<()> {
  let prompt = if use_color {
    format!("{} ", "rcon>".bright_magenta().bold())
  } else {
    "rcon> ".to_owned()
  };

  stdout.write_all(prompt.as_bytes()).await?;
  stdout.flush().await
}

/// Announce a successful login.
pub fn render_login(host: &str, port: u16, use_color: bool) {
  if use_color {
    println!("{} {}", "⇢".bright_cyan(), format!("{host}:{port}").bold());
    println!("{}", "Logged in".green().bold());
  } else {
    println!("{host}:{port}");
    println!("Logged in");
  }

  println!();
}

/// Print a server-pushed message (chat, connects, admin log lines).
pub fn render_server_message(message: &ServerMessage, use_color: bool) {
  if use_color {
    println!("{} {}", "»".bright_yellow(), message.message.yellow());
  } else {
    println!("» {}", message.message);
  }
}

/// Render a command's output in a human-friendly format.
pub fn render_response(command: &str, output: &str, use_color: bool) {
  if use_color {
    println!("{} {}", "✔".green().bold(), command.bold());
  } else {
    println!("{command}");
  }

  for line in output.lines() {
    if use_color {
      println!("  {}", line.cyan());
    } else {
      println!("  {line}");
    }
  }

  println!();
}

/// Show a farewell message when the user leaves the shell.
pub fn render_bye(use_color: bool) {
  if use_color {
    println!("{}", "⇢ Session closed".bright_magenta().bold());
  } else {
    println!("Session closed");
  }
}

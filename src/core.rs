use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{MissedTickBehavior, interval};

use crate::{cli::Cli, logging, transport::Client, ui, util::command};

/// How often the REPL pings an otherwise silent session.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Orchestrate the full client lifecycle for a single invocation.
pub async fn run(cli: Cli) -> Result<i32> {
  let use_color_stdout = !cli.plain && io::stdout().is_terminal();
  let use_color_logs = !cli.plain && io::stderr().is_terminal();

  logging::init(cli.verbose, use_color_logs);

  let (host, port, password) = cli.endpoint();
  let password = password.ok_or_else(|| {
    anyhow!("BattlEye requires a password; supply --password, --server or set RCON_PASSWORD")
  })?;

  let mut client = Client::connect(&host, port)
    .await
    .with_context(|| format!("failed to connect to {host}:{port}"))?
    .with_timeout(cli.timeout())
    .with_message_handler(move |message| {
      ui::render_server_message(message, use_color_stdout)
    });

  client
    .login(&password)
    .await
    .with_context(|| format!("failed to log in to {host}:{port}"))?;
  ui::render_login(&host, port, use_color_stdout);

  let exit_code = if cli.command.is_empty() {
    run_interactive(&mut client, use_color_stdout).await?
  } else {
    run_one_shot(&cli, &mut client, use_color_stdout).await?
  };

  client.close();
  Ok(exit_code)
}

async fn run_one_shot(
  cli: &Cli,
  client: &mut Client,
  use_color: bool,
) -> Result<i32> {
  let (name, args) = cli
    .command
    .split_first()
    .ok_or_else(|| anyhow!("no command given"))?;

  let output = client
    .run(name, args)
    .await
    .with_context(|| format!("command `{}` failed", cli.command.join(" ")))?;

  ui::render_response(&cli.command.join(" "), &output, use_color);
  Ok(0)
}

async fn run_interactive(client: &mut Client, use_color: bool) -> Result<i32> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdout = tokio::io::stdout();
  let mut keep_alive = interval(KEEP_ALIVE_INTERVAL);
  keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);
  keep_alive.reset();
  let mut exit_code = 0;

  loop {
    ui::render_prompt(&mut stdout, use_color)
      .await
      .context("failed to render prompt")?;

    // Keep draining server messages and pinging the server until the user
    // finishes a line; `next_line` and `listen` are both cancel safe.
    let line = loop {
      tokio::select! {
        line = lines.next_line() => {
          break line.context("failed to read line from stdin")?;
        }
        _ = keep_alive.tick() => {
          client.keep_alive().await.context("keep-alive failed")?;
        }
        result = client.listen() => {
          result.context("failed to receive server message")?;
        }
      }
    };

    let Some(input) = line else {
      println!();
      tracing::info!("stdin closed; terminating session");
      break;
    };

    let Some(command) = command::sanitize(&input) else {
      continue;
    };

    if command::is_exit_command(&command) {
      ui::render_bye(use_color);
      break;
    }

    match client.run(&command, &[] as &[&str]).await {
      Ok(output) => ui::render_response(&command, &output, use_color),
      Err(err) if !err.is_transport() => {
        tracing::error!(error = %err, command = %command, "command failed");
        exit_code = 2;
      }
      Err(err) => return Err(err).context("connection to server lost"),
    }
    keep_alive.reset();
  }

  Ok(exit_code)
}

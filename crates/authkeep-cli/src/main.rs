//! authkeep - sign in to a password-based identity provider from the terminal.
//!
//! Keeps the session on disk between runs, prints the bearer token for
//! scripts and follows a session until its token expires.

mod commands;
mod format;
mod navigator;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{AuthKind, Context};

/// Directory for a daily-rolling log file, in addition to stderr
const LOG_DIR_ENV: &str = "AUTHKEEP_LOG_DIR";

const USAGE: &str = "\
Usage: authkeep <command>

Commands:
  login [email]    Sign in with email and password
  signup [email]   Create an account and sign in
  logout           End the current session
  status           Show the current session
  token            Print the bearer token of the current session
  watch            Follow the current session until it expires
  help             Show this message";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Auth(AuthKind, Option<String>),
    Logout,
    Status,
    Token,
    Watch,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some(name) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    let command = match name.as_str() {
        "login" => Command::Auth(AuthKind::Login, rest.first().cloned()),
        "signup" => Command::Auth(AuthKind::Signup, rest.first().cloned()),
        "logout" => Command::Logout,
        "status" => Command::Status,
        "token" => Command::Token,
        "watch" => Command::Watch,
        "help" | "-h" | "--help" => Command::Help,
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    };

    let max_args = if matches!(command, Command::Auth(..)) { 1 } else { 0 };
    if rest.len() > max_args {
        bail!("Too many arguments for {}\n\n{}", name, USAGE);
    }
    Ok(command)
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "authkeep.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let log_dir = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from);
    let _guard = init_tracing(log_dir.as_deref());
    info!(?command, "authkeep starting");

    let mut context = Context::load()?;
    match command {
        Command::Auth(kind, email) => context.authenticate(kind, email).await?,
        Command::Logout => context.logout(),
        Command::Status => context.status(),
        Command::Token => context.token()?,
        Command::Watch => context.watch().await?,
        Command::Help => {}
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

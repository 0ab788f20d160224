//! postdesk: command-line front end for the blog admin console.

mod args;
mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use postdesk_core::{AdminConsole, Config};
use tracing::{debug, error, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};
use commands::Output;

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). With a log file the
/// returned guard must live until exit so buffered lines get flushed.
fn init_tracing(log_file: Option<&std::path::Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr = fmt::layer().with_writer(io::stderr);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(api) = cli.api {
        config.api_base_url = api;
    }
    debug!(api = %config.api_base_url, "Config loaded");

    let console = AdminConsole::new(config)?;
    let output = if cli.json { Output::Json } else { Output::Table };

    match cli.command {
        Commands::Login { email, password } => commands::login(&console, &email, password).await?,
        Commands::Logout => commands::logout(&console),
        Commands::Whoami => commands::whoami(&console),
        Commands::Blogs(cmd) => commands::blogs(&console, cmd.action, output).await?,
        Commands::Categories(cmd) => commands::categories(&console, cmd.action, output).await?,
        Commands::Authors(cmd) => commands::authors(&console, cmd.action, output).await?,
    }

    Ok(())
}

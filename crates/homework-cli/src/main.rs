//! Homework Bot CLI
//!
//! Main entry point for watching homework review statuses.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use homework_transport::{PracticumClient, TelegramNotifier};
use homework_watcher::{PollLoop, WatchConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Homework Bot - review status notifier
///
/// Polls the homework review API and sends a Telegram message whenever the
/// status of the latest submission changes or the bot runs into a new problem.
#[derive(Parser, Debug)]
#[command(name = "homework-bot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Load environment variables from this file (default: .env if present)
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Seconds to wait between polls (overrides RETRY_PERIOD)
    #[arg(long, value_name = "SECS")]
    retry_period: Option<u64>,

    /// Unix timestamp to start polling from (default: now)
    #[arg(long, value_name = "UNIX_SECS")]
    from_date: Option<i64>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Variables from the env file may include RUST_LOG, so load them first.
    let env_file = load_env_file(args.env_file.as_deref());

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Homework bot starting");

    match run_bot(args, env_file).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Runs the bot until a shutdown signal arrives.
///
/// 1. Check configuration (exactly once)
/// 2. Build the HTTP collaborators
/// 3. Install signal handlers
/// 4. Poll until cancelled
async fn run_bot(args: Args, env_file: anyhow::Result<Option<PathBuf>>) -> anyhow::Result<()> {
    match env_file? {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        None => tracing::debug!("No environment file loaded"),
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(severity = "critical", error = %e, "Configuration check failed");
            return Err(e);
        }
    };
    log_config(&config);

    let client = reqwest::Client::new();
    let fetcher = PracticumClient::from_config(client.clone(), &config);
    let notifier = TelegramNotifier::from_config(client, &config);

    let mut poll_loop = PollLoop::from_config(&config, fetcher, notifier);
    if let Some(from_date) = args.from_date {
        poll_loop = poll_loop.with_cursor(from_date);
    }

    let token = CancellationToken::new();
    spawn_signal_handlers(&token);

    let stopped = poll_loop.run(token).await;
    tracing::info!(cursor = stopped.cursor(), "Homework bot stopped");
    Ok(())
}

/// Loads variables from `path`, or from `.env` in the working directory when
/// no path is given. A missing default `.env` is not an error.
fn load_env_file(path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file '{}'", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

/// Reads configuration from the environment and applies CLI overrides.
fn load_config(args: &Args) -> anyhow::Result<WatchConfig> {
    apply_overrides(WatchConfig::from_env()?, args)
}

/// Applies CLI overrides to an already validated configuration.
///
/// Only an overridden configuration is validated again.
fn apply_overrides(config: WatchConfig, args: &Args) -> anyhow::Result<WatchConfig> {
    let Some(secs) = args.retry_period else {
        return Ok(config);
    };

    let config = config.with_retry_period(Duration::from_secs(secs));
    config.validate()?;
    Ok(config)
}

/// Logs the effective configuration, without credentials.
fn log_config(config: &WatchConfig) {
    tracing::info!(
        endpoint = %config.endpoint,
        telegram_api_url = %config.telegram_api_url,
        retry_period_secs = config.retry_period.as_secs(),
        "Configuration loaded"
    );
}

/// Cancels `token` on Ctrl+C, and on SIGTERM on Unix systems.
fn spawn_signal_handlers(token: &CancellationToken) {
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                signal_token.cancel();
            }
            Err(err) => {
                tracing::error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm_token = token.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    tracing::info!("Received SIGTERM signal");
                    sigterm_token.cancel();
                }
                Err(err) => {
                    tracing::error!("Error setting up SIGTERM handler: {}", err);
                }
            }
        });
    }
}

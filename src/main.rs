//! # rostersync
//!
//! Entry point: parses the CLI, installs logging and runs one
//! synchronization.
//!
//! ## Exit status
//!
//! - `0` every team synchronized
//! - `1` configuration error or at least one team failed
//! - `130` interrupted by SIGINT/SIGTERM; changes already sent stay applied

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![forbid(clippy::expect_used)]

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rostersync::{Cli, Termination, run_until_shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let termination = run_until_shutdown(rostersync::execute(&cli), wait_for_shutdown()).await;
    match &termination {
        Termination::Succeeded => {}
        Termination::Failed(message) => eprintln!("{message}"),
        Termination::Interrupted(signal) => {
            eprintln!("interrupted by {signal}, remaining changes were not applied");
        }
    }
    termination.exit_code()
}

/// Log to stderr so stdout carries only progress lines.
///
/// `RUST_LOG` wins over the `--debug` switch.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "error" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Resolve with the name of the first termination signal received.
///
/// Never resolves if the handlers cannot be installed.
async fn wait_for_shutdown() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "failed to install signal handlers");
                std::future::pending().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending().await
            }
        }
    }
}

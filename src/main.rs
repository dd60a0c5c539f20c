//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `transit_governor` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C handling
//! - User-facing output formatting

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use transit_governor::initialization::init_logger_with;
use transit_governor::{run_session, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => trigger.cancel(),
            Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    match run_session(config, shutdown).await {
        Ok(report) => {
            println!(
                "Ran {} poll{} ({} failed) in {:.1}s",
                report.polls,
                if report.polls == 1 { "" } else { "s" },
                report.failed_polls,
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("transit_governor error: {:#}", e);
            process::exit(1);
        }
    }
}

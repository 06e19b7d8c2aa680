//! logroll CLI - write stdin to a size-rotated log file

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use logroll_rotator::{capture, Rotator};
use tokio::io::BufReader;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Diagnostics go to stderr; stdout carries tee output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("logroll={0},logroll_rotator={0}", log_level).into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "✗".red(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut rotator = Rotator::from_config(cli.config())
        .with_context(|| format!("Failed to open {}", cli.path.display()))?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let stdin = BufReader::new(tokio::io::stdin());

    let outcome = tokio::select! {
        result = capture(&mut rotator, stdin) => result.map(Some),
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            Ok(None)
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            Ok(None)
        }
    };

    let pending = rotator.pending_compressions();
    if pending > 0 {
        info!("Waiting for {} compression job(s) to finish", pending);
    }
    let closed = tokio::task::spawn_blocking(move || rotator.close()).await?;

    if let Some(bytes) = outcome.context("Log capture failed")? {
        info!("Input closed after {} bytes", bytes);
    }
    closed.context("Failed to close log file")?;

    Ok(())
}

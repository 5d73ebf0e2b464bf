//! pagetrace - DOM interaction capture
//!
//! Main entry point for the pagetrace CLI.

mod cli;
mod cmd_decode;
mod cmd_record;
mod script;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagetrace_config::{Config, ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let log_dir = ConfigLoader::log_dir(config);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("pagetrace")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        // stdout carries native-messaging frames; console logs go to stderr.
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    ConfigLoader::load_or_default(path)
        .with_context(|| format!("loading configuration from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::CheckConfig => check_config(&cli.config, &config),
        Commands::Record {
            page,
            script,
            output,
            format,
        } => {
            prepare(&cli.config, &config)?;
            cmd_record::handle_record(&config, &page, &script, output.as_deref(), format.into()).await
        }
        Commands::Decode { input } => {
            prepare(&cli.config, &config)?;
            cmd_decode::handle_decode(input.as_deref(), config.relay.max_message_bytes).await
        }
    }
}

/// Start logging and refuse to run with an invalid configuration.
fn prepare(path: &Path, config: &Config) -> anyhow::Result<()> {
    init_tracing(config)?;
    debug!("Using configuration {}", path.display());

    if let Some(e) = ConfigValidator::validate(config)?.into_error() {
        return Err(e).context("invalid configuration (run `pagetrace check-config`)");
    }
    Ok(())
}

/// Print validation errors and warnings; fail if there are errors.
fn check_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;

    if path.exists() {
        println!("Configuration: {}", path.display());
    } else {
        println!("Configuration: {} (not found, using defaults)", path.display());
    }
    for warning in &result.warnings {
        println!("  warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("  error:   {}: {}", error.path, error.message);
    }

    if result.is_valid() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("{} configuration error(s)", result.errors.len())
    }
}

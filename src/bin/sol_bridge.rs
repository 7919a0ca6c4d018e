//! Headless bridge binary for stdin/stdout JSON communication.
//!
//! Reads `ReplyEnvelope` messages as newline-delimited JSON from stdin,
//! interprets each model reply, publishes LED payloads, and writes one
//! `ResponseEnvelope` per line to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use sol::SolConfig;
use sol::dispatch::LogPublisher;
use sol::host::{ReplyHandler, run_stdio_bridge};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("SOL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(SolConfig::default_config_path);
    let config = SolConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config_path.display()))?;

    // Initialise tracing to stderr only (stdout is reserved for the JSON
    // protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(
        config = %config_path.display(),
        topic = %config.device.topic,
        "sol-bridge starting"
    );

    let handler = ReplyHandler::from_config(&config, LogPublisher);
    let stats = run_stdio_bridge(&handler).await.map_err(|e| {
        tracing::error!(error = %e, "sol-bridge exited with error");
        anyhow::anyhow!("sol-bridge failed: {e}")
    })?;

    tracing::info!(
        handled = stats.handled,
        failed = stats.failed,
        "sol-bridge shut down cleanly"
    );
    Ok(())
}

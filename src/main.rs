//! Command-line client that polls the coil server and logs decoded samples.

use anyhow::{Context, Result};
use chrono::{LocalResult, TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use coilstream::config::{ClientConfig, LoggingConfig};
use coilstream::decode::DecodedSample;
use coilstream::poller::{CoilPoller, PollErrorKind};
use coilstream::transport::TcpCoilTransport;

/// Modbus TCP coil stream client.
#[derive(Parser, Debug)]
#[command(name = "coilstream")]
#[command(about = "Polls Modbus coils and logs decoded float samples")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format)
    #[arg(short, long, default_value = "coilstream.json5")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = ClientConfig::load_from_file(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    let log_config = LoggingConfig {
        level: args
            .log_level
            .clone()
            .unwrap_or_else(|| config.logging.level.clone()),
    };
    coilstream::init_tracing(&log_config)?;

    info!("Starting coilstream");
    info!("Loaded configuration from {:?}", args.config);

    // Connect before polling starts; a bad endpoint fails here, not in the loop
    info!(
        "Connecting to Modbus server at {}:{}...",
        config.connection.host, config.connection.port
    );
    let transport = TcpCoilTransport::connect(
        &config.connection.host,
        config.connection.port,
        config.connection.timeout(),
    )
    .await
    .context("Failed to connect to Modbus server")?;
    info!("Connected");

    let handle = CoilPoller::new(config.poll.clone(), transport, log_sample, log_error).start();

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    handle.stop().await;
    info!("Coil stream stopped");

    Ok(())
}

/// Sample sink that mirrors each decoded pair to the log.
fn log_sample(sample: DecodedSample) {
    if sample.epoch_time.is_finite() {
        let secs = sample.epoch_time.trunc() as i64;
        let nanos = (sample.epoch_time.fract() * 1e9) as u32;

        if let LocalResult::Single(when) = Utc.timestamp_opt(secs, nanos) {
            info!("time: {}\tsin(t): {:.6}", when, sample.sine_value);
            return;
        }
    }

    // Non-finite or out-of-range timestamp; log the raw value
    info!(
        "time: {:.6}\tsin(t): {:.6}",
        sample.epoch_time, sample.sine_value
    );
}

/// Observer sink for non-fatal per-cycle failures.
fn log_error(kind: PollErrorKind, message: &str) {
    warn!("Poll error ({:?}): {}", kind, message);
}

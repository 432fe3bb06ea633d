//! Modbus TCP coil client that streams bit-encoded float telemetry.
//!
//! The remote server exposes 96 contiguous coils: 64 encoding an IEEE-754
//! float64 timestamp followed by 32 encoding a float32 sine sample, one coil
//! per bit. This crate polls both blocks on a fixed cadence, reassembles the
//! bits into floats, and hands each decoded `(epoch_time, sine_value)` pair
//! to a consumer-owned sink.
//!
//! Pipeline:
//!
//! ```text
//! poller -> transport (read coils x2) -> decode (bits to floats) -> sink
//! ```
//!
//! - [`transport`] - Modbus TCP "read coils" round trips
//! - [`decode`] - bit-array to float reconstruction
//! - [`poller`] - cancellable polling loop and sink callbacks
//! - [`config`] - configuration loading (JSON5 format)

pub mod config;
pub mod decode;
pub mod poller;
pub mod transport;

// Re-export commonly used types at the crate root
pub use config::{ClientConfig, ConfigError, ConnectionConfig, LoggingConfig, PollConfig};
pub use decode::{BitOrder, DecodeError, DecodedSample};
pub use poller::{
    CoilPoller, PollError, PollErrorKind, PollObserver, PollerHandle, PollerState, SampleSink,
};
pub use transport::{CoilBlock, CoilTransport, TcpCoilTransport, TransportError};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(())
}

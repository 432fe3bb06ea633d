//! Configuration for the coil stream client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::decode::{BitOrder, SINE_CHANNEL_BITS, TIME_CHANNEL_BITS};
use crate::transport::CoilBlock;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Complete client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Modbus server connection settings
    pub connection: ConnectionConfig,

    /// Polling settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Modbus TCP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Host address (IP)
    pub host: String,

    /// TCP port (default: 502)
    #[serde(default = "default_modbus_port")]
    pub port: u16,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_modbus_port() -> u16 {
    502
}

fn default_timeout_ms() -> u64 {
    1000
}

impl ConnectionConfig {
    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Polling cadence and coil channel layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between cycles in milliseconds, measured from cycle completion
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// First coil address of the 64-bit timestamp channel
    #[serde(default)]
    pub time_coil_base: u16,

    /// First coil address of the 32-bit sine channel
    #[serde(default = "default_sine_coil_base")]
    pub sine_coil_base: u16,

    /// Per-channel bit order as served by the device
    #[serde(default)]
    pub bit_order: BitOrder,
}

fn default_interval_ms() -> u64 {
    200
}

fn default_sine_coil_base() -> u16 {
    64
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            time_coil_base: 0,
            sine_coil_base: default_sine_coil_base(),
            bit_order: BitOrder::default(),
        }
    }
}

impl PollConfig {
    /// Coil block holding the 64 timestamp bits.
    pub fn time_block(&self) -> CoilBlock {
        CoilBlock {
            start: self.time_coil_base,
            count: TIME_CHANNEL_BITS,
        }
    }

    /// Coil block holding the 32 sine bits.
    pub fn sine_block(&self) -> CoilBlock {
        CoilBlock {
            start: self.sine_coil_base,
            count: SINE_CHANNEL_BITS,
        }
    }

    /// Inter-cycle delay as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.host.is_empty() {
            return Err(ConfigError::Validation(
                "Connection host cannot be empty".to_string(),
            ));
        }

        if self.connection.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            connection: { host: "192.168.1.10" }
        }"#;

        let config: ClientConfig = json5::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.connection.host, "192.168.1.10");
        assert_eq!(config.connection.port, 502); // default
        assert_eq!(config.poll.interval_ms, 200); // default
        assert_eq!(config.poll.time_coil_base, 0);
        assert_eq!(config.poll.sine_coil_base, 64);
        assert_eq!(config.poll.bit_order, BitOrder::Msb);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            connection: { host: "127.0.0.1", port: 5020, timeout_ms: 500 },
            poll: { interval_ms: 100, time_coil_base: 16, sine_coil_base: 96, bit_order: "lsb" },
            logging: { level: "debug" }
        }"#;

        let config: ClientConfig = json5::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.connection.port, 5020);
        assert_eq!(config.connection.timeout(), Duration::from_millis(500));
        assert_eq!(config.poll.bit_order, BitOrder::Lsb);
        assert_eq!(
            config.poll.time_block(),
            CoilBlock {
                start: 16,
                count: 64
            }
        );
        assert_eq!(
            config.poll.sine_block(),
            CoilBlock {
                start: 96,
                count: 32
            }
        );
    }

    #[test]
    fn test_validate_empty_host() {
        let json = r#"{ connection: { host: "" } }"#;
        let config: ClientConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_interval() {
        let json = r#"{
            connection: { host: "127.0.0.1" },
            poll: { interval_ms: 0 }
        }"#;
        let config: ClientConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_blocks_are_contiguous() {
        let poll = PollConfig::default();
        let time = poll.time_block();
        let sine = poll.sine_block();
        assert_eq!(time.start + time.count, sine.start);
    }
}

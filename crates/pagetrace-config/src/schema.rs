//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Capture engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Quiescence window for input coalescing, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Attribute that holds an element's stable identifier.
    #[serde(default = "default_identity_attribute")]
    pub identity_attribute: String,

    /// Emit the document snapshot after the initial scan.
    #[serde(default = "default_true")]
    pub snapshot_on_start: bool,
}

impl CaptureConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            identity_attribute: default_identity_attribute(),
            snapshot_on_start: true,
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_identity_attribute() -> String {
    "id".to_string()
}

fn default_true() -> bool {
    true
}

/// Boundary relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Largest serialized record accepted by the sink.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

/// Browsers reject native messages above 1 MB.
pub const NATIVE_MESSAGE_LIMIT: usize = 1024 * 1024;

fn default_max_message_bytes() -> usize {
    NATIVE_MESSAGE_LIMIT
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files; `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use crate::report::{TranscriptNaming, DEFAULT_PREFIX, DEFAULT_SUFFIX};
use crate::transport::DEFAULT_RX_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Logging and transcript configuration
    pub logging: LoggingConfig,
}

/// Serial link configuration section.
///
/// Framing (57600 8-N-1, no flow control) is fixed and deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device used when none is given on the command line
    pub device: Option<String>,
    /// Receive timeout applied at open, in milliseconds
    pub rx_timeout_ms: u64,
    /// Device aliases for convenience
    #[serde(default)]
    pub device_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: None,
            rx_timeout_ms: DEFAULT_RX_TIMEOUT.as_millis() as u64,
            device_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the receive timeout as Duration
    pub fn rx_timeout(&self) -> Duration {
        Duration::from_millis(self.rx_timeout_ms)
    }

    /// Resolve a device name through aliases
    pub fn resolve_device(&self, name: &str) -> String {
        self.device_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Diagnostic log format
    pub format: LogFormat,
    /// Mirror operator narration into a timestamped transcript file
    pub debug_transcript: bool,
    /// Directory transcripts are created in
    pub transcript_dir: PathBuf,
    /// Transcript file-name prefix
    pub transcript_prefix: String,
    /// Transcript file-name suffix
    pub transcript_suffix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            debug_transcript: false,
            transcript_dir: PathBuf::from("."),
            transcript_prefix: DEFAULT_PREFIX.to_string(),
            transcript_suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Transcript naming described by this section.
    pub fn transcript_naming(&self) -> TranscriptNaming {
        TranscriptNaming {
            dir: self.transcript_dir.clone(),
            prefix: self.transcript_prefix.clone(),
            suffix: self.transcript_suffix.clone(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

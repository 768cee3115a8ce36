//! Port-specific error types.
//!
//! Defines error types for serial port operations, separate from the
//! transport-level errors so that each backend can report exactly which OS
//! call failed.

use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial device was not found on the system.
    #[error("Serial port not found: {device}")]
    NotFound {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// The readiness wait before a read failed.
    #[error("Failed to wait for data: {0}")]
    Wait(#[source] std::io::Error),

    /// A named OS call failed. The raw OS error code is kept in `source`.
    #[error("Failed to {op}: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No data arrived within the readiness wait.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device path and the failed open.
    pub fn not_found(port_name: impl Into<String>, source: std::io::Error) -> Self {
        Self::NotFound {
            device: port_name.into(),
            source,
        }
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Whether this is a failed readiness wait rather than a failed transfer.
    pub fn is_wait_failure(&self) -> bool {
        matches!(self, Self::Wait(_))
    }

    /// The raw OS error code behind this error, when there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::NotFound { source, .. }
            | Self::Wait(source)
            | Self::Os { source, .. }
            | Self::Io(source) => source.raw_os_error(),
            _ => None,
        }
    }
}

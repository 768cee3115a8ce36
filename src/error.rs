//! Transport-level error taxonomy.
//!
//! Every transport failure is returned as a value. The OS error code of the
//! failing call is preserved wherever the backend had one, and
//! [`TransportError::status_code`] maps each variant onto the integer
//! convention the mechacon protocol layer has always consumed.

use crate::port::PortError;
use thiserror::Error;

/// "Too many open files": reported when a second port is opened.
#[cfg(unix)]
pub const EMFILE: i32 = nix::errno::Errno::EMFILE as i32;

/// "Too many open files": reported when a second port is opened.
#[cfg(not(unix))]
pub const EMFILE: i32 = 24;

/// Status returned for a read or write on a closed transport.
pub const NOT_OPEN_STATUS: i32 = -1;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors returned by [`SerialTransport`](crate::transport::SerialTransport).
///
/// A read that times out is *not* an error; it returns `Ok(0)`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A port is already open; the existing connection was left untouched.
    #[error("COM port is already open")]
    AlreadyOpen,

    /// Opening or configuring the device failed. The device is closed.
    #[error("Failed to open COM port {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: PortError,
    },

    /// Read or write attempted with no port open.
    #[error("COM port is not open")]
    NotOpen,

    /// The readiness wait before a read failed.
    #[error("Waiting for COM port data failed: {0}")]
    Wait(#[source] PortError),

    /// The read itself failed after data was signalled.
    #[error("Read from COM port failed: {0}")]
    Read(#[source] PortError),

    /// The write or the following drain failed.
    #[error("Write to COM port failed: {0}")]
    Write(#[source] PortError),
}

impl TransportError {
    /// The OS error code behind this error, when one is known.
    ///
    /// `AlreadyOpen` reports [`EMFILE`].
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::AlreadyOpen => Some(EMFILE),
            Self::NotOpen => None,
            Self::Open { source, .. }
            | Self::Wait(source)
            | Self::Read(source)
            | Self::Write(source) => source.raw_os_error(),
        }
    }

    /// Integer status in the protocol layer's convention.
    ///
    /// Open failures are the positive OS code (or `-1` when there is none);
    /// I/O failures are negative, so a caller can tell them apart from a byte
    /// count; `NotOpen` is [`NOT_OPEN_STATUS`].
    pub fn status_code(&self) -> i32 {
        match self {
            Self::AlreadyOpen | Self::Open { .. } => self.raw_os_error().unwrap_or(-1),
            Self::NotOpen => NOT_OPEN_STATUS,
            Self::Wait(_) | Self::Read(_) | Self::Write(_) => {
                self.raw_os_error().map_or(-1, |code| -code.abs().max(1))
            }
        }
    }

    /// Whether this error came from opening the port.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Self::AlreadyOpen | Self::Open { .. })
    }
}

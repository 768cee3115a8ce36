//! Port abstraction layer for serial communication.
//!
//! Provides the adapter trait the transport talks to, the fixed wire
//! configuration, the concrete backends and device discovery.

pub mod discovery;
pub mod error;
pub mod mock;
#[cfg(unix)]
pub mod native;
pub mod sync_port;
pub mod traits;

pub use discovery::{default_scanner, DevDirScanner, DeviceScanner, SystemScanner};
pub use error::PortError;
pub use mock::{MockFailure, MockSerialPort};
#[cfg(unix)]
pub use native::NativePort;
pub use sync_port::SyncSerialPort;
pub use traits::*;

/// The backend [`SerialTransport::open`](crate::SerialTransport::open) uses.
///
/// Unix hosts use the termios backend; everything else goes through the
/// `serialport` crate.
#[cfg(unix)]
pub type PlatformPort = NativePort;

/// The backend [`SerialTransport::open`](crate::SerialTransport::open) uses.
#[cfg(not(unix))]
pub type PlatformPort = SyncSerialPort;

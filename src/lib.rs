//! PMAP serial transport library
//!
//! This library is the platform layer the mechacon protocol logic sits on:
//! it discovers candidate serial devices, opens one at the fixed 57600 8-N-1
//! framing, performs timeout-bounded reads and drained writes, and narrates
//! what it does to the operator with an optional debug transcript.
//!
//! # Modules
//!
//! - `transport`: the single-connection serial transport
//! - `port`: adapter trait, fixed wire configuration, backends and discovery
//! - `report`: console narration and the debug transcript
//! - `strcmp`: ASCII case-insensitive comparison for protocol tokens
//! - `error`: transport error taxonomy
//! - `config`: configuration with TOML support
//! - `logging`: tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use pmap_serial::{Reporter, SerialTransport};
//! use std::time::Duration;
//!
//! let reporter = Reporter::new();
//! reporter.init_debug_sink();
//!
//! let mut link = SerialTransport::new(reporter.clone());
//! link.open("/dev/ttyUSB0")?;
//! link.write("VER\r")?;
//!
//! let mut reply = [0u8; 64];
//! let n = link.read(&mut reply, Duration::from_millis(500))?;
//! println!("{}", String::from_utf8_lossy(&reply[..n]));
//!
//! link.close();
//! reporter.deinit_debug_sink();
//! # Ok::<(), pmap_serial::TransportError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod report;
pub mod strcmp;
pub mod transport;

// Re-export commonly used types for convenience
pub use error::{TransportError, TransportResult};
pub use port::{
    DeviceScanner, MockSerialPort, PortConfiguration, PortError, SerialPortAdapter,
    SyncSerialPort,
};
pub use report::{DebugSink, Reporter};
pub use strcmp::{compare_ci, compare_ci_bounded};
pub use transport::{sleep_ms, SerialTransport, DEFAULT_RX_TIMEOUT};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};

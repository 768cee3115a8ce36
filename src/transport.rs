//! The serial transport used by the mechacon protocol layer.
//!
//! A [`SerialTransport`] owns at most one open port. Opening while a port is
//! active fails with [`TransportError::AlreadyOpen`] and leaves the existing
//! connection alone; closing is idempotent; reads and writes on a closed
//! transport fail immediately with [`TransportError::NotOpen`].
//!
//! ```text
//! Closed --open ok--> Opened --close--> Closed
//! Closed --open err-> Closed
//! Opened --read/write--> Opened
//! Opened --open--> Opened (AlreadyOpen)
//! ```
//!
//! There is no internal locking and no retry: each call makes one attempt and
//! a multi-threaded host must serialise access itself.

use crate::error::{TransportError, TransportResult};
use crate::port::{
    default_scanner, DeviceOpen, DeviceScanner, PlatformPort, PortConfiguration, PortError,
    SerialPortAdapter,
};
use crate::report::Reporter;
use std::time::Duration;
use tracing::{debug, trace};

/// The protocol layer's normal receive timeout, applied at every open.
pub const DEFAULT_RX_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Open/closed state of the transport.
#[derive(Debug, Default)]
enum PortState {
    #[default]
    Closed,
    Opened {
        port: Box<dyn SerialPortAdapter>,
    },
}

/// A single serial connection with timeout-bounded reads and drained writes.
pub struct SerialTransport {
    state: PortState,
    config: PortConfiguration,
    rx_timeout: Duration,
    default_rx_timeout: Duration,
    reporter: Reporter,
    scanner: Box<dyn DeviceScanner>,
}

impl SerialTransport {
    /// A closed transport narrating through `reporter`.
    pub fn new(reporter: Reporter) -> Self {
        Self {
            state: PortState::Closed,
            config: PortConfiguration::mecha(),
            rx_timeout: DEFAULT_RX_TIMEOUT,
            default_rx_timeout: DEFAULT_RX_TIMEOUT,
            reporter,
            scanner: default_scanner(),
        }
    }

    /// Use `scanner` for the device listing printed by [`open`](Self::open).
    pub fn with_scanner(mut self, scanner: Box<dyn DeviceScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Receive timeout applied on every successful open.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_rx_timeout = timeout;
        self.rx_timeout = timeout;
        self
    }

    /// Open and configure `device` for the mechacon link.
    ///
    /// Candidate devices are listed first as an operator aid; listing never
    /// fails the open. On success the receive timeout is reset to its default.
    /// On failure the device is closed again and the OS error is returned.
    pub fn open(&mut self, device: &str) -> TransportResult<()> {
        self.ensure_closed()?;

        self.reporter.report(self.scanner.describe());
        for candidate in self.scanner.scan() {
            self.reporter.report(candidate);
        }

        crate::report!(self.reporter, "Opening COM port: {device}");
        let mut port = PlatformPort::open_device(device, &self.config)
            .map_err(|source| self.open_failed(Some("Failed to open COM port"), device, source))?;
        self.reporter.report("COM port opened successfully.");

        // Returning here drops `port`, which closes the device again.
        if let Err(source) = port.configure(&self.config) {
            return Err(self.open_failed(None, device, source));
        }
        self.install(Box::new(port));
        Ok(())
    }

    /// Install an already-open adapter, under the same rules as [`open`](Self::open).
    pub fn open_with(&mut self, port: Box<dyn SerialPortAdapter>) -> TransportResult<()> {
        self.ensure_closed()?;
        crate::report!(self.reporter, "Opening COM port: {}", port.name());
        self.reporter.report("COM port opened successfully.");
        self.install(port);
        Ok(())
    }

    fn ensure_closed(&self) -> TransportResult<()> {
        if let PortState::Opened { .. } = self.state {
            self.reporter.report("COM port is already open.");
            return Err(TransportError::AlreadyOpen);
        }
        Ok(())
    }

    fn install(&mut self, port: Box<dyn SerialPortAdapter>) {
        debug!(device = port.name(), config = %self.config, "transport opened");
        self.state = PortState::Opened { port };
        self.rx_timeout = self.default_rx_timeout;
        self.reporter.report("COM port configuration set.");
    }

    /// Narrate a failed open. `step` names the failed step when the cause
    /// alone would not say it.
    fn open_failed(&self, step: Option<&str>, device: &str, source: PortError) -> TransportError {
        let text = match (step, source.raw_os_error()) {
            (Some(step), Some(code)) => format!("{step}. Error code: {code}"),
            (Some(step), None) => format!("{step}: {source}."),
            (None, Some(code)) => format!("{source}. Error code: {code}"),
            (None, None) => format!("{source}."),
        };
        debug!(device, error = %source, "open failed");
        self.reporter.report_error(text);
        TransportError::Open {
            device: device.to_string(),
            source,
        }
    }

    /// Close the port. Closing a closed transport only reports that fact.
    pub fn close(&mut self) {
        match std::mem::take(&mut self.state) {
            PortState::Opened { port } => {
                self.reporter.report("Closing COM port...");
                debug!(device = port.name(), "transport closed");
                drop(port);
                self.reporter.report("COM port closed.");
            }
            PortState::Closed => self.reporter.report("COM port is already closed."),
        }
    }

    fn port_mut(&mut self) -> TransportResult<&mut Box<dyn SerialPortAdapter>> {
        match &mut self.state {
            PortState::Opened { port } => Ok(port),
            PortState::Closed => {
                self.reporter.report("COM port is not open.");
                Err(TransportError::NotOpen)
            }
        }
    }

    /// Wait up to `timeout` for data and perform a single read into `buffer`.
    ///
    /// Returns the number of bytes read; `Ok(0)` means the wait elapsed with
    /// no data. Returns `NotOpen` without waiting when no port is open.
    pub fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> TransportResult<usize> {
        let reporter = self.reporter.clone();
        let port = self.port_mut()?;

        match port.read_timeout(buffer, timeout) {
            Ok(n) => {
                trace!(bytes = n, "read from COM port");
                Ok(n)
            }
            Err(PortError::Timeout(_)) => {
                reporter.report("Read from COM port timed out.");
                Ok(0)
            }
            Err(e) if e.is_wait_failure() => {
                reporter.report_error("Select function error.");
                Err(TransportError::Wait(e))
            }
            Err(e) => {
                reporter.report_error("Read from COM port failed.");
                Err(TransportError::Read(e))
            }
        }
    }

    /// [`read`](Self::read) with the current receive timeout.
    pub fn read_default(&mut self, buffer: &mut [u8]) -> TransportResult<usize> {
        self.read(buffer, self.rx_timeout)
    }

    /// Write `data` in one OS write and block until it has been transmitted.
    ///
    /// `data` is treated as NUL-terminated text: nothing from the first NUL
    /// byte on is sent. Returns the number of bytes the OS accepted.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> TransportResult<usize> {
        let data = data.as_ref();
        let data = match data.iter().position(|&b| b == 0) {
            Some(end) => &data[..end],
            None => data,
        };

        let reporter = self.reporter.clone();
        let port = self.port_mut()?;

        let result = port
            .write_bytes(data)
            .and_then(|n| port.drain().map(|()| n));
        match result {
            Ok(n) => {
                trace!(bytes = n, requested = data.len(), "wrote to COM port");
                Ok(n)
            }
            Err(e) => {
                reporter.report_error("Write to COM port failed.");
                Err(TransportError::Write(e))
            }
        }
    }

    /// Whether a port is open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, PortState::Opened { .. })
    }

    /// Name of the open device.
    pub fn device(&self) -> Option<&str> {
        match &self.state {
            PortState::Opened { port } => Some(port.name()),
            PortState::Closed => None,
        }
    }

    /// The receive timeout used by [`read_default`](Self::read_default).
    pub fn receive_timeout(&self) -> Duration {
        self.rx_timeout
    }

    /// Override the receive timeout until the next open.
    pub fn set_receive_timeout(&mut self, timeout: Duration) {
        self.rx_timeout = timeout;
    }

    /// The reporter this transport narrates through.
    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("state", &self.state)
            .field("rx_timeout", &self.rx_timeout)
            .finish()
    }
}

/// Block the calling thread for roughly `msec` milliseconds.
///
/// Uses the monotonic clock; the scheduler may oversleep.
pub fn sleep_ms(msec: u64) {
    std::thread::sleep(Duration::from_millis(msec));
}

//! Portable serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter` trait. This is the default backend on hosts without
//! termios and an alternative on unix when `NativePort` is not wanted.

use super::error::PortError;
use super::traits::{DeviceOpen, PortConfiguration, SerialPortAdapter};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// Serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl DeviceOpen for SyncSerialPort {
    /// Open the port. The `serialport` crate applies the line settings as
    /// part of opening.
    ///
    /// # Example
    /// ```no_run
    /// use pmap_serial::port::{DeviceOpen, PortConfiguration, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &PortConfiguration::mecha())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn open_device(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .open()
            .map_err(|e| match e.kind() {
                // serialport keeps only the error kind, not the OS code.
                serialport::ErrorKind::NoDevice
                | serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                    PortError::not_found(
                        port_name,
                        std::io::Error::new(std::io::ErrorKind::NotFound, e.description),
                    )
                }
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    /// Discard anything left in the buffers.
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError> {
        self.clear_buffers()?;
        debug!(device = %self.name, %config, "serialport backend configured");
        Ok(())
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)?;
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(PortError::timeout(timeout)),
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn drain(&mut self) -> Result<(), PortError> {
        // serialport's flush waits for the output queue to empty (tcdrain on unix).
        self.port.flush().map_err(PortError::Io)
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(PortError::Serial)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

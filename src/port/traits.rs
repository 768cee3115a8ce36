//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that allows the native termios
//! backend, the `serialport`-crate backend and mock implementations to be
//! used interchangeably by the transport.

use super::error::PortError;
use std::time::Duration;

/// Line speed used by the mechacon link.
pub const MECHA_BAUD_RATE: u32 = 57_600;

/// Wire parameters applied at open time.
///
/// The link always runs 57600 8-N-1 without flow control in raw mode, so the
/// only way to get a `PortConfiguration` is [`PortConfiguration::mecha`] (or
/// `Default`, which is the same thing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second), both directions.
    pub baud_rate: u32,

    /// Number of data bits.
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,
}

impl PortConfiguration {
    /// The fixed mechacon framing: 57600 baud, 8 data bits, no parity,
    /// 1 stop bit, no hardware or software flow control.
    pub const fn mecha() -> Self {
        Self {
            baud_rate: MECHA_BAUD_RATE,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self::mecha()
    }
}

impl std::fmt::Display for PortConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{} {}-{}-{}", self.baud_rate, bits, parity, stop)
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// An adapter is always an *open* port: constructing one opens and configures
/// the device, dropping it closes the handle.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Wait up to `timeout` for the port to become readable, then perform a
    /// single read into `buffer`.
    ///
    /// Returns `PortError::Timeout` when nothing arrived in time and
    /// `PortError::Wait` when the readiness wait itself failed.
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, PortError>;

    /// Issue one write of `data`.
    ///
    /// Returns the number of bytes the OS accepted.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Block until every byte written so far has been transmitted.
    fn drain(&mut self) -> Result<(), PortError>;

    /// Discard unread input and unsent output.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;
}

/// Backends that open a device by path.
///
/// Opening is split in two so callers can tell a device that would not open
/// apart from one that opened but rejected its configuration. Dropping the
/// value returned by [`open_device`](Self::open_device) closes the device.
pub trait DeviceOpen: SerialPortAdapter + Sized {
    /// Open the device node.
    fn open_device(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError>;

    /// Apply `config` and discard stale buffered data.
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError>;

    /// Open and configure in one go.
    fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let mut port = Self::open_device(port_name, config)?;
        port.configure(config)?;
        Ok(port)
    }
}

//! Native termios serial port for unix hosts.
//!
//! Talks to the device node directly so that every step of the open sequence
//! (open, clear `O_NONBLOCK`, `tcgetattr`, `tcsetattr`, `tcflush`) reports the
//! exact OS error code of the call that failed, and so that reads use a single
//! `poll(2)` readiness wait followed by one `read(2)`.

use super::error::PortError;
use super::traits::{
    DataBits, DeviceOpen, FlowControl, Parity, PortConfiguration, SerialPortAdapter, StopBits,
};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::termios::{
    self, BaudRate, ControlFlags, FlushArg, InputFlags, LocalFlags, OutputFlags, SetArg,
    SpecialCharacterIndices, Termios,
};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Serial port opened and configured through termios.
///
/// The device file is owned: dropping the port closes it, which is what makes
/// every early return after [`DeviceOpen::open_device`] leave the device closed.
pub struct NativePort {
    file: File,
    name: String,
}

/// Map a failed termios/fcntl call to a [`PortError::Os`] naming the call.
fn os(op: &'static str) -> impl FnOnce(Errno) -> PortError {
    move |errno| PortError::Os {
        op,
        source: errno.into(),
    }
}

fn speed_for(baud_rate: u32) -> Result<BaudRate, PortError> {
    let speed = match baud_rate {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        other => return Err(PortError::config(format!("Unsupported baud rate {other}"))),
    };
    Ok(speed)
}

/// Apply `config` to `tio`: line speed, framing, no flow control, raw mode.
fn apply_configuration(tio: &mut Termios, config: &PortConfiguration) -> Result<(), PortError> {
    let speed = speed_for(config.baud_rate)?;
    termios::cfsetispeed(tio, speed).map_err(os("set input speed"))?;
    termios::cfsetospeed(tio, speed).map_err(os("set output speed"))?;

    let cflag = &mut tio.control_flags;
    cflag.remove(ControlFlags::CSIZE);
    cflag.insert(match config.data_bits {
        DataBits::Seven => ControlFlags::CS7,
        DataBits::Eight => ControlFlags::CS8,
    });

    match config.parity {
        Parity::None => cflag.remove(ControlFlags::PARENB),
        Parity::Odd => cflag.insert(ControlFlags::PARENB | ControlFlags::PARODD),
        Parity::Even => {
            cflag.insert(ControlFlags::PARENB);
            cflag.remove(ControlFlags::PARODD);
        }
    }

    match config.stop_bits {
        StopBits::One => cflag.remove(ControlFlags::CSTOPB),
        StopBits::Two => cflag.insert(ControlFlags::CSTOPB),
    }

    cflag.remove(ControlFlags::CRTSCTS);
    tio.input_flags
        .remove(InputFlags::IXON | InputFlags::IXOFF | InputFlags::IXANY);
    match config.flow_control {
        FlowControl::None => {}
        FlowControl::Software => tio.input_flags.insert(InputFlags::IXON | InputFlags::IXOFF),
        FlowControl::Hardware => tio.control_flags.insert(ControlFlags::CRTSCTS),
    }

    // Raw mode: no input translation, no line discipline, no output processing.
    tio.input_flags.remove(
        InputFlags::IGNBRK
            | InputFlags::BRKINT
            | InputFlags::PARMRK
            | InputFlags::ISTRIP
            | InputFlags::INLCR
            | InputFlags::IGNCR
            | InputFlags::ICRNL,
    );
    tio.local_flags = LocalFlags::empty();
    tio.output_flags = OutputFlags::empty();
    tio.control_flags
        .insert(ControlFlags::CREAD | ControlFlags::CLOCAL);
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

    Ok(())
}

impl NativePort {
    fn flush_all(&self) -> Result<(), PortError> {
        termios::tcflush(&self.file, FlushArg::TCIOFLUSH).map_err(os("flush terminal I/O"))
    }

    /// Wait until the device is readable. `Ok(false)` means `timeout` elapsed.
    fn wait_readable(&self, timeout: Duration) -> Result<bool, PortError> {
        let deadline = Instant::now() + timeout;
        loop {
            // poll(2) takes milliseconds as an int; long waits go in slices.
            let remaining = deadline.saturating_duration_since(Instant::now());
            let slice = u16::try_from(remaining.as_millis()).unwrap_or(u16::MAX);

            let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
            let ready = poll(&mut fds, slice).map_err(|errno| PortError::Wait(errno.into()))?;
            if ready > 0 {
                return Ok(true);
            }
            if slice < u16::MAX {
                return Ok(false);
            }
        }
    }
}

impl DeviceOpen for NativePort {
    /// Open the device node with `O_NOCTTY | O_NONBLOCK`. Nothing is
    /// configured yet.
    fn open_device(port_name: &str, _config: &PortConfiguration) -> Result<Self, PortError> {
        let flags = OFlag::O_NOCTTY | OFlag::O_NONBLOCK;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(flags.bits())
            .open(port_name)
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => PortError::not_found(port_name, source),
                _ => PortError::Os {
                    op: "open device",
                    source,
                },
            })?;
        debug!(device = port_name, fd = file.as_raw_fd(), "device opened");

        Ok(Self {
            file,
            name: port_name.to_string(),
        })
    }

    /// Switch back to blocking mode, apply `config` immediately and discard
    /// stale input/output.
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError> {
        fcntl(self.file.as_raw_fd(), FcntlArg::F_SETFL(OFlag::empty()))
            .map_err(os("clear non-blocking mode"))?;

        let mut tio = termios::tcgetattr(&self.file).map_err(os("get terminal attributes"))?;
        apply_configuration(&mut tio, config)?;
        termios::tcsetattr(&self.file, SetArg::TCSANOW, &tio)
            .map_err(os("set terminal attributes"))?;
        self.flush_all()?;

        debug!(device = %self.name, %config, "terminal attributes applied");
        Ok(())
    }
}

impl SerialPortAdapter for NativePort {
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, PortError> {
        if !self.wait_readable(timeout)? {
            return Err(PortError::timeout(timeout));
        }
        self.file.read(buffer).map_err(|source| PortError::Os {
            op: "read from device",
            source,
        })
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.file.write(data).map_err(|source| PortError::Os {
            op: "write to device",
            source,
        })
    }

    fn drain(&mut self) -> Result<(), PortError> {
        termios::tcdrain(&self.file).map_err(os("drain output"))
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.flush_all()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for NativePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePort")
            .field("name", &self.name)
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}

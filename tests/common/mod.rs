//! Shared test utilities for pmap-serial integration tests.
//!
//! This module provides common test infrastructure including:
//! - Reporters whose narration can be inspected
//! - A pseudo-terminal peer that stands in for the mechacon end of the link
//! - Open descriptor counting for leak checks

#![allow(dead_code)]

use pmap_serial::port::DevDirScanner;
use pmap_serial::report::MemoryWriter;
use pmap_serial::{Reporter, SerialTransport};

/// Reporter writing to in-memory console and error buffers.
pub fn captured_reporter() -> (Reporter, MemoryWriter, MemoryWriter) {
    let console = MemoryWriter::new();
    let errors = MemoryWriter::new();
    let reporter = Reporter::with_writers(Box::new(console.clone()), Box::new(errors.clone()));
    (reporter, console, errors)
}

/// Closed transport with captured narration and an empty device listing.
pub fn quiet_transport() -> (SerialTransport, MemoryWriter) {
    let (reporter, console, _) = captured_reporter();
    let transport = SerialTransport::new(reporter)
        .with_scanner(Box::new(DevDirScanner::new("/definitely/not/a/dev/dir")));
    (transport, console)
}

#[cfg(target_os = "linux")]
pub use pty::{open_fd_count, PtyPeer};

#[cfg(target_os = "linux")]
mod pty {
    use nix::fcntl::OFlag;
    use nix::poll::{poll, PollFd, PollFlags};
    use nix::pty::{grantpt, posix_openpt, ptsname_r, unlockpt, PtyMaster};
    use std::io::{Read, Write};
    use std::os::fd::AsFd;
    use std::time::Duration;

    /// Master side of a pseudo-terminal; the transport opens the slave path.
    pub struct PtyPeer {
        master: PtyMaster,
        slave_path: String,
    }

    impl PtyPeer {
        /// Allocate a new pseudo-terminal pair.
        pub fn open() -> Self {
            let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).expect("posix_openpt");
            grantpt(&master).expect("grantpt");
            unlockpt(&master).expect("unlockpt");
            let slave_path = ptsname_r(&master).expect("ptsname_r");
            Self { master, slave_path }
        }

        /// Path the transport should open.
        pub fn slave_path(&self) -> &str {
            &self.slave_path
        }

        /// Send bytes towards the transport.
        pub fn send(&mut self, data: &[u8]) {
            self.master.write_all(data).expect("pty master write");
            self.master.flush().expect("pty master flush");
        }

        /// Collect what the transport wrote, waiting up to `timeout` for each chunk
        /// until `len` bytes have arrived.
        pub fn receive(&mut self, len: usize, timeout: Duration) -> Vec<u8> {
            let wait = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
            let mut received = Vec::with_capacity(len);
            let mut chunk = [0u8; 256];
            while received.len() < len {
                let mut fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLIN)];
                match poll(&mut fds, wait) {
                    Ok(ready) if ready > 0 => {}
                    _ => break,
                }
                match self.master.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => received.extend_from_slice(&chunk[..n]),
                }
            }
            received
        }
    }

    /// Number of descriptors this process has open.
    pub fn open_fd_count() -> usize {
        std::fs::read_dir("/proc/self/fd")
            .expect("read /proc/self/fd")
            .count()
    }
}

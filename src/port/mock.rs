//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates a peer device without requiring
//! hardware. Clones share state, so a test can keep one handle for scripting
//! and inspection while the transport owns the other.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Failure a mock operation can be told to produce once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// The readiness wait fails.
    Wait,
    /// The wait succeeds but the read itself fails.
    Read,
    /// The write call fails.
    Write,
    /// The write succeeds but draining fails.
    Drain,
}

/// Inner state of the mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes the "peer" has sent and the transport has not read yet.
    read_queue: VecDeque<u8>,
    /// Log of all byte slices written to the port.
    write_log: Vec<Vec<u8>>,
    /// Failures to inject, consumed by the first matching operation.
    failures: Vec<MockFailure>,
    /// Cap on how many bytes a single write accepts.
    write_limit: Option<usize>,
    /// Timeout passed to the most recent read.
    last_timeout: Option<Duration>,
    /// Number of completed drains.
    drains: usize,
    /// Whether buffers have been cleared.
    buffers_cleared: bool,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use pmap_serial::port::{MockSerialPort, SerialPortAdapter};
/// use std::time::Duration;
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"OK\r");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read_timeout(&mut buffer, Duration::from_millis(10)).unwrap();
/// assert_eq!(&buffer[..n], b"OK\r");
///
/// port.write_bytes(b"VER\r").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"VER\r".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Enqueue bytes to be returned by subsequent reads.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Make the next operation of the given kind fail with an OS-style error.
    pub fn fail_next(&mut self, failure: MockFailure) {
        self.state.lock().failures.push(failure);
    }

    /// Accept at most `limit` bytes per write, simulating a short write.
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.state.lock().write_limit = limit;
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Timeout requested by the most recent read.
    pub fn last_timeout(&self) -> Option<Duration> {
        self.state.lock().last_timeout
    }

    /// Number of drains performed so far.
    pub fn drain_count(&self) -> usize {
        self.state.lock().drains
    }

    /// Get whether buffers have been cleared.
    pub fn was_cleared(&self) -> bool {
        self.state.lock().buffers_cleared
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Number of live handles sharing this mock's state, including this one.
    ///
    /// Drops to 1 once the transport has released its handle.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }
}

fn take_failure(state: &mut MockPortState, kind: MockFailure) -> bool {
    match state.failures.iter().position(|f| *f == kind) {
        Some(idx) => {
            state.failures.remove(idx);
            true
        }
        None => false,
    }
}

/// Injected failures carry EIO.
fn eio() -> std::io::Error {
    std::io::Error::from_raw_os_error(5)
}

fn injected(op: &'static str) -> PortError {
    PortError::Os { op, source: eio() }
}

impl SerialPortAdapter for MockSerialPort {
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.last_timeout = Some(timeout);

        if take_failure(&mut state, MockFailure::Wait) {
            return Err(PortError::Wait(eio()));
        }
        if state.read_queue.is_empty() {
            return Err(PortError::timeout(timeout));
        }
        if take_failure(&mut state, MockFailure::Read) {
            return Err(injected("read from device"));
        }

        let n = buffer.len().min(state.read_queue.len());
        for (slot, byte) in buffer.iter_mut().zip(state.read_queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if take_failure(&mut state, MockFailure::Write) {
            return Err(injected("write to device"));
        }

        let accepted = state.write_limit.map_or(data.len(), |l| l.min(data.len()));
        state.write_log.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn drain(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if take_failure(&mut state, MockFailure::Drain) {
            return Err(injected("drain output"));
        }
        state.drains += 1;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

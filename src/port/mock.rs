//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that behaves like a non-blocking TTY without
//! requiring hardware: reads drain a queue, writes are logged, and failures
//! can be injected.

use super::error::PortError;
use super::traits::SerialIo;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Inner state of the mock port, shared between clones.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes returned by read operations.
    read_queue: VecDeque<u8>,
    /// Every buffer passed to a write.
    write_log: Vec<Vec<u8>>,
    /// Errno the next operation fails with.
    fail_next: Option<i32>,
    /// Cap on bytes accepted per write, to simulate short writes.
    max_write: Option<usize>,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use tty_serial::port::{MockSerialPort, SerialIo};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"hello");
///
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"hello");
///
/// port.write_bytes(b"ACK").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"ACK".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Append bytes to the read queue.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state().write_log.clone()
    }

    /// All written bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state().write_log.concat()
    }

    /// Make the next read, write or queue query fail with `errno`.
    pub fn fail_next(&mut self, errno: i32) {
        self.state().fail_next = Some(errno);
    }

    /// Accept at most `max` bytes per write.
    pub fn set_max_write(&mut self, max: Option<usize>) {
        self.state().max_write = max;
    }

    fn state(&self) -> MutexGuard<'_, MockPortState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn injected_failure(state: &mut MockPortState) -> Result<(), PortError> {
    match state.fail_next.take() {
        Some(errno) => Err(PortError::Io(io::Error::from_raw_os_error(errno))),
        None => Ok(()),
    }
}

impl SerialIo for MockSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state();
        injected_failure(&mut state)?;

        let accepted = state.max_write.map_or(data.len(), |max| max.min(data.len()));
        state.write_log.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state();
        injected_failure(&mut state)?;

        let count = buffer.len().min(state.read_queue.len());
        for (slot, byte) in buffer.iter_mut().zip(state.read_queue.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn bytes_available(&self) -> Result<usize, PortError> {
        let mut state = self.state();
        injected_failure(&mut state)?;
        Ok(state.read_queue.len())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("queued", &self.state().read_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_partial_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"Hello");
        assert_eq!(port.bytes_available().unwrap(), 8);
    }

    #[test]
    fn test_empty_read_returns_zero() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log, vec![b"Test1".to_vec(), b"Test2".to_vec()]);
        assert_eq!(port.written(), b"Test1Test2");
    }

    #[test]
    fn test_short_write() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_max_write(Some(2));
        assert_eq!(port.write_bytes(b"hello").unwrap(), 2);
        assert_eq!(port.written(), b"he");
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next(libc::EIO);

        let err = port.write_bytes(b"x").unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EIO));
        assert_eq!(port.write_bytes(b"x").unwrap(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let mut port = MockSerialPort::new("MOCK0");
        let observer = port.clone();
        port.write_bytes(b"shared").unwrap();
        assert_eq!(observer.written(), b"shared");
    }
}

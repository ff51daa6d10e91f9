//! Core trait for serial port abstraction.
//!
//! `SerialIo` lets the real `TtyPort` and the in-memory `MockSerialPort` be
//! used interchangeably by code that only moves bytes.

use super::error::PortError;

/// Byte-level serial I/O.
pub trait SerialIo: std::fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Write bytes to the port in a single call.
    ///
    /// Returns the number of bytes actually written; short writes are not retried.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Write `data` up to, not including, its first NUL byte.
    fn write_text(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.write_bytes(until_nul(data))
    }

    /// Read bytes into the provided buffer in a single call.
    ///
    /// Returns the number of bytes actually read, `0` if none arrived in time.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Bytes currently queued for reading.
    fn bytes_available(&self) -> Result<usize, PortError>;
}

/// The prefix of `data` before its first NUL byte.
pub(crate) fn until_nul(data: &[u8]) -> &[u8] {
    let len = memchr::memchr(0, data).unwrap_or(data.len());
    &data[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_until_nul() {
        assert_eq!(until_nul(b"AT\0+RST"), b"AT");
        assert_eq!(until_nul(b"hello"), b"hello");
        assert_eq!(until_nul(b"\0tail"), b"");
        assert_eq!(until_nul(b""), b"");
    }
}

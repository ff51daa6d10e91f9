//! Owned TTY serial port.
//!
//! `TtyPort` owns the device descriptor. It is released when the port is
//! dropped, or explicitly through [`TtyPort::close`] when the caller wants the
//! OS result.

use super::error::PortError;
use super::settings::{BaudRate, Parity, PortSettings, ReadMode, ReadTimeout};
use super::sys;
use super::traits::{until_nul, SerialIo};
use std::ffi::{CStr, CString};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use tracing::{debug, warn};

/// A serial port backed by a TTY device.
pub struct TtyPort {
    fd: OwnedFd,
    name: String,
}

impl TtyPort {
    /// Open a TTY device and apply `settings` before returning it.
    ///
    /// # Example
    /// ```no_run
    /// use tty_serial::port::{BaudRate, PortSettings, TtyPort};
    ///
    /// let port = TtyPort::open("/dev/ttyS0", &PortSettings::simple(BaudRate::Baud115200))?;
    /// port.write_buffer(b"AT\r")?;
    /// # Ok::<(), tty_serial::port::PortError>(())
    /// ```
    pub fn open(path: impl AsRef<Path>, settings: &PortSettings) -> Result<Self, PortError> {
        let path = path.as_ref();
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| PortError::InvalidPath(path.to_path_buf()))?;

        let fd = sys::open_device(&c_path).map_err(|source| {
            warn!(
                path = %path.display(),
                errno = source.raw_os_error(),
                error = %source,
                "failed to open serial device"
            );
            PortError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let port = Self {
            fd,
            name: path.display().to_string(),
        };
        port.configure(settings.baud_rate, settings.parity, settings.read_mode.timeout)?;
        port.set_read_mode(settings.read_mode)?;

        debug!(
            port = %port.name,
            baud_rate = settings.baud_rate.bps(),
            parity = %settings.parity,
            min_bytes = settings.read_mode.min_bytes,
            timeout_ds = settings.read_mode.timeout.deciseconds(),
            "opened serial port"
        );
        Ok(port)
    }

    /// Open with no parity, non-blocking reads and the default timeout.
    pub fn open_simple(path: impl AsRef<Path>, baud_rate: BaudRate) -> Result<Self, PortError> {
        Self::open(path, &PortSettings::simple(baud_rate))
    }

    /// Adopt an already-open descriptor without touching its attributes.
    pub fn from_owned_fd(fd: OwnedFd, name: impl Into<String>) -> Self {
        Self {
            fd,
            name: name.into(),
        }
    }

    /// Put the port into raw 8-bit mode with the given speed, parity and read timeout.
    ///
    /// Reads become non-blocking; use [`TtyPort::set_read_mode`] afterwards to
    /// wait for a minimum byte count. On failure the port keeps whatever
    /// attributes the OS accepted.
    pub fn configure(
        &self,
        baud_rate: BaudRate,
        parity: Parity,
        timeout: ReadTimeout,
    ) -> Result<(), PortError> {
        let mut termios = self.attributes()?;
        sys::apply_raw_attributes(&mut termios, baud_rate, parity, timeout)
            .map_err(PortError::SetAttributes)?;
        self.apply(&termios)
    }

    /// Change only when reads return, leaving every other attribute alone.
    pub fn set_read_mode(&self, mode: ReadMode) -> Result<(), PortError> {
        let mut termios = self.attributes()?;
        sys::apply_read_mode(&mut termios, mode);
        self.apply(&termios)
    }

    /// Decode the attributes currently applied to the device.
    pub fn settings(&self) -> Result<PortSettings, PortError> {
        let termios = self.attributes()?;
        let speed = sys::output_speed(&termios);
        let baud_rate = BaudRate::from_speed(speed).ok_or(PortError::UnsupportedSpeed(speed))?;

        Ok(PortSettings {
            baud_rate,
            parity: Parity::from_cflag(termios.c_cflag),
            read_mode: sys::read_mode_of(&termios),
        })
    }

    /// Change the line speed, leaving every other attribute alone.
    ///
    /// Works even when the current speed has no [`BaudRate`] counterpart.
    pub fn set_baud_rate(&self, baud_rate: BaudRate) -> Result<(), PortError> {
        let mut termios = self.attributes()?;
        sys::set_speed(&mut termios, baud_rate).map_err(PortError::SetAttributes)?;
        self.apply(&termios)
    }

    pub fn set_parity(&self, parity: Parity) -> Result<(), PortError> {
        let mut termios = self.attributes()?;
        sys::set_parity(&mut termios, parity);
        self.apply(&termios)
    }

    /// Release the port and report the OS result of closing it.
    pub fn close(self) -> Result<(), PortError> {
        let name = self.name;
        let fd = self.fd.into_raw_fd();
        unsafe { sys::close(fd) }.map_err(|e| {
            warn!(port = %name, errno = e.raw_os_error(), error = %e, "close failed");
            PortError::Close(e)
        })
    }

    /// Write exactly one byte. Returns the count the OS reports.
    pub fn write_byte(&self, byte: u8) -> Result<usize, PortError> {
        self.write_raw(&[byte])
    }

    /// Write `data` up to, not including, its first NUL byte.
    ///
    /// Data after an embedded NUL is never sent, so this suits text payloads.
    /// A short write is returned as-is.
    pub fn write_buffer(&self, data: &[u8]) -> Result<usize, PortError> {
        self.write_raw(until_nul(data))
    }

    pub fn write_cstr(&self, data: &CStr) -> Result<usize, PortError> {
        self.write_raw(data.to_bytes())
    }

    /// A single read of at most `buffer.len()` bytes.
    ///
    /// `Ok(0)` means nothing arrived before the read timeout.
    pub fn read_buffer(&self, buffer: &mut [u8]) -> Result<usize, PortError> {
        sys::read(self.fd.as_fd(), buffer).map_err(|e| self.io_failure("read", e))
    }

    /// Read one byte; `Ok(None)` when nothing arrived before the read timeout.
    pub fn read_byte(&self) -> Result<Option<u8>, PortError> {
        let mut byte = [0u8; 1];
        match self.read_buffer(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Bytes queued for reading, without reading or blocking.
    pub fn bytes_available(&self) -> Result<usize, PortError> {
        sys::bytes_available(self.fd.as_fd()).map_err(|e| self.io_failure("bytes_available", e))
    }

    /// Device path or label this port was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn write_raw(&self, data: &[u8]) -> Result<usize, PortError> {
        sys::write(self.fd.as_fd(), data).map_err(|e| self.io_failure("write", e))
    }

    fn attributes(&self) -> Result<libc::termios, PortError> {
        sys::get_attributes(self.fd.as_fd()).map_err(|e| {
            warn!(port = %self.name, errno = e.raw_os_error(), error = %e, "tcgetattr failed");
            PortError::GetAttributes(e)
        })
    }

    fn apply(&self, termios: &libc::termios) -> Result<(), PortError> {
        sys::set_attributes(self.fd.as_fd(), termios).map_err(|e| {
            warn!(port = %self.name, errno = e.raw_os_error(), error = %e, "tcsetattr failed");
            PortError::SetAttributes(e)
        })
    }

    fn io_failure(&self, operation: &'static str, e: io::Error) -> PortError {
        warn!(
            port = %self.name,
            operation,
            errno = e.raw_os_error(),
            error = %e,
            "serial I/O failed"
        );
        PortError::Io(e)
    }
}

impl SerialIo for TtyPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.write_raw(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.read_buffer(buffer)
    }

    fn bytes_available(&self) -> Result<usize, PortError> {
        TtyPort::bytes_available(self)
    }
}

impl io::Read for TtyPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        sys::read(self.fd.as_fd(), buf)
    }
}

impl io::Write for TtyPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        sys::write(self.fd.as_fd(), buf)
    }

    // writes are unbuffered in this layer
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsFd for TtyPort {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for TtyPort {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl IntoRawFd for TtyPort {
    fn into_raw_fd(self) -> RawFd {
        self.fd.into_raw_fd()
    }
}

impl std::fmt::Debug for TtyPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyPort")
            .field("name", &self.name)
            .field("fd", &self.fd.as_raw_fd())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_error() {
        let result = TtyPort::open_simple("/dev/nonexistent_port_12345", BaudRate::Baud9600);

        match result {
            Err(PortError::Open { path, source }) => {
                assert!(path.to_string_lossy().contains("nonexistent"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("Expected Open error, got: {:?}", other),
        }
    }

    #[test]
    fn test_interior_nul_is_invalid_path() {
        let result = TtyPort::open_simple("/dev/tty\0S0", BaudRate::Baud9600);
        assert!(matches!(result, Err(PortError::InvalidPath(_))));
    }

    fn regular_file_port(file: std::fs::File) -> TtyPort {
        TtyPort::from_owned_fd(OwnedFd::from(file), "regular-file")
    }

    #[test]
    fn test_set_read_mode_reports_failure() {
        let port = regular_file_port(tempfile::tempfile().unwrap());

        let err = port
            .set_read_mode(ReadMode::blocking(1, ReadTimeout::NONE))
            .unwrap_err();
        assert!(matches!(err, PortError::GetAttributes(_)));
        assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
    }

    #[test]
    fn test_read_byte_failure_is_not_a_timeout() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let write_only = std::fs::OpenOptions::new()
            .write(true)
            .open(file.path())
            .unwrap();
        let port = regular_file_port(write_only);

        let err = port.read_byte().unwrap_err();
        assert!(matches!(err, PortError::Io(_)));
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_read_byte_at_end_of_data_is_none() {
        let port = regular_file_port(tempfile::tempfile().unwrap());
        assert_eq!(port.read_byte().unwrap(), None);
    }

    #[test]
    fn test_regular_file_is_not_a_terminal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = TtyPort::open_simple(file.path(), BaudRate::Baud9600);

        let err = result.unwrap_err();
        assert!(matches!(err, PortError::GetAttributes(_)));
        assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
    }
}

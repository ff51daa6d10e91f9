//! Port-specific error types.
//!
//! Every failure of the termios layer is returned as a `PortError` carrying the
//! underlying OS error, so callers decide how (and whether) to report it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device path cannot be passed to the OS (it contains a NUL byte).
    #[error("Invalid device path: {0:?}")]
    InvalidPath(PathBuf),

    /// The device could not be opened.
    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the terminal attributes failed.
    #[error("Failed to read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// Applying the terminal attributes failed.
    #[error("Failed to apply terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    /// A read, write or queue query failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Releasing the descriptor failed.
    #[error("Failed to close port: {0}")]
    Close(#[source] io::Error),

    /// A pseudo-terminal pair could not be allocated.
    #[error("Failed to allocate pseudo-terminal: {0}")]
    Pty(#[source] io::Error),

    /// The device reports a line speed with no `BaudRate` equivalent.
    #[error("Unsupported line speed constant: {0:#o}")]
    UnsupportedSpeed(libc::speed_t),
}

impl PortError {
    /// The OS error number behind this failure, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Open { source, .. } => source.raw_os_error(),
            Self::GetAttributes(e)
            | Self::SetAttributes(e)
            | Self::Io(e)
            | Self::Close(e)
            | Self::Pty(e) => e.raw_os_error(),
            Self::InvalidPath(_) | Self::UnsupportedSpeed(_) => None,
        }
    }

    /// The `io::ErrorKind` behind this failure.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Open { source, .. } => source.kind(),
            Self::GetAttributes(e)
            | Self::SetAttributes(e)
            | Self::Io(e)
            | Self::Close(e)
            | Self::Pty(e) => e.kind(),
            Self::InvalidPath(_) | Self::UnsupportedSpeed(_) => io::ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::Open {
            path: PathBuf::from("/dev/ttyUSB0"),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to open \"/dev/ttyUSB0\": "));
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_io_conversion() {
        let err: PortError = io::Error::from_raw_os_error(libc::EBADF).into();
        assert!(matches!(err, PortError::Io(_)));
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_invalid_path_has_no_errno() {
        let err = PortError::InvalidPath(PathBuf::from("bad"));
        assert_eq!(err.raw_os_error(), None);
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}

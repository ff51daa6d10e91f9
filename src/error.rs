use crate::config::ConfigError;
use crate::port::PortError;
use thiserror::Error;

/// Unified application error type for the command-line surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Port(#[from] PortError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Port enumeration failed: {0}")]
    Enumerate(#[from] serialport::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The pty self-test received something other than what it sent.
    #[error("Loopback mismatch: sent {sent:?}, received {received:?}")]
    LoopbackMismatch { sent: Vec<u8>, received: Vec<u8> },
}

impl AppError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// A specialized `Result` type for command handlers.
pub type AppResult<T> = Result<T, AppError>;

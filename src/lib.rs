//! Raw TTY serial port library.
//!
//! Opens terminal devices, configures them through termios (speed, parity,
//! raw 8-bit mode, read timeout), and performs single-call reads, writes and
//! queue-depth queries.
//!
//! # Modules
//!
//! - `port`: termios primitives, the owned `TtyPort`, pty pairs and the mock
//! - `service`: command logic shared by the binary
//! - `config`: Configuration management with TOML support
//! - `error`: Application-level error handling
//! - `logging`: `tracing` subscriber setup for the binary

#[cfg(not(unix))]
compile_error!("tty_serial requires a POSIX termios interface");

pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod service;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use port::{
    BaudRate, MockSerialPort, Parity, PortError, PortSettings, PtyPair, ReadMode, ReadTimeout,
    SerialIo, TtyPort, DEFAULT_TIMEOUT, NO_BLOCK,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};

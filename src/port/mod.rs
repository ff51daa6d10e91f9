//! Port layer for raw TTY serial communication.
//!
//! `sys` holds the descriptor-level termios calls, `tty` wraps them in an
//! owned port, and `pty` provides virtual loopback pairs. `SerialIo` is the
//! seam shared with the in-memory mock.

pub mod error;
pub mod mock;
pub mod pty;
pub mod settings;
pub mod sys;
pub mod traits;
pub mod tty;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use pty::PtyPair;
pub use settings::*;
pub use traits::SerialIo;
pub use tty::TtyPort;

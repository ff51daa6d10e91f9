//! Pseudo-terminal pairs for exercising ports without hardware.
//!
//! Bytes written to the controller side arrive at the device side and vice
//! versa, so a `PtyPair` behaves like two serial ports joined by a cable.

use super::error::PortError;
use super::tty::TtyPort;
use std::ffi::{CStr, OsStr};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A freshly allocated pseudo-terminal.
#[derive(Debug)]
pub struct PtyPair {
    controller: TtyPort,
    device_path: PathBuf,
    // Held open so the controller never sees a hangup between device opens.
    _device: OwnedFd,
}

impl PtyPair {
    pub fn open() -> Result<Self, PortError> {
        let (controller, device) = open_pty().map_err(PortError::Pty)?;
        let device_path = device_name(&device).map_err(PortError::Pty)?;

        debug!(device = %device_path.display(), "allocated pseudo-terminal");
        Ok(Self {
            controller: TtyPort::from_owned_fd(controller, "ptmx"),
            device_path,
            _device: device,
        })
    }

    /// Path to open with [`TtyPort::open`] for the device side.
    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    /// The controller side, with its attributes untouched.
    pub fn controller(&self) -> &TtyPort {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TtyPort {
        &mut self.controller
    }
}

fn open_pty() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut controller: libc::c_int = 0;
    let mut device: libc::c_int = 0;

    let rc = unsafe {
        libc::openpty(
            &mut controller,
            &mut device,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    unsafe { Ok((OwnedFd::from_raw_fd(controller), OwnedFd::from_raw_fd(device))) }
}

fn device_name(device: &OwnedFd) -> io::Result<PathBuf> {
    let mut buf: [libc::c_char; 256] = [0; 256];
    let rc = unsafe { libc::ttyname_r(device.as_raw_fd(), buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }

    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Ok(PathBuf::from(OsStr::from_bytes(name.to_bytes())))
}

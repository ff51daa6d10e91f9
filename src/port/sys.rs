//! Descriptor-level termios primitives.
//!
//! Each function is a single pass-through to the corresponding libc call and
//! reports failure through `io::Error::last_os_error()`. Nothing here retries.

use super::settings::{BaudRate, Parity, ReadMode, ReadTimeout};
use std::ffi::CStr;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

/// Open a terminal device for reading and writing.
///
/// The device does not become the controlling terminal, and writes complete
/// only once handed to the device (`O_SYNC`).
pub fn open_device(path: &CStr) -> io::Result<OwnedFd> {
    let flags = libc::O_RDWR | libc::O_NOCTTY | libc::O_SYNC | libc::O_CLOEXEC;
    let fd = unsafe { libc::open(path.as_ptr(), flags) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

pub fn get_attributes(fd: BorrowedFd<'_>) -> io::Result<libc::termios> {
    unsafe {
        let mut termios: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd.as_raw_fd(), &mut termios) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(termios)
    }
}

/// Apply attributes immediately, without draining pending output.
pub fn set_attributes(fd: BorrowedFd<'_>, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd.as_raw_fd(), libc::TCSANOW, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Put an attribute set into raw 8-bit mode at the given speed and parity.
///
/// Reads are left non-blocking (`VMIN` = 0) with `timeout` as `VTIME`. Input
/// translations other than break handling and software flow control are left
/// as they were.
pub fn apply_raw_attributes(
    termios: &mut libc::termios,
    baud_rate: BaudRate,
    parity: Parity,
    timeout: ReadTimeout,
) -> io::Result<()> {
    set_speed(termios, baud_rate)?;

    termios.c_cflag = (termios.c_cflag & !libc::CSIZE) | libc::CS8;
    // breaks are not delivered as NUL bytes
    termios.c_iflag &= !libc::IGNBRK;
    termios.c_lflag = 0;
    termios.c_oflag = 0;
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = timeout.deciseconds();

    termios.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);

    termios.c_cflag |= libc::CLOCAL | libc::CREAD;
    set_parity(termios, parity);
    termios.c_cflag &= !libc::CSTOPB;
    termios.c_cflag &= !libc::CRTSCTS;

    Ok(())
}

/// Set both input and output speed.
pub fn set_speed(termios: &mut libc::termios, baud_rate: BaudRate) -> io::Result<()> {
    let speed = baud_rate.as_speed();
    unsafe {
        if libc::cfsetospeed(&mut *termios, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::cfsetispeed(&mut *termios, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Replace the parity bits, leaving the rest of `c_cflag` alone.
pub fn set_parity(termios: &mut libc::termios, parity: Parity) {
    termios.c_cflag &= !(libc::PARENB | libc::PARODD);
    termios.c_cflag |= parity.cflag_bits();
}

/// Overwrite only the `VMIN`/`VTIME` pair.
pub fn apply_read_mode(termios: &mut libc::termios, mode: ReadMode) {
    termios.c_cc[libc::VMIN] = mode.min_bytes;
    termios.c_cc[libc::VTIME] = mode.timeout.deciseconds();
}

/// Decode the read mode stored in an attribute set.
pub fn read_mode_of(termios: &libc::termios) -> ReadMode {
    ReadMode::blocking(
        termios.c_cc[libc::VMIN],
        ReadTimeout::from_deciseconds(termios.c_cc[libc::VTIME]),
    )
}

/// Output speed stored in an attribute set.
pub fn output_speed(termios: &libc::termios) -> libc::speed_t {
    unsafe { libc::cfgetospeed(termios) }
}

pub fn read(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
    let len = unsafe {
        libc::read(
            fd.as_raw_fd(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len() as libc::size_t,
        )
    };

    if len >= 0 {
        Ok(len as usize)
    } else {
        Err(io::Error::last_os_error())
    }
}

pub fn write(fd: BorrowedFd<'_>, buf: &[u8]) -> io::Result<usize> {
    let len = unsafe {
        libc::write(
            fd.as_raw_fd(),
            buf.as_ptr() as *const libc::c_void,
            buf.len() as libc::size_t,
        )
    };

    if len >= 0 {
        Ok(len as usize)
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Number of bytes queued for reading (`FIONREAD`).
pub fn bytes_available(fd: BorrowedFd<'_>) -> io::Result<usize> {
    let mut count: libc::c_int = 0;
    if unsafe { libc::ioctl(fd.as_raw_fd(), libc::FIONREAD, &mut count) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(count as usize)
}

/// Close a raw descriptor and report what the OS said.
///
/// # Safety
///
/// `fd` must not be owned by anything that will close it again, and must not
/// be used after this call. Closing a descriptor number twice reports
/// `EBADF` only if nothing reused the number in between.
pub unsafe fn close(fd: RawFd) -> io::Result<()> {
    if libc::close(fd) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saturated_termios() -> libc::termios {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        termios.c_iflag = !0;
        termios.c_oflag = !0;
        termios.c_cflag = !0;
        termios.c_lflag = !0;
        termios.c_cc[libc::VMIN] = 9;
        termios.c_cc[libc::VTIME] = 9;
        termios
    }

    #[test]
    fn test_raw_attributes_clear_processing() {
        let mut termios = saturated_termios();
        apply_raw_attributes(
            &mut termios,
            BaudRate::Baud9600,
            Parity::None,
            ReadTimeout::from_deciseconds(7),
        )
        .unwrap();

        assert_eq!(termios.c_lflag, 0);
        assert_eq!(termios.c_oflag, 0);
        assert_eq!(termios.c_cflag & libc::CSIZE, libc::CS8);
        assert_eq!(termios.c_iflag & libc::IGNBRK, 0);
        assert_eq!(termios.c_iflag & (libc::IXON | libc::IXOFF | libc::IXANY), 0);
        assert_eq!(termios.c_cflag & (libc::CLOCAL | libc::CREAD), libc::CLOCAL | libc::CREAD);
        assert_eq!(termios.c_cflag & (libc::PARENB | libc::PARODD), 0);
        assert_eq!(termios.c_cflag & libc::CSTOPB, 0);
        assert_eq!(termios.c_cflag & libc::CRTSCTS, 0);
        assert_eq!(termios.c_cc[libc::VMIN], 0);
        assert_eq!(termios.c_cc[libc::VTIME], 7);
        assert_eq!(output_speed(&termios), libc::B9600);
    }

    #[test]
    fn test_raw_attributes_keep_other_input_flags() {
        let mut termios = saturated_termios();
        apply_raw_attributes(&mut termios, BaudRate::Baud1200, Parity::None, ReadTimeout::NONE)
            .unwrap();

        assert_ne!(termios.c_iflag & libc::ICRNL, 0);
        assert_ne!(termios.c_iflag & libc::INPCK, 0);
    }

    #[test]
    fn test_raw_attributes_apply_parity() {
        let mut termios = saturated_termios();
        apply_raw_attributes(&mut termios, BaudRate::Baud19200, Parity::Odd, ReadTimeout::NONE)
            .unwrap();
        assert_eq!(Parity::from_cflag(termios.c_cflag), Parity::Odd);

        apply_raw_attributes(&mut termios, BaudRate::Baud19200, Parity::Even, ReadTimeout::NONE)
            .unwrap();
        assert_eq!(Parity::from_cflag(termios.c_cflag), Parity::Even);
    }

    #[test]
    fn test_set_speed_replaces_unlisted_speed() {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        assert_eq!(output_speed(&termios), libc::B0);
        assert_eq!(BaudRate::from_speed(output_speed(&termios)), None);

        set_speed(&mut termios, BaudRate::Baud38400).unwrap();
        assert_eq!(output_speed(&termios), libc::B38400);
        assert_eq!(unsafe { libc::cfgetispeed(&termios) }, libc::B38400);
    }

    #[test]
    fn test_set_parity_touches_only_parity_bits() {
        let mut termios = saturated_termios();
        let others = termios.c_cflag & !(libc::PARENB | libc::PARODD);

        set_parity(&mut termios, Parity::Even);
        assert_eq!(Parity::from_cflag(termios.c_cflag), Parity::Even);
        assert_eq!(termios.c_cflag & !(libc::PARENB | libc::PARODD), others);

        set_parity(&mut termios, Parity::None);
        assert_eq!(Parity::from_cflag(termios.c_cflag), Parity::None);
        assert_eq!(termios.c_cflag & !(libc::PARENB | libc::PARODD), others);
    }

    #[test]
    fn test_read_mode_touches_only_control_chars() {
        let mut termios = saturated_termios();
        let before = (termios.c_iflag, termios.c_oflag, termios.c_cflag, termios.c_lflag);

        let mode = ReadMode::blocking(4, ReadTimeout::from_deciseconds(12));
        apply_read_mode(&mut termios, mode);

        assert_eq!(
            (termios.c_iflag, termios.c_oflag, termios.c_cflag, termios.c_lflag),
            before
        );
        assert_eq!(read_mode_of(&termios), mode);
    }
}

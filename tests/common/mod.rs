//! Shared test utilities for pty-backed port tests.

#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};
use tty_serial::port::{PortSettings, PtyPair, ReadTimeout, TtyPort};

/// How long a test waits for bytes to cross the pty.
pub const DEADLINE: Duration = Duration::from_secs(2);

/// Settings with a short read timeout so empty reads return quickly.
pub fn quick_settings() -> PortSettings {
    let mut settings = PortSettings::default();
    settings.read_mode.timeout = ReadTimeout::from_deciseconds(1);
    settings
}

/// Allocate a pty and open its device side as a configured port.
pub fn open_pair(settings: &PortSettings) -> (PtyPair, TtyPort) {
    let pair = PtyPair::open().expect("failed to allocate pty");
    let device = TtyPort::open(pair.device_path(), settings).expect("failed to open pty device");
    (pair, device)
}

/// Collect `count` bytes from `port`, reading only what is already queued so a
/// blocking descriptor never stalls the test.
pub fn read_within(port: &TtyPort, count: usize, deadline: Duration) -> Vec<u8> {
    let started = Instant::now();
    let mut received = Vec::new();

    while received.len() < count && started.elapsed() < deadline {
        let queued = port.bytes_available().expect("FIONREAD failed");
        if queued == 0 {
            thread::sleep(Duration::from_millis(5));
            continue;
        }

        let mut buffer = vec![0u8; queued.min(count - received.len())];
        let n = port.read_buffer(&mut buffer).expect("read failed");
        received.extend_from_slice(&buffer[..n]);
    }

    received
}

//! Service layer for serial port operations.
//!
//! The command-line handlers are thin wrappers around these functions. Each
//! one performs a single pass of the port operation it names and returns a
//! serializable result, so output formatting stays outside the I/O path.
//!
//! ```text
//! CLI ──> service::{send_text, send_byte, read, available, loopback} ──> SerialIo
//! ```

use crate::error::{AppError, AppResult};
use crate::port::{PortError, PortSettings, PtyPair, SerialIo, TtyPort};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Payload written by the pty self-test.
pub const LOOPBACK_PAYLOAD: &[u8] = b"hello";

/// How long the self-test waits for its payload to arrive.
const LOOPBACK_DEADLINE: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

// ========== Result DTOs ==========

/// Result from writing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub port_name: String,
    pub bytes_requested: usize,
    pub bytes_written: usize,
}

/// Result from reading data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
    pub port_name: String,
    pub bytes_read: usize,
    /// Lossy UTF-8 rendering of the bytes
    pub data: String,
    /// Lowercase hex rendering of the bytes
    pub hex: String,
}

/// Result from a queue-depth query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableResult {
    pub port_name: String,
    pub bytes_available: usize,
}

/// One enumerated serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub port_name: String,
    /// "usb", "pci", "bluetooth" or "unknown"
    pub transport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

/// Result from the pty self-test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackResult {
    pub device: String,
    pub bytes_written: usize,
    pub bytes_available: usize,
    pub received: String,
}

// ========== Operations ==========

/// Write `text` up to its first NUL byte.
///
/// `bytes_requested` is the full input length, so a cut shows up as a
/// shortfall in `bytes_written`.
pub fn send_text<P: SerialIo>(port: &mut P, text: &[u8]) -> AppResult<WriteResult> {
    let bytes_written = port.write_text(text)?;
    debug!(port = port.name(), bytes_written, "sent text");

    Ok(WriteResult {
        port_name: port.name().to_string(),
        bytes_requested: text.len(),
        bytes_written,
    })
}

pub fn send_byte<P: SerialIo>(port: &mut P, byte: u8) -> AppResult<WriteResult> {
    let bytes_written = port.write_bytes(&[byte])?;
    debug!(port = port.name(), byte, bytes_written, "sent byte");

    Ok(WriteResult {
        port_name: port.name().to_string(),
        bytes_requested: 1,
        bytes_written,
    })
}

/// A single read of at most `max` bytes.
pub fn read<P: SerialIo>(port: &mut P, max: usize) -> AppResult<ReadResult> {
    let mut buffer = vec![0u8; max];
    let bytes_read = port.read_bytes(&mut buffer)?;
    buffer.truncate(bytes_read);

    Ok(ReadResult {
        port_name: port.name().to_string(),
        bytes_read,
        data: String::from_utf8_lossy(&buffer).into_owned(),
        hex: to_hex(&buffer),
    })
}

pub fn available<P: SerialIo>(port: &P) -> AppResult<AvailableResult> {
    Ok(AvailableResult {
        port_name: port.name().to_string(),
        bytes_available: port.bytes_available()?,
    })
}

/// Poll until at least `count` bytes are queued or `deadline` passes.
///
/// Returns the last queue depth observed.
pub fn wait_for_bytes<P: SerialIo>(
    port: &P,
    count: usize,
    deadline: Duration,
) -> Result<usize, PortError> {
    let started = Instant::now();
    loop {
        let queued = port.bytes_available()?;
        if queued >= count || started.elapsed() >= deadline {
            return Ok(queued);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Enumerate serial ports known to the system.
pub fn list_ports() -> AppResult<Vec<PortInfo>> {
    use serialport::SerialPortType;

    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let mut info = PortInfo {
                port_name: p.port_name,
                transport: String::new(),
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
            };
            info.transport = match p.port_type {
                SerialPortType::UsbPort(usb) => {
                    info.vid = Some(format!("0x{:04x}", usb.vid));
                    info.pid = Some(format!("0x{:04x}", usb.pid));
                    info.manufacturer = usb.manufacturer;
                    info.product = usb.product;
                    "usb"
                }
                SerialPortType::PciPort => "pci",
                SerialPortType::BluetoothPort => "bluetooth",
                SerialPortType::Unknown => "unknown",
            }
            .to_string();
            info
        })
        .collect())
}

/// Send [`LOOPBACK_PAYLOAD`] across a fresh pseudo-terminal and check it arrives intact.
pub fn loopback(settings: &PortSettings) -> AppResult<LoopbackResult> {
    let mut pair = PtyPair::open()?;
    let mut device = TtyPort::open(pair.device_path(), settings)?;

    let bytes_written = pair.controller_mut().write_bytes(LOOPBACK_PAYLOAD)?;
    let bytes_available = wait_for_bytes(&device, LOOPBACK_PAYLOAD.len(), LOOPBACK_DEADLINE)?;

    let mut received = vec![0u8; bytes_available.max(LOOPBACK_PAYLOAD.len())];
    let n = device.read_bytes(&mut received)?;
    received.truncate(n);

    if received != LOOPBACK_PAYLOAD {
        return Err(AppError::LoopbackMismatch {
            sent: LOOPBACK_PAYLOAD.to_vec(),
            received,
        });
    }

    info!(device = device.name(), bytes_available, "loopback passed");
    Ok(LoopbackResult {
        device: device.name().to_string(),
        bytes_written,
        bytes_available,
        received: String::from_utf8_lossy(&received).into_owned(),
    })
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_send_text_stops_at_nul() {
        let mut port = MockSerialPort::new("MOCK0");
        let result = send_text(&mut port, b"AT\0junk").unwrap();

        assert_eq!(result.bytes_requested, 7);
        assert_eq!(result.bytes_written, 2);
        assert_eq!(port.written(), b"AT");
    }

    #[test]
    fn test_send_text_reports_short_write() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_max_write(Some(3));

        let result = send_text(&mut port, b"hello").unwrap();
        assert_eq!(result.bytes_requested, 5);
        assert_eq!(result.bytes_written, 3);
        assert_eq!(port.get_write_log().len(), 1);
    }

    #[test]
    fn test_send_byte() {
        let mut port = MockSerialPort::new("MOCK0");
        let result = send_byte(&mut port, 0x41).unwrap();
        assert_eq!(result.bytes_written, 1);
        assert_eq!(port.written(), vec![0x41]);
    }

    #[test]
    fn test_read_renders_data() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"OK\r\n");

        let result = read(&mut port, 64).unwrap();
        assert_eq!(result.bytes_read, 4);
        assert_eq!(result.data, "OK\r\n");
        assert_eq!(result.hex, "4f4b0d0a");
    }

    #[test]
    fn test_read_empty_is_not_an_error() {
        let mut port = MockSerialPort::new("MOCK0");
        let result = read(&mut port, 16).unwrap();
        assert_eq!(result.bytes_read, 0);
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_read_failure_propagates() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next(libc::EIO);

        let err = read(&mut port, 16).unwrap_err();
        assert!(matches!(err, AppError::Port(PortError::Io(_))));
    }

    #[test]
    fn test_available_counts_queue() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"abc");
        assert_eq!(available(&port).unwrap().bytes_available, 3);
    }

    #[test]
    fn test_wait_for_bytes_gives_up_at_deadline() {
        let port = MockSerialPort::new("MOCK0");
        let queued = wait_for_bytes(&port, 1, Duration::from_millis(20)).unwrap();
        assert_eq!(queued, 0);
    }

    #[test]
    fn test_write_result_json_shape() {
        let result = WriteResult {
            port_name: "/dev/ttyS0".to_string(),
            bytes_requested: 5,
            bytes_written: 5,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["bytes_written"], 5);
        assert_eq!(json["port_name"], "/dev/ttyS0");
    }
}

//! Typed serial port settings.
//!
//! These types stand in for the raw termios constants: a `BaudRate` always maps
//! to a speed the terminal subsystem recognizes, and `ReadTimeout` always fits
//! in the `VTIME` control character.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Minimum byte count that makes reads return immediately with whatever is queued.
pub const NO_BLOCK: u8 = 0;

/// Read timeout used by [`PortSettings::simple`]: half a second.
pub const DEFAULT_TIMEOUT: ReadTimeout = ReadTimeout(5);

/// Serial line speeds understood by the termios interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    Baud50,
    Baud75,
    Baud110,
    Baud134,
    Baud150,
    Baud200,
    Baud300,
    Baud600,
    Baud1200,
    Baud1800,
    Baud2400,
    Baud4800,
    Baud9600,
    Baud19200,
    Baud38400,
    Baud57600,
    Baud115200,
    Baud230400,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud460800,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud500000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud576000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud921600,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud1000000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud1152000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud1500000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud2000000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud2500000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud3000000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud3500000,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Baud4000000,
}

impl BaudRate {
    /// Every speed supported on the current target, slowest first.
    pub const ALL: &'static [BaudRate] = &[
        BaudRate::Baud50,
        BaudRate::Baud75,
        BaudRate::Baud110,
        BaudRate::Baud134,
        BaudRate::Baud150,
        BaudRate::Baud200,
        BaudRate::Baud300,
        BaudRate::Baud600,
        BaudRate::Baud1200,
        BaudRate::Baud1800,
        BaudRate::Baud2400,
        BaudRate::Baud4800,
        BaudRate::Baud9600,
        BaudRate::Baud19200,
        BaudRate::Baud38400,
        BaudRate::Baud57600,
        BaudRate::Baud115200,
        BaudRate::Baud230400,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud460800,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud500000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud576000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud921600,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud1000000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud1152000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud1500000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud2000000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud2500000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud3000000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud3500000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        BaudRate::Baud4000000,
    ];

    /// Bits per second.
    pub fn bps(self) -> u32 {
        match self {
            BaudRate::Baud50 => 50,
            BaudRate::Baud75 => 75,
            BaudRate::Baud110 => 110,
            BaudRate::Baud134 => 134,
            BaudRate::Baud150 => 150,
            BaudRate::Baud200 => 200,
            BaudRate::Baud300 => 300,
            BaudRate::Baud600 => 600,
            BaudRate::Baud1200 => 1200,
            BaudRate::Baud1800 => 1800,
            BaudRate::Baud2400 => 2400,
            BaudRate::Baud4800 => 4800,
            BaudRate::Baud9600 => 9600,
            BaudRate::Baud19200 => 19200,
            BaudRate::Baud38400 => 38400,
            BaudRate::Baud57600 => 57600,
            BaudRate::Baud115200 => 115200,
            BaudRate::Baud230400 => 230400,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud460800 => 460800,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud500000 => 500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud576000 => 576000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud921600 => 921600,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud1000000 => 1_000_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud1152000 => 1_152_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud1500000 => 1_500_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud2000000 => 2_000_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud2500000 => 2_500_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud3000000 => 3_000_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud3500000 => 3_500_000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud4000000 => 4_000_000,
        }
    }

    /// The symbolic termios speed constant.
    pub fn as_speed(self) -> libc::speed_t {
        match self {
            BaudRate::Baud50 => libc::B50,
            BaudRate::Baud75 => libc::B75,
            BaudRate::Baud110 => libc::B110,
            BaudRate::Baud134 => libc::B134,
            BaudRate::Baud150 => libc::B150,
            BaudRate::Baud200 => libc::B200,
            BaudRate::Baud300 => libc::B300,
            BaudRate::Baud600 => libc::B600,
            BaudRate::Baud1200 => libc::B1200,
            BaudRate::Baud1800 => libc::B1800,
            BaudRate::Baud2400 => libc::B2400,
            BaudRate::Baud4800 => libc::B4800,
            BaudRate::Baud9600 => libc::B9600,
            BaudRate::Baud19200 => libc::B19200,
            BaudRate::Baud38400 => libc::B38400,
            BaudRate::Baud57600 => libc::B57600,
            BaudRate::Baud115200 => libc::B115200,
            BaudRate::Baud230400 => libc::B230400,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud460800 => libc::B460800,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud500000 => libc::B500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud576000 => libc::B576000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud921600 => libc::B921600,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud1000000 => libc::B1000000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud1152000 => libc::B1152000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud1500000 => libc::B1500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud2000000 => libc::B2000000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud2500000 => libc::B2500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud3000000 => libc::B3000000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud3500000 => libc::B3500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BaudRate::Baud4000000 => libc::B4000000,
        }
    }

    /// Look up a speed by its bits-per-second value.
    ///
    /// Returns `None` for non-standard rates.
    pub fn from_bps(bps: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|rate| rate.bps() == bps)
    }

    /// Decode a termios speed constant.
    pub fn from_speed(speed: libc::speed_t) -> Option<Self> {
        Self::ALL.iter().copied().find(|rate| rate.as_speed() == speed)
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::Baud9600
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bps())
    }
}

/// Error returned when converting a non-standard bits-per-second value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedBaudRate(pub u32);

impl fmt::Display for UnsupportedBaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a supported baud rate", self.0)
    }
}

impl std::error::Error for UnsupportedBaudRate {}

impl TryFrom<u32> for BaudRate {
    type Error = UnsupportedBaudRate;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        BaudRate::from_bps(bps).ok_or(UnsupportedBaudRate(bps))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bps()
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

impl Parity {
    /// The control-mode bits that select this parity.
    pub fn cflag_bits(self) -> libc::tcflag_t {
        match self {
            Parity::None => 0,
            Parity::Even => libc::PARENB,
            Parity::Odd => libc::PARENB | libc::PARODD,
        }
    }

    /// Decode the parity selected by a control-mode word.
    pub fn from_cflag(cflag: libc::tcflag_t) -> Self {
        if cflag & libc::PARENB == 0 {
            Parity::None
        } else if cflag & libc::PARODD != 0 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "none",
            Parity::Even => "even",
            Parity::Odd => "odd",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "even" | "e" => Ok(Parity::Even),
            "odd" | "o" => Ok(Parity::Odd),
            other => Err(format!("unknown parity '{}'", other)),
        }
    }
}

/// Read timeout in tenths of a second, as stored in `VTIME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadTimeout(u8);

impl ReadTimeout {
    /// No timeout: reads wait only for the minimum byte count.
    pub const NONE: ReadTimeout = ReadTimeout(0);

    /// Longest timeout the terminal interface can express (25.5 s).
    pub const MAX: ReadTimeout = ReadTimeout(u8::MAX);

    pub const fn from_deciseconds(deciseconds: u8) -> Self {
        ReadTimeout(deciseconds)
    }

    /// Convert a duration, rounding up to the next tenth of a second.
    ///
    /// Durations beyond [`ReadTimeout::MAX`] saturate.
    pub fn from_duration(duration: Duration) -> Self {
        let tenths = duration.as_nanos().div_ceil(100_000_000);
        ReadTimeout(u8::try_from(tenths).unwrap_or(u8::MAX))
    }

    pub const fn deciseconds(self) -> u8 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0) * 100)
    }
}

impl Default for ReadTimeout {
    fn default() -> Self {
        DEFAULT_TIMEOUT
    }
}

/// The `VMIN`/`VTIME` pair controlling when a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMode {
    /// Bytes a read waits for before returning. [`NO_BLOCK`] returns immediately.
    pub min_bytes: u8,
    pub timeout: ReadTimeout,
}

impl ReadMode {
    pub fn non_blocking(timeout: ReadTimeout) -> Self {
        Self {
            min_bytes: NO_BLOCK,
            timeout,
        }
    }

    pub fn blocking(min_bytes: u8, timeout: ReadTimeout) -> Self {
        Self { min_bytes, timeout }
    }

    pub fn is_blocking(&self) -> bool {
        self.min_bytes != NO_BLOCK
    }
}

impl Default for ReadMode {
    fn default() -> Self {
        Self::non_blocking(DEFAULT_TIMEOUT)
    }
}

/// Full configuration applied when a port is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortSettings {
    pub baud_rate: BaudRate,
    pub parity: Parity,
    pub read_mode: ReadMode,
}

impl PortSettings {
    /// No parity, non-blocking reads and the default timeout.
    pub fn simple(baud_rate: BaudRate) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }
}

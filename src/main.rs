use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tty_serial::config::{Config, ConfigLoader};
use tty_serial::error::{AppError, AppResult};
use tty_serial::port::{BaudRate, Parity, PortSettings, ReadTimeout, TtyPort};
use tty_serial::service;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Open, configure, read and write TTY serial ports.",
    long_about = "Thin command-line access to termios serial ports: raw 8-bit mode, \
                  single-call reads and writes, and queue-depth queries. Settings not \
                  given on the command line come from the configuration file."
)]
struct Args {
    /// Configuration file (overrides the standard lookup).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log filter, e.g. "debug" or "tty_serial=trace".
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct PortArgs {
    /// Device path or configured alias; falls back to `serial.device`.
    device: Option<String>,

    /// Line speed in bits per second.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Parity: none, even or odd.
    #[arg(short = 'P', long)]
    parity: Option<Parity>,

    /// Bytes a read waits for (0 returns immediately).
    #[arg(long)]
    min_bytes: Option<u8>,

    /// Read timeout in tenths of a second.
    #[arg(short, long)]
    timeout: Option<u8>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports known to the system.
    List,
    /// Write text up to its first NUL byte.
    Send {
        #[command(flatten)]
        port: PortArgs,
        /// Text to send.
        #[arg(long)]
        text: String,
    },
    /// Write a single byte (decimal or 0x-prefixed hex).
    SendByte {
        #[command(flatten)]
        port: PortArgs,
        #[arg(long, value_parser = parse_byte)]
        byte: u8,
    },
    /// Perform one read and print what arrived.
    Read {
        #[command(flatten)]
        port: PortArgs,
        /// Maximum bytes to read.
        #[arg(short, long, default_value_t = 256)]
        max: usize,
    },
    /// Print the number of bytes waiting to be read.
    Available {
        #[command(flatten)]
        port: PortArgs,
    },
    /// Send "hello" across a pseudo-terminal pair and verify it arrives.
    Loopback,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    tty_serial::logging::init(&config.logging);

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> AppResult<Config> {
    let loader = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader.into_config())
}

fn run(args: &Args, config: &Config) -> AppResult<()> {
    match &args.command {
        Command::List => {
            let ports = service::list_ports()?;
            if args.json {
                return print_json(&ports);
            }
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                println!("{}\t{}", port.port_name, port.transport);
            }
            Ok(())
        }
        Command::Send { port, text } => {
            let mut tty = open_port(port, config)?;
            let result = service::send_text(&mut tty, text.as_bytes())?;
            emit(args.json, &result, || {
                format!("wrote {} of {} bytes", result.bytes_written, result.bytes_requested)
            })
        }
        Command::SendByte { port, byte } => {
            let mut tty = open_port(port, config)?;
            let result = service::send_byte(&mut tty, *byte)?;
            emit(args.json, &result, || format!("wrote {} byte", result.bytes_written))
        }
        Command::Read { port, max } => {
            let mut tty = open_port(port, config)?;
            let result = service::read(&mut tty, *max)?;
            emit(args.json, &result, || {
                format!("{} bytes: {}", result.bytes_read, result.data.escape_debug())
            })
        }
        Command::Available { port } => {
            let tty = open_port(port, config)?;
            let result = service::available(&tty)?;
            emit(args.json, &result, || result.bytes_available.to_string())
        }
        Command::Loopback => {
            let settings = config.serial.port_settings()?;
            let result = service::loopback(&settings)?;
            emit(args.json, &result, || {
                format!(
                    "loopback ok on {}: {} bytes available, read {:?}",
                    result.device, result.bytes_available, result.received
                )
            })
        }
    }
}

/// Merge command-line port options over the configured defaults and open the port.
fn open_port(args: &PortArgs, config: &Config) -> AppResult<TtyPort> {
    let device = args
        .device
        .clone()
        .or_else(|| config.serial.device.clone())
        .ok_or_else(|| AppError::invalid_argument("no device given and serial.device is unset"))?;
    let device = config.serial.resolve_port(&device);

    let mut settings: PortSettings = config.serial.port_settings()?;
    if let Some(bps) = args.baud {
        settings.baud_rate = BaudRate::from_bps(bps)
            .ok_or_else(|| AppError::invalid_argument(format!("{} is not a standard baud rate", bps)))?;
    }
    if let Some(parity) = args.parity {
        settings.parity = parity;
    }
    if let Some(min_bytes) = args.min_bytes {
        settings.read_mode.min_bytes = min_bytes;
    }
    if let Some(timeout) = args.timeout {
        settings.read_mode.timeout = ReadTimeout::from_deciseconds(timeout);
    }

    Ok(TtyPort::open(&device, &settings)?)
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> AppResult<()> {
    if json {
        print_json(value)
    } else {
        println!("{}", text());
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("'{}' is not a byte value (0-255 or 0x00-0xff)", s))
}

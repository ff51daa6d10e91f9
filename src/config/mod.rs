//! Configuration module for tty-serial.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `TTY_SERIAL_CONFIG` environment variable (explicit path)
//! 2. `./tty-serial.toml` (current directory)
//! 3. `~/.config/tty-serial/config.toml` (XDG)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `TTY_SERIAL_<SECTION>_<KEY>`
//!
//! Examples:
//! - `TTY_SERIAL_SERIAL_DEVICE=/dev/ttyO1`
//! - `TTY_SERIAL_SERIAL_TIMEOUT_DECISECONDS=10`
//! - `TTY_SERIAL_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use tty_serial::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let settings = loader.config().serial.port_settings()?;
//! println!("Default baud: {}", settings.baud_rate);
//! # Ok::<(), tty_serial::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};

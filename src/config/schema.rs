//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::{BaudRate, Parity, PortSettings, ReadMode, ReadTimeout, DEFAULT_TIMEOUT, NO_BLOCK};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values that the types alone cannot rule out.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.port_settings().map(|_| ())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device used when a command names none
    pub device: Option<String>,
    /// Line speed in bits per second; must be a standard rate
    pub baud_rate: u32,
    /// Parity: "none", "even" or "odd"
    pub parity: Parity,
    /// Bytes a read waits for; 0 returns immediately
    pub min_bytes: u8,
    /// Read timeout in tenths of a second
    pub timeout_deciseconds: u8,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: None,
            baud_rate: 9600,
            parity: Parity::None,
            min_bytes: NO_BLOCK,
            timeout_deciseconds: DEFAULT_TIMEOUT.deciseconds(),
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Build the settings applied when opening a port.
    pub fn port_settings(&self) -> ConfigResult<PortSettings> {
        let baud_rate = BaudRate::from_bps(self.baud_rate).ok_or_else(|| {
            ConfigError::validation(
                "serial.baud_rate",
                format!("{} is not a standard baud rate", self.baud_rate),
            )
        })?;

        Ok(PortSettings {
            baud_rate,
            parity: self.parity,
            read_mode: ReadMode::blocking(
                self.min_bytes,
                ReadTimeout::from_deciseconds(self.timeout_deciseconds),
            ),
        })
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive, e.g. "warn" or "tty_serial=debug"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.min_bytes, NO_BLOCK);
        assert_eq!(config.serial.timeout_deciseconds, 5);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("gps".to_string(), "/dev/ttyS1".to_string());

        assert_eq!(config.resolve_port("gps"), "/dev/ttyS1");
        assert_eq!(config.resolve_port("/dev/ttyUSB0"), "/dev/ttyUSB0");
    }

    #[test]
    fn test_port_settings_from_config() {
        let config = SerialConfig {
            baud_rate: 115200,
            parity: Parity::Odd,
            min_bytes: 1,
            timeout_deciseconds: 20,
            ..Default::default()
        };

        let settings = config.port_settings().unwrap();
        assert_eq!(settings.baud_rate, BaudRate::Baud115200);
        assert_eq!(settings.parity, Parity::Odd);
        assert!(settings.read_mode.is_blocking());
        assert_eq!(settings.read_mode.timeout.deciseconds(), 20);
    }

    #[test]
    fn test_nonstandard_baud_rejected() {
        let config = SerialConfig {
            baud_rate: 12345,
            ..Default::default()
        };

        let err = config.port_settings().unwrap_err();
        assert!(err.to_string().contains("serial.baud_rate"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            device = "/dev/ttyO1"
            baud_rate = 57600
            parity = "even"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.device.as_deref(), Some("/dev/ttyO1"));
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.serial.parity, Parity::Even);
        // Defaults should still work
        assert_eq!(config.serial.timeout_deciseconds, 5);
        assert_eq!(config.logging.level, "warn");
    }
}

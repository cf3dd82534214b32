//! Driver configuration stored as JSON.
//!
//! ```json
//! {
//!   "port": "/dev/ttyUSB0",
//!   "timeout_ms": 1000,
//!   "settle_delay_ms": 50,
//!   "default_speed": 10000
//! }
//! ```
//!
//! Missing fields fall back to their defaults, so an empty object `{}` is a
//! valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::link::{SerialSettings, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT};

/// Port used when nothing else is configured.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Speed used by the CLI when a command does not specify one.
pub const DEFAULT_SPEED: u16 = 10000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Connection and motion defaults for a rotary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Serial port name (`/dev/ttyUSB0`, `COM5`, ...)
    pub port: String,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// Pause after each frame in milliseconds
    pub settle_delay_ms: u64,
    /// Speed for commands that don't specify one
    pub default_speed: u16,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            default_speed: DEFAULT_SPEED,
        }
    }
}

impl DriverConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the config to a JSON file, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Line settings for the configured port (always 115200-8-N-1).
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings::new(self.port.clone()).with_timeout(self.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.settle_delay(), Duration::from_millis(50));
        assert_eq!(config.default_speed, 10000);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: DriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config: DriverConfig =
            serde_json::from_str(r#"{"port": "COM5", "settle_delay_ms": 0}"#).unwrap();
        assert_eq!(config.port, "COM5");
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.timeout_ms, 1000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");

        let config = DriverConfig {
            port: "/dev/ttyACM0".to_string(),
            timeout_ms: 2500,
            settle_delay_ms: 20,
            default_speed: 4000,
        };
        config.save(&path).unwrap();

        let loaded = DriverConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DriverConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ port: ").unwrap();
        assert!(matches!(
            DriverConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_speed_above_u16_rejected() {
        let result: Result<DriverConfig, _> = serde_json::from_str(r#"{"default_speed": 70000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serial_settings_from_config() {
        let config = DriverConfig {
            port: "COM5".to_string(),
            timeout_ms: 300,
            ..DriverConfig::default()
        };
        let settings = config.serial_settings();
        assert_eq!(settings.port, "COM5");
        assert_eq!(settings.timeout, Duration::from_millis(300));
    }
}

//! Configuration loaded once at startup
//!
//! Located at `~/.config/cube/config.toml` by default. Every field is
//! optional in the file; missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::board::{BoardType, DefaultBoard};
use crate::{BoardConfig, CubeError, Result};

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path; discovered automatically when absent
    pub device: Option<String>,
    /// Baud rate of the Firmata sketch
    pub baud_rate: u32,
    /// How long to wait for the protocol version reply, in milliseconds
    pub handshake_timeout_ms: u64,
    /// Delay after opening the port while the board resets, in milliseconds
    pub settle_ms: u64,
    /// Log every byte sent and received
    pub debug_uart: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: None,
            baud_rate: DefaultBoard::BAUD_RATE,
            handshake_timeout_ms: 3000,
            settle_ms: 2000,
            debug_uart: false,
        }
    }
}

/// Configuration for the Cube controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// Board the indicator is wired to
    pub board: BoardType,

    /// Serial link settings
    pub serial: SerialConfig,
}

impl CubeConfig {
    /// Parse CubeConfig from TOML string.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize CubeConfig to TOML string.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the serial layer cannot use
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(CubeError::Config("baud_rate must be positive".to_string()));
        }
        if self.serial.handshake_timeout_ms == 0 {
            return Err(CubeError::Config(
                "handshake_timeout_ms must be positive".to_string(),
            ));
        }
        if let Some(device) = &self.serial.device {
            if device.trim().is_empty() {
                return Err(CubeError::Config("device must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CubeConfig::default();
        assert_eq!(config.board, BoardType::Uno);
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.serial.device, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = CubeConfig::default();
        let toml_str = config.to_toml().unwrap();

        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("board = \"uno\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            board = "mega"

            [serial]
            device = "/dev/ttyACM1"
            baud_rate = 115200
            handshake_timeout_ms = 500
        "#;

        let config = CubeConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.board, BoardType::Mega);
        assert_eq!(config.serial.device.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.handshake_timeout_ms, 500);
        // Unspecified fields keep defaults
        assert_eq!(config.serial.settle_ms, 2000);
        assert!(!config.serial.debug_uart);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CubeConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CubeConfig::default());
    }

    #[test]
    fn test_load_rejects_zero_baud_rate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial]\nbaud_rate = 0").unwrap();

        let result = CubeConfig::load(file.path());
        assert!(matches!(result, Err(CubeError::Config(_))));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial\nbaud_rate = ").unwrap();

        assert!(CubeConfig::load(file.path()).is_err());
    }
}

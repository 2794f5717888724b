//! CLI configuration management
//!
//! Combines the shared `CubeConfig` file with CLI-only settings.

use anyhow::{Context, Result};
use cube_core::{default_config_path, BoardType, CubeConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_DEVICE: &str = "CUBE_DEVICE";
pub const ENV_FORMAT: &str = "CUBE_FORMAT";
pub const ENV_VERBOSE: &str = "CUBE_VERBOSE";
pub const ENV_BAUD_RATE: &str = "CUBE_BAUD_RATE";
pub const ENV_TIMEOUT_MS: &str = "CUBE_TIMEOUT_MS";

/// Effective CLI configuration
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CliConfig {
    /// Device and serial settings
    pub cube: CubeConfig,

    /// Output format
    pub output_format: String,

    /// Enable verbose logging
    pub verbose: bool,

    /// File the settings were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            cube: CubeConfig::default(),
            output_format: "table".to_string(),
            verbose: false,
            source: None,
        }
    }
}

impl CliConfig {
    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Write the default device configuration to `path` unless it exists
    ///
    /// Returns whether a file was written.
    pub fn init_file(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = CubeConfig::default()
            .to_toml()
            .context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(true)
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// Each stage overrides whatever the previous stages set.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    base: CubeConfig,
    source: Option<PathBuf>,
    device: Option<String>,
    board: Option<BoardType>,
    baud_rate: Option<u32>,
    timeout_ms: Option<u64>,
    output_format: Option<String>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set device path (with validation)
    pub fn with_device(mut self, device: impl Into<String>) -> Result<Self> {
        let device = device.into();
        Self::validate_device(&device)?;
        self.device = Some(device);
        Ok(self)
    }

    /// Set board type from its name
    pub fn with_board(mut self, board: &str) -> Result<Self> {
        self.board = Some(BoardType::from_str(board)?);
        Ok(self)
    }

    /// Set baud rate (with validation)
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Result<Self> {
        Self::validate_baud_rate(baud_rate)?;
        self.baud_rate = Some(baud_rate);
        Ok(self)
    }

    /// Set handshake timeout in milliseconds (with validation)
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self> {
        Self::validate_timeout_ms(timeout_ms)?;
        self.timeout_ms = Some(timeout_ms);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Load the device configuration file
    ///
    /// `path` falls back to the default location. A missing file leaves the
    /// defaults in place; an unreadable or invalid one is an error.
    pub fn with_config_file(mut self, path: Option<&Path>, load_file: bool) -> Result<Self> {
        if !load_file {
            return Ok(self);
        }

        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        self.base = CubeConfig::load(&path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        if path.exists() {
            self.source = Some(path);
        }
        Ok(self)
    }

    /// Apply environment variable overrides
    ///
    /// Values that fail validation are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var(ENV_DEVICE) {
            if Self::validate_device(&device).is_ok() {
                self.device = Some(device);
            }
        }

        if let Ok(format) = std::env::var(ENV_FORMAT) {
            if Self::validate_output_format(&format).is_ok() {
                self.output_format = Some(format);
            }
        }

        if let Ok(verbose) = std::env::var(ENV_VERBOSE) {
            self.verbose = Some(verbose.to_lowercase() == "true" || verbose == "1");
        }

        if let Ok(baud_rate) = std::env::var(ENV_BAUD_RATE) {
            if let Ok(baud_rate) = baud_rate.parse() {
                if Self::validate_baud_rate(baud_rate).is_ok() {
                    self.baud_rate = Some(baud_rate);
                }
            }
        }

        if let Ok(timeout_ms) = std::env::var(ENV_TIMEOUT_MS) {
            if let Ok(timeout_ms) = timeout_ms.parse() {
                if Self::validate_timeout_ms(timeout_ms).is_ok() {
                    self.timeout_ms = Some(timeout_ms);
                }
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();
        let mut cube = self.base;

        if let Some(device) = self.device {
            cube.serial.device = Some(device);
        }
        if let Some(board) = self.board {
            cube.board = board;
        }
        if let Some(baud_rate) = self.baud_rate {
            cube.serial.baud_rate = baud_rate;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            cube.serial.handshake_timeout_ms = timeout_ms;
        }
        let output_format = self.output_format.unwrap_or(defaults.output_format);

        // Validate final values
        cube.validate()?;
        Self::validate_output_format(&output_format)?;

        Ok(CliConfig {
            cube,
            output_format,
            verbose: self.verbose.unwrap_or(defaults.verbose),
            source: self.source,
        })
    }

    /// Validate device path
    fn validate_device(device: &str) -> Result<()> {
        if device.trim().is_empty() {
            return Err(anyhow::anyhow!("Device path cannot be empty"));
        }
        Ok(())
    }

    /// Validate output format
    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "table" | "json" => Ok(()),
            _ => Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be 'table' or 'json'",
                format
            )),
        }
    }

    /// Validate baud rate
    fn validate_baud_rate(baud_rate: u32) -> Result<()> {
        if baud_rate == 0 {
            return Err(anyhow::anyhow!("Baud rate must be greater than 0"));
        }
        Ok(())
    }

    /// Validate handshake timeout
    fn validate_timeout_ms(timeout_ms: u64) -> Result<()> {
        if timeout_ms == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout_ms > 60_000 {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to 60000 ms"
            ));
        }

        Ok(())
    }
}

//! Error types for the Cube controller

use thiserror::Error;

/// Core error type for Cube operations
#[derive(Error, Debug)]
pub enum CubeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Opening the session failed (bad path or no handshake)
    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    /// Operation attempted before a successful `connect`
    #[error("Not connected to a board")]
    NotConnected,

    /// Pin number out of range for the board
    #[error("Pin out of range: {pin} (must be 0-{max})", max = .pin_count.saturating_sub(1))]
    InvalidPin { pin: u8, pin_count: u8 },

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No serial device could be found
    #[error("Device not found")]
    DeviceNotFound,
}

/// Result type alias for Cube operations
pub type Result<T> = std::result::Result<T, CubeError>;

impl From<toml::de::Error> for CubeError {
    fn from(err: toml::de::Error) -> Self {
        CubeError::Config(err.to_string())
    }
}

//! Cube Core Library
//!
//! Shared types, board constants, pin map, errors and configuration for the
//! Cube indicator controller. Used by both the hardware crate and the CLI.

pub mod board;
pub mod config;
pub mod error;
pub mod pins;
pub mod types;

// Re-export commonly used types
pub use board::*;
pub use config::{default_config_path, CubeConfig, SerialConfig};
pub use error::*;
pub use types::*;

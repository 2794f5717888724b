//! Configuration types for the Cube controller
//!
//! A single read-only [`CubeConfig`] holds the serial and board settings.
//! It is loaded once at startup; the CLI layers environment variables and
//! command-line flags on top of it.

mod cube_config;
mod paths;

pub use cube_config::{CubeConfig, SerialConfig};
pub use paths::default_config_path;

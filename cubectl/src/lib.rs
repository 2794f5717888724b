//! Cube CLI Library
//!
//! Command definitions, configuration and output formatting for `cubectl`.
//! Device access goes through [`cube_hardware::CubeDevice`].

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

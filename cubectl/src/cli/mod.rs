//! CLI command definitions and handlers
//!
//! This module organizes the CLI into logical submodules:
//! - [`commands`] - Command and subcommand enum definitions
//! - [`handlers`] - Command execution handlers, generic over `PinIo`

mod commands;
mod handlers;

pub use commands::*;
pub use handlers::*;

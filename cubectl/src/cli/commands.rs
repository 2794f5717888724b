//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cube indicator CLI
#[derive(Parser, Debug)]
#[command(name = "cubectl")]
#[command(version, about = "Drive the Cube red/green and level indicator", long_about = None)]
pub struct Cli {
    /// Serial device path (overrides config file and discovery)
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Board the indicator is wired to (overrides config file)
    #[arg(short, long, global = true)]
    pub board: Option<String>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't load config file
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/cube/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run against an in-memory board instead of the serial device
    #[arg(long, global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List candidate serial devices
    Discover,

    /// Red off, then green on
    Green,

    /// Green off, then red on
    Red,

    /// Turn red and green off
    Off,

    /// Alternate red and green five times
    Blink,

    /// Show a level on the four level pins
    Level {
        /// Level to show; below 1 blinks the first level pin
        #[arg(allow_negative_numbers = true)]
        num: i32,
    },

    /// Blink the first level pin
    BlinkLevel,

    /// Read the analog sensor once
    Analog,

    /// Print the analog sensor periodically
    Monitor {
        /// Delay between readings in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,

        /// Stop after this many readings (default: until interrupted)
        #[arg(short, long)]
        count: Option<u64>,
    },

    /// Show or initialize the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Whether the command talks to the board
    pub fn needs_device(&self) -> bool {
        !matches!(
            self,
            Commands::Discover | Commands::Config { .. } | Commands::Completion { .. }
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file if none exists
    Init,
}

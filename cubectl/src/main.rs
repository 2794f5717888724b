//! Cube CLI
//!
//! Command-line interface for the Cube red/green and level indicator.

use anyhow::Result;
use clap::Parser;
use cube_core::default_config_path;
use cube_hardware::platform_lister;
use cubectl::cli::{
    generate_completion, handle_config, handle_device, handle_discover, handle_mock, Cli,
    Commands,
};
use cubectl::config::CliConfig;
use cubectl::format::OutputFormat;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completion { shell } = cli.command {
        generate_completion(shell);
        return Ok(());
    }

    // Build configuration using priority chain: defaults → file → env → CLI args
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            if cli.verbose {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    init_tracing(config.verbose);
    debug!("Effective configuration: {:?}", config);

    let format = match config.output_format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let lister = platform_lister();

    let result = match &cli.command {
        Commands::Discover => handle_discover(lister.as_ref(), format),
        Commands::Config { command } => handle_config(command, &config, &config_path, format),
        command if cli.mock => handle_mock(&config.cube, command, format).await,
        command => handle_device(&config.cube, lister.as_ref(), command, format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        if config.verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<CliConfig> {
    let mut builder = CliConfig::builder()
        .with_config_file(cli.config.as_deref(), !cli.no_config)?
        .with_env_overrides();

    if let Some(ref device) = cli.device {
        builder = builder.with_device(device)?;
    }
    if let Some(ref board) = cli.board {
        builder = builder.with_board(board)?;
    }
    if let Some(format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }

    builder.build()
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

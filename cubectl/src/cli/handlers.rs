//! Command execution handlers

use anyhow::{Context, Result};
use cube_core::pins::{self, SENSOR_CHANNEL};
use cube_core::{CubeConfig, CubeError};
use cube_hardware::{CubeDevice, MockBoard, PinIo, PortLister};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::format::{
    format_analog, format_config, format_pins, format_ports, format_state, format_success,
    OutputFormat,
};

use super::commands::*;

/// How long `analog` waits for the first sensor report
pub const ANALOG_WAIT: Duration = Duration::from_secs(1);

const ANALOG_POLL: Duration = Duration::from_millis(20);

/// Handle discover command
pub fn handle_discover(lister: &dyn PortLister, format: OutputFormat) -> Result<()> {
    let ports = lister.list_ports();
    println!("{}", format_ports(&ports, format)?);
    Ok(())
}

/// Pick the device path: configured path first, then the first discovered one
pub fn resolve_device(config: &CubeConfig, lister: &dyn PortLister) -> Result<String> {
    if let Some(device) = &config.serial.device {
        return Ok(device.clone());
    }

    let ports = lister.list_ports();
    debug!("Discovered ports: {:?}", ports);
    ports
        .into_iter()
        .next()
        .ok_or(CubeError::DeviceNotFound)
        .context("No serial device found; pass --device")
}

/// Wait up to `wait` for the first analog reading
pub async fn wait_for_analog<S: PinIo>(
    device: &CubeDevice<S>,
    wait: Duration,
) -> Result<Option<f64>> {
    let deadline = Instant::now() + wait;
    loop {
        if let Some(value) = device.get_analog()? {
            return Ok(Some(value));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(ANALOG_POLL).await;
    }
}

/// Handle the commands that drive a connected device
pub async fn handle_indicator<S: PinIo>(
    device: &mut CubeDevice<S>,
    command: &Commands,
    format: OutputFormat,
) -> Result<()> {
    let state = match command {
        Commands::Green => {
            device.go_green().await?;
            "green"
        }
        Commands::Red => {
            device.go_red().await?;
            "red"
        }
        Commands::Off => {
            device.go_off().await?;
            "off"
        }
        Commands::Blink => {
            device.blink().await?;
            "green"
        }
        Commands::Level { num } => {
            device.show_level(*num).await?;
            info!("Level {} shown", num);
            "level"
        }
        Commands::BlinkLevel => {
            device.blink_light_level().await?;
            "level"
        }
        Commands::Analog => {
            let value = wait_for_analog(device, ANALOG_WAIT).await?;
            println!("{}", format_analog(SENSOR_CHANNEL, value, format)?);
            return Ok(());
        }
        Commands::Monitor { interval_ms, count } => {
            return handle_monitor(device, Duration::from_millis(*interval_ms), *count, format)
                .await;
        }
        Commands::Discover | Commands::Config { .. } | Commands::Completion { .. } => {
            return Err(anyhow::anyhow!("Command does not use the device"));
        }
    };

    println!("{}", format_state(state, format)?);
    Ok(())
}

/// Print the analog reading every `interval` until `count` readings or Ctrl-C
pub async fn handle_monitor<S: PinIo>(
    device: &CubeDevice<S>,
    interval: Duration,
    count: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0u64;
    while count.map_or(true, |count| printed < count) {
        let value = device.get_analog()?;
        println!("{}", format_analog(SENSOR_CHANNEL, value, format)?);
        printed += 1;

        if count == Some(printed) {
            break;
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("Interrupted after {} readings", printed);
                break;
            }
            _ = sleep(interval) => {}
        }
    }
    Ok(())
}

/// Run a device command against an in-memory board and print its pins
pub async fn handle_mock(
    config: &CubeConfig,
    command: &Commands,
    format: OutputFormat,
) -> Result<()> {
    let mock = MockBoard::with_board(config.board.to_board_info());
    let mut device = CubeDevice::new();
    device.attach(mock.clone()).await?;

    handle_indicator(&mut device, command, format).await?;

    let levels: Vec<_> = pins::output_pins()
        .map(|pin| (pin, mock.level(pin)))
        .collect();
    println!("{}", format_pins(&levels, format)?);
    Ok(())
}

/// Connect to the serial device and run a device command
pub async fn handle_device(
    config: &CubeConfig,
    lister: &dyn PortLister,
    command: &Commands,
    format: OutputFormat,
) -> Result<()> {
    let path = resolve_device(config, lister)?;
    let mut device: CubeDevice = CubeDevice::new();
    device
        .connect(&path, config)
        .await
        .with_context(|| format!("Cannot connect to {}", path))?;

    let result = handle_indicator(&mut device, command, format).await;
    // Outputs stay latched on the board after the session closes
    device.close();
    result
}

/// Handle config commands
pub fn handle_config(
    command: &ConfigCommands,
    current_config: &CliConfig,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", format_config(current_config, format)?);
        }
        ConfigCommands::Init => {
            if CliConfig::init_file(path)? {
                println!(
                    "{}",
                    format_success(&format!("Wrote default config to {}", path.display()))
                );
            } else {
                println!("Config file already exists: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

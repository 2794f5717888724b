//! Output formatting utilities for the CLI
//!
//! Provides table and JSON formatting with colors.

use anyhow::Result;
use colored::*;
use cube_core::PinValue;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::CliConfig;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct PortsReport<'a> {
    ports: &'a [String],
}

#[derive(Serialize)]
struct AnalogReport {
    channel: u8,
    value: Option<f64>,
}

#[derive(Serialize)]
struct StateReport<'a> {
    state: &'a str,
}

#[derive(Serialize)]
struct PinReport {
    pin: u8,
    level: u8,
}

/// Format discovered serial ports
pub fn format_ports(ports: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&PortsReport { ports })?),
        OutputFormat::Table => {
            if ports.is_empty() {
                return Ok(format!("{}", "No serial devices found".yellow()));
            }

            #[derive(Tabled)]
            struct PortRow {
                #[tabled(rename = "#")]
                index: usize,
                #[tabled(rename = "Device")]
                device: String,
            }

            let rows: Vec<PortRow> = ports
                .iter()
                .enumerate()
                .map(|(index, device)| PortRow {
                    index,
                    device: device.cyan().to_string(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Serial Devices:".bold(), table))
        }
    }
}

/// Format one analog reading
pub fn format_analog(channel: u8, value: Option<f64>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&AnalogReport { channel, value })?),
        OutputFormat::Table => Ok(match value {
            Some(value) => format!("A{}: {}", channel, format!("{:.4}", value).cyan()),
            None => format!("A{}: {}", channel, "no reading".dimmed()),
        }),
    }
}

/// Format the indicator state a command left behind
pub fn format_state(state: &str, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&StateReport { state })?),
        OutputFormat::Table => {
            let label = match state {
                "green" => state.green().bold(),
                "red" => state.red().bold(),
                _ => state.normal(),
            };
            Ok(format_success(&format!("Indicator: {}", label)))
        }
    }
}

/// Format pin levels of the mock board
pub fn format_pins(pins: &[(u8, PinValue)], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report: Vec<PinReport> = pins
                .iter()
                .map(|&(pin, value)| PinReport {
                    pin,
                    level: u8::from(value.is_high()),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct PinRow {
                #[tabled(rename = "Pin")]
                pin: u8,
                #[tabled(rename = "Level")]
                level: String,
            }

            let rows: Vec<PinRow> = pins
                .iter()
                .map(|&(pin, value)| PinRow {
                    pin,
                    level: if value.is_high() {
                        "HIGH".green().to_string()
                    } else {
                        "low".dimmed().to_string()
                    },
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Mock Pins:".bold(), table))
        }
    }
}

/// Format the effective configuration
pub fn format_config(config: &CliConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::Table => {
            let serial = &config.cube.serial;
            let mut output = String::new();
            output.push_str(&"Cube Configuration:".bold().to_string());
            output.push('\n');
            let source = config
                .source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string());
            output.push_str(&format!("{:<20} {}\n", "Source", source));
            output.push_str(&format!("{:<20} {:?}\n", "Board", config.cube.board));
            output.push_str(&format!(
                "{:<20} {}\n",
                "Device",
                serial.device.as_deref().unwrap_or("(discover)")
            ));
            output.push_str(&format!("{:<20} {}\n", "Baud Rate", serial.baud_rate));
            output.push_str(&format!(
                "{:<20} {} ms\n",
                "Handshake Timeout", serial.handshake_timeout_ms
            ));
            output.push_str(&format!("{:<20} {} ms\n", "Settle Delay", serial.settle_ms));
            output.push_str(&format!("{:<20} {}\n", "Debug UART", serial.debug_uart));
            output.push_str(&format!("{:<20} {}\n", "Output Format", config.output_format));
            output.push_str(&format!("{:<20} {}", "Verbose", config.verbose));
            Ok(output)
        }
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_success() {
        let message = format_success("Operation completed");
        assert!(message.contains("✓"));
        assert!(message.contains("Operation completed"));
    }

    #[test]
    fn test_format_ports_json() {
        let ports = vec!["/dev/ttyACM0".to_string(), "/dev/ttyUSB0".to_string()];
        let result = format_ports(&ports, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["ports"][0], "/dev/ttyACM0");
        assert_eq!(parsed["ports"][1], "/dev/ttyUSB0");
    }

    #[test]
    fn test_format_ports_table() {
        let ports = vec!["/dev/ttyACM0".to_string()];
        let result = format_ports(&ports, OutputFormat::Table).unwrap();
        assert!(result.contains("ttyACM0"));

        let empty = format_ports(&[], OutputFormat::Table).unwrap();
        assert!(empty.contains("No serial devices found"));
    }

    #[test]
    fn test_format_analog_json() {
        let result = format_analog(0, Some(0.5005), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["channel"], 0);
        assert_eq!(parsed["value"], 0.5005);

        let none = format_analog(0, None, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&none).unwrap();
        assert!(parsed["value"].is_null());
    }

    #[test]
    fn test_format_analog_table() {
        let result = format_analog(0, Some(0.25), OutputFormat::Table).unwrap();
        assert!(result.contains("A0"));
        assert!(result.contains("0.2500"));
    }

    #[test]
    fn test_format_state_json() {
        let result = format_state("green", OutputFormat::Json).unwrap();
        assert_eq!(result, r#"{"state":"green"}"#);
    }

    #[test]
    fn test_format_pins_json() {
        let pins = vec![(5, PinValue::Low), (9, PinValue::High)];
        let result = format_pins(&pins, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed[0]["pin"], 5);
        assert_eq!(parsed[0]["level"], 0);
        assert_eq!(parsed[1]["level"], 1);
    }

    #[test]
    fn test_format_config_json() {
        let config = CliConfig::default();
        let result = format_config(&config, OutputFormat::Json).unwrap();
        assert!(result.contains("baud_rate"));
        assert!(result.contains("57600"));
        assert!(result.contains("output_format"));
    }
}

//! Board definitions and configuration
//!
//! Each Firmata-capable board the indicator can be wired to implements the
//! `BoardConfig` trait with its pin layout and serial parameters. The
//! `BoardType` enum is the runtime counterpart selected from the CLI or the
//! config file.
//!
//! Note: Actual hardware I/O is in the `cube-hardware` crate. This module only
//! contains board specifications.

use crate::{CubeError, Result};

/// Firmata board configuration trait
///
/// # Example
///
/// ```
/// use cube_core::board::{ArduinoUno, BoardConfig};
///
/// const PINS: u8 = ArduinoUno::PIN_COUNT;
/// const NAME: &str = ArduinoUno::NAME;
/// ```
pub trait BoardConfig: Send + Sync + 'static {
    /// Human-readable board name
    const NAME: &'static str;

    /// Total number of addressable pins (digital and analog-capable)
    const PIN_COUNT: u8;

    /// Number of analog input channels
    const ANALOG_PIN_COUNT: u8;

    /// Pin number of analog channel 0
    const ANALOG_PIN_OFFSET: u8;

    /// Largest raw ADC reading
    const ANALOG_MAX: u16;

    /// Serial communication baud rate of the StandardFirmata sketch
    const BAUD_RATE: u32;
}

/// Arduino Uno (ATmega328P) running StandardFirmata
///
/// - 14 digital pins, 6 analog inputs (A0 = pin 14)
/// - 10-bit ADC
/// - 57600 baud
pub struct ArduinoUno;

impl BoardConfig for ArduinoUno {
    const NAME: &'static str = "Arduino Uno";
    const PIN_COUNT: u8 = 20;
    const ANALOG_PIN_COUNT: u8 = 6;
    const ANALOG_PIN_OFFSET: u8 = 14;
    const ANALOG_MAX: u16 = 1023;
    const BAUD_RATE: u32 = 57600;
}

/// Arduino Mega 2560 running StandardFirmata
pub struct ArduinoMega;

impl BoardConfig for ArduinoMega {
    const NAME: &'static str = "Arduino Mega";
    const PIN_COUNT: u8 = 70;
    const ANALOG_PIN_COUNT: u8 = 16;
    const ANALOG_PIN_OFFSET: u8 = 54;
    const ANALOG_MAX: u16 = 1023;
    const BAUD_RATE: u32 = 57600;
}

/// Default board type used throughout the codebase
pub type DefaultBoard = ArduinoUno;

/// Runtime board type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    /// Arduino Uno / Nano class board
    #[default]
    Uno,
    /// Arduino Mega 2560
    Mega,
}

impl std::str::FromStr for BoardType {
    type Err = CubeError;

    /// Parse board type from string (for CLI --board flag)
    ///
    /// ```
    /// use std::str::FromStr;
    /// use cube_core::board::BoardType;
    ///
    /// assert!(BoardType::from_str("uno").is_ok());
    /// assert!(BoardType::from_str("Mega").is_ok());
    /// assert!(BoardType::from_str("teensy").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uno" | "nano" | "arduino-uno" => Ok(BoardType::Uno),
            "mega" | "arduino-mega" => Ok(BoardType::Mega),
            _ => Err(CubeError::InvalidInput(format!(
                "Unknown board type: '{}'. Valid options: uno, mega",
                s
            ))),
        }
    }
}

impl BoardType {
    /// Convert to runtime board info
    pub fn to_board_info(self) -> BoardInfo {
        match self {
            BoardType::Uno => BoardInfo::of::<ArduinoUno>(self),
            BoardType::Mega => BoardInfo::of::<ArduinoMega>(self),
        }
    }
}

/// Runtime board information (non-generic)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardInfo {
    /// Board type variant
    pub board_type: BoardType,
    /// Human-readable board name
    pub name: String,
    /// Total number of addressable pins
    pub pin_count: u8,
    /// Number of analog input channels
    pub analog_pin_count: u8,
    /// Pin number of analog channel 0
    pub analog_pin_offset: u8,
    /// Largest raw ADC reading
    pub analog_max: u16,
}

impl BoardInfo {
    fn of<B: BoardConfig>(board_type: BoardType) -> Self {
        Self {
            board_type,
            name: B::NAME.to_string(),
            pin_count: B::PIN_COUNT,
            analog_pin_count: B::ANALOG_PIN_COUNT,
            analog_pin_offset: B::ANALOG_PIN_OFFSET,
            analog_max: B::ANALOG_MAX,
        }
    }

    /// Validate a pin number against this board's pin count
    ///
    /// ```
    /// use cube_core::board::BoardType;
    ///
    /// let board = BoardType::Uno.to_board_info();
    /// assert!(board.validate_pin(13).is_ok());
    /// assert!(board.validate_pin(20).is_err());
    /// ```
    pub fn validate_pin(&self, pin: u8) -> Result<()> {
        if pin >= self.pin_count {
            return Err(CubeError::InvalidPin {
                pin,
                pin_count: self.pin_count,
            });
        }
        Ok(())
    }

    /// Validate an analog channel index and return its pin number
    pub fn analog_channel_pin(&self, channel: u8) -> Result<u8> {
        if channel >= self.analog_pin_count {
            return Err(CubeError::InvalidInput(format!(
                "Analog channel must be 0-{}, got {}",
                self.analog_pin_count - 1,
                channel
            )));
        }
        Ok(self.analog_pin_offset + channel)
    }

    /// Scale a raw ADC reading to `[0.0, 1.0]`, rounded to four decimals
    pub fn normalize_analog(&self, raw: u16) -> f64 {
        let fraction = f64::from(raw.min(self.analog_max)) / f64::from(self.analog_max);
        (fraction * 10_000.0).round() / 10_000.0
    }
}

impl Default for BoardInfo {
    fn default() -> Self {
        BoardType::default().to_board_info()
    }
}

//! Core types shared by the hardware layer and the CLI

use serde::{Deserialize, Serialize};

/// Firmata pin mode, encoded as the byte sent with `SET_PIN_MODE`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    Input = 0x00,
    Output = 0x01,
    Analog = 0x02,
    Pwm = 0x03,
    Servo = 0x04,
}

/// Logical level of a digital pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinValue {
    #[default]
    Low,
    High,
}

impl PinValue {
    /// High iff `condition` holds
    pub fn when(condition: bool) -> Self {
        if condition {
            PinValue::High
        } else {
            PinValue::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == PinValue::High
    }

    /// The opposite level
    pub fn toggled(self) -> Self {
        match self {
            PinValue::Low => PinValue::High,
            PinValue::High => PinValue::Low,
        }
    }
}

impl From<bool> for PinValue {
    fn from(high: bool) -> Self {
        PinValue::when(high)
    }
}

impl std::fmt::Display for PinValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinValue::Low => write!(f, "0"),
            PinValue::High => write!(f, "1"),
        }
    }
}

/// Firmware identity reported by the board during the handshake
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FirmwareInfo {
    /// Firmata protocol version, e.g. `2.5`
    pub protocol_version: String,
    /// Sketch name, e.g. `StandardFirmata.ino`
    pub name: String,
    /// Sketch version, e.g. `2.5`
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mode_values() {
        assert_eq!(PinMode::Input as u8, 0x00);
        assert_eq!(PinMode::Output as u8, 0x01);
        assert_eq!(PinMode::Analog as u8, 0x02);
    }

    #[test]
    fn test_pin_value_helpers() {
        assert_eq!(PinValue::when(true), PinValue::High);
        assert_eq!(PinValue::from(false), PinValue::Low);
        assert_eq!(PinValue::Low.toggled(), PinValue::High);
        assert!(PinValue::High.is_high());
        assert_eq!(PinValue::High.to_string(), "1");
    }

    #[test]
    fn test_pin_value_serialization() {
        let json = serde_json::to_string(&PinValue::High).unwrap();
        assert_eq!(json, "\"high\"");
    }
}

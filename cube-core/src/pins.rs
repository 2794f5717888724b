//! Fixed wiring of the indicator to the board
//!
//! Pin 6 belongs to both the red group and the level-1 slot of the level
//! indicator; the two features drive the same LED.

/// Digital pins driving the green LEDs
pub const GREEN_PINS: [u8; 2] = [9, 10];

/// Digital pins driving the red LEDs
pub const RED_PINS: [u8; 2] = [5, 6];

/// Analog channel of the sensor (A0)
pub const SENSOR_CHANNEL: u8 = 0;

/// Level indicator pins; `LEVEL_PINS[n - 1]` lights for level `n`
pub const LEVEL_PINS: [u8; 4] = [6, 5, 10, 9];

/// Pin toggled by the "zero level" blink pattern
pub const LEVEL_BLINK_PIN: u8 = LEVEL_PINS[0];

/// Number of red/green alternations in `blink`
pub const BLINK_CYCLES: usize = 5;

/// Pause between half-transitions of `blink`, in milliseconds
pub const BLINK_INTERVAL_MS: u64 = 100;

/// Number of writes in the zero-level blink pattern
pub const LEVEL_BLINK_WRITES: usize = 8;

/// Pause between writes of the zero-level blink pattern, in milliseconds
pub const LEVEL_BLINK_INTERVAL_MS: u64 = 250;

/// Every pin the controller configures as a digital output
pub fn output_pins() -> impl Iterator<Item = u8> {
    GREEN_PINS.into_iter().chain(RED_PINS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_are_disjoint() {
        for green in GREEN_PINS {
            assert!(!RED_PINS.contains(&green));
        }
    }

    #[test]
    fn test_level_pins_cover_all_outputs() {
        let mut outputs: Vec<u8> = output_pins().collect();
        let mut levels = LEVEL_PINS.to_vec();
        outputs.sort_unstable();
        levels.sort_unstable();
        assert_eq!(outputs, levels);
    }

    #[test]
    fn test_level_blink_pin_is_shared_with_red() {
        assert_eq!(LEVEL_BLINK_PIN, 6);
        assert!(RED_PINS.contains(&LEVEL_BLINK_PIN));
    }
}

//! Pin-level access to a connected board

use async_trait::async_trait;
use cube_core::{PinMode, PinValue, Result};

/// Trait for pin I/O abstraction
///
/// This trait enables testing of `CubeDevice` without real hardware
/// by allowing mock implementations.
#[async_trait]
pub trait PinIo: Send {
    /// Configure the mode of a pin
    async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()>;

    /// Drive a digital output pin
    async fn digital_write(&mut self, pin: u8, value: PinValue) -> Result<()>;

    /// Start or stop streaming reports for an analog channel
    async fn report_analog(&mut self, channel: u8, enable: bool) -> Result<()>;

    /// Pin number backing an analog channel
    fn analog_pin(&self, channel: u8) -> Result<u8>;

    /// Last reported value of an analog channel, scaled to `[0.0, 1.0]`
    ///
    /// Returns `None` until the board has reported the channel at least once.
    fn analog_value(&self, channel: u8) -> Option<f64>;
}

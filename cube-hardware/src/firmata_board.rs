//! Blocking Firmata client behind the session
//!
//! [`FirmataBoard`] is what the session needs from a Firmata client;
//! [`StandardBoard`] provides it with the `firmata` crate's
//! `standard::board::Board`.

use crate::serial_driver::LinkPort;
use cube_core::{CubeError, FirmwareInfo, PinMode as CubePinMode, PinValue, Result};
use firmata::*;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Blocking Firmata client
///
/// Calls block on the serial link, so the session runs them off the async
/// runtime.
pub trait FirmataBoard: Send {
    /// Query protocol version, firmware and capabilities
    fn handshake(&mut self) -> Result<FirmwareInfo>;

    fn set_pin_mode(&mut self, pin: u8, mode: CubePinMode) -> Result<()>;

    fn digital_write(&mut self, pin: u8, value: PinValue) -> Result<()>;

    fn report_analog(&mut self, channel: u8, enable: bool) -> Result<()>;

    /// Read and apply one incoming message; errors when none arrives in time
    fn read_message(&mut self) -> Result<()>;

    /// Last raw value read for `pin`
    fn pin_value(&mut self, pin: u8) -> Option<u16>;
}

fn link_error(action: &str, err: impl Debug) -> CubeError {
    CubeError::Serial(format!("{} failed: {:?}", action, err))
}

fn firmata_mode(mode: CubePinMode) -> PinMode {
    match mode {
        CubePinMode::Input => PinMode::Input,
        CubePinMode::Output => PinMode::Output,
        CubePinMode::Analog => PinMode::Analog,
        CubePinMode::Pwm => PinMode::Pwm,
        CubePinMode::Servo => PinMode::Servo,
    }
}

/// StandardFirmata client on a serial link
pub struct StandardBoard {
    inner: standard::board::Board,
    /// Analog channels with reporting switched on
    reporting: BTreeSet<u8>,
    /// A message arrived while reporting was on
    reported: bool,
}

impl StandardBoard {
    pub fn new(port: LinkPort) -> Self {
        Self {
            inner: standard::board::Board::new(Box::new(port)),
            reporting: BTreeSet::new(),
            reported: false,
        }
    }
}

impl FirmataBoard for StandardBoard {
    fn handshake(&mut self) -> Result<FirmwareInfo> {
        self.inner
            .populate_board_info()
            .map_err(|e| link_error("Board query", e))?;

        Ok(FirmwareInfo {
            protocol_version: self.inner.protocol_version().to_string(),
            name: self.inner.firmware_name().to_string(),
            version: self.inner.firmware_version().to_string(),
        })
    }

    fn set_pin_mode(&mut self, pin: u8, mode: CubePinMode) -> Result<()> {
        self.inner
            .set_pin_mode(PinId::Digital(pin), firmata_mode(mode))
            .map_err(|e| link_error("Set pin mode", e))
    }

    fn digital_write(&mut self, pin: u8, value: PinValue) -> Result<()> {
        self.inner
            .digital_write(PinId::Digital(pin), value.is_high())
            .map_err(|e| link_error("Digital write", e))
    }

    fn report_analog(&mut self, channel: u8, enable: bool) -> Result<()> {
        self.inner
            .report_analog(PinId::Analog(channel), enable)
            .map_err(|e| link_error("Report analog", e))?;

        if enable {
            self.reporting.insert(channel);
        } else {
            self.reporting.remove(&channel);
        }
        Ok(())
    }

    fn read_message(&mut self) -> Result<()> {
        self.inner
            .read_and_decode()
            .map_err(|e| link_error("Read", e))?;

        if !self.reporting.is_empty() {
            self.reported = true;
        }
        Ok(())
    }

    fn pin_value(&mut self, pin: u8) -> Option<u16> {
        // The pin table starts zeroed; nothing is known before a report
        if !self.reported {
            return None;
        }
        let value = self.inner.pins().get(usize::from(pin))?.value;
        u16::try_from(value).ok()
    }
}

//! Cube Device - High-level interface for the indicator
//!
//! Maps the logical indicator states (red, green, off, blink, level) onto
//! digital pin writes and exposes the analog sensor reading.

use crate::discovery;
use crate::pin_io::PinIo;
use crate::session::FirmataSession;
use cube_core::pins::{
    self, BLINK_CYCLES, BLINK_INTERVAL_MS, GREEN_PINS, LEVEL_BLINK_INTERVAL_MS, LEVEL_BLINK_PIN,
    LEVEL_BLINK_WRITES, LEVEL_PINS, RED_PINS, SENSOR_CHANNEL,
};
use cube_core::{CubeConfig, CubeError, PinMode, PinValue, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Connection state of a [`CubeDevice`]
#[derive(Debug)]
pub enum SessionState<S> {
    Disconnected,
    Connected(S),
}

/// Controller for the red/green and level indicator
///
/// Generic over the pin I/O type, allowing a real Firmata session or
/// [`MockBoard`](crate::mock::MockBoard) for testing.
pub struct CubeDevice<S: PinIo = FirmataSession> {
    state: SessionState<S>,
}

impl<S: PinIo> Default for CubeDevice<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeDevice<FirmataSession> {
    /// Open a Firmata session on `path` and configure the indicator pins
    ///
    /// Replaces any session that is already open.
    pub async fn connect(&mut self, path: &str, config: &CubeConfig) -> Result<()> {
        let session = FirmataSession::open(path, config).await?;
        self.attach(session).await
    }
}

impl<S: PinIo> CubeDevice<S> {
    /// Create a controller with no session
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
        }
    }

    /// Candidate serial device paths for this host
    pub fn discover(&self) -> Vec<String> {
        discovery::discover()
    }

    /// Configure pins on an open session and take ownership of it
    ///
    /// Green and red pins become outputs, then analog reporting is enabled
    /// for the sensor channel and its pin is set to analog input.
    pub async fn attach(&mut self, mut session: S) -> Result<()> {
        for pin in pins::output_pins() {
            session.set_pin_mode(pin, PinMode::Output).await?;
        }

        session.report_analog(SENSOR_CHANNEL, true).await?;
        let sensor_pin = session.analog_pin(SENSOR_CHANNEL)?;
        session.set_pin_mode(sensor_pin, PinMode::Analog).await?;

        if self.is_connected() {
            warn!("Replacing existing session");
        }
        self.state = SessionState::Connected(session);
        info!("Indicator pins configured");
        Ok(())
    }

    /// Turn every red and green pin off
    ///
    /// No-op without a session. The session itself stays open and keeps
    /// polling; use [`close`](Self::close) to release it. Write errors are
    /// logged, not returned.
    pub async fn disconnect(&mut self) {
        let SessionState::Connected(session) = &mut self.state else {
            debug!("disconnect: no session");
            return;
        };

        for pin in RED_PINS.into_iter().chain(GREEN_PINS) {
            if let Err(e) = session.digital_write(pin, PinValue::Low).await {
                warn!("Failed to turn off pin {} on disconnect: {}", pin, e);
                return;
            }
        }
    }

    /// Release the session, stopping its background reader
    ///
    /// Returns the session if one was open.
    pub fn close(&mut self) -> Option<S> {
        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Connected(session) => {
                info!("Session closed");
                Some(session)
            }
            SessionState::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Open session, if any
    pub fn session(&self) -> Option<&S> {
        match &self.state {
            SessionState::Connected(session) => Some(session),
            SessionState::Disconnected => None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut S> {
        match &mut self.state {
            SessionState::Connected(session) => Ok(session),
            SessionState::Disconnected => Err(CubeError::NotConnected),
        }
    }

    /// Write `value` to each pin in order; the first failure aborts the rest
    async fn write_pins(&mut self, pins: &[u8], value: PinValue) -> Result<()> {
        let session = self.session_mut()?;
        for &pin in pins {
            session.digital_write(pin, value).await?;
        }
        Ok(())
    }

    /// Red off, then green on
    pub async fn go_green(&mut self) -> Result<()> {
        self.write_pins(&RED_PINS, PinValue::Low).await?;
        self.write_pins(&GREEN_PINS, PinValue::High).await
    }

    /// Green off, then red on
    pub async fn go_red(&mut self) -> Result<()> {
        self.write_pins(&GREEN_PINS, PinValue::Low).await?;
        self.write_pins(&RED_PINS, PinValue::High).await
    }

    /// Green off, then red off
    pub async fn go_off(&mut self) -> Result<()> {
        self.write_pins(&GREEN_PINS, PinValue::Low).await?;
        self.write_pins(&RED_PINS, PinValue::Low).await
    }

    /// Alternate red and green five times, 100 ms per half-cycle
    pub async fn blink(&mut self) -> Result<()> {
        let interval = Duration::from_millis(BLINK_INTERVAL_MS);
        for _ in 0..BLINK_CYCLES {
            self.go_red().await?;
            sleep(interval).await;
            self.go_green().await?;
            sleep(interval).await;
        }
        Ok(())
    }

    /// Last normalized reading of the sensor, `None` before the first report
    pub fn get_analog(&self) -> Result<Option<f64>> {
        match &self.state {
            SessionState::Connected(session) => Ok(session.analog_value(SENSOR_CHANNEL)),
            SessionState::Disconnected => Err(CubeError::NotConnected),
        }
    }

    /// Toggle the level-1 pin eight times (0, 1, 0, ... 1), 250 ms apart
    pub async fn blink_light_level(&mut self) -> Result<()> {
        let interval = Duration::from_millis(LEVEL_BLINK_INTERVAL_MS);
        let mut value = PinValue::Low;
        for step in 0..LEVEL_BLINK_WRITES {
            if step > 0 {
                sleep(interval).await;
            }
            self.write_pins(&[LEVEL_BLINK_PIN], value).await?;
            value = value.toggled();
        }
        Ok(())
    }

    /// Light level pins 1..=num; below 1, play the zero-level blink instead
    ///
    /// Levels above 4 light every pin.
    pub async fn show_level(&mut self, num: i32) -> Result<()> {
        debug!("Showing level {}", num);
        if num < 1 {
            self.blink_light_level().await?;
        } else {
            self.write_pins(&[LEVEL_PINS[0]], PinValue::High).await?;
        }

        for (threshold, &pin) in (2..).zip(&LEVEL_PINS[1..]) {
            self.write_pins(&[pin], PinValue::when(num >= threshold))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBoard, PinEvent};
    use std::collections::BTreeMap;
    use tokio::time::Instant;

    async fn connected_device() -> (CubeDevice<MockBoard>, MockBoard) {
        let mock = MockBoard::new();
        let mut device = CubeDevice::new();
        device.attach(mock.clone()).await.unwrap();
        mock.clear_events();
        (device, mock)
    }

    fn any_red_and_green_high(levels: &BTreeMap<u8, PinValue>) -> bool {
        let high = |pin: &u8| levels.get(pin).copied().unwrap_or_default().is_high();
        RED_PINS.iter().any(high) && GREEN_PINS.iter().any(high)
    }

    /// Replay writes over `levels`, reporting whether red and green were
    /// ever lit together at a write boundary
    fn ever_both_lit(mut levels: BTreeMap<u8, PinValue>, writes: &[(u8, PinValue)]) -> bool {
        writes.iter().any(|&(pin, value)| {
            levels.insert(pin, value);
            any_red_and_green_high(&levels)
        })
    }

    #[tokio::test]
    async fn test_attach_configures_pins() {
        let mock = MockBoard::new();
        let mut device = CubeDevice::new();
        device.attach(mock.clone()).await.unwrap();

        assert!(device.is_connected());
        assert_eq!(
            mock.events(),
            vec![
                PinEvent::Mode {
                    pin: 9,
                    mode: PinMode::Output
                },
                PinEvent::Mode {
                    pin: 10,
                    mode: PinMode::Output
                },
                PinEvent::Mode {
                    pin: 5,
                    mode: PinMode::Output
                },
                PinEvent::Mode {
                    pin: 6,
                    mode: PinMode::Output
                },
                PinEvent::ReportAnalog {
                    channel: 0,
                    enable: true
                },
                PinEvent::Mode {
                    pin: 14,
                    mode: PinMode::Analog
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_attach_failure_leaves_device_disconnected() {
        let mock = MockBoard::new();
        mock.fail_after(2);
        let mut device = CubeDevice::new();

        let result = device.attach(mock).await;
        assert!(matches!(result, Err(CubeError::Serial(_))));
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn test_go_green_writes_red_then_green() {
        let (mut device, mock) = connected_device().await;
        device.go_green().await.unwrap();

        assert_eq!(
            mock.writes(),
            vec![
                (5, PinValue::Low),
                (6, PinValue::Low),
                (9, PinValue::High),
                (10, PinValue::High),
            ]
        );
    }

    #[tokio::test]
    async fn test_go_red_writes_green_then_red() {
        let (mut device, mock) = connected_device().await;
        device.go_red().await.unwrap();

        assert_eq!(
            mock.writes(),
            vec![
                (9, PinValue::Low),
                (10, PinValue::Low),
                (5, PinValue::High),
                (6, PinValue::High),
            ]
        );
    }

    #[tokio::test]
    async fn test_go_green_then_off_clears_everything() {
        let (mut device, mock) = connected_device().await;
        device.go_green().await.unwrap();
        device.go_off().await.unwrap();

        for pin in RED_PINS.iter().chain(GREEN_PINS.iter()) {
            assert_eq!(mock.level(*pin), PinValue::Low, "pin {} still lit", pin);
        }
    }

    #[tokio::test]
    async fn test_red_to_green_never_both_lit() {
        let (mut device, mock) = connected_device().await;
        device.go_red().await.unwrap();
        let all_red: BTreeMap<u8, PinValue> = RED_PINS
            .iter()
            .chain(GREEN_PINS.iter())
            .map(|&pin| (pin, mock.level(pin)))
            .collect();
        assert!(RED_PINS.iter().all(|pin| all_red[pin].is_high()));

        mock.clear_events();
        device.go_green().await.unwrap();
        assert!(!ever_both_lit(all_red, &mock.writes()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_never_lights_both_groups() {
        let (mut device, mock) = connected_device().await;
        device.blink().await.unwrap();
        assert!(!ever_both_lit(BTreeMap::new(), &mock.writes()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_alternates_five_times_in_one_second() {
        let (mut device, mock) = connected_device().await;

        let start = Instant::now();
        device.blink().await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(900), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1300), "{:?}", elapsed);

        // 5 cycles x (go_red + go_green) x 4 writes each
        let writes = mock.writes();
        assert_eq!(writes.len(), 40);
        let red_on = writes
            .iter()
            .filter(|&&w| w == (6, PinValue::High))
            .count();
        assert_eq!(red_on, 5);
        assert_eq!(mock.level(9), PinValue::High);
        assert_eq!(mock.level(5), PinValue::Low);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_spacing() {
        let (mut device, mock) = connected_device().await;
        device.blink().await.unwrap();

        // First write of each half-cycle is 100 ms after the previous one
        let starts: Vec<Instant> = mock
            .timed_events()
            .chunks(4)
            .map(|chunk| chunk[0].0)
            .collect();
        assert_eq!(starts.len(), 10);
        for pair in starts.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_level_zero_blinks_pin_six() {
        let (mut device, mock) = connected_device().await;

        let start = Instant::now();
        device.show_level(0).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(7 * 250));

        let writes = mock.writes();
        let expected_blink: Vec<(u8, PinValue)> = (0..8)
            .map(|i| (6, PinValue::when(i % 2 == 1)))
            .collect();
        assert_eq!(&writes[..8], expected_blink.as_slice());
        assert_eq!(
            &writes[8..],
            &[
                (5, PinValue::Low),
                (10, PinValue::Low),
                (9, PinValue::Low)
            ]
        );
        assert_eq!(mock.level(6), PinValue::High);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_level_negative_blinks() {
        let (mut device, mock) = connected_device().await;
        device.show_level(-3).await.unwrap();
        assert_eq!(mock.writes().len(), 8 + 3);
    }

    #[tokio::test]
    async fn test_show_level_three() {
        let (mut device, mock) = connected_device().await;
        device.show_level(3).await.unwrap();

        assert_eq!(mock.level(6), PinValue::High);
        assert_eq!(mock.level(5), PinValue::High);
        assert_eq!(mock.level(10), PinValue::High);
        assert_eq!(mock.level(9), PinValue::Low);
        assert_eq!(mock.writes().len(), 4);
    }

    #[tokio::test]
    async fn test_show_level_four_and_above() {
        let (mut device, mock) = connected_device().await;
        device.show_level(4).await.unwrap();
        for pin in LEVEL_PINS {
            assert_eq!(mock.level(pin), PinValue::High);
        }

        device.show_level(9).await.unwrap();
        for pin in LEVEL_PINS {
            assert_eq!(mock.level(pin), PinValue::High);
        }
    }

    #[tokio::test]
    async fn test_show_level_is_monotonic() {
        let (mut device, mock) = connected_device().await;
        for level in 1..=4 {
            device.show_level(level).await.unwrap();
            for (idx, pin) in LEVEL_PINS.iter().enumerate() {
                let lit = (idx as i32) < level;
                assert_eq!(mock.level(*pin).is_high(), lit, "level {}", level);
            }
        }
    }

    #[tokio::test]
    async fn test_get_analog_without_connect() {
        let device: CubeDevice<MockBoard> = CubeDevice::new();
        assert!(matches!(device.get_analog(), Err(CubeError::NotConnected)));
    }

    #[tokio::test]
    async fn test_get_analog_reads_sensor_channel() {
        let (device, mock) = connected_device().await;
        assert_eq!(device.get_analog().unwrap(), None);

        mock.set_analog(0, 0);
        assert_eq!(device.get_analog().unwrap(), Some(0.0));
        mock.set_analog(0, 1023);
        assert_eq!(device.get_analog().unwrap(), Some(1.0));
    }

    #[tokio::test]
    async fn test_writes_without_connect_fail() {
        let mut device: CubeDevice<MockBoard> = CubeDevice::new();
        assert!(matches!(device.go_green().await, Err(CubeError::NotConnected)));
        assert!(matches!(device.go_red().await, Err(CubeError::NotConnected)));
        assert!(matches!(device.go_off().await, Err(CubeError::NotConnected)));
        assert!(matches!(device.blink().await, Err(CubeError::NotConnected)));
        assert!(matches!(
            device.show_level(2).await,
            Err(CubeError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_without_session_is_noop() {
        let mut device: CubeDevice<MockBoard> = CubeDevice::new();
        device.disconnect().await;
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_zeroes_pins_and_keeps_session() {
        let (mut device, mock) = connected_device().await;
        device.go_red().await.unwrap();
        mock.clear_events();

        device.disconnect().await;

        assert_eq!(
            mock.writes(),
            vec![
                (5, PinValue::Low),
                (6, PinValue::Low),
                (9, PinValue::Low),
                (10, PinValue::Low),
            ]
        );
        assert!(device.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_swallows_write_errors() {
        let (mut device, mock) = connected_device().await;
        mock.fail_after(1);

        device.disconnect().await;
        assert_eq!(mock.writes(), vec![(5, PinValue::Low)]);
    }

    #[tokio::test]
    async fn test_partial_failure_aborts_remaining_writes() {
        let (mut device, mock) = connected_device().await;
        mock.fail_after(3);

        let result = device.go_green().await;
        assert!(matches!(result, Err(CubeError::Serial(_))));
        // Red cleared, first green pin lit, second never written
        assert_eq!(
            mock.writes(),
            vec![(5, PinValue::Low), (6, PinValue::Low), (9, PinValue::High)]
        );
    }

    #[tokio::test]
    async fn test_close_returns_session() {
        let (mut device, _mock) = connected_device().await;
        assert!(device.close().is_some());
        assert!(!device.is_connected());
        assert!(device.close().is_none());
        assert!(matches!(device.get_analog(), Err(CubeError::NotConnected)));
    }
}

//! In-memory boards for tests and `--mock` runs
//!
//! [`MockBoard`] stands in for a whole session and records every pin
//! operation with the (tokio) time it happened, so tests can check write
//! order, intermediate states and pacing. [`ScriptedBoard`] stands in for
//! the Firmata client underneath a real [`FirmataSession`](crate::FirmataSession).

use crate::firmata_board::FirmataBoard;
use crate::pin_io::PinIo;
use async_trait::async_trait;
use cube_core::{BoardInfo, CubeError, FirmwareInfo, PinMode, PinValue, Result};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// One recorded pin operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Mode { pin: u8, mode: PinMode },
    Write { pin: u8, value: PinValue },
    ReportAnalog { channel: u8, enable: bool },
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<(Instant, PinEvent)>,
    levels: BTreeMap<u8, PinValue>,
    modes: BTreeMap<u8, PinMode>,
    analog: BTreeMap<u8, u16>,
    /// Writes left before every further write fails
    writes_before_failure: Option<usize>,
}

/// Mock board implementing [`PinIo`]
///
/// Clones share state: keep one clone in the test while the device owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockBoard {
    state: Arc<Mutex<MockState>>,
    board: BoardInfo,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock of a specific board layout
    pub fn with_board(board: BoardInfo) -> Self {
        Self {
            state: Arc::default(),
            board,
        }
    }

    pub fn board(&self) -> &BoardInfo {
        &self.board
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current level of a pin (low if never written)
    pub fn level(&self, pin: u8) -> PinValue {
        self.lock().levels.get(&pin).copied().unwrap_or_default()
    }

    /// Mode last set for a pin
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.lock().modes.get(&pin).copied()
    }

    /// Every recorded event, oldest first
    pub fn events(&self) -> Vec<PinEvent> {
        self.lock().events.iter().map(|(_, e)| *e).collect()
    }

    /// Every recorded event with its timestamp
    pub fn timed_events(&self) -> Vec<(Instant, PinEvent)> {
        self.lock().events.clone()
    }

    /// Digital writes only, oldest first
    pub fn writes(&self) -> Vec<(u8, PinValue)> {
        self.lock()
            .events
            .iter()
            .filter_map(|(_, e)| match *e {
                PinEvent::Write { pin, value } => Some((pin, value)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Simulate an analog report from the board
    pub fn set_analog(&self, channel: u8, raw: u16) {
        self.lock().analog.insert(channel, raw);
    }

    /// Let `count` more writes succeed, then fail every later one
    pub fn fail_after(&self, count: usize) {
        self.lock().writes_before_failure = Some(count);
    }

    fn record(&self, event: PinEvent) -> Result<()> {
        let mut state = self.lock();
        if let Some(remaining) = state.writes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(CubeError::Serial("Write failed: mock link down".to_string()));
            }
            *remaining -= 1;
        }

        debug!("mock: {:?}", event);
        match event {
            PinEvent::Mode { pin, mode } => {
                state.modes.insert(pin, mode);
            }
            PinEvent::Write { pin, value } => {
                state.levels.insert(pin, value);
            }
            PinEvent::ReportAnalog { .. } => {}
        }
        state.events.push((Instant::now(), event));
        Ok(())
    }
}

#[async_trait]
impl PinIo for MockBoard {
    async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.board.validate_pin(pin)?;
        self.record(PinEvent::Mode { pin, mode })
    }

    async fn digital_write(&mut self, pin: u8, value: PinValue) -> Result<()> {
        self.board.validate_pin(pin)?;
        self.record(PinEvent::Write { pin, value })
    }

    async fn report_analog(&mut self, channel: u8, enable: bool) -> Result<()> {
        self.board.analog_channel_pin(channel)?;
        self.record(PinEvent::ReportAnalog { channel, enable })
    }

    fn analog_pin(&self, channel: u8) -> Result<u8> {
        self.board.analog_channel_pin(channel)
    }

    fn analog_value(&self, channel: u8) -> Option<f64> {
        let raw = self.lock().analog.get(&channel).copied()?;
        Some(self.board.normalize_analog(raw))
    }
}

#[derive(Debug, Default)]
struct ScriptedState {
    calls: Vec<PinEvent>,
    handshakes: usize,
    handshake_failures: usize,
    handshake_stall: Option<Duration>,
    /// Reports the board sends next, as (pin, raw value)
    pending: VecDeque<(u8, u16)>,
    values: BTreeMap<u8, u16>,
    reads: usize,
    writes_fail: bool,
}

/// Scripted Firmata client for driving a session without a serial port
///
/// Clones share state. Reads return queued reports one at a time and time
/// out after a millisecond when the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBoard {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Calls made on the board, oldest first
    pub fn calls(&self) -> Vec<PinEvent> {
        self.lock().calls.clone()
    }

    pub fn handshakes(&self) -> usize {
        self.lock().handshakes
    }

    /// Number of reads attempted so far
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    /// Ignore the next `count` handshakes
    pub fn fail_handshakes(&self, count: usize) {
        self.lock().handshake_failures = count;
    }

    /// Block the next handshakes for `stall` before answering
    pub fn stall_handshake(&self, stall: Duration) {
        self.lock().handshake_stall = Some(stall);
    }

    /// Fail every later mode, write and report call
    pub fn fail_writes(&self) {
        self.lock().writes_fail = true;
    }

    /// Queue an analog report for `pin`
    pub fn queue_report(&self, pin: u8, raw: u16) {
        self.lock().pending.push_back((pin, raw));
    }

    fn call(&self, event: PinEvent) -> Result<()> {
        let mut state = self.lock();
        if state.writes_fail {
            return Err(CubeError::Serial("Write failed: scripted link down".to_string()));
        }
        state.calls.push(event);
        Ok(())
    }
}

impl FirmataBoard for ScriptedBoard {
    fn handshake(&mut self) -> Result<FirmwareInfo> {
        let stall = self.lock().handshake_stall;
        if let Some(stall) = stall {
            std::thread::sleep(stall);
        }

        let mut state = self.lock();
        state.handshakes += 1;
        if state.handshake_failures > 0 {
            state.handshake_failures -= 1;
            return Err(CubeError::Serial("Read failed: timed out".to_string()));
        }
        Ok(FirmwareInfo {
            protocol_version: "2.5".to_string(),
            name: "StandardFirmata.ino".to_string(),
            version: "2.5".to_string(),
        })
    }

    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.call(PinEvent::Mode { pin, mode })
    }

    fn digital_write(&mut self, pin: u8, value: PinValue) -> Result<()> {
        self.call(PinEvent::Write { pin, value })
    }

    fn report_analog(&mut self, channel: u8, enable: bool) -> Result<()> {
        self.call(PinEvent::ReportAnalog { channel, enable })
    }

    fn read_message(&mut self) -> Result<()> {
        let report = {
            let mut state = self.lock();
            state.reads += 1;
            state.pending.pop_front()
        };
        match report {
            Some((pin, raw)) => {
                self.lock().values.insert(pin, raw);
                Ok(())
            }
            None => {
                std::thread::sleep(Duration::from_millis(1));
                Err(CubeError::Serial("Read failed: timed out".to_string()))
            }
        }
    }

    fn pin_value(&mut self, pin: u8) -> Option<u16> {
        self.lock().values.get(&pin).copied()
    }
}

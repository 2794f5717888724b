//! Firmata session over a serial link
//!
//! A session shares its [`FirmataBoard`] with a poller thread that keeps
//! reading incoming reports. Dropping the session stops the poller and
//! closes the link.

use crate::firmata_board::{FirmataBoard, StandardBoard};
use crate::pin_io::PinIo;
use crate::serial_driver::{open_port, TracedPort};
use async_trait::async_trait;
use cube_core::{BoardInfo, CubeConfig, CubeError, FirmwareInfo, PinMode, PinValue, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Pause after a read that returned nothing
const IDLE_PAUSE: Duration = Duration::from_millis(10);

type SharedBoard = Arc<Mutex<Box<dyn FirmataBoard>>>;

fn lock(board: &SharedBoard) -> MutexGuard<'_, Box<dyn FirmataBoard>> {
    board.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Poller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    fn spawn(board: SharedBoard) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("firmata-poller".to_string())
            .spawn(move || {
                debug!("Poller started");
                let mut failures = 0u64;
                while !flag.load(Ordering::Relaxed) {
                    let result = lock(&board).read_message();
                    match result {
                        Ok(()) => failures = 0,
                        Err(e) => {
                            failures += 1;
                            if failures == 1 {
                                debug!("Poll: {}", e);
                            }
                            std::thread::sleep(IDLE_PAUSE);
                        }
                    }
                    // Let writers take the board between reads
                    std::thread::yield_now();
                }
                debug!("Poller stopped");
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Poller thread panicked");
            }
        }
    }
}

/// Query `board` once, failing when it does not answer within `wait`
///
/// The query runs on the blocking pool. A query still blocked when `wait`
/// elapses ends on the link's read timeout.
pub async fn handshake<B>(mut board: B, wait: Duration) -> Result<(B, FirmwareInfo)>
where
    B: FirmataBoard + 'static,
{
    let query = tokio::task::spawn_blocking(move || {
        let firmware = board.handshake()?;
        Ok::<_, CubeError>((board, firmware))
    });

    match timeout(wait, query).await {
        Ok(Ok(Ok(answered))) => Ok(answered),
        Ok(Ok(Err(e))) => Err(CubeError::ConnectionFailure(format!(
            "Handshake failed: {}",
            e
        ))),
        Ok(Err(e)) => Err(CubeError::ConnectionFailure(format!(
            "Handshake task failed: {}",
            e
        ))),
        Err(_) => {
            warn!("No Firmata reply within {:?}", wait);
            Err(CubeError::ConnectionFailure(format!(
                "No Firmata reply within {} ms",
                wait.as_millis()
            )))
        }
    }
}

/// Open Firmata session
pub struct FirmataSession {
    board: SharedBoard,
    poller: Poller,
    layout: BoardInfo,
    firmware: FirmwareInfo,
    port_path: Option<String>,
}

impl FirmataSession {
    /// Open the serial device at `path` and complete the handshake
    ///
    /// Waits `settle_ms` for the board to finish its reset before querying.
    pub async fn open(path: &str, config: &CubeConfig) -> Result<Self> {
        info!("Opening Firmata session on {}", path);
        let port = open_port(path, &config.serial)?;

        if config.serial.settle_ms > 0 {
            debug!("Waiting {} ms for board reset", config.serial.settle_ms);
            sleep(Duration::from_millis(config.serial.settle_ms)).await;
        }

        let board = StandardBoard::new(TracedPort::new(port, config.serial.debug_uart));
        let wait = Duration::from_millis(config.serial.handshake_timeout_ms);
        let (board, firmware) = handshake(board, wait).await?;
        info!(
            "Connected to {} ({} {}, Firmata {})",
            path, firmware.name, firmware.version, firmware.protocol_version
        );

        let mut session = Self::start(Box::new(board), firmware, config.board.to_board_info())?;
        session.port_path = Some(path.to_string());
        Ok(session)
    }

    /// Start a session on a board that already answered the handshake
    pub fn start(
        board: Box<dyn FirmataBoard>,
        firmware: FirmwareInfo,
        layout: BoardInfo,
    ) -> Result<Self> {
        let board: SharedBoard = Arc::new(Mutex::new(board));
        let poller = Poller::spawn(Arc::clone(&board))?;

        Ok(Self {
            board,
            poller,
            layout,
            firmware,
            port_path: None,
        })
    }

    /// Run `f` on the board from the blocking pool
    async fn with_board<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn FirmataBoard) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let board = Arc::clone(&self.board);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&board);
            f(&mut **guard)
        })
        .await
        .map_err(|e| CubeError::Serial(format!("Board task failed: {}", e)))?
    }

    /// Firmware identity reported during the handshake
    pub fn firmware(&self) -> &FirmwareInfo {
        &self.firmware
    }

    pub fn board(&self) -> &BoardInfo {
        &self.layout
    }

    /// Device path, when opened by path
    pub fn port_path(&self) -> Option<&str> {
        self.port_path.as_deref()
    }

    /// Whether the poller thread is still reading the link
    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }
}

#[async_trait]
impl PinIo for FirmataSession {
    async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.layout.validate_pin(pin)?;
        debug!("Set pin {} mode {:?}", pin, mode);
        self.with_board(move |board| board.set_pin_mode(pin, mode))
            .await
    }

    async fn digital_write(&mut self, pin: u8, value: PinValue) -> Result<()> {
        self.layout.validate_pin(pin)?;
        debug!("Write pin {} = {}", pin, value);
        self.with_board(move |board| board.digital_write(pin, value))
            .await
    }

    async fn report_analog(&mut self, channel: u8, enable: bool) -> Result<()> {
        self.layout.analog_channel_pin(channel)?;
        debug!("Report analog A{}: {}", channel, enable);
        self.with_board(move |board| board.report_analog(channel, enable))
            .await
    }

    fn analog_pin(&self, channel: u8) -> Result<u8> {
        self.layout.analog_channel_pin(channel)
    }

    fn analog_value(&self, channel: u8) -> Option<f64> {
        let pin = self.layout.analog_channel_pin(channel).ok()?;
        let raw = lock(&self.board).pin_value(pin)?;
        Some(self.layout.normalize_analog(raw))
    }
}

//! cube-hardware
//!
//! Hardware crate containing serial discovery, the Firmata session with its
//! background poller, and the high-level indicator controller. Used by the
//! CLI to drive the board.
//!
//! Public API:
//! - `device::CubeDevice` — high-level controller for the indicator
//! - `session::FirmataSession` — Firmata session over a serial link
//! - `discovery::discover` — candidate serial device paths for this host
//! - `mock::MockBoard` — in-memory board for tests and dry runs

pub mod device;
pub mod discovery;
pub mod firmata_board;
pub mod mock;
pub mod pin_io;
pub mod serial_driver;
pub mod session;

pub use device::{CubeDevice, SessionState};
pub use discovery::{discover, platform_lister, PortLister, PosixGlobLister, WindowsRegistryLister};
pub use firmata_board::{FirmataBoard, StandardBoard};
pub use mock::{MockBoard, ScriptedBoard};
pub use pin_io::PinIo;
pub use session::FirmataSession;

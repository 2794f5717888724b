//! Serial driver for low-level hardware communication
//!
//! Opens the USB serial port as a blocking stream for the Firmata client and
//! optionally logs every byte crossing the link.

use cube_core::{CubeError, Result, SerialConfig};
use std::io::{self, Read, Write};
use std::time::Duration;
use tokio_serial::SerialPort;
use tracing::{debug, error};

/// Read timeout of the open port
///
/// Bounds how long the poller holds the board between incoming messages.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Open the serial device at `path` with 8N1 framing and no flow control
pub fn open_port(path: &str, config: &SerialConfig) -> Result<Box<dyn SerialPort>> {
    debug!(
        "Opening serial port: {} at {} baud",
        path, config.baud_rate
    );

    let port = tokio_serial::new(path, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|e| {
            error!("Failed to open serial port {}: {}", path, e);
            CubeError::ConnectionFailure(format!("Failed to open serial port {}: {}", path, e))
        })?;

    debug!("Serial port opened successfully");
    Ok(port)
}

/// Byte stream to the board, logging traffic when `debug_uart` is set
pub struct TracedPort<P> {
    inner: P,
    debug_uart: bool,
}

/// The stream handed to the Firmata client
pub type LinkPort = TracedPort<Box<dyn SerialPort>>;

impl<P> TracedPort<P> {
    pub fn new(inner: P, debug_uart: bool) -> Self {
        Self { inner, debug_uart }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Read> Read for TracedPort<P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.debug_uart && n > 0 {
            debug!("RX: {:02X?}", &buf[..n]);
        }
        Ok(n)
    }
}

impl<P: Write> Write for TracedPort<P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf).map_err(|e| {
            error!("Write failed: {}", e);
            e
        })?;
        if self.debug_uart {
            debug!("TX: {:02X?}", &buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_open_port_missing_device() {
        let config = SerialConfig::default();
        let result = open_port("/dev/cube-does-not-exist", &config);
        assert!(matches!(result, Err(CubeError::ConnectionFailure(_))));
    }

    #[test]
    fn test_traced_port_passes_bytes_through() {
        let mut port = TracedPort::new(Cursor::new(Vec::new()), true);
        port.write_all(&[0xF9]).unwrap();
        port.write_all(&[0xC0, 0x01]).unwrap();
        port.flush().unwrap();
        assert_eq!(port.into_inner().into_inner(), vec![0xF9, 0xC0, 0x01]);
    }

    #[test]
    fn test_traced_port_reads() {
        let mut port = TracedPort::new(Cursor::new(vec![0xE0, 0x7F, 0x07]), false);
        let mut buf = [0u8; 3];
        port.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0xE0, 0x7F, 0x07]);
        assert_eq!(port.read(&mut buf).unwrap(), 0);
    }
}

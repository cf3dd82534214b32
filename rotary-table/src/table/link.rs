//! Serial link to the rotary table.
//!
//! The table listens on a plain UART at a fixed 115200-8-N-1 configuration
//! with no flow control. Only the write half of the port is used: the
//! protocol is fire-and-forget and the device sends no replies.
//!
//! Opening the port goes through the [`Connector`] trait so the driver can be
//! exercised against an in-memory channel in tests. [`SerialConnector`] is the
//! real implementation backed by the `serialport` crate.

use std::io::Write;
use std::thread;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, trace};

use super::error::{TableError, TableResult};
use super::frame::CommandFrame;

/// Fixed baud rate of the table controller.
pub const BAUD_RATE: u32 = 115_200;

/// Default read/write timeout for the serial port.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after each frame so the controller can consume it before the next.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Port name and timeout. Everything else about the line is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub timeout: Duration,
}

impl SerialSettings {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Byte sink that frames are written to. Dropping it closes the port.
pub trait Channel: Write + Send {}

impl<T: Write + Send> Channel for T {}

/// Opens channels to the table.
pub trait Connector {
    /// Open a channel with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Open`] (or another transport error) if the
    /// port cannot be opened.
    fn open(&mut self, settings: &SerialSettings) -> TableResult<Box<dyn Channel>>;
}

/// Opens real serial ports at 115200-8-N-1 without flow control.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(&mut self, settings: &SerialSettings) -> TableResult<Box<dyn Channel>> {
        let port = serialport::new(&settings.port, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout)
            .open()
            .map_err(|source| TableError::Open {
                port: settings.port.clone(),
                source,
            })?;

        debug!(
            "Opened {} at {} baud, 8-N-1, timeout {:?}",
            settings.port, BAUD_RATE, settings.timeout
        );
        Ok(Box::new(port))
    }
}

/// An open channel plus the transmit policy.
pub struct Link {
    channel: Box<dyn Channel>,
    settle_delay: Duration,
}

impl Link {
    pub fn new(channel: Box<dyn Channel>, settle_delay: Duration) -> Self {
        Self {
            channel,
            settle_delay,
        }
    }

    /// Write a frame, flush it out of any OS/driver buffers, then block for
    /// the settle delay.
    ///
    /// No acknowledgement is read. A failed write is returned as-is; nothing
    /// is retried.
    pub fn transmit(&mut self, frame: &CommandFrame) -> TableResult<()> {
        self.channel.write_all(frame.as_bytes())?;
        self.channel.flush()?;
        trace!("Wrote {} bytes", frame.len());

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

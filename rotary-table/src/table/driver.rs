//! High-level rotary table driver.
//!
//! [`RotaryTable`] owns the serial link and exposes one method per motion
//! command. Every method validates its parameters, encodes the frame, and
//! writes it synchronously; all take `&mut self`, so commands to one table are
//! always issued one at a time.
//!
//! # Connection Lifecycle
//!
//! ```no_run
//! use rotary_table::table::{Direction, RotaryTable};
//!
//! // Connects immediately; the port is closed when `table` is dropped,
//! // including on early returns via `?`.
//! let mut table = RotaryTable::open("/dev/ttyUSB0")?;
//!
//! table.set_coordinate(0)?;
//! table.move_absolute(10000, 10000)?;
//! table.run_constant_speed(5000, Direction::Reverse)?;
//! table.stop()?;
//! # Ok::<(), rotary_table::table::TableError>(())
//! ```
//!
//! Explicit [`connect`](RotaryTable::connect) and
//! [`disconnect`](RotaryTable::disconnect) are also available; disconnect is
//! idempotent.
//!
//! # Observing Frames
//!
//! Every frame that is about to be written is passed to a [`FrameObserver`].
//! The default [`TracingObserver`] logs it at debug level as `[SEND] 0x55 0xAA ...`.
//! Closures work as observers too:
//!
//! ```
//! use rotary_table::table::{CommandFrame, RotaryTable};
//!
//! let table = RotaryTable::new("/dev/ttyUSB0")
//!     .with_observer(|frame: &CommandFrame| eprintln!("-> {frame}"));
//! assert!(!table.is_connected());
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::DriverConfig;
use super::error::{TableError, TableResult};
use super::frame::{Command, CommandFrame, Direction};
use super::link::{Connector, Link, SerialConnector, SerialSettings, DEFAULT_SETTLE_DELAY};

/// Receives each encoded frame just before it is written.
pub trait FrameObserver: Send {
    fn on_frame(&mut self, frame: &CommandFrame);
}

impl<F> FrameObserver for F
where
    F: FnMut(&CommandFrame) + Send,
{
    fn on_frame(&mut self, frame: &CommandFrame) {
        self(frame)
    }
}

/// Logs outgoing frames through `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FrameObserver for TracingObserver {
    fn on_frame(&mut self, frame: &CommandFrame) {
        debug!("[SEND] {frame}");
    }
}

/// Driver for a serial rotary table.
///
/// Generic over the [`Connector`] so tests can substitute an in-memory port;
/// applications use the default [`SerialConnector`].
pub struct RotaryTable<C: Connector = SerialConnector> {
    settings: SerialSettings,
    settle_delay: Duration,
    connector: C,
    link: Option<Link>,
    observer: Box<dyn FrameObserver>,
}

impl RotaryTable<SerialConnector> {
    /// Create a driver for `port` with default timeout and settle delay.
    ///
    /// Does not open the port; call [`connect`](Self::connect) or use
    /// [`open`](Self::open) instead.
    pub fn new(port: impl Into<String>) -> Self {
        Self::with_connector(SerialSettings::new(port), SerialConnector)
    }

    /// Create a driver from a loaded [`DriverConfig`]. Does not connect.
    pub fn from_config(config: &DriverConfig) -> Self {
        Self::with_connector(config.serial_settings(), SerialConnector)
            .with_settle_delay(config.settle_delay())
    }

    /// Create a driver for `port` and connect to it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Open`] if the port cannot be opened.
    pub fn open(port: impl Into<String>) -> TableResult<Self> {
        let mut table = Self::new(port);
        table.connect()?;
        Ok(table)
    }

    /// Create a driver from a [`DriverConfig`] and connect to it.
    pub fn open_with_config(config: &DriverConfig) -> TableResult<Self> {
        let mut table = Self::from_config(config);
        table.connect()?;
        Ok(table)
    }
}

impl<C: Connector> RotaryTable<C> {
    /// Create a driver that opens its channel through `connector`.
    pub fn with_connector(settings: SerialSettings, connector: C) -> Self {
        Self {
            settings,
            settle_delay: DEFAULT_SETTLE_DELAY,
            connector,
            link: None,
            observer: Box::new(TracingObserver),
        }
    }

    /// Set the pause after each frame. Takes effect on the next connect.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Replace the frame observer.
    pub fn with_observer(mut self, observer: impl FrameObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn port(&self) -> &str {
        &self.settings.port
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    // ==================== Connection ====================

    /// Open the serial port.
    ///
    /// Calling this while already connected is a no-op. On failure the driver
    /// stays disconnected and the underlying cause is returned.
    pub fn connect(&mut self) -> TableResult<()> {
        if self.link.is_some() {
            debug!("Already connected to {}", self.settings.port);
            return Ok(());
        }

        let channel = self.connector.open(&self.settings).inspect_err(|e| {
            warn!("Failed to connect to {}: {e}", self.settings.port);
        })?;
        self.link = Some(Link::new(channel, self.settle_delay));

        info!("Connected to rotary table on {}", self.settings.port);
        Ok(())
    }

    /// Close the serial port if it is open. Safe to call any number of times.
    pub fn disconnect(&mut self) {
        if self.link.take().is_some() {
            info!("Disconnected from {}", self.settings.port);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    // ==================== Sending ====================

    /// Encode and send a [`Command`].
    ///
    /// Parameters are validated before anything else; an out-of-range value
    /// returns [`TableError::OutOfRange`] and nothing is written.
    pub fn send(&mut self, command: Command) -> TableResult<()> {
        let frame = command.encode().inspect_err(|e| {
            warn!("Invalid {} parameters: {e}", command.opcode());
        })?;
        self.send_frame(&frame)
    }

    /// Send an already-encoded frame.
    ///
    /// # Errors
    ///
    /// - [`TableError::NotConnected`] if the port is closed (nothing written)
    /// - [`TableError::Transport`] if the write or flush fails (port stays open)
    pub fn send_frame(&mut self, frame: &CommandFrame) -> TableResult<()> {
        let Some(link) = self.link.as_mut() else {
            warn!("Not connected to rotary table");
            return Err(TableError::NotConnected);
        };

        self.observer.on_frame(frame);
        link.transmit(frame).inspect_err(|e| {
            warn!("Failed to send {} command: {e}", frame.opcode());
        })
    }

    // ==================== Motion Commands ====================

    /// Rotate continuously at `speed` in `direction` until stopped.
    pub fn run_constant_speed(&mut self, speed: i64, direction: Direction) -> TableResult<()> {
        self.send(Command::Run { speed, direction })
    }

    pub fn run_forward(&mut self, speed: i64) -> TableResult<()> {
        self.run_constant_speed(speed, Direction::Forward)
    }

    pub fn run_reverse(&mut self, speed: i64) -> TableResult<()> {
        self.run_constant_speed(speed, Direction::Reverse)
    }

    /// Move to an absolute `coordinate` at `speed`.
    pub fn move_absolute(&mut self, coordinate: i64, speed: i64) -> TableResult<()> {
        self.send(Command::MoveAbsolute { coordinate, speed })
    }

    /// Move by `steps` (negative moves backwards) at `speed`.
    pub fn move_incremental(&mut self, steps: i64, speed: i64) -> TableResult<()> {
        self.send(Command::MoveIncremental { steps, speed })
    }

    /// Redefine the current position as `coordinate` without moving.
    pub fn set_coordinate(&mut self, coordinate: i64) -> TableResult<()> {
        self.send(Command::SetCoordinate { coordinate })
    }

    /// Stop all motion. This is the only way to abort a command already sent.
    pub fn stop(&mut self) -> TableResult<()> {
        self.send(Command::Stop)
    }

    /// Seek the mechanical zero at `speed`, searching in `direction`.
    pub fn return_to_zero(&mut self, speed: i64, direction: Direction) -> TableResult<()> {
        self.send(Command::ReturnToZero { speed, direction })
    }
}

impl<C: Connector> Drop for RotaryTable<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

//! Host-side driver for motorized rotary tables.
//!
//! The table controller accepts fixed-format binary command frames over a
//! 115200-8-N-1 serial line and never replies. This crate encodes those frames
//! bit-exactly and writes them to the port, one command at a time.
//!
//! # Features
//!
//! - `rotary` (default) - Rotary table protocol and serial driver
//! - `hardware-tests` - Smoke tests against a physical table (set `ROTARY_TABLE_PORT`)
//!
//! # Example
//!
//! ```no_run
//! use rotary_table::table::{Direction, RotaryTable};
//!
//! let mut table = RotaryTable::open("/dev/ttyUSB0")?;
//! table.return_to_zero(10000, Direction::Forward)?;
//! table.move_incremental(-5000, 10000)?;
//! # Ok::<(), rotary_table::table::TableError>(())
//! ```

#[cfg(feature = "rotary")]
pub mod table;

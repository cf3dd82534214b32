//! Error types for rotary table communication.

use thiserror::Error;

/// Errors that can occur while encoding or sending rotary table commands.
///
/// None of these are fatal to the process. After an `OutOfRange` or
/// `NotConnected` error nothing was written to the port; after a `Transport`
/// error during a send the port stays open and the caller may retry.
#[derive(Error, Debug)]
pub enum TableError {
    /// A numeric parameter does not fit its wire field.
    #[error("{field} {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field (`speed`, `coordinate`, `steps`)
        field: &'static str,
        /// Value that was rejected
        value: i64,
        /// Smallest accepted value
        min: i64,
        /// Largest accepted value
        max: i64,
    },

    /// A command was issued while no serial port is open.
    #[error("Not connected to rotary table")]
    NotConnected,

    /// The serial port could not be opened.
    #[error("Failed to open {port}: {source}")]
    Open {
        /// Port name that was being opened
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Writing or flushing a frame failed.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl TableError {
    /// True for errors raised by the serial channel itself.
    ///
    /// Covers both open failures and write failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, TableError::Open { .. } | TableError::Transport(_))
    }
}

/// Result type for rotary table operations.
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = TableError::OutOfRange {
            field: "speed",
            value: 70000,
            min: 0,
            max: 65535,
        };
        assert_eq!(err.to_string(), "speed 70000 out of range [0, 65535]");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_preserves_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "cable pulled");
        let err = TableError::from(io);
        assert!(err.is_transport());
        assert!(err.source().is_some());
        assert!(err.to_string().contains("cable pulled"));
    }

    #[test]
    fn test_open_error_names_port() {
        let err = TableError::Open {
            port: "/dev/ttyUSB9".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
        };
        assert!(err.is_transport());
        assert!(err.to_string().starts_with("Failed to open /dev/ttyUSB9"));
    }
}

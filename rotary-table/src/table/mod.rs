mod config;
mod driver;
mod encoding;
mod error;
mod frame;
mod link;

pub use config::{ConfigError, DriverConfig, DEFAULT_PORT, DEFAULT_SPEED};
pub use driver::{FrameObserver, RotaryTable, TracingObserver};
pub use encoding::{
    encode_coordinate, encode_speed, encode_steps, MAX_COORDINATE, MAX_SPEED, MIN_COORDINATE,
};
pub use error::{TableError, TableResult};
pub use frame::{
    build_move_absolute, build_move_incremental, build_return_to_zero, build_run_command,
    build_set_coordinate, build_stop, Command, CommandFrame, Direction, Opcode, FOOTER, HEADER,
};
pub use link::{
    Channel, Connector, Link, SerialConnector, SerialSettings, BAUD_RATE, DEFAULT_SETTLE_DELAY,
    DEFAULT_TIMEOUT,
};

//! Command frame layout for the rotary table serial protocol.
//!
//! # Frame Format
//!
//! Every command is a single frame:
//!
//! ```text
//! 55 AA <opcode> <operand bytes...> C3
//! ```
//!
//! The operand layout is fixed per opcode:
//!
//! | Command        | Opcode | Operand                                  | Frame |
//! |----------------|--------|------------------------------------------|-------|
//! | Run            | `0x06` | dir(1) speed(2) 00 00 00                 | 10    |
//! | Move absolute  | `0x07` | speed(2) coordinate(4)                   | 10    |
//! | Move relative  | `0x08` | speed(2) steps(4)                        | 10    |
//! | Set coordinate | `0x09` | coordinate(4)                            | 8     |
//! | Stop           | `0x02` | 00 00 00 00 00 00                        | 10    |
//! | Return to zero | `0x0B` | dir(1) speed(2) 00 00 00                 | 10    |
//!
//! Multi-byte fields are little-endian (see [`encoding`](super::encoding)).
//! The device sends no reply frames.
//!
//! # Example
//!
//! ```
//! use rotary_table::table::{build_run_command, Direction};
//!
//! let frame = build_run_command(10000, Direction::Forward)?;
//! assert_eq!(
//!     frame.as_bytes(),
//!     &[0x55, 0xAA, 0x06, 0x09, 0x10, 0x27, 0x00, 0x00, 0x00, 0xC3]
//! );
//! # Ok::<(), rotary_table::table::TableError>(())
//! ```

use std::fmt;

use clap::ValueEnum;

use super::encoding::{encode_coordinate, encode_speed, encode_steps};
use super::error::TableResult;

/// Two-byte frame header.
pub const HEADER: [u8; 2] = [0x55, 0xAA];

/// One-byte frame footer.
pub const FOOTER: u8 = 0xC3;

/// Header + opcode + footer.
const FRAME_OVERHEAD: usize = HEADER.len() + 2;

/// Zero padding after direction+speed in run-class frames.
const RESERVED_RUN: [u8; 3] = [0x00; 3];

/// Zero payload of the stop frame.
const RESERVED_STOP: [u8; 6] = [0x00; 6];

/// Rotation direction with its wire code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, strum::EnumIter, strum::Display,
)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Forward = 0x09,
    Reverse = 0x0A,
}

impl Direction {
    /// Byte sent on the wire for this direction.
    pub fn wire_code(self) -> u8 {
        self as u8
    }
}

/// Operation selector byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[repr(u8)]
pub enum Opcode {
    Stop = 0x02,
    Run = 0x06,
    MoveAbsolute = 0x07,
    MoveIncremental = 0x08,
    SetCoordinate = 0x09,
    ReturnToZero = 0x0B,
}

impl Opcode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Number of operand bytes carried by frames with this opcode.
    pub fn operand_len(self) -> usize {
        match self {
            Opcode::SetCoordinate => 4,
            Opcode::Stop
            | Opcode::Run
            | Opcode::MoveAbsolute
            | Opcode::MoveIncremental
            | Opcode::ReturnToZero => 6,
        }
    }

    /// Total frame length on the wire for this opcode.
    pub fn frame_len(self) -> usize {
        FRAME_OVERHEAD + self.operand_len()
    }
}

/// A fully encoded command frame, ready to be written to the port.
///
/// Frames can only be produced by the `build_*` functions (or
/// [`Command::encode`]), so every frame has already passed range validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    opcode: Opcode,
    bytes: Vec<u8>,
}

impl CommandFrame {
    fn new(opcode: Opcode, operand: &[u8]) -> Self {
        debug_assert_eq!(operand.len(), opcode.operand_len());

        let mut bytes = Vec::with_capacity(opcode.frame_len());
        bytes.extend_from_slice(&HEADER);
        bytes.push(opcode.code());
        bytes.extend_from_slice(operand);
        bytes.push(FOOTER);

        Self { opcode, bytes }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Operand bytes between the opcode and the footer.
    pub fn operand(&self) -> &[u8] {
        &self.bytes[HEADER.len() + 1..self.bytes.len() - 1]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Formats as space-separated `0xNN` bytes, e.g. `0x55 0xAA 0x02 ...`.
impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "0x{b:02X}")?;
        }
        Ok(())
    }
}

/// Build a run-at-constant-speed frame (opcode `0x06`).
pub fn build_run_command(speed: i64, direction: Direction) -> TableResult<CommandFrame> {
    let speed = encode_speed(speed)?;
    Ok(CommandFrame::new(
        Opcode::Run,
        &direction_speed_operand(direction, speed),
    ))
}

/// Build a move-to-absolute-position frame (opcode `0x07`).
pub fn build_move_absolute(coordinate: i64, speed: i64) -> TableResult<CommandFrame> {
    let speed = encode_speed(speed)?;
    let coordinate = encode_coordinate(coordinate)?;
    Ok(CommandFrame::new(
        Opcode::MoveAbsolute,
        &speed_position_operand(speed, coordinate),
    ))
}

/// Build a move-by-relative-steps frame (opcode `0x08`).
pub fn build_move_incremental(steps: i64, speed: i64) -> TableResult<CommandFrame> {
    let speed = encode_speed(speed)?;
    let steps = encode_steps(steps)?;
    Ok(CommandFrame::new(
        Opcode::MoveIncremental,
        &speed_position_operand(speed, steps),
    ))
}

/// Build a set-current-coordinate frame (opcode `0x09`).
pub fn build_set_coordinate(coordinate: i64) -> TableResult<CommandFrame> {
    let coordinate = encode_coordinate(coordinate)?;
    Ok(CommandFrame::new(Opcode::SetCoordinate, &coordinate))
}

/// Build the stop frame (opcode `0x02`). Has no parameters and cannot fail.
pub fn build_stop() -> CommandFrame {
    CommandFrame::new(Opcode::Stop, &RESERVED_STOP)
}

/// Build a return-to-mechanical-zero frame (opcode `0x0B`).
pub fn build_return_to_zero(speed: i64, direction: Direction) -> TableResult<CommandFrame> {
    let speed = encode_speed(speed)?;
    Ok(CommandFrame::new(
        Opcode::ReturnToZero,
        &direction_speed_operand(direction, speed),
    ))
}

fn direction_speed_operand(direction: Direction, speed: [u8; 2]) -> [u8; 6] {
    let mut operand = [0u8; 6];
    operand[0] = direction.wire_code();
    operand[1..3].copy_from_slice(&speed);
    operand[3..].copy_from_slice(&RESERVED_RUN);
    operand
}

fn speed_position_operand(speed: [u8; 2], position: [u8; 4]) -> [u8; 6] {
    let mut operand = [0u8; 6];
    operand[..2].copy_from_slice(&speed);
    operand[2..].copy_from_slice(&position);
    operand
}

/// A motion request with its parameters, before encoding.
///
/// Useful when the operation is chosen at runtime (e.g. from the CLI) and
/// the frame should be inspected or logged before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run { speed: i64, direction: Direction },
    MoveAbsolute { coordinate: i64, speed: i64 },
    MoveIncremental { steps: i64, speed: i64 },
    SetCoordinate { coordinate: i64 },
    Stop,
    ReturnToZero { speed: i64, direction: Direction },
}

impl Command {
    /// Validate parameters and produce the wire frame.
    pub fn encode(&self) -> TableResult<CommandFrame> {
        match *self {
            Command::Run { speed, direction } => build_run_command(speed, direction),
            Command::MoveAbsolute { coordinate, speed } => build_move_absolute(coordinate, speed),
            Command::MoveIncremental { steps, speed } => build_move_incremental(steps, speed),
            Command::SetCoordinate { coordinate } => build_set_coordinate(coordinate),
            Command::Stop => Ok(build_stop()),
            Command::ReturnToZero { speed, direction } => build_return_to_zero(speed, direction),
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Run { .. } => Opcode::Run,
            Command::MoveAbsolute { .. } => Opcode::MoveAbsolute,
            Command::MoveIncremental { .. } => Opcode::MoveIncremental,
            Command::SetCoordinate { .. } => Opcode::SetCoordinate,
            Command::Stop => Opcode::Stop,
            Command::ReturnToZero { .. } => Opcode::ReturnToZero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;
    use strum::IntoEnumIterator;

    #[test]
    fn test_direction_wire_codes() {
        assert_eq!(Direction::Forward.wire_code(), 0x09);
        assert_eq!(Direction::Reverse.wire_code(), 0x0A);
        assert_eq!(Direction::default(), Direction::Forward);

        let codes: Vec<u8> = Direction::iter().map(Direction::wire_code).collect();
        assert_eq!(codes, vec![0x09, 0x0A]);
    }

    #[test]
    fn test_run_forward_frame() {
        let frame = build_run_command(10000, Direction::Forward).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x06, 0x09, 0x10, 0x27, 0x00, 0x00, 0x00, 0xC3]
        );
    }

    #[test]
    fn test_run_reverse_frame() {
        let frame = build_run_command(10000, Direction::Reverse).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x06, 0x0A, 0x10, 0x27, 0x00, 0x00, 0x00, 0xC3]
        );
    }

    #[test]
    fn test_move_absolute_frame() {
        let frame = build_move_absolute(10000, 10000).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x07, 0x10, 0x27, 0x10, 0x27, 0x00, 0x00, 0xC3]
        );
    }

    #[test]
    fn test_move_absolute_negative_coordinate() {
        let frame = build_move_absolute(-10000, 500).unwrap();
        // 500 = 0x01F4, -10000 = 0xFFFFD8F0
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x07, 0xF4, 0x01, 0xF0, 0xD8, 0xFF, 0xFF, 0xC3]
        );
    }

    #[test]
    fn test_move_incremental_frame() {
        let frame = build_move_incremental(5000, 10000).unwrap();
        // 5000 = 0x1388
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x08, 0x10, 0x27, 0x88, 0x13, 0x00, 0x00, 0xC3]
        );

        let back = build_move_incremental(-5000, 10000).unwrap();
        assert_eq!(back.operand(), &[0x10, 0x27, 0x78, 0xEC, 0xFF, 0xFF]);
    }

    #[test]
    fn test_set_coordinate_frames() {
        let frame = build_set_coordinate(-1).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x09, 0xFF, 0xFF, 0xFF, 0xFF, 0xC3]
        );

        let zero = build_set_coordinate(0).unwrap();
        assert_eq!(zero.as_bytes(), &[0x55, 0xAA, 0x09, 0, 0, 0, 0, 0xC3]);

        // 15000 = 0x3A98
        let frame = build_set_coordinate(15000).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x55, 0xAA, 0x09, 0x98, 0x3A, 0x00, 0x00, 0xC3]
        );
    }

    #[test]
    fn test_stop_frame() {
        assert_eq!(
            build_stop().as_bytes(),
            &[0x55, 0xAA, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC3]
        );
        // Independent of whatever was built before
        let _ = build_run_command(65535, Direction::Reverse).unwrap();
        assert_eq!(build_stop(), build_stop());
    }

    #[test]
    fn test_return_to_zero_frames() {
        let fwd = build_return_to_zero(10000, Direction::Forward).unwrap();
        assert_eq!(
            fwd.as_bytes(),
            &[0x55, 0xAA, 0x0B, 0x09, 0x10, 0x27, 0x00, 0x00, 0x00, 0xC3]
        );
        let rev = build_return_to_zero(10000, Direction::Reverse).unwrap();
        assert_eq!(rev.operand()[0], 0x0A);
    }

    #[test]
    fn test_frame_lengths_match_opcode() {
        for opcode in Opcode::iter() {
            let expected = if opcode == Opcode::SetCoordinate { 8 } else { 10 };
            assert_eq!(opcode.frame_len(), expected, "{opcode}");
        }

        let frames = [
            build_run_command(1, Direction::Forward).unwrap(),
            build_move_absolute(1, 1).unwrap(),
            build_move_incremental(1, 1).unwrap(),
            build_set_coordinate(1).unwrap(),
            build_stop(),
            build_return_to_zero(1, Direction::Reverse).unwrap(),
        ];
        for frame in &frames {
            assert_eq!(frame.len(), frame.opcode().frame_len());
            assert_eq!(&frame.as_bytes()[..2], &HEADER);
            assert_eq!(frame.as_bytes()[2], frame.opcode().code());
            assert_eq!(*frame.as_bytes().last().unwrap(), FOOTER);
        }
    }

    #[test]
    fn test_invalid_parameters_build_nothing() {
        assert!(matches!(
            build_run_command(-1, Direction::Forward),
            Err(TableError::OutOfRange { field: "speed", .. })
        ));
        assert!(matches!(
            build_move_absolute(0, 65536),
            Err(TableError::OutOfRange { field: "speed", .. })
        ));
        assert!(matches!(
            build_move_absolute(1i64 << 31, 100),
            Err(TableError::OutOfRange {
                field: "coordinate",
                ..
            })
        ));
        assert!(matches!(
            build_move_incremental(-(1i64 << 31) - 1, 100),
            Err(TableError::OutOfRange { field: "steps", .. })
        ));
        assert!(build_set_coordinate(i64::MAX).is_err());
        assert!(build_return_to_zero(70000, Direction::Reverse).is_err());
    }

    #[test]
    fn test_command_encode_matches_builders() {
        let cmd = Command::MoveAbsolute {
            coordinate: 10000,
            speed: 10000,
        };
        assert_eq!(cmd.encode().unwrap(), build_move_absolute(10000, 10000).unwrap());
        assert_eq!(cmd.opcode(), Opcode::MoveAbsolute);
        assert_eq!(Command::Stop.encode().unwrap(), build_stop());
        assert!(Command::SetCoordinate {
            coordinate: i64::MIN
        }
        .encode()
        .is_err());
    }

    #[test]
    fn test_display_hex() {
        let frame = build_set_coordinate(-1).unwrap();
        assert_eq!(
            frame.to_string(),
            "0x55 0xAA 0x09 0xFF 0xFF 0xFF 0xFF 0xC3"
        );
    }
}

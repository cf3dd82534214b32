//! Integer field encoding for rotary table frames.
//!
//! Every multi-byte field on the wire is little-endian. Speeds are unsigned
//! 16-bit, coordinates and step counts are signed 32-bit two's complement.
//! Both encoders take `i64` so that out-of-range requests from callers are
//! rejected here rather than silently truncated.

use super::error::{TableError, TableResult};

/// Largest speed the 16-bit speed field can carry.
pub const MAX_SPEED: i64 = u16::MAX as i64;

/// Smallest coordinate (or step count) the 32-bit field can carry.
pub const MIN_COORDINATE: i64 = i32::MIN as i64;

/// Largest coordinate (or step count) the 32-bit field can carry.
pub const MAX_COORDINATE: i64 = i32::MAX as i64;

/// Encode a speed as 2 little-endian bytes.
///
/// # Errors
///
/// Returns [`TableError::OutOfRange`] if `value` is negative or above 65535.
pub fn encode_speed(value: i64) -> TableResult<[u8; 2]> {
    let speed = u16::try_from(value).map_err(|_| TableError::OutOfRange {
        field: "speed",
        value,
        min: 0,
        max: MAX_SPEED,
    })?;
    Ok(speed.to_le_bytes())
}

/// Encode an absolute coordinate as 4 little-endian two's-complement bytes.
///
/// # Errors
///
/// Returns [`TableError::OutOfRange`] if `value` does not fit in an `i32`.
pub fn encode_coordinate(value: i64) -> TableResult<[u8; 4]> {
    encode_i32_field("coordinate", value)
}

/// Encode a relative step count. Same layout as [`encode_coordinate`].
pub fn encode_steps(value: i64) -> TableResult<[u8; 4]> {
    encode_i32_field("steps", value)
}

fn encode_i32_field(field: &'static str, value: i64) -> TableResult<[u8; 4]> {
    let v = i32::try_from(value).map_err(|_| TableError::OutOfRange {
        field,
        value,
        min: MIN_COORDINATE,
        max: MAX_COORDINATE,
    })?;
    Ok(v.to_le_bytes())
}

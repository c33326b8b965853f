//! Line protocol decoder
//!
//! The device reports one record per line:
//!
//! ```text
//! dx,dy,L,R\n
//! ```
//!
//! - `dx`, `dy` - signed decimal motion deltas (device units since last report)
//! - `L`, `R` - left/right button level, `0` released, nonzero pressed
//!
//! There is no checksum or framing beyond the newline. Anything that does not
//! split into exactly four integers is rejected and the caller drops the line.
//! Integers too large for their field are clamped rather than rejected.

use std::num::IntErrorKind;
use thiserror::Error;

/// Number of comma-separated fields in a valid record.
pub const FIELD_COUNT: usize = 4;

const FIELD_NAMES: [&str; FIELD_COUNT] = ["dx", "dy", "L", "R"];

/// One decoded motion + button record.
///
/// Button levels are kept as received (clamped to `i64`); interpretation as
/// pressed/released happens in [`crate::buttons`]. Motion deltas beyond the
/// `i32` range saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub dx: i32,
    pub dy: i32,
    pub left: i64,
    pub right: i64,
}

impl Frame {
    pub fn new(dx: i32, dy: i32, left: i64, right: i64) -> Self {
        Self { dx, dy, left, right }
    }
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("empty line")]
    Empty,

    #[error("expected 4 fields, got {0}")]
    FieldCount(usize),

    #[error("field {name} is not an integer: {value:?}")]
    InvalidField { name: &'static str, value: String },
}

/// Decode a raw line into a [`Frame`].
///
/// Never panics. Surrounding whitespace (including a trailing `\r`) is
/// ignored, as is whitespace around individual fields.
pub fn decode_line(line: &str) -> Result<Frame, FrameError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(FrameError::Empty);
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(FrameError::FieldCount(fields.len()));
    }

    let mut values = [0i64; FIELD_COUNT];
    for (idx, raw) in fields.iter().enumerate() {
        values[idx] = parse_field(idx, raw)?;
    }

    Ok(Frame::new(
        saturate_i32(values[0]),
        saturate_i32(values[1]),
        values[2],
        values[3],
    ))
}

/// Parse a base-10 integer of any length, clamping to the `i64` range.
fn parse_field(idx: usize, raw: &str) -> Result<i64, FrameError> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Ok(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(FrameError::InvalidField {
                name: FIELD_NAMES[idx],
                value: raw.to_string(),
            }),
        },
    }
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

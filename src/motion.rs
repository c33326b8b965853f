//! Motion scaling (device units → screen pixels)

use serde::{Deserialize, Serialize};

/// How a scaled delta is converted back to whole pixels.
///
/// `Truncate` drops the fractional part (toward zero). With a non-integral
/// scale factor this silently loses sub-pixel motion; nothing is carried
/// over to the next frame in either mode.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MotionRounding {
    #[default]
    Truncate,
    Nearest,
}

impl MotionRounding {
    fn apply(self, value: f64) -> i32 {
        let value = match self {
            MotionRounding::Truncate => value.trunc(),
            MotionRounding::Nearest => value.round(),
        };
        // `as` saturates at the i32 bounds and maps NaN to 0
        value as i32
    }
}

/// Scale a raw `(dx, dy)` pair.
///
/// Returns `None` when both scaled deltas are zero, in which case no motion
/// should be injected.
pub fn scale_delta(dx: i32, dy: i32, scale: f64, rounding: MotionRounding) -> Option<(i32, i32)> {
    let sx = rounding.apply(f64::from(dx) * scale);
    let sy = rounding.apply(f64::from(dy) * scale);

    if sx == 0 && sy == 0 {
        None
    } else {
        Some((sx, sy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_scale() {
        assert_eq!(scale_delta(3, -2, 2.0, MotionRounding::Truncate), Some((6, -4)));
        assert_eq!(scale_delta(5, 0, 1.0, MotionRounding::Truncate), Some((5, 0)));
    }

    #[test]
    fn test_zero_motion_is_none() {
        assert_eq!(scale_delta(0, 0, 1.0, MotionRounding::Truncate), None);
        assert_eq!(scale_delta(0, 0, 3.5, MotionRounding::Nearest), None);
    }

    #[test]
    fn test_truncation_toward_zero() {
        assert_eq!(scale_delta(3, -3, 0.5, MotionRounding::Truncate), Some((1, -1)));
        // Sub-pixel motion vanishes entirely
        assert_eq!(scale_delta(1, -1, 0.5, MotionRounding::Truncate), None);
    }

    #[test]
    fn test_nearest_rounding() {
        assert_eq!(scale_delta(3, -3, 0.5, MotionRounding::Nearest), Some((2, -2)));
        assert_eq!(scale_delta(1, 0, 0.4, MotionRounding::Nearest), None);
    }

    #[test]
    fn test_saturates_instead_of_overflowing() {
        assert_eq!(
            scale_delta(i32::MAX, i32::MIN, 4.0, MotionRounding::Truncate),
            Some((i32::MAX, i32::MIN))
        );
    }

    #[test]
    fn test_negative_scale_inverts() {
        assert_eq!(scale_delta(2, -5, -1.0, MotionRounding::Truncate), Some((-2, 5)));
    }
}

//! Common time helpers for tripmode_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

pub use tripmode_config::expected_count;

/// Convert seconds to microseconds, rounded to the nearest whole
/// microsecond. Negative or non-finite input maps to 0.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn secs_to_micros(secs: f64) -> u64 {
    if !(secs.is_finite() && secs > 0.0) {
        return 0;
    }
    (secs * MICROS_PER_SEC as f64).round() as u64
}

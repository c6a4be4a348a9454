//! PatchMaster timestamps.
//!
//! PatchMaster stores times as seconds on its own epoch. The conversion below
//! includes an empirical correction term and has not been verified against
//! PatchMaster's own display.

use chrono::{DateTime, Utc};

/// Offset PatchMaster adds to its stored times (seconds since 1990-01-01 on
/// a 1904 based clock).
pub const JAN_FIRST_1990: f64 = 1_580_970_496.0;

/// Seconds between 1904-01-01 and 1970-01-01.
pub const MAC_EPOCH_TO_UNIX: f64 = 2_082_844_800.0;

const CORRECTION: f64 = 16_096.0;

/// Convert PatchMaster seconds to seconds since the Unix epoch.
pub fn unix_seconds(time: f64) -> f64 {
    time - JAN_FIRST_1990 - MAC_EPOCH_TO_UNIX + CORRECTION
}

/// Convert PatchMaster seconds to a UTC timestamp.
pub fn to_datetime(time: f64) -> Option<DateTime<Utc>> {
    let seconds = unix_seconds(time);
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Seconds from `start` to `time`, both in PatchMaster seconds.
pub fn elapsed(start: f64, time: f64) -> f64 {
    unix_seconds(time) - unix_seconds(start)
}

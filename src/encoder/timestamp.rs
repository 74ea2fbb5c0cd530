//! RFC 3339 timestamps for the syslog TIMESTAMP field.

use chrono::{DateTime, Utc};

use crate::config::TimePrecision;

/// Convert fractional epoch seconds into a UTC instant.
///
/// Sub-second parts are rounded to whole microseconds; an `f64` near the
/// current epoch cannot carry more precision than that. Returns `None` for
/// non-finite or out-of-range input.
pub(crate) fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let mut secs = whole as i64;
    let mut micros = ((seconds - whole) * 1_000_000.0).round() as u32;
    if micros >= 1_000_000 {
        secs = secs.checked_add(1)?;
        micros -= 1_000_000;
    }
    DateTime::from_timestamp(secs, micros * 1_000)
}

/// Render `timestamp` (or the current time when absent or unusable).
///
/// Whole-second output truncates the fraction rather than rounding it.
pub(crate) fn format_timestamp(timestamp: Option<f64>, precision: TimePrecision) -> String {
    timestamp
        .map(|seconds| match precision {
            TimePrecision::Seconds => seconds.floor(),
            _ => seconds,
        })
        .and_then(from_epoch_seconds)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(precision.seconds_format(), false)
}

//! Timestamp parsing for operator-entered redaction ranges.
//!
//! Accepts `SS`, `MM:SS` and `HH:MM:SS`, each with optional fractional
//! seconds, and ranges written as `<start>-<end>`.

use thiserror::Error;

/// Longest recording we accept (24 hours in seconds).
pub const MAX_MEDIA_DURATION_SECS: f64 = 86400.0;

/// Timestamp parsing/validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS(.mmm), MM:SS(.mmm) or SS(.mmm)")]
    InvalidFormat(String),

    #[error("Invalid range '{0}'. Use <start>-<end>")]
    InvalidRange(String),

    #[error("Start time must be before end time")]
    StartNotBeforeEnd,

    #[error("Timestamp exceeds maximum allowed duration ({} hours)", .0 / 3600.0)]
    ExceedsMaxDuration(f64),
}

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use redact_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("2.5").unwrap(), 2.5);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    // Components from least to most significant: seconds, minutes, hours.
    const UNITS: [(&str, f64); 3] = [("seconds", 1.0), ("minutes", 60.0), ("hours", 3600.0)];

    let mut total = 0.0;
    for (part, (name, scale)) in parts.iter().rev().zip(UNITS) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| TimestampError::InvalidValue(name, part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        if !value.is_finite() {
            return Err(TimestampError::InvalidValue(name, part.to_string()));
        }
        total += value * scale;
    }

    if total > MAX_MEDIA_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration(MAX_MEDIA_DURATION_SECS));
    }
    Ok(total)
}

/// Parse `<start>-<end>` into a `(start, end)` pair in seconds.
pub fn parse_time_range(range: &str) -> Result<(f64, f64), TimestampError> {
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| TimestampError::InvalidRange(range.to_string()))?;

    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    if start >= end {
        return Err(TimestampError::StartNotBeforeEnd);
    }
    Ok((start, end))
}

/// Format seconds as `HH:MM:SS`, or `HH:MM:SS.mmm` when fractional.
pub fn format_seconds(total_secs: f64) -> String {
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

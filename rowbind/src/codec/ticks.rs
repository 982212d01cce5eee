//! Tick-based time encodings.
//!
//! Durations and instants are stored as integer counts of 100-nanosecond
//! ticks. Instants count from the Unix epoch (UTC). Durations can also be
//! read from text in the invariant `[-][d.]hh:mm[:ss[.fffffff]]` layout or
//! as a bare day count; instants from RFC 3339 or `SQLite`'s
//! `YYYY-MM-DD HH:MM:SS[.fff]`.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Nanoseconds per tick.
pub const NANOS_PER_TICK: i64 = 100;

const SECONDS_PER_DAY: i64 = 86_400;

/// A time value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicksError {
    /// The value does not fit the target representation.
    #[error("time value out of range")]
    OutOfRange,
    /// A negative tick count was read into an unsigned duration.
    #[error("negative duration of {0} ticks")]
    Negative(i64),
    /// Duration text did not match the invariant layout.
    #[error("invalid duration text `{0}`")]
    InvalidDuration(String),
    /// Timestamp text was neither RFC 3339 nor `SQLite` datetime.
    #[error("invalid timestamp text `{0}`")]
    InvalidTimestamp(String),
}

fn split(ticks: i64) -> (i64, u32) {
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    let sub = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    // rem_euclid keeps `sub` in 0..1e9
    (secs, u32::try_from(sub).unwrap_or(0))
}

fn join(secs: i64, nanos: i64) -> Result<i64, TicksError> {
    secs.checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(nanos / NANOS_PER_TICK))
        .ok_or(TicksError::OutOfRange)
}

/// Duration of `ticks` 100 ns units.
pub fn delta_from_ticks(ticks: i64) -> Result<TimeDelta, TicksError> {
    let (secs, nanos) = split(ticks);
    TimeDelta::new(secs, nanos).ok_or(TicksError::OutOfRange)
}

/// Tick count of `delta`, truncating below 100 ns.
pub fn delta_to_ticks(delta: &TimeDelta) -> Result<i64, TicksError> {
    join(delta.num_seconds(), i64::from(delta.subsec_nanos()))
}

/// Unsigned duration of `ticks` 100 ns units.
pub fn duration_from_ticks(ticks: i64) -> Result<std::time::Duration, TicksError> {
    if ticks < 0 {
        return Err(TicksError::Negative(ticks));
    }
    let (secs, nanos) = split(ticks);
    let secs = u64::try_from(secs).map_err(|_| TicksError::OutOfRange)?;
    Ok(std::time::Duration::new(secs, nanos))
}

/// Tick count of `duration`, truncating below 100 ns.
pub fn duration_to_ticks(duration: &std::time::Duration) -> Result<i64, TicksError> {
    let secs = i64::try_from(duration.as_secs()).map_err(|_| TicksError::OutOfRange)?;
    join(secs, i64::from(duration.subsec_nanos()))
}

/// Instant `ticks` 100 ns units after the Unix epoch.
pub fn timestamp_from_ticks(ticks: i64) -> Result<DateTime<Utc>, TicksError> {
    let (secs, nanos) = split(ticks);
    DateTime::from_timestamp(secs, nanos).ok_or(TicksError::OutOfRange)
}

/// Ticks between the Unix epoch and `instant`.
pub fn timestamp_to_ticks(instant: &DateTime<Utc>) -> Result<i64, TicksError> {
    join(
        instant.timestamp(),
        i64::from(instant.timestamp_subsec_nanos()),
    )
}

/// Parses an instant from RFC 3339 or `SQLite` datetime text. Text without
/// an offset is taken as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TicksError> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TicksError::InvalidTimestamp(text.to_owned()))
}

/// Parses duration text into ticks.
///
/// Accepted: `d`, `hh:mm`, `hh:mm:ss`, `hh:mm:ss.fffffff`, each optionally
/// prefixed by `d.` (days) and `-`. Hours run 0-23, minutes and seconds
/// 0-59, and the fraction has 1 to 7 digits.
pub fn parse_ticks(text: &str) -> Result<i64, TicksError> {
    let invalid = || TicksError::InvalidDuration(text.to_owned());
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let magnitude = if body.contains(':') {
        let (days, clock) = match body.split_once('.') {
            Some((days, clock)) if !days.contains(':') => (number(days, i64::MAX).ok_or_else(invalid)?, clock),
            _ => (0, body),
        };
        clock_ticks(days, clock).ok_or_else(invalid)?
    } else {
        number(body, i64::MAX)
            .and_then(|days| days.checked_mul(SECONDS_PER_DAY * TICKS_PER_SECOND))
            .ok_or_else(invalid)?
    };

    Ok(if negative { -magnitude } else { magnitude })
}

/// Parses duration text into a [`TimeDelta`].
pub fn parse_delta(text: &str) -> Result<TimeDelta, TicksError> {
    delta_from_ticks(parse_ticks(text)?)
}

/// Parses duration text into an unsigned duration.
pub fn parse_duration(text: &str) -> Result<std::time::Duration, TicksError> {
    duration_from_ticks(parse_ticks(text)?)
}

fn clock_ticks(days: i64, clock: &str) -> Option<i64> {
    let mut parts = clock.split(':');
    let hours = number(parts.next()?, 23)?;
    let minutes = number(parts.next()?, 59)?;
    let (seconds, fraction) = match parts.next() {
        Some(last) => match last.split_once('.') {
            Some((secs, frac)) => (number(secs, 59)?, fraction_ticks(frac)?),
            None => (number(last, 59)?, 0),
        },
        None => (0, 0),
    };
    if parts.next().is_some() {
        return None;
    }
    let secs = days
        .checked_mul(SECONDS_PER_DAY)?
        .checked_add(hours * 3_600 + minutes * 60 + seconds)?;
    secs.checked_mul(TICKS_PER_SECOND)?.checked_add(fraction)
}

fn number(digits: &str, max: i64) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().filter(|n| *n <= max)
}

fn fraction_ticks(digits: &str) -> Option<i64> {
    if digits.len() > 7 {
        return None;
    }
    let value = number(digits, i64::MAX)?;
    let scale = 7 - u32::try_from(digits.len()).ok()?;
    Some(value * 10_i64.pow(scale))
}

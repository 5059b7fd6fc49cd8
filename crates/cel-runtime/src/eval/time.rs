//! Timestamp and duration parsing, formatting, and checked arithmetic.

use chrono::DateTime;

use super::value::{Duration, Timestamp};
use super::EvalError;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Parse an RFC 3339 timestamp string.
///
/// Supports formats like:
/// - "2009-02-13T23:31:30Z"
/// - "2009-02-13T23:31:30.123456789Z"
/// - "2009-02-13T23:31:30+01:00"
pub fn parse_timestamp(s: &str) -> Result<Timestamp, EvalError> {
    let dt = DateTime::parse_from_rfc3339(s)
        .map_err(|e| EvalError::invalid_argument(format!("invalid timestamp format: {}", e)))?;

    let ts = Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    };
    if !ts.is_valid() {
        return Err(EvalError::range_error(
            "timestamp out of range: must be between year 0001 and 9999",
        ));
    }
    Ok(ts)
}

/// Parse a CEL duration string such as `100s`, `1.5h`, `1h30m`, `-30s`,
/// `100ms`, `100us`, or `100ns`.
pub fn parse_duration(s: &str) -> Result<Duration, EvalError> {
    let invalid = |msg: String| EvalError::invalid_argument(msg);

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if body.is_empty() {
        return Err(invalid(format!("invalid duration: '{}'", s)));
    }

    let mut total_nanos: i128 = 0;
    let mut remaining = body;
    while !remaining.is_empty() {
        let num_end = remaining
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(remaining.len());
        if num_end == 0 {
            return Err(invalid(format!(
                "invalid duration format: expected number at '{}'",
                remaining
            )));
        }
        let (num_str, rest) = remaining.split_at(num_end);

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        if unit_end == 0 {
            return Err(invalid(format!(
                "invalid duration: missing unit after '{}'",
                num_str
            )));
        }
        let (unit, rest) = rest.split_at(unit_end);
        remaining = rest;

        let multiplier: i128 = match unit {
            "h" => 3_600 * NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "s" => NANOS_PER_SECOND,
            "ms" => 1_000_000,
            "us" | "\u{00b5}s" => 1_000,
            "ns" => 1,
            _ => return Err(invalid(format!("invalid duration unit: '{}'", unit))),
        };

        let nanos = if num_str.contains('.') {
            let num: f64 = num_str
                .parse()
                .map_err(|_| invalid(format!("invalid number in duration: '{}'", num_str)))?;
            (num * multiplier as f64) as i128
        } else {
            let num: i128 = num_str
                .parse()
                .map_err(|_| invalid(format!("invalid number in duration: '{}'", num_str)))?;
            num.checked_mul(multiplier)
                .ok_or_else(|| EvalError::range_error("duration out of range"))?
        };
        total_nanos = total_nanos
            .checked_add(nanos)
            .ok_or_else(|| EvalError::range_error("duration out of range"))?;
    }

    if negative {
        total_nanos = -total_nanos;
    }
    duration_from_nanos(total_nanos)
}

/// Format a timestamp as RFC 3339 with trailing zeros trimmed from the
/// fractional seconds.
pub fn format_timestamp(ts: &Timestamp) -> String {
    let Some(dt) = ts.to_datetime_utc() else {
        return format!("{}s", ts.seconds);
    };
    let nanos = format!("{:09}", ts.nanos);
    let trimmed = nanos.trim_end_matches('0');
    if trimmed.is_empty() {
        dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        format!("{}.{}Z", dt.format("%Y-%m-%dT%H:%M:%S"), trimmed)
    }
}

/// Format a duration as `Xs` or `X.XXXs`.
pub fn format_duration(d: &Duration) -> String {
    let total = d.to_nanos();
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.abs();
    let secs = abs / NANOS_PER_SECOND;
    let frac = abs % NANOS_PER_SECOND;
    if frac == 0 {
        format!("{}{}s", sign, secs)
    } else {
        let frac = format!("{:09}", frac);
        format!("{}{}.{}s", sign, secs, frac.trim_end_matches('0'))
    }
}

fn duration_from_nanos(nanos: i128) -> Result<Duration, EvalError> {
    let d = Duration::from_nanos(nanos);
    if i64::try_from(nanos / NANOS_PER_SECOND).is_err() || !d.is_valid() {
        return Err(EvalError::range_error("duration out of range"));
    }
    Ok(d)
}

fn timestamp_from_nanos(nanos: i128) -> Result<Timestamp, EvalError> {
    let seconds = nanos.div_euclid(NANOS_PER_SECOND);
    let sub = nanos.rem_euclid(NANOS_PER_SECOND) as i32;
    let seconds = i64::try_from(seconds)
        .map_err(|_| EvalError::range_error("timestamp out of range"))?;
    let ts = Timestamp::new(seconds, sub);
    if !ts.is_valid() {
        return Err(EvalError::range_error("timestamp out of range"));
    }
    Ok(ts)
}

fn timestamp_nanos(ts: &Timestamp) -> i128 {
    ts.seconds as i128 * NANOS_PER_SECOND + ts.nanos as i128
}

/// `timestamp + duration`, range checked.
pub fn add_timestamp_duration(ts: &Timestamp, d: &Duration) -> Result<Timestamp, EvalError> {
    timestamp_from_nanos(timestamp_nanos(ts) + d.to_nanos())
}

/// `timestamp - duration`, range checked.
pub fn sub_timestamp_duration(ts: &Timestamp, d: &Duration) -> Result<Timestamp, EvalError> {
    timestamp_from_nanos(timestamp_nanos(ts) - d.to_nanos())
}

/// `timestamp - timestamp`, range checked.
pub fn sub_timestamps(a: &Timestamp, b: &Timestamp) -> Result<Duration, EvalError> {
    duration_from_nanos(timestamp_nanos(a) - timestamp_nanos(b))
}

/// `duration + duration`, range checked.
pub fn add_durations(a: &Duration, b: &Duration) -> Result<Duration, EvalError> {
    duration_from_nanos(a.to_nanos() + b.to_nanos())
}

/// `duration - duration`, range checked.
pub fn sub_durations(a: &Duration, b: &Duration) -> Result<Duration, EvalError> {
    duration_from_nanos(a.to_nanos() - b.to_nanos())
}

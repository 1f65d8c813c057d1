//! Duration Parser
//!
//! Converts human duration expressions ("5m", "1.5 h", "7d") or raw
//! millisecond counts into milliseconds.

use std::time::Duration;

use thiserror::Error;

// == Unit Table ==
const YEAR_MS: f64 = 31_536_000_000.0;
const WEEK_MS: f64 = 604_800_000.0;
const DAY_MS: f64 = 86_400_000.0;
const HOUR_MS: f64 = 3_600_000.0;
const MINUTE_MS: f64 = 60_000.0;
const SECOND_MS: f64 = 1_000.0;

/// (unit, canonical name, milliseconds per unit)
const UNITS: &[(&str, &str, f64)] = &[
    ("years", "years", YEAR_MS),
    ("year", "years", YEAR_MS),
    ("yrs", "years", YEAR_MS),
    ("yr", "years", YEAR_MS),
    ("y", "years", YEAR_MS),
    ("weeks", "weeks", WEEK_MS),
    ("week", "weeks", WEEK_MS),
    ("w", "weeks", WEEK_MS),
    ("days", "days", DAY_MS),
    ("day", "days", DAY_MS),
    ("d", "days", DAY_MS),
    ("hours", "hours", HOUR_MS),
    ("hour", "hours", HOUR_MS),
    ("hrs", "hours", HOUR_MS),
    ("hr", "hours", HOUR_MS),
    ("h", "hours", HOUR_MS),
    ("minutes", "minutes", MINUTE_MS),
    ("minute", "minutes", MINUTE_MS),
    ("mins", "minutes", MINUTE_MS),
    ("min", "minutes", MINUTE_MS),
    ("m", "minutes", MINUTE_MS),
    ("seconds", "seconds", SECOND_MS),
    ("second", "seconds", SECOND_MS),
    ("secs", "seconds", SECOND_MS),
    ("sec", "seconds", SECOND_MS),
    ("s", "seconds", SECOND_MS),
    ("milliseconds", "milliseconds", 1.0),
    ("millisecond", "milliseconds", 1.0),
    ("msecs", "milliseconds", 1.0),
    ("msec", "milliseconds", 1.0),
    ("ms", "milliseconds", 1.0),
];

// == Duration Error ==
/// Errors raised while parsing a duration expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DurationError {
    /// Input was empty or whitespace only
    #[error("Duration expression cannot be empty")]
    Empty,

    /// Input did not look like `<number>[<unit>]`
    #[error("Invalid duration format: {0:?}, expected something like \"1d\", \"2.5h\", \"30min\" or a plain millisecond count")]
    InvalidFormat(String),

    /// Numeric part was not a finite number
    #[error("Invalid number in duration: {0:?}")]
    InvalidNumber(String),

    /// Unit suffix is not in the unit table
    #[error("Unknown time unit {unit:?}, supported units: {supported}")]
    UnknownUnit { unit: String, supported: String },
}

// == Parse ==
/// Parses a duration expression into milliseconds.
///
/// A bare number is taken as milliseconds. Otherwise the number may be
/// followed by optional whitespace and a case-insensitive unit. Negative and
/// fractional values are accepted; fractions are rounded to whole milliseconds.
pub fn parse_duration_ms(expr: &str) -> Result<i64, DurationError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let split = split_number(trimmed);
    let (number, unit) = trimmed.split_at(split);
    if number.is_empty() || number == "-" {
        return Err(DurationError::InvalidFormat(expr.to_string()));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| DurationError::InvalidFormat(expr.to_string()))?;
    if !value.is_finite() {
        return Err(DurationError::InvalidNumber(expr.to_string()));
    }

    let unit = unit.trim_start();
    if unit.is_empty() {
        return Ok(value.round() as i64);
    }
    if !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DurationError::InvalidFormat(expr.to_string()));
    }

    let factor = unit_factor(unit).ok_or_else(|| DurationError::UnknownUnit {
        unit: unit.to_string(),
        supported: supported_units().join(", "),
    })?;

    Ok((value * factor).round() as i64)
}

/// Returns the byte offset where the numeric part of `s` ends.
///
/// Accepts an optional leading `-`, digits, and at most one `.` followed by
/// at least one digit.
fn split_number(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    i
}

fn unit_factor(unit: &str) -> Option<f64> {
    let unit = unit.to_ascii_lowercase();
    UNITS
        .iter()
        .find(|(name, _, _)| *name == unit)
        .map(|(_, _, factor)| *factor)
}

/// Returns true if `expr` parses as a duration.
pub fn is_valid_duration(expr: &str) -> bool {
    parse_duration_ms(expr).is_ok()
}

/// All accepted unit spellings, sorted.
pub fn supported_units() -> Vec<&'static str> {
    let mut units: Vec<&'static str> = UNITS.iter().map(|(name, _, _)| *name).collect();
    units.sort_unstable();
    units
}

/// Canonical name for a unit abbreviation ("hrs" -> "hours").
///
/// Unknown abbreviations are returned unchanged.
pub fn unit_name(abbreviation: &str) -> &str {
    let lower = abbreviation.to_ascii_lowercase();
    UNITS
        .iter()
        .find(|(name, _, _)| *name == lower)
        .map(|(_, canonical, _)| *canonical)
        .unwrap_or(abbreviation)
}

// == TTL Input ==
/// A time-to-live supplied by a caller.
///
/// `None` at the call site, or anything resolving to zero, means the entry
/// never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ttl {
    /// Raw milliseconds
    Millis(i64),
    /// Duration expression such as "5m"
    Expr(String),
}

impl Ttl {
    /// Resolves this TTL to milliseconds.
    pub fn to_millis(&self) -> Result<i64, DurationError> {
        match self {
            Ttl::Millis(ms) => Ok(*ms),
            Ttl::Expr(expr) => parse_duration_ms(expr),
        }
    }
}

impl From<i64> for Ttl {
    fn from(ms: i64) -> Self {
        Ttl::Millis(ms)
    }
}

impl From<&str> for Ttl {
    fn from(expr: &str) -> Self {
        Ttl::Expr(expr.to_string())
    }
}

impl From<String> for Ttl {
    fn from(expr: String) -> Self {
        Ttl::Expr(expr)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Millis(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }
}

//! Per-field-type value coercion
//!
//! Each [`FieldType`] maps to exactly one coercion strategy. Strategies
//! either produce a [`FilterValue`] or fail with a [`ValidationError`]
//! naming the field and raw value; `boolean` is the only one that cannot
//! fail.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use regex::{Captures, Regex};

use crate::error::ValidationError;
use crate::filter::FilterValue;
use crate::schema::{FieldSchema, FieldType};

/// Largest integer magnitude that survives a round trip through an f64
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// `YYYY-MM-DD` with an optional ` HH:MM:SS`
static SQL_DATETIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:\s+(\d{2}):(\d{2}):(\d{2}))?$")
        .expect("SQL datetime regex is valid")
});

/// `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `YYYYMMDD`, or ordinal `YYYY-DDD`
static ISO_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?|(\d{2})(\d{2})|-(\d{3}))?$")
        .expect("ISO date regex is valid")
});

/// `HH[:MM[:SS[.f]]]` or `HH[MM[SS[.f]]]`, then an optional zone designator
static ISO_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{2})(?::(\d{2})(?::(\d{2})(?:[.,](\d{1,9}))?)?|(\d{2})(?:(\d{2})(?:[.,](\d{1,9}))?)?)?(Z|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .expect("ISO time regex is valid")
});

const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];

type Coercer = fn(&str, &str, &FieldSchema) -> Result<FilterValue, ValidationError>;

const fn coercer(field_type: FieldType) -> Coercer {
    match field_type {
        FieldType::Number => coerce_number,
        FieldType::String => coerce_string,
        FieldType::Boolean => coerce_boolean,
        FieldType::Date => coerce_date,
        FieldType::Unix => coerce_unix,
        FieldType::Enum => coerce_enum,
    }
}

/// Coerce a raw query value for `field_name` according to its schema
pub fn coerce(
    value: &str,
    field_name: &str,
    field: &FieldSchema,
) -> Result<FilterValue, ValidationError> {
    coercer(field.field_type)(value, field_name, field)
}

fn coerce_number(value: &str, name: &str, _field: &FieldSchema) -> Result<FilterValue, ValidationError> {
    let trimmed = value.trim();

    if let Ok(n) = trimmed.parse::<i64>() {
        if n.unsigned_abs() > MAX_SAFE_INTEGER.unsigned_abs() {
            return Err(ValidationError::invalid_number(name, value));
        }
        return Ok(FilterValue::Integer(n));
    }

    let n: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::invalid_number(name, value))?;
    if !n.is_finite() || n.abs() > MAX_SAFE_INTEGER as f64 {
        return Err(ValidationError::invalid_number(name, value));
    }

    if n.fract() == 0.0 {
        Ok(FilterValue::Integer(n as i64))
    } else {
        Ok(FilterValue::Float(n))
    }
}

fn coerce_boolean(value: &str, _name: &str, _field: &FieldSchema) -> Result<FilterValue, ValidationError> {
    let lowered = value.to_lowercase();
    Ok(FilterValue::Boolean(TRUTHY.contains(&lowered.as_str())))
}

fn coerce_string(value: &str, name: &str, field: &FieldSchema) -> Result<FilterValue, ValidationError> {
    if let Some(allowed) = &field.enum_values {
        ensure_allowed(value, name, allowed)?;
    }
    Ok(FilterValue::String(value.to_string()))
}

fn coerce_enum(value: &str, name: &str, field: &FieldSchema) -> Result<FilterValue, ValidationError> {
    ensure_allowed(value, name, field.enum_values.as_deref().unwrap_or_default())?;
    Ok(FilterValue::String(value.to_string()))
}

fn ensure_allowed(value: &str, name: &str, allowed: &[String]) -> Result<(), ValidationError> {
    if allowed.iter().any(|candidate| candidate == value) {
        Ok(())
    } else {
        Err(ValidationError::invalid_value(name, value, allowed))
    }
}

fn coerce_date(value: &str, name: &str, _field: &FieldSchema) -> Result<FilterValue, ValidationError> {
    let parsed = if SQL_DATETIME_REGEX.is_match(value) {
        parse_sql_datetime(value)
    } else {
        parse_iso_datetime(value)
    };

    parsed
        .map(FilterValue::DateTime)
        .map_err(|reason| ValidationError::invalid_date(name, value, reason))
}

fn coerce_unix(value: &str, name: &str, _field: &FieldSchema) -> Result<FilterValue, ValidationError> {
    let seconds: i64 = value.trim().parse().map_err(|_| {
        ValidationError::invalid_timestamp(name, value, "not an integer number of seconds")
    })?;

    DateTime::from_timestamp(seconds, 0)
        .map(|dt| FilterValue::DateTime(dt.fixed_offset()))
        .ok_or_else(|| ValidationError::invalid_timestamp(name, value, "timestamp is out of range"))
}

/// Date and optional time separated by whitespace, read as UTC
fn parse_sql_datetime(value: &str) -> Result<DateTime<FixedOffset>, String> {
    let mut parts = value.split_whitespace();
    let date = parts.next().unwrap_or_default();
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| e.to_string())?;

    let time = match parts.next() {
        Some(time) => NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|e| e.to_string())?,
        None => NaiveTime::MIN,
    };

    Ok(date.and_time(time).and_utc().fixed_offset())
}

/// ISO-8601 in extended or basic format
///
/// Covers calendar and ordinal dates, reduced precision (`2024-03`,
/// `2024-03-01T13`), fractional seconds, and `Z` or `±HH[[:]MM]` offsets.
/// Input without an offset is read as UTC.
fn parse_iso_datetime(value: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    let (date, time) = match value.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (value, None),
    };
    let date = parse_iso_date(date)?;

    let Some(time) = time else {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    };
    let (time, offset) = parse_iso_time(time)?;
    let naive = date.and_time(time);

    match offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| "date-time is out of range".to_string()),
        None => Ok(naive.and_utc().fixed_offset()),
    }
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate, String> {
    let caps = ISO_DATE_REGEX
        .captures(raw)
        .ok_or_else(|| format!("unsupported ISO-8601 date `{raw}`"))?;
    let year = capture_u32(&caps, 1).unwrap_or_default() as i32;

    let date = match capture_u32(&caps, 6) {
        Some(ordinal) => NaiveDate::from_yo_opt(year, ordinal),
        None => NaiveDate::from_ymd_opt(
            year,
            capture_u32(&caps, 2).or(capture_u32(&caps, 4)).unwrap_or(1),
            capture_u32(&caps, 3).or(capture_u32(&caps, 5)).unwrap_or(1),
        ),
    };
    date.ok_or_else(|| "date is out of range".to_string())
}

fn parse_iso_time(raw: &str) -> Result<(NaiveTime, Option<FixedOffset>), String> {
    let caps = ISO_TIME_REGEX
        .captures(raw)
        .ok_or_else(|| format!("unsupported ISO-8601 time `{raw}`"))?;

    let nanos = caps
        .get(4)
        .or(caps.get(7))
        .map_or(0, |fraction| format!("{:0<9}", fraction.as_str()).parse().unwrap_or(0));
    let time = NaiveTime::from_hms_nano_opt(
        capture_u32(&caps, 1).unwrap_or_default(),
        capture_u32(&caps, 2).or(capture_u32(&caps, 5)).unwrap_or(0),
        capture_u32(&caps, 3).or(capture_u32(&caps, 6)).unwrap_or(0),
        nanos,
    )
    .ok_or("time is out of range")?;

    let offset = caps.get(8).map(|zone| parse_offset(zone.as_str())).transpose()?;
    Ok((time, offset))
}

/// `Z`, `±HH`, `±HHMM`, or `±HH:MM`
fn parse_offset(raw: &str) -> Result<FixedOffset, String> {
    if raw == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| "offset is out of range".to_string());
    }

    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(..2).and_then(|h| h.parse().ok()).unwrap_or_default();
    let minutes: i32 = digits.get(2..).and_then(|m| m.parse().ok()).unwrap_or_default();

    if minutes >= 60 {
        return Err(format!("offset `{raw}` is out of range"));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset `{raw}` is out of range"))
}

fn capture_u32(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

//! Filter value coercion.
//!
//! Raw values arrive from URL state as strings or numbers. Each column's
//! configured type decides how they become typed SQL operands. Values that
//! fail to parse are dropped one by one; a filter whose list ends up empty
//! is dropped as a whole by the caller.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::Value;
use std::fmt;
use thiserror::Error;

use super::config::{BooleanParser, ColumnType};
use super::types::RawValue;

/// Datetime layouts accepted without an offset; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A typed filter operand.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterScalar {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl fmt::Display for FilterScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterScalar::Text(s) => f.write_str(s),
            FilterScalar::Number(n) => write!(f, "{n}"),
            FilterScalar::Boolean(b) => write!(f, "{b}"),
            FilterScalar::Date(d) => f.write_str(&d.to_rfc3339()),
        }
    }
}

impl From<FilterScalar> for Value {
    fn from(scalar: FilterScalar) -> Self {
        match scalar {
            FilterScalar::Text(s) => s.into(),
            FilterScalar::Number(n) => n.into(),
            FilterScalar::Boolean(b) => b.into(),
            FilterScalar::Date(d) => d.into(),
        }
    }
}

/// Every value of a filter was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no filter value survived coercion")]
pub struct Dropped;

/// Coerce raw values for a column of type `ty`.
pub fn coerce_values(
    ty: ColumnType,
    bool_parser: Option<BooleanParser>,
    raw: &[RawValue],
) -> Result<Vec<FilterScalar>, Dropped> {
    let values: Vec<FilterScalar> = raw
        .iter()
        .filter_map(|value| {
            let coerced = coerce_one(ty, bool_parser, value);
            if coerced.is_none() {
                tracing::trace!(value = %value, column_type = ?ty, "dropping unparseable filter value");
            }
            coerced
        })
        .collect();

    if values.is_empty() {
        Err(Dropped)
    } else {
        Ok(values)
    }
}

fn coerce_one(
    ty: ColumnType,
    bool_parser: Option<BooleanParser>,
    value: &RawValue,
) -> Option<FilterScalar> {
    match ty {
        ColumnType::Text => Some(FilterScalar::Text(value.to_string())),
        ColumnType::Number => parse_number(value).map(FilterScalar::Number),
        ColumnType::Date => parse_date(value).map(FilterScalar::Date),
        ColumnType::Boolean => match bool_parser {
            Some(parser) => parser(value),
            None => parse_bool(value),
        }
        .map(FilterScalar::Boolean),
    }
}

/// Numeric coercion with JavaScript `Number()` semantics for blanks:
/// an empty or all-whitespace string is zero. Non-finite results are dropped.
pub fn parse_number(value: &RawValue) -> Option<f64> {
    let n = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
    };
    n.is_finite().then_some(n)
}

/// Date coercion.
///
/// Numbers are epoch milliseconds. Strings may be RFC 3339, a naive
/// datetime (taken as UTC), or a bare `YYYY-MM-DD` date at midnight UTC.
pub fn parse_date(value: &RawValue) -> Option<DateTime<Utc>> {
    match value {
        RawValue::Number(ms) => {
            if !ms.is_finite() {
                return None;
            }
            DateTime::from_timestamp_millis(*ms as i64)
        }
        RawValue::Text(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for format in NAIVE_DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(dt.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        }
    }
}

/// Default boolean coercion: `true`/`1` and `false`/`0`, case-insensitive.
/// Only strings are recognized.
pub fn parse_bool(value: &RawValue) -> Option<bool> {
    let RawValue::Text(s) = value else {
        return None;
    };
    match s.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

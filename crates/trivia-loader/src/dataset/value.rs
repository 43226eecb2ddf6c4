//! Cell values carried by a [`Dataset`](super::Dataset).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};

use crate::typemap::ColumnType;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone.
    TimestampTz(DateTime<FixedOffset>),
    Interval(Duration),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may be stored in a column of the given type.
    ///
    /// NULL fits every column; unrecognised column types accept anything.
    pub fn fits(&self, column_type: &ColumnType) -> bool {
        match (self, column_type) {
            (Value::Null, _) | (_, ColumnType::Other(_)) => true,
            (Value::Bool(_), ColumnType::Bool) => true,
            (Value::I32(_), ColumnType::Int32 | ColumnType::Int64) => true,
            (Value::I64(_), ColumnType::Int64) => true,
            (Value::F32(_), ColumnType::Float32 | ColumnType::Float64) => true,
            (Value::F64(_), ColumnType::Float64) => true,
            (Value::Text(_), ColumnType::Text) => true,
            (Value::Timestamp(_), ColumnType::Timestamp) => true,
            (Value::TimestampTz(_), ColumnType::TimestampTz) => true,
            (Value::Interval(_), ColumnType::Interval) => true,
            _ => false,
        }
    }

    /// Text form handed to PostgreSQL as a `text` parameter.
    ///
    /// The statement casts it to the column type server-side, so the text
    /// must be in a form PostgreSQL's input functions accept.
    pub fn to_param(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { "t" } else { "f" }.to_string()),
            Value::I32(n) => Some(n.to_string()),
            Value::I64(n) => Some(n.to_string()),
            Value::F32(n) => Some(float_param(*n as f64, n.to_string())),
            Value::F64(n) => Some(float_param(*n, n.to_string())),
            Value::Text(s) => Some(s.clone()),
            Value::Timestamp(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()),
            Value::TimestampTz(dt) => Some(dt.to_rfc3339()),
            Value::Interval(d) => Some(interval_param(d)),
        }
    }

    /// Compare two values of the same kind. Integers and floats compare
    /// numerically across widths; anything else across kinds is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::TimestampTz(a), Value::TimestampTz(b)) => Some(a.cmp(b)),
            (Value::Interval(a), Value::Interval(b)) => Some(a.cmp(b)),
            (Value::I32(_) | Value::I64(_), Value::I32(_) | Value::I64(_)) => {
                Some(self.as_i64()?.cmp(&other.as_i64()?))
            }
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(n) => Some(*n as i64),
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I32(n) => Some(*n as f64),
            Value::I64(n) => Some(*n as f64),
            Value::F32(n) => Some(*n as f64),
            Value::F64(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_param() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

// float8in rejects Rust's "inf" spelling on older servers.
fn float_param(n: f64, text: String) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() && n > 0.0 {
        "Infinity".to_string()
    } else if n.is_infinite() {
        "-Infinity".to_string()
    } else {
        text
    }
}

fn interval_param(d: &Duration) -> String {
    match d.num_microseconds() {
        Some(us) => format!("{} microseconds", us),
        None => format!("{} milliseconds", d.num_milliseconds()),
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Interval(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

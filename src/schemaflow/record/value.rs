//! Scalar values carried by records.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A single value in a record.
///
/// This enum covers every column type the engine supports. Values are
/// immutable; transforms produce new records rather than mutating existing
/// ones. `Time` carries the instant as epoch milliseconds together with the
/// timezone it was observed in; the zone is presentation metadata, so two
/// `Time` values for the same instant compare equal regardless of zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit floating point number
    Double(f64),
    /// Boolean value (true/false)
    Boolean(bool),
    /// UTF-8 string
    String(String),
    /// Instant in epoch milliseconds, plus the timezone it belongs to
    Time(i64, Tz),
    /// Raw byte payload
    Bytes(Vec<u8>),
    /// Missing value; only valid in columns declared nullable
    Null,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Same instant, any zone
            (Value::Time(a, _), Value::Time(b, _)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// Hash implementation for `Value`, consistent with its `PartialEq`.
///
/// `Double` hashes its bit representation so that NaN and infinities can be
/// hashed at all; `Time` hashes the epoch value only, matching equality.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Long(l) => l.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::String(s) => s.hash(state),
            Value::Time(millis, _) => millis.hash(state),
            Value::Bytes(bytes) => bytes.hash(state),
            Value::Null => {}
        }
    }
}

impl Value {
    /// Get the type name for error messages and debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Long(_) => "LONG",
            Value::Double(_) => "DOUBLE",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Time(_, _) => "TIME",
            Value::Bytes(_) => "BYTES",
            Value::Null => "NULL",
        }
    }

    /// Check if this value is a numeric type (integer, long or double).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::Long(_) | Value::Double(_)
        )
    }

    /// Convert to a 32-bit integer if the value can represent one.
    ///
    /// Longs outside the `i32` range and unparseable strings return `None`;
    /// doubles truncate toward zero.
    pub fn to_int(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Long(l) => i32::try_from(*l).ok(),
            Value::Double(d) => Some(*d as i32),
            Value::Boolean(b) => Some(i32::from(*b)),
            Value::String(s) => s.parse::<i32>().ok(),
            Value::Time(_, _) | Value::Bytes(_) | Value::Null => None,
        }
    }

    /// Convert to a 64-bit integer if the value can represent one.
    ///
    /// `Time` converts to its epoch millisecond value.
    pub fn to_long(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            Value::Double(d) => Some(*d as i64),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Time(millis, _) => Some(*millis),
            Value::Bytes(_) | Value::Null => None,
        }
    }

    /// Convert to a double if the value can represent one.
    pub fn to_double(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(f64::from(*i)),
            Value::Long(l) => Some(*l as f64),
            Value::Double(d) => Some(*d),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Time(millis, _) => Some(*millis as f64),
            Value::Bytes(_) | Value::Null => None,
        }
    }

    /// Convert to a boolean if the value can represent one.
    pub fn to_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::Long(l) => Some(*l != 0),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Render this value as a stable string suitable for use as a grouping key.
    ///
    /// Unlike `Display`, time values render as their raw epoch milliseconds so
    /// that keys do not depend on zone formatting.
    pub fn to_key_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Long(l) => l.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Time(millis, _) => millis.to_string(),
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(2 * bytes.len());
                for byte in bytes {
                    out.push_str(&format!("{:02x}", byte));
                }
                out
            }
            Value::Null => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Time(millis, tz) => match DateTime::from_timestamp_millis(*millis) {
                Some(utc) => write!(
                    f,
                    "{}",
                    utc.with_timezone(tz).format("%Y-%m-%d %H:%M:%S%.3f %Z")
                ),
                None => write!(f, "{}ms", millis),
            },
            Value::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::Null => write!(f, "NULL"),
        }
    }
}

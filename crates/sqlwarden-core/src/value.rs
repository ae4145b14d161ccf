//! Runtime values exchanged with the database driver.
//!
//! `Value` is the closed set of scalar values SQLWarden binds as command
//! parameters, receives back from scalar queries (last-insert-id, existence
//! probes), and stores in tracked `Record` instances.
//!
//! Temporal values are integer-backed: `Date` counts days since the Unix
//! epoch, `Time` and `Timestamp` count microseconds.

use serde::{Deserialize, Serialize};

use crate::types::SqlType;

/// The nil UUID, treated as the "unset" value for UUID properties.
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// A database value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 8-bit integer.
    TinyInt(i8),
    /// 16-bit integer.
    SmallInt(i16),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    BigInt(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Exact decimal, kept as its textual form.
    Decimal(String),
    /// Text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
    /// UUID in canonical textual form.
    Uuid(String),
}

impl Value {
    /// Whether this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the inner string for text-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Decimal(s) | Value::Uuid(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Widen integral values to `i64` where that is lossless.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(i) => Some(i64::from(*i)),
            Value::SmallInt(i) => Some(i64::from(*i)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this value is the type's zero/default value.
    ///
    /// Runtime-default rules only supply a value when the current value is
    /// unset: NULL, numeric zero, an empty or blank string, the day-zero
    /// date, a zero timestamp, or the nil UUID. An explicitly set value is
    /// never overwritten.
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(_) => false,
            Value::TinyInt(i) => *i == 0,
            Value::SmallInt(i) => *i == 0,
            Value::Int(i) => *i == 0,
            Value::BigInt(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Double(f) => *f == 0.0,
            Value::Decimal(s) => s.trim().is_empty(),
            Value::Text(s) => s.trim().is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Date(d) => *d == 0,
            Value::Time(t) => *t == 0,
            Value::Timestamp(ts) => *ts == 0,
            Value::Uuid(u) => u.is_empty() || u == NIL_UUID,
        }
    }

    /// Convert an integral value into the representation declared for a key
    /// column, widening where needed.
    ///
    /// Used when a dialect's last-insert-id query returns a different
    /// integral width than the declared key type. Returns `None` when the
    /// value is not integral or the target type is not integral.
    pub fn widen_to(&self, target: SqlType) -> Option<Value> {
        let n = self.as_i64()?;
        match target {
            SqlType::TinyInt => i8::try_from(n).ok().map(Value::TinyInt),
            SqlType::SmallInt => i16::try_from(n).ok().map(Value::SmallInt),
            SqlType::Int => i32::try_from(n).ok().map(Value::Int),
            SqlType::BigInt => Some(Value::BigInt(n)),
            _ => None,
        }
    }

    /// The natural `SqlType` of this value, if it has one.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(SqlType::Bool),
            Value::TinyInt(_) => Some(SqlType::TinyInt),
            Value::SmallInt(_) => Some(SqlType::SmallInt),
            Value::Int(_) => Some(SqlType::Int),
            Value::BigInt(_) => Some(SqlType::BigInt),
            Value::Float(_) => Some(SqlType::Float),
            Value::Double(_) => Some(SqlType::Double),
            Value::Decimal(_) => Some(SqlType::Decimal),
            Value::Text(_) => Some(SqlType::Text),
            Value::Bytes(_) => Some(SqlType::Bytes),
            Value::Date(_) => Some(SqlType::Date),
            Value::Time(_) => Some(SqlType::Time),
            Value::Timestamp(_) => Some(SqlType::Timestamp),
            Value::Uuid(_) => Some(SqlType::Uuid),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
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

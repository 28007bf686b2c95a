use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Dynamic column value, as decoded by the driver.
///
/// One value per column per row. The engine never sees wire bytes: every
/// decoding decision (numeric, array, JSON, UUID layout) has already been
/// made by the time a `Value` reaches it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Arbitrary-precision decimal. PG: `NUMERIC`.
    Decimal(Decimal),
    Text(String),
    Bool(bool),
    /// Fixed 16-byte identifier. PG: `UUID`.
    Uuid(Uuid),
    /// Homogeneous typed array. PG: `int[]`, `float8[]`, `text[]`.
    Array(Array),
    /// Decoded JSON object. Key order is preserved.
    Map(Vec<(String, Value)>),
    /// Decoded JSON array. Elements may be of any kind.
    List(Vec<Value>),
    /// Nullable 64-bit integer wrapper. `None` is SQL NULL.
    NullableInt(Option<i64>),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
}

/// Typed array payload of [`Value::Array`].
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl Array {
    pub fn len(&self) -> usize {
        match self {
            Array::Int(v) => v.len(),
            Array::Float(v) => v.len(),
            Array::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element kind of the array.
    pub fn element_kind(&self) -> ValueKind {
        match self {
            Array::Int(_) => ValueKind::Int64,
            Array::Float(_) => ValueKind::Float64,
            Array::Text(_) => ValueKind::Text,
        }
    }

    /// Elements as individual dynamic values.
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            Array::Int(v) => v.iter().copied().map(Value::Int64).collect(),
            Array::Float(v) => v.iter().copied().map(Value::Float64).collect(),
            Array::Text(v) => v.iter().cloned().map(Value::Text).collect(),
        }
    }
}

/// Tag of a [`Value`] variant, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Text,
    Bool,
    Uuid,
    Array,
    Map,
    List,
    NullableInt,
    Timestamp,
    TimestampTz,
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Int16 => "int16",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Float32 => "float32",
            ValueKind::Float64 => "float64",
            ValueKind::Decimal => "decimal",
            ValueKind::Text => "text",
            ValueKind::Bool => "bool",
            ValueKind::Uuid => "uuid",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::List => "list",
            ValueKind::NullableInt => "nullable int",
            ValueKind::Timestamp => "timestamp",
            ValueKind::TimestampTz => "timestamptz",
            ValueKind::Date => "date",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Int16(_) => ValueKind::Int16,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Text(_) => ValueKind::Text,
            Value::Bool(_) => ValueKind::Bool,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::List(_) => ValueKind::List,
            Value::NullableInt(_) => ValueKind::NullableInt,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::TimestampTz(_) => ValueKind::TimestampTz,
            Value::Date(_) => ValueKind::Date,
        }
    }

    /// SQL NULL, including an invalid nullable-integer wrapper.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::NullableInt(None))
    }

    /// Render as a JSON document.
    ///
    /// Decimals and temporals become strings; non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null | Value::NullableInt(None) => Json::Null,
            Value::Int16(v) => Json::from(*v),
            Value::Int32(v) => Json::from(*v),
            Value::Int64(v) | Value::NullableInt(Some(v)) => Json::from(*v),
            Value::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Decimal(d) => Json::String(d.to_string()),
            Value::Text(s) => Json::String(s.clone()),
            Value::Bool(b) => Json::Bool(*b),
            Value::Uuid(u) => Json::String(u.to_string()),
            Value::Array(a) => Json::Array(a.to_values().iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Timestamp(t) => Json::String(t.to_string()),
            Value::TimestampTz(t) => Json::String(t.to_rfc3339()),
            Value::Date(d) => Json::String(d.to_string()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use rowmap_api::{Array, NullInt64, Primitive, PrimitiveKind, TargetKind, Value, ValueKind};

use crate::error::CoercionError;

/// Convert `value` into a primitive of kind `target`.
///
/// Covers single scalar slots only. Records, sequences and optional layers
/// are handled by the materializer before a value gets here.
pub fn coerce(value: &Value, target: PrimitiveKind) -> Result<Primitive, CoercionError> {
    let source = value.kind();
    let fail = |reason: String| CoercionError::new(source, TargetKind::Primitive(target), reason);

    if value.is_null() {
        return Err(fail("null value".into()));
    }
    if target == PrimitiveKind::Json {
        return Ok(to_json(value));
    }

    match value {
        Value::Null | Value::NullableInt(None) => Err(fail("null value".into())),
        Value::Int16(v) => from_int(i64::from(*v), target).map_err(fail),
        Value::Int32(v) => from_int(i64::from(*v), target).map_err(fail),
        Value::Int64(v) | Value::NullableInt(Some(v)) => from_int(*v, target).map_err(fail),
        Value::Float32(v) => from_float(f64::from(*v), target).map_err(fail),
        Value::Float64(v) => from_float(*v, target).map_err(fail),
        Value::Decimal(d) => from_decimal(d, target).map_err(fail),
        Value::Text(s) => from_text(s, target).map_err(fail),
        Value::Bool(b) => match target {
            PrimitiveKind::Bool => Ok(Primitive::Bool(*b)),
            _ => Err(fail("incompatible types".into())),
        },
        Value::Uuid(u) => match target {
            PrimitiveKind::Uuid => Ok(Primitive::Uuid(*u)),
            PrimitiveKind::Text => Ok(Primitive::Text(hex_string(u))),
            _ => Err(fail("incompatible types".into())),
        },
        Value::Array(a) => from_array(a, target),
        Value::Map(_) | Value::List(_) => Err(fail(
            "nested document needs a record, sequence or json destination".into(),
        )),
        Value::Timestamp(t) => from_naive_datetime(*t, target).map_err(fail),
        Value::TimestampTz(t) => from_datetime(*t, target).map_err(fail),
        Value::Date(d) => from_date(*d, target).map_err(fail),
    }
}

/// Lowercase hex, no separators.
pub fn hex_string(uuid: &Uuid) -> String {
    uuid.simple().to_string()
}

fn from_int(v: i64, target: PrimitiveKind) -> Result<Primitive, String> {
    let out_of_range = |_| format!("value {v} out of range");
    match target {
        PrimitiveKind::Int16 => i16::try_from(v).map(Primitive::Int16).map_err(out_of_range),
        PrimitiveKind::Int32 => i32::try_from(v).map(Primitive::Int32).map_err(out_of_range),
        PrimitiveKind::Int64 => Ok(Primitive::Int64(v)),
        PrimitiveKind::Float32 => Ok(Primitive::Float32(v as f32)),
        PrimitiveKind::Float64 => Ok(Primitive::Float64(v as f64)),
        PrimitiveKind::Decimal => Ok(Primitive::Decimal(Decimal::from(v))),
        PrimitiveKind::NullInt64 => Ok(Primitive::NullInt64(NullInt64::new(v))),
        _ => Err("incompatible types".into()),
    }
}

fn from_float(v: f64, target: PrimitiveKind) -> Result<Primitive, String> {
    match target {
        PrimitiveKind::Float32 => Ok(Primitive::Float32(v as f32)),
        PrimitiveKind::Float64 => Ok(Primitive::Float64(v)),
        PrimitiveKind::Decimal => Decimal::try_from(v)
            .map(Primitive::Decimal)
            .map_err(|e| e.to_string()),
        // Truncating cast, always valid.
        PrimitiveKind::NullInt64 => Ok(Primitive::NullInt64(NullInt64::new(v as i64))),
        k if k.is_integer() => {
            let t = v.trunc();
            // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
            if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
                return Err(format!("value {v} out of range"));
            }
            from_int(t as i64, target)
        }
        _ => Err("incompatible types".into()),
    }
}

fn from_decimal(d: &Decimal, target: PrimitiveKind) -> Result<Primitive, String> {
    match target {
        PrimitiveKind::Float64 => d
            .to_f64()
            .map(Primitive::Float64)
            .ok_or_else(|| format!("decimal {d} not representable as f64")),
        PrimitiveKind::Float32 => d
            .to_f32()
            .map(Primitive::Float32)
            .ok_or_else(|| format!("decimal {d} not representable as f32")),
        PrimitiveKind::Decimal => Ok(Primitive::Decimal(*d)),
        _ => Err("unknown format".into()),
    }
}

fn from_text(s: &str, target: PrimitiveKind) -> Result<Primitive, String> {
    match target {
        PrimitiveKind::Text => Ok(Primitive::Text(s.to_string())),
        PrimitiveKind::Uuid => Uuid::parse_str(s)
            .map(Primitive::Uuid)
            .map_err(|e| e.to_string()),
        k if k.is_temporal() => {
            let parsed = parse_temporal(s).map_err(|e| e.to_string())?;
            parsed.into_primitive(target)
        }
        _ => Err("incompatible types".into()),
    }
}

/// Array-like envelope around a scalar: only a single element converts.
fn from_array(a: &Array, target: PrimitiveKind) -> Result<Primitive, CoercionError> {
    let values = a.to_values();
    match values.as_slice() {
        [single] => coerce(single, target),
        _ => Err(CoercionError::new(
            ValueKind::Array,
            TargetKind::Primitive(target),
            format!("{}-element {} array into a scalar", values.len(), a.element_kind()),
        )),
    }
}

fn from_naive_datetime(t: NaiveDateTime, target: PrimitiveKind) -> Result<Primitive, String> {
    Temporal::Naive(t).into_primitive(target)
}

fn from_datetime(t: DateTime<Utc>, target: PrimitiveKind) -> Result<Primitive, String> {
    Temporal::Zoned(t).into_primitive(target)
}

fn from_date(d: NaiveDate, target: PrimitiveKind) -> Result<Primitive, String> {
    Temporal::Date(d).into_primitive(target)
}

/// Text that does not parse as JSON is kept as a JSON string.
fn to_json(value: &Value) -> Primitive {
    match value {
        Value::Text(s) => Primitive::Json(
            serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone())),
        ),
        other => Primitive::Json(other.to_json()),
    }
}

// ════════════════════════════════════════════════════════════════
//  Temporal parsing
// ════════════════════════════════════════════════════════════════

/// Layouts with a UTC offset. `%#z` accepts `+09`, `+0900` and `+09:00`.
const ZONED_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%#z",
];

const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// A parsed temporal value, before it is fitted to a destination kind.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Temporal {
    Zoned(DateTime<Utc>),
    Naive(NaiveDateTime),
    Date(NaiveDate),
}

impl Temporal {
    fn into_primitive(self, target: PrimitiveKind) -> Result<Primitive, String> {
        match (self, target) {
            (Temporal::Zoned(t), PrimitiveKind::TimestampTz) => Ok(Primitive::TimestampTz(t)),
            (Temporal::Zoned(t), PrimitiveKind::Timestamp) => Ok(Primitive::Timestamp(t.naive_utc())),
            (Temporal::Zoned(t), PrimitiveKind::Date) => Ok(Primitive::Date(t.date_naive())),
            (Temporal::Naive(t), PrimitiveKind::Timestamp) => Ok(Primitive::Timestamp(t)),
            (Temporal::Naive(t), PrimitiveKind::TimestampTz) => {
                Ok(Primitive::TimestampTz(Utc.from_utc_datetime(&t)))
            }
            (Temporal::Naive(t), PrimitiveKind::Date) => Ok(Primitive::Date(t.date())),
            (Temporal::Date(d), PrimitiveKind::Date) => Ok(Primitive::Date(d)),
            (Temporal::Date(d), PrimitiveKind::Timestamp | PrimitiveKind::TimestampTz) => {
                let midnight = d
                    .and_hms_opt(0, 0, 0)
                    .ok_or_else(|| format!("no midnight for {d}"))?;
                Temporal::Naive(midnight).into_primitive(target)
            }
            _ => Err("incompatible types".into()),
        }
    }
}

/// Format-sniffing parse: RFC 3339, RFC 2822, then the fixed layout lists.
/// On failure the last parser error is returned as-is.
fn parse_temporal(s: &str) -> Result<Temporal, chrono::ParseError> {
    let s = s.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(Temporal::Zoned(t.with_timezone(&Utc)));
    }
    let mut last = match DateTime::parse_from_rfc2822(s) {
        Ok(t) => return Ok(Temporal::Zoned(t.with_timezone(&Utc))),
        Err(e) => e,
    };
    for layout in ZONED_LAYOUTS {
        match DateTime::parse_from_str(s, layout) {
            Ok(t) => return Ok(Temporal::Zoned(t.with_timezone(&Utc))),
            Err(e) => last = e,
        }
    }
    for layout in NAIVE_LAYOUTS {
        match NaiveDateTime::parse_from_str(s, layout) {
            Ok(t) => return Ok(Temporal::Naive(t)),
            Err(e) => last = e,
        }
    }
    for layout in DATE_LAYOUTS {
        match NaiveDate::parse_from_str(s, layout) {
            Ok(d) => return Ok(Temporal::Date(d)),
            Err(e) => last = e,
        }
    }
    Err(last)
}

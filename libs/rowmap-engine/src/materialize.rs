use std::borrow::Cow;

use rowmap_api::{
    Column, PrimitiveKind, RecordSlot, ScalarSlot, SequenceSlot, Shape, SlotMut, TargetKind, Value,
};

use crate::coerce::coerce;
use crate::config::MapperConfig;
use crate::error::{CoercionError, MapError};
use crate::navigate::{settle, Settled};
use crate::shape::ShapeCache;

/// Writes one row, or one nested document, into a destination.
///
/// Stateless apart from the shared shape cache; one instance serves any
/// number of rows and destinations.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'m> {
    shapes: &'m ShapeCache,
    config: &'m MapperConfig,
}

impl<'m> Materializer<'m> {
    pub fn new(shapes: &'m ShapeCache, config: &'m MapperConfig) -> Self {
        Self { shapes, config }
    }

    /// Write one row into `slot`.
    ///
    /// A record destination takes every column by name. Any other
    /// destination takes exactly one column. On error the destination keeps
    /// whatever this row already wrote.
    pub fn fill(
        &self,
        columns: &[Column],
        values: &[Value],
        slot: SlotMut<'_>,
    ) -> Result<(), MapError> {
        if slot.shape().unwrap_optional().is_record() {
            let Settled::Record(rec) = settle(slot) else {
                return Err(MapError::Shape("record slot settled into a non-record".into()));
            };
            let entries = columns.iter().map(|c| c.name.as_str()).zip(values);
            return self.record(rec, "", entries, 0);
        }

        match (columns, values) {
            ([column], [value]) => self.assign(&column.name, value, slot, 0),
            _ => Err(MapError::Shape(format!(
                "{} columns into non-record destination {}",
                columns.len(),
                slot.shape()
            ))),
        }
    }

    /// Write one value into `slot`. Null leaves the slot untouched.
    ///
    /// A nested document aimed at a destination of the wrong shape is a
    /// shape error, raised before any optional layer is allocated.
    pub fn assign(
        &self,
        column: &str,
        value: &Value,
        slot: SlotMut<'_>,
        depth: usize,
    ) -> Result<(), MapError> {
        if value.is_null() {
            return Ok(());
        }
        if depth > self.config.max_depth {
            return Err(MapError::Shape(format!(
                "column '{column}': nested deeper than {} levels",
                self.config.max_depth
            )));
        }
        let shape = slot.shape();
        let target = shape.unwrap_optional();
        if misfits(value, target) {
            return Err(MapError::Shape(format!(
                "column '{column}': {} value into {} destination",
                value.kind(),
                target.target_kind()
            )));
        }
        match settle(slot) {
            Settled::Scalar(s) => self.scalar(column, value, s),
            Settled::Record(r) => self.nested_record(column, value, r, depth),
            Settled::Sequence(s) => self.sequence(column, value, s, depth),
        }
    }

    fn scalar(&self, column: &str, value: &Value, slot: &mut dyn ScalarSlot) -> Result<(), MapError> {
        let kind = slot.kind();
        let converted = coerce(value, kind).map_err(|e| MapError::coercion(column, e))?;
        slot.assign(converted).map_err(|rejected| {
            MapError::Shape(format!(
                "column '{column}': {kind} slot rejected a {} value",
                rejected.kind()
            ))
        })
    }

    /// Named entries into a record. `path` prefixes names in error messages
    /// for nested documents.
    fn record<'v>(
        &self,
        rec: &mut dyn RecordSlot,
        path: &str,
        entries: impl IntoIterator<Item = (&'v str, &'v Value)>,
        depth: usize,
    ) -> Result<(), MapError> {
        let index = self.shapes.index(&rec.record_type());

        for (name, value) in entries {
            let label = if path.is_empty() {
                Cow::Borrowed(name)
            } else {
                Cow::Owned(format!("{path}.{name}"))
            };

            // Resolve first: a null column must still name a field.
            let position = index.resolve(name).map_err(|mut e| {
                e.column = label.to_string();
                e
            })?;
            if value.is_null() {
                continue;
            }
            let field = rec.field(position).ok_or_else(|| {
                MapError::Shape(format!(
                    "{} has no field at position {position}",
                    index.record_name()
                ))
            })?;
            self.assign(&label, value, field, depth)?;
        }
        Ok(())
    }

    fn nested_record(
        &self,
        column: &str,
        value: &Value,
        rec: &mut dyn RecordSlot,
        depth: usize,
    ) -> Result<(), MapError> {
        match value {
            Value::Map(entries) => self.record(
                rec,
                column,
                entries.iter().map(|(k, v)| (k.as_str(), v)),
                depth + 1,
            ),
            Value::Text(text) if self.config.json_text => {
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(doc @ serde_json::Value::Object(_)) => {
                        self.nested_record(column, &Value::from(doc), rec, depth)
                    }
                    Ok(_) => Err(mismatch(
                        column,
                        value,
                        rec_kind(rec),
                        "JSON text is not an object",
                    )),
                    Err(e) => Err(mismatch(
                        column,
                        value,
                        rec_kind(rec),
                        format!("not a JSON document: {e}"),
                    )),
                }
            }
            _ => Err(mismatch(column, value, rec_kind(rec), "incompatible types")),
        }
    }

    fn sequence(
        &self,
        column: &str,
        value: &Value,
        seq: &mut dyn SequenceSlot,
        depth: usize,
    ) -> Result<(), MapError> {
        match value {
            Value::Array(array) => self.elements(column, array.to_values().iter(), seq, depth),
            Value::List(items) => self.elements(column, items.iter(), seq, depth),
            Value::Text(text) if self.config.json_text => {
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(doc @ serde_json::Value::Array(_)) => {
                        self.sequence(column, &Value::from(doc), seq, depth)
                    }
                    Ok(_) => Err(mismatch(
                        column,
                        value,
                        TargetKind::Sequence,
                        "JSON text is not an array",
                    )),
                    Err(e) => Err(mismatch(
                        column,
                        value,
                        TargetKind::Sequence,
                        format!("not a JSON document: {e}"),
                    )),
                }
            }
            _ => Err(mismatch(column, value, TargetKind::Sequence, "incompatible types")),
        }
    }

    /// Replace the sequence contents with one freshly allocated element per
    /// item. Null items stay at the element's zero value.
    fn elements<'v>(
        &self,
        column: &str,
        items: impl Iterator<Item = &'v Value>,
        seq: &mut dyn SequenceSlot,
        depth: usize,
    ) -> Result<(), MapError> {
        seq.clear();
        for item in items {
            let element = seq.push_default();
            self.assign(column, item, element, depth + 1)?;
        }
        Ok(())
    }
}

/// Nested documents only fit destinations of their own structure. JSON
/// scalar slots take either.
fn misfits(value: &Value, dest: &Shape) -> bool {
    match (value, dest) {
        (Value::Map(_) | Value::List(_), Shape::Primitive(kind)) => *kind != PrimitiveKind::Json,
        (Value::Map(_), Shape::Sequence(_)) => true,
        (Value::List(_) | Value::Array(_), Shape::Record(_)) => true,
        _ => false,
    }
}

fn rec_kind(rec: &dyn RecordSlot) -> TargetKind {
    TargetKind::Record(rec.record_type().name)
}

fn mismatch(column: &str, value: &Value, target: TargetKind, reason: impl Into<String>) -> MapError {
    MapError::coercion(column, CoercionError::new(value.kind(), target, reason))
}

use std::any::TypeId;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

// ════════════════════════════════════════════════════════════════
//  Primitive kinds
// ════════════════════════════════════════════════════════════════

/// Leaf destination types. Every scalar destination declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Text,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    /// [`NullInt64`] wrapper.
    NullInt64,
    /// Raw JSON document (`serde_json::Value`).
    Json,
}

impl PrimitiveKind {
    pub fn is_integer(self) -> bool {
        matches!(self, PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Timestamp | PrimitiveKind::TimestampTz | PrimitiveKind::Date
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int16 => "i16",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::Int64 => "i64",
            PrimitiveKind::Float32 => "f32",
            PrimitiveKind::Float64 => "f64",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::Text => "string",
            PrimitiveKind::Uuid => "uuid",
            PrimitiveKind::Timestamp => "timestamp",
            PrimitiveKind::TimestampTz => "timestamptz",
            PrimitiveKind::Date => "date",
            PrimitiveKind::NullInt64 => "null int64",
            PrimitiveKind::Json => "json",
        };
        f.write_str(name)
    }
}

/// A converted value, ready to be stored into a scalar slot of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Text(String),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    NullInt64(NullInt64),
    Json(serde_json::Value),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Bool(_) => PrimitiveKind::Bool,
            Primitive::Int16(_) => PrimitiveKind::Int16,
            Primitive::Int32(_) => PrimitiveKind::Int32,
            Primitive::Int64(_) => PrimitiveKind::Int64,
            Primitive::Float32(_) => PrimitiveKind::Float32,
            Primitive::Float64(_) => PrimitiveKind::Float64,
            Primitive::Decimal(_) => PrimitiveKind::Decimal,
            Primitive::Text(_) => PrimitiveKind::Text,
            Primitive::Uuid(_) => PrimitiveKind::Uuid,
            Primitive::Timestamp(_) => PrimitiveKind::Timestamp,
            Primitive::TimestampTz(_) => PrimitiveKind::TimestampTz,
            Primitive::Date(_) => PrimitiveKind::Date,
            Primitive::NullInt64(_) => PrimitiveKind::NullInt64,
            Primitive::Json(_) => PrimitiveKind::Json,
        }
    }
}

/// Nullable 64-bit integer destination. `valid == false` is SQL NULL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NullInt64 {
    pub value: i64,
    pub valid: bool,
}

impl NullInt64 {
    pub fn new(value: i64) -> Self {
        Self { value, valid: true }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<i64> {
        self.valid.then_some(self.value)
    }
}

// ════════════════════════════════════════════════════════════════
//  Shape
// ════════════════════════════════════════════════════════════════

/// Static description of a record type.
///
/// `fields` is a function rather than a list so that self-referential
/// records (`Option<Box<Self>>`) describe themselves lazily.
#[derive(Clone, Copy)]
pub struct RecordType {
    pub name: &'static str,
    pub id: TypeId,
    pub fields: fn() -> Vec<FieldDef>,
}

impl RecordType {
    pub fn field_defs(&self) -> Vec<FieldDef> {
        (self.fields)()
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType").field("name", &self.name).finish()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// One field of a record, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Name used for column matching (field ident or `#[column(rename)]`).
    pub name: &'static str,
    pub shape: Shape,
}

impl FieldDef {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, shape }
    }
}

/// Recursive description of a destination type.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    /// Lazily allocated wrapper (`Option<T>`).
    Optional(Box<Shape>),
    /// Growable sequence (`Vec<T>`).
    Sequence(Box<Shape>),
    Record(RecordType),
}

impl Shape {
    /// Strip every optional layer.
    pub fn unwrap_optional(&self) -> &Shape {
        let mut shape = self;
        while let Shape::Optional(inner) = shape {
            shape = inner;
        }
        shape
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Shape::Sequence(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Shape::Record(_))
    }

    pub fn target_kind(&self) -> TargetKind {
        match self {
            Shape::Primitive(k) => TargetKind::Primitive(*k),
            Shape::Optional(_) => TargetKind::Optional,
            Shape::Sequence(_) => TargetKind::Sequence,
            Shape::Record(r) => TargetKind::Record(r.name),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Primitive(k) => write!(f, "{k}"),
            Shape::Optional(inner) => write!(f, "option<{inner}>"),
            Shape::Sequence(inner) => write!(f, "vec<{inner}>"),
            Shape::Record(r) => f.write_str(r.name),
        }
    }
}

/// Outermost layer of a destination, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Primitive(PrimitiveKind),
    Optional,
    Sequence,
    Record(&'static str),
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Primitive(k) => write!(f, "{k}"),
            TargetKind::Optional => f.write_str("option"),
            TargetKind::Sequence => f.write_str("sequence"),
            TargetKind::Record(name) => write!(f, "record {name}"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Slots
// ════════════════════════════════════════════════════════════════

/// Mutable handle into a destination value, one variant per shape layer.
pub enum SlotMut<'a> {
    Scalar(&'a mut dyn ScalarSlot),
    Optional(&'a mut dyn OptionalSlot),
    Sequence(&'a mut dyn SequenceSlot),
    Record(&'a mut dyn RecordSlot),
}

impl SlotMut<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            SlotMut::Scalar(s) => Shape::Primitive(s.kind()),
            SlotMut::Optional(o) => Shape::Optional(Box::new(o.inner_shape())),
            SlotMut::Sequence(s) => Shape::Sequence(Box::new(s.element_shape())),
            SlotMut::Record(r) => Shape::Record(r.record_type()),
        }
    }
}

/// Leaf slot holding one primitive kind.
pub trait ScalarSlot {
    fn kind(&self) -> PrimitiveKind;

    /// Store `value`. Hands the value back if its kind differs from `kind()`.
    fn assign(&mut self, value: Primitive) -> Result<(), Primitive>;
}

/// Optional wrapper. Storage is allocated on first write and reused after.
pub trait OptionalSlot {
    fn inner_shape(&self) -> Shape;

    fn is_allocated(&self) -> bool;

    /// Allocate a zero-valued inner value if absent, then hand out its slot.
    fn get_or_allocate(&mut self) -> SlotMut<'_>;
}

/// Growable sequence. Elements are appended, never reordered. Removal only
/// happens through `clear` and `truncate`.
pub trait SequenceSlot {
    fn element_shape(&self) -> Shape;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append zero-valued elements until `len() >= len`.
    fn grow_to(&mut self, len: usize);

    fn element(&mut self, index: usize) -> Option<SlotMut<'_>>;

    /// Append a zero-valued element and hand out its slot.
    fn push_default(&mut self) -> SlotMut<'_>;

    fn clear(&mut self);

    /// Drop elements past `len`. No-op when the sequence is already shorter.
    fn truncate(&mut self, len: usize);
}

/// Record with a fixed, ordered set of fields.
pub trait RecordSlot {
    fn record_type(&self) -> RecordType;

    /// Slot of the field at `index` in `record_type().field_defs()`.
    fn field(&mut self, index: usize) -> Option<SlotMut<'_>>;
}

// ════════════════════════════════════════════════════════════════
//  Destination traits
// ════════════════════════════════════════════════════════════════

/// Anything that can be written into. Object safe.
pub trait Target {
    fn slot(&mut self) -> SlotMut<'_>;
}

/// Statically described destination. `Default` is the zero value used
/// whenever a wrapper or sequence element is allocated.
pub trait Shaped: Target + Default + 'static {
    fn shape() -> Shape;
}

/// Named-field destination. Implemented by `#[derive(Record)]`.
pub trait Record: Shaped + RecordSlot {
    fn record_type() -> RecordType;
}

macro_rules! scalar_target {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl ScalarSlot for $ty {
                fn kind(&self) -> PrimitiveKind {
                    PrimitiveKind::$kind
                }

                fn assign(&mut self, value: Primitive) -> Result<(), Primitive> {
                    match value {
                        Primitive::$kind(v) => {
                            *self = v;
                            Ok(())
                        }
                        other => Err(other),
                    }
                }
            }

            impl Target for $ty {
                fn slot(&mut self) -> SlotMut<'_> {
                    SlotMut::Scalar(self)
                }
            }

            impl Shaped for $ty {
                fn shape() -> Shape {
                    Shape::Primitive(PrimitiveKind::$kind)
                }
            }
        )*
    };
}

scalar_target! {
    bool => Bool,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    String => Text,
    Uuid => Uuid,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    NaiveDate => Date,
    NullInt64 => NullInt64,
    serde_json::Value => Json,
}

impl<T: Shaped> OptionalSlot for Option<T> {
    fn inner_shape(&self) -> Shape {
        T::shape()
    }

    fn is_allocated(&self) -> bool {
        self.is_some()
    }

    fn get_or_allocate(&mut self) -> SlotMut<'_> {
        self.get_or_insert_with(T::default).slot()
    }
}

impl<T: Shaped> Target for Option<T> {
    fn slot(&mut self) -> SlotMut<'_> {
        SlotMut::Optional(self)
    }
}

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }
}

// Box is pure indirection: always allocated, transparent to the shape.
impl<T: Target + ?Sized> Target for Box<T> {
    fn slot(&mut self) -> SlotMut<'_> {
        (**self).slot()
    }
}

impl<T: Shaped> Shaped for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Shaped> SequenceSlot for Vec<T> {
    fn element_shape(&self) -> Shape {
        T::shape()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn grow_to(&mut self, len: usize) {
        if Vec::len(self) < len {
            self.resize_with(len, T::default);
        }
    }

    fn element(&mut self, index: usize) -> Option<SlotMut<'_>> {
        self.get_mut(index).map(Target::slot)
    }

    fn push_default(&mut self) -> SlotMut<'_> {
        let index = Vec::len(self);
        self.push(T::default());
        self[index].slot()
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }
}

impl<T: Shaped> Target for Vec<T> {
    fn slot(&mut self) -> SlotMut<'_> {
        SlotMut::Sequence(self)
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(Box::new(T::shape()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_nest() {
        assert_eq!(
            <Option<Vec<Option<i64>>>>::shape().to_string(),
            "option<vec<option<i64>>>"
        );
        assert_eq!(<Box<String>>::shape(), Shape::Primitive(PrimitiveKind::Text));
        assert!(<Option<Option<Vec<i32>>>>::shape().unwrap_optional().is_sequence());
    }

    #[test]
    fn scalar_assign_rejects_other_kind() {
        let mut n = 0i32;
        let SlotMut::Scalar(slot) = n.slot() else {
            panic!("expected scalar slot");
        };
        assert_eq!(slot.kind(), PrimitiveKind::Int32);
        assert_eq!(slot.assign(Primitive::Int64(5)), Err(Primitive::Int64(5)));
        assert_eq!(slot.assign(Primitive::Int32(5)), Ok(()));
        assert_eq!(n, 5);
    }

    #[test]
    fn optional_allocates_once() {
        let mut v: Option<String> = None;
        let SlotMut::Optional(slot) = v.slot() else {
            panic!("expected optional slot");
        };
        assert!(!slot.is_allocated());
        if let SlotMut::Scalar(s) = slot.get_or_allocate() {
            s.assign(Primitive::Text("a".into())).unwrap();
        }
        assert!(slot.is_allocated());
        if let SlotMut::Scalar(s) = slot.get_or_allocate() {
            s.assign(Primitive::Text("b".into())).unwrap();
        }
        assert_eq!(v.as_deref(), Some("b"));
    }

    #[test]
    fn sequence_grows_with_zero_values() {
        let mut v: Vec<i64> = vec![7];
        let SlotMut::Sequence(seq) = v.slot() else {
            panic!("expected sequence slot");
        };
        seq.grow_to(3);
        seq.grow_to(2);
        assert_eq!(seq.len(), 3);
        assert!(seq.element(3).is_none());
        assert_eq!(v, vec![7, 0, 0]);
    }

    #[test]
    fn sequence_truncates_but_never_pads() {
        let mut v: Vec<i64> = vec![1, 2, 3];
        let SlotMut::Sequence(seq) = v.slot() else {
            panic!("expected sequence slot");
        };
        seq.truncate(5);
        assert_eq!(seq.len(), 3);
        seq.truncate(1);
        assert_eq!(v, vec![1]);
    }

    #[test]
    fn null_int64_get() {
        assert_eq!(NullInt64::new(4).get(), Some(4));
        assert_eq!(NullInt64::null().get(), None);
    }
}

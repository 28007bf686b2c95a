// Lets `#[derive(Record)]` output (which names `::rowmap_api`) compile inside this crate.
extern crate self as rowmap_api;

pub use rowmap_derive::Record;
pub mod error;
pub mod row;
pub mod source;
pub mod target;
pub mod value;

pub use error::{ErrorKind, SourceError};
pub use row::{Column, Row};
pub use source::{AsyncRowSource, ResultSet, RowSource};
pub use target::{
    FieldDef, NullInt64, OptionalSlot, Primitive, PrimitiveKind, Record, RecordSlot, RecordType,
    ScalarSlot, SequenceSlot, Shape, Shaped, SlotMut, Target, TargetKind,
};
pub use value::{Array, Value, ValueKind};

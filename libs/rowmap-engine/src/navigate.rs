use rowmap_api::{RecordSlot, ScalarSlot, SequenceSlot, SlotMut, Target};

use crate::error::MapError;

/// A slot with every optional layer allocated and stripped.
/// Writable without further allocation.
pub enum Settled<'a> {
    Scalar(&'a mut dyn ScalarSlot),
    Sequence(&'a mut dyn SequenceSlot),
    Record(&'a mut dyn RecordSlot),
}

/// Unwrap optional layers, allocating a zero value at each absent one.
pub fn settle(mut slot: SlotMut<'_>) -> Settled<'_> {
    loop {
        match slot {
            SlotMut::Optional(o) => slot = o.get_or_allocate(),
            SlotMut::Scalar(s) => return Settled::Scalar(s),
            SlotMut::Sequence(s) => return Settled::Sequence(s),
            SlotMut::Record(r) => return Settled::Record(r),
        }
    }
}

/// Settle the top of a destination.
pub fn navigate<T: Target + ?Sized>(dest: &mut T) -> Settled<'_> {
    settle(dest.slot())
}

/// Working slot for 1-based row `row` of a sequence destination.
///
/// Grows the sequence to `row` elements (never shrinks it) and returns
/// element `row - 1`. Calling twice for the same row yields the same element.
pub fn row_element(seq: &mut dyn SequenceSlot, row: usize) -> Result<SlotMut<'_>, MapError> {
    let index = row
        .checked_sub(1)
        .ok_or_else(|| MapError::Shape("row numbers start at 1".into()))?;
    seq.grow_to(row);
    let len = seq.len();
    seq.element(index).ok_or_else(|| {
        MapError::Shape(format!(
            "sequence holds {len} elements after growing to row {row}"
        ))
    })
}

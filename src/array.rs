//! Array record compiler and the [ArrayRecord] sequence view.

use std::sync::Arc;

use crate::{
    accessor::{Accessor, GeneratedAccessor},
    buffer::ByteView,
    encoding::TextEncoder,
    errors::{Error, Result},
    record::{Record, RecordType, Shape},
    sequence::IndexedSequence,
    value::Value,
};

/// Name given to the array record of `length` elements of `element`.
pub fn array_name(element: &Accessor, length: usize) -> String {
    format!("Array<{}>[{length}]", element.name())
}

/// Compiles an array record type of `length` elements packed back to back.
///
/// Element `i` occupies bits `[i * bits, (i + 1) * bits)`. Placement is
/// validated for the first two elements, which covers every later one.
pub(crate) fn compile(
    element: Accessor,
    length: usize,
    encoder: Option<&Arc<dyn TextEncoder>>,
) -> Result<RecordType> {
    let bits = element.bits();
    let bit_length = bits.checked_mul(length).ok_or_else(|| Error::InternalCompile {
        layout: array_name(&element, length),
        reason: "array bit length overflows".to_string(),
    })?;

    for i in 0..length.min(2) {
        element.generate(&i.to_string(), i * bits, encoder)?;
    }

    // Bit elements start at any of the 8 phases of a byte.
    let phases = if element.byte_aligned() { 1 } else { 8 };
    let slots = (0..phases)
        .map(|phase| element.generate("", phase, encoder))
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordType::new(
        array_name(&element, length),
        bit_length,
        Shape::Array {
            element,
            length,
            slots,
        },
    ))
}

/// Sequence view of an array [Record].
#[derive(Debug, Clone)]
pub struct ArrayRecord {
    record: Record,
}

impl ArrayRecord {
    pub(crate) fn new(record: Record) -> Self {
        ArrayRecord { record }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub(crate) fn get_element(&self, index: usize) -> Result<Value> {
        let (slot, view) = self.element(index)?;
        slot.get(&view).map_err(|e| e.with_field(index))
    }

    pub(crate) fn set_element(&self, index: usize, value: Value) -> Result<()> {
        let (slot, view) = self.element(index)?;
        slot.set(&view, value).map_err(|e| e.with_field(index))
    }

    /// Cached accessor of element `index` and the view it addresses, which
    /// starts at the byte holding the element's first bit.
    fn element(&self, index: usize) -> Result<(&GeneratedAccessor, ByteView)> {
        let Shape::Array {
            element,
            length,
            slots,
        } = self.record.record_type().shape()
        else {
            return Err(Error::NotAnArray(self.record.record_type().name().to_string()));
        };

        if index >= *length {
            return Err(Error::IndexOutOfBounds {
                index,
                length: *length,
            });
        }

        let start = index * element.bits();
        let byte = start / 8;
        let view = self.record.byte_view();
        let sub = view.subview(byte, view.byte_length() - byte)?;

        Ok((&slots[(start % 8) % slots.len()], sub))
    }
}

impl IndexedSequence for ArrayRecord {
    fn len(&self) -> usize {
        self.record.record_type().length().unwrap_or(0)
    }

    fn get(&self, index: usize) -> Result<Value> {
        self.get_element(index)
    }

    fn set(&self, index: usize, value: Value) -> Result<()> {
        self.set_element(index, value)
    }

    fn atomic<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let view = self.record.byte_view();
        let saved = view.to_vec();
        let result = f();
        if result.is_err() {
            view.write(|bytes| bytes.copy_from_slice(&saved));
        }
        result
    }
}

impl<'a> IntoIterator for &'a ArrayRecord {
    type Item = Result<Value>;
    type IntoIter = crate::sequence::SequenceIter<'a, ArrayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Compiled record types and the zero-copy [Record] views bound to buffers.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    accessor::{Accessor, GeneratedAccessor},
    array::ArrayRecord,
    buffer::{Buffer, BufferSource, ByteView},
    errors::{Error, Result},
    uid::Uid,
    value::Value,
};

/// A named field of an object record with its absolute bit offset.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub accessor: Accessor,
    pub bit_offset: usize,
    pub(crate) generated: GeneratedAccessor,
}

/// Layout of a compiled record type.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Heterogeneous named fields in declaration order.
    Object {
        fields: Vec<CompiledField>,
        index: HashMap<String, usize>,
    },
    /// `length` homogeneous elements of `element`, packed back to back.
    /// `slots[p]` is the element accessor generated at bit phase `p` within
    /// a byte; byte-aligned elements have the single phase 0.
    Array {
        element: Accessor,
        length: usize,
        slots: Vec<GeneratedAccessor>,
    },
}

/// A compiled binary layout. Bind it to a buffer with [RecordType::bind].
#[derive(Debug)]
pub struct RecordType {
    uid: Uid,
    name: String,
    bit_length: usize,
    byte_length: usize,
    shape: Shape,
}

impl RecordType {
    pub(crate) fn new(name: String, bit_length: usize, shape: Shape) -> Self {
        RecordType {
            uid: Uid::next(),
            name,
            bit_length,
            byte_length: bit_length.div_ceil(8),
            shape,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, Shape::Array { .. })
    }

    /// Fields of an object record; empty for arrays.
    pub fn fields(&self) -> &[CompiledField] {
        match &self.shape {
            Shape::Object { fields, .. } => fields,
            Shape::Array { .. } => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        match &self.shape {
            Shape::Object { fields, index } => index.get(name).map(|i| &fields[*i]),
            Shape::Array { .. } => None,
        }
    }

    /// Field names in declaration order; empty for arrays.
    pub fn keys(&self) -> Vec<&str> {
        self.fields().iter().map(|f| f.name.as_str()).collect()
    }

    /// Element count of an array record.
    pub fn length(&self) -> Option<usize> {
        match &self.shape {
            Shape::Array { length, .. } => Some(*length),
            Shape::Object { .. } => None,
        }
    }

    /// Element accessor of an array record.
    pub fn element(&self) -> Option<&Accessor> {
        match &self.shape {
            Shape::Array { element, .. } => Some(element),
            Shape::Object { .. } => None,
        }
    }

    /// Binds a view of this type at `byte_offset` within `source`.
    pub fn bind(self: &Arc<Self>, source: impl Into<BufferSource>, byte_offset: usize) -> Result<Record> {
        let view = ByteView::new(source, byte_offset, self.byte_length)?;
        Ok(Record::from_view(self.clone(), view))
    }

    /// Binds a view over a fresh zero-filled buffer of exactly this size.
    pub fn allocate(self: &Arc<Self>) -> Record {
        let view = ByteView::whole(Buffer::new(self.byte_length));
        Record::from_view(self.clone(), view)
    }

    /// Human-readable listing of the layout, one line per field.
    pub fn layout(&self) -> String {
        let rows: Vec<LayoutRow> = match &self.shape {
            Shape::Object { fields, .. } => fields
                .iter()
                .map(|f| LayoutRow::new(&f.name, &f.accessor, f.bit_offset))
                .collect(),
            Shape::Array {
                element, length, ..
            } => vec![LayoutRow {
                name: format!("[0..{length}]"),
                accessor: element.name(),
                bit_offset: 0,
                bits: element.bits() * length,
            }],
        };
        render_layout(&self.name, &rows, self.bit_length)
    }
}

/// One line of a rendered layout listing.
pub(crate) struct LayoutRow {
    pub name: String,
    pub accessor: String,
    pub bit_offset: usize,
    pub bits: usize,
}

impl LayoutRow {
    pub fn new(name: &str, accessor: &Accessor, bit_offset: usize) -> Self {
        LayoutRow {
            name: name.to_string(),
            accessor: accessor.name(),
            bit_offset,
            bits: accessor.bits(),
        }
    }
}

pub(crate) fn render_layout(name: &str, rows: &[LayoutRow], bit_length: usize) -> String {
    let mut out = format!(
        "record {name}: {bit_length} bits / {} bytes\n",
        bit_length.div_ceil(8)
    );
    for row in rows {
        out.push_str(&format!(
            "  @{:<6} +{:<6} {:<20} {}\n",
            row.bit_offset, row.bits, row.accessor, row.name
        ));
    }
    out
}

/// A view of a [RecordType] over a byte range of a shared [Buffer].
///
/// The view does not own the bytes: every clone, every sub-record view and
/// every other view bound to the same buffer reads and writes the same
/// storage. Setters take `&self` and mutate the buffer, never the view.
#[derive(Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    view: ByteView,
}

impl Record {
    pub(crate) fn from_view(record_type: Arc<RecordType>, view: ByteView) -> Self {
        Record { record_type, view }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn byte_view(&self) -> &ByteView {
        &self.view
    }

    pub fn buffer(&self) -> &Buffer {
        self.view.buffer()
    }

    pub fn byte_offset(&self) -> usize {
        self.view.byte_offset()
    }

    pub fn byte_length(&self) -> usize {
        self.view.byte_length()
    }

    /// Reads the named field of an object record.
    pub fn get(&self, field: &str) -> Result<Value> {
        self.field(field)?.generated.get(&self.view)
    }

    /// Writes the named field of an object record.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.field(field)?.generated.set(&self.view, value.into())
    }

    /// Reads element `index` of an array record.
    pub fn at(&self, index: usize) -> Result<Value> {
        self.array()?.get_element(index)
    }

    /// Writes element `index` of an array record.
    pub fn set_at(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.array()?.set_element(index, value.into())
    }

    /// Sequence view of an array record.
    pub fn as_array(&self) -> Option<ArrayRecord> {
        self.record_type
            .is_array()
            .then(|| ArrayRecord::new(self.clone()))
    }

    /// Field names for objects, element indexes for arrays.
    pub fn keys(&self) -> Vec<String> {
        match self.record_type.shape() {
            Shape::Object { fields, .. } => fields.iter().map(|f| f.name.clone()).collect(),
            Shape::Array { length, .. } => (0..*length).map(|i| i.to_string()).collect(),
        }
    }

    /// Current values in declaration (or index) order.
    pub fn values(&self) -> Result<Vec<Value>> {
        match self.record_type.shape() {
            Shape::Object { fields, .. } => {
                fields.iter().map(|f| f.generated.get(&self.view)).collect()
            }
            Shape::Array { length, .. } => (0..*length).map(|i| self.at(i)).collect(),
        }
    }

    /// `(key, value)` pairs in declaration (or index) order.
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        Ok(self.keys().into_iter().zip(self.values()?).collect())
    }

    /// Copies the bytes into a fresh buffer and binds a view of the same type
    /// to it.
    pub fn detach(&self) -> Record {
        let view = ByteView::whole(Buffer::from(self.view.to_vec()));
        Record::from_view(self.record_type.clone(), view)
    }

    /// Lowercase hex dump of the record bytes.
    pub fn to_hex(&self) -> String {
        self.view.to_hex()
    }

    fn field(&self, name: &str) -> Result<&CompiledField> {
        if self.record_type.is_array() {
            return Err(Error::NotAnObject(self.record_type.name().to_string()));
        }
        self.record_type.field(name).ok_or_else(|| Error::UnknownField {
            record: self.record_type.name().to_string(),
            field: name.to_string(),
        })
    }

    fn array(&self) -> Result<ArrayRecord> {
        self.as_array()
            .ok_or_else(|| Error::NotAnArray(self.record_type.name().to_string()))
    }
}

impl PartialEq for Record {
    /// Same record type and same bytes.
    fn eq(&self, other: &Self) -> bool {
        self.record_type.uid() == other.record_type.uid() && self.view.to_vec() == other.view.to_vec()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type", &self.record_type.name())
            .field("uid", &self.record_type.uid())
            .field("byte_offset", &self.view.byte_offset())
            .field("bytes", &self.to_hex())
            .finish()
    }
}

//! Error type for record definition, binding and field access.

use thiserror::Error;

use crate::uid::Uid;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while defining record types, binding them to buffers
/// or reading and writing their fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Record name is not Pascal case or field name is not camel case.
    #[error("invalid {kind} name {name:?}")]
    InvalidIdentifier { kind: &'static str, name: String },

    /// Field name collides with the record runtime surface.
    #[error("field name {0:?} is reserved")]
    ReservedName(String),

    /// Field name appears twice in one record.
    #[error("duplicate field {0:?}")]
    DuplicateField(String),

    /// DataType token could not be parsed.
    #[error("unknown data type {0:?}")]
    UnknownType(String),

    /// Explicit bit offset would move a field backward.
    #[error("bit offset {bit_offset} of {field} is below the running offset {min}")]
    InvalidOffset {
        field: String,
        bit_offset: usize,
        min: usize,
    },

    /// Bit length override is smaller than the fields it must contain.
    #[error("bit length {requested} is smaller than the {required} bits required by the fields")]
    InvalidBitLength { requested: usize, required: usize },

    /// A byte-granular accessor was placed off a byte boundary.
    #[error("{field} ({accessor}) must be byte aligned, got bit offset {bit_offset}")]
    Alignment {
        field: String,
        accessor: String,
        bit_offset: usize,
    },

    /// Value has the wrong kind, is not an integer, is not finite or is
    /// outside the field's range.
    #[error("invalid value for {field}: {reason}")]
    Range { field: String, reason: String },

    /// Encoded text does not fit the field's capacity.
    #[error("byteLength of {field}: {encoded} bytes exceed capacity {byte_length}")]
    Capacity {
        field: String,
        byte_length: usize,
        encoded: usize,
    },

    /// Backing storage is too small for the requested view.
    #[error("view [{byte_offset}, {byte_offset}+{byte_length}) exceeds buffer of {available} bytes")]
    Bounds {
        byte_offset: usize,
        byte_length: usize,
        available: usize,
    },

    /// Sub-record assignment with a value of another record type.
    #[error("{field} expects a {expected} record, got {found}")]
    TypeIdentity {
        field: String,
        expected: Uid,
        found: Uid,
    },

    /// Text encoder is missing or does not know the encoding.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Text encoder failed to encode or decode.
    #[error("{encoding} encoding error: {reason}")]
    Encoding { encoding: String, reason: String },

    /// No field with this name on the record.
    #[error("{record} has no field {field:?}")]
    UnknownField { record: String, field: String },

    /// Index access on an object record.
    #[error("{0} is not an array record")]
    NotAnArray(String),

    /// Named field access on an array record.
    #[error("{0} is not an object record")]
    NotAnObject(String),

    /// Element index past the end of an array record.
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Generated layout failed its self-check. The rendered layout is
    /// attached for diagnosis.
    #[error("internal compile error: {reason}\n{layout}")]
    InternalCompile { layout: String, reason: String },
}

impl Error {
    pub(crate) fn range(field: &str, reason: impl Into<String>) -> Self {
        Error::Range {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Renames the field a value error refers to.
    pub(crate) fn with_field(mut self, name: impl ToString) -> Self {
        if let Error::Range { field, .. }
        | Error::Capacity { field, .. }
        | Error::TypeIdentity { field, .. } = &mut self
        {
            *field = name.to_string();
        }
        self
    }
}

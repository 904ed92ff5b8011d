//! Definition of named fields used to build object records.

use crate::{
    data_type::DataType,
    errors::{Error, Result},
};

/// Names a field may not take: they would shadow the record runtime surface.
pub const RESERVED_NAMES: &[&str] = &[
    "constructor",
    "toString",
    "toLocaleString",
    "valueOf",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "uid",
    "name",
    "bitLength",
    "byteLength",
    "buffer",
    "byteOffset",
    "keys",
    "values",
    "entries",
    "length",
];

/// A single named field in an object record definition.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Accessor name on the compiled record.
    pub name: String,
    /// Kind and width of the field.
    pub data_type: DataType,
    /// Absolute bit offset. When `None` the field follows the previous one.
    pub bit_offset: Option<usize>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        FieldSpec {
            name: name.into(),
            data_type: data_type.into(),
            bit_offset: None,
        }
    }

    pub fn at(mut self, bit_offset: usize) -> Self {
        self.bit_offset = Some(bit_offset);
        self
    }
}

/// Ordered description of an object record.
///
/// ```
/// use bitrecord::field::ObjectDef;
///
/// let def = ObjectDef::new("Header")
///     .field("version", "uint8")
///     .field("flag", "bit1")
///     .field_at("length", "uint16", 16);
/// assert_eq!(def.fields.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    /// Total bit length; pads the record past its last field.
    pub bit_length: Option<usize>,
}

impl ObjectDef {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectDef {
            name: name.into(),
            fields: Vec::new(),
            bit_length: None,
        }
    }

    /// Appends a field placed right after the previous one.
    pub fn field(mut self, name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        self.fields.push(FieldSpec::new(name, data_type));
        self
    }

    /// Appends a field at an explicit bit offset.
    pub fn field_at(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<DataType>,
        bit_offset: usize,
    ) -> Self {
        self.fields.push(FieldSpec::new(name, data_type).at(bit_offset));
        self
    }

    pub fn bit_length(mut self, bits: usize) -> Self {
        self.bit_length = Some(bits);
        self
    }
}

/// Record names are Pascal case: `[A-Z][A-Za-z0-9]*`.
pub fn validate_record_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric());

    if !valid {
        return Err(Error::InvalidIdentifier {
            kind: "record",
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Field names are camel case, `[a-z_$][A-Za-z0-9_$]*`, and not reserved.
pub fn validate_field_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if !valid {
        return Err(Error::InvalidIdentifier {
            kind: "field",
            name: name.to_string(),
        });
    }

    if RESERVED_NAMES.contains(&name) {
        return Err(Error::ReservedName(name.to_string()));
    }

    Ok(())
}

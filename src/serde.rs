//! Serde-deserializable record definitions and serialization of live values.
//!
//! A [RecordDef] describes an object or array record the same way the
//! builder API does, so definitions can ship as JSON files next to the data
//! they describe:
//!
//! ```json
//! {
//!   "kind": "Object",
//!   "name": "Header",
//!   "fields": [
//!     { "name": "version", "type": "uint8" },
//!     { "name": "flags", "type": "bit3", "bit_offset": 8 },
//!     { "name": "origin", "type": { "kind": "Array", "element": "int16", "length": 2 } }
//!   ]
//! }
//! ```
//!
//! Record values serialize as maps (objects) or sequences (arrays).

use std::sync::Arc;

use serde::{
    Deserialize, Serialize, Serializer,
    ser::{Error as _, SerializeMap, SerializeSeq},
};

use crate::{
    context::Context,
    data_type::DataType,
    errors::Result,
    field::{FieldSpec, ObjectDef},
    record::{Record, RecordType},
    value::Value,
};

/// Top-level record definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind")]
pub enum RecordDef {
    /// Named fields laid out in order.
    Object {
        name: String,
        fields: Vec<FieldDef>,
        /// Optional total size in bits; pads the record past its last field.
        #[serde(default)]
        bit_length: Option<usize>,
    },
    /// Fixed number of elements of one type.
    Array { element: ElementDef, length: usize },
}

/// Description of a single object field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: ElementDef,
    /// Absolute bit offset; defaults to right after the previous field.
    #[serde(default)]
    pub bit_offset: Option<usize>,
}

/// Data type of a field or array element: a primitive token such as
/// `"uint16"` or an inline nested record definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum ElementDef {
    Token(String),
    Record(Box<RecordDef>),
}

impl Context {
    /// Compiles a deserialized definition, nested records first.
    pub fn define(&self, def: &RecordDef) -> Result<Arc<RecordType>> {
        match def {
            RecordDef::Object {
                name,
                fields,
                bit_length,
            } => {
                let mut object = ObjectDef::new(name.clone());
                object.bit_length = *bit_length;
                for field in fields {
                    let data_type = self.element(&field.data_type)?;
                    object.fields.push(FieldSpec {
                        name: field.name.clone(),
                        data_type,
                        bit_offset: field.bit_offset,
                    });
                }
                self.define_object(&object)
            }
            RecordDef::Array { element, length } => {
                self.define_array(self.element(element)?, *length)
            }
        }
    }

    fn element(&self, def: &ElementDef) -> Result<DataType> {
        Ok(match def {
            ElementDef::Token(token) => DataType::from(token.as_str()),
            ElementDef::Record(record) => DataType::Record(self.define(record)?),
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.record_type().is_array() {
            let values = self.values().map_err(S::Error::custom)?;
            let mut seq = serializer.serialize_seq(Some(values.len()))?;
            for value in &values {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let entries = self.entries().map_err(S::Error::custom)?;
            let mut map = serializer.serialize_map(Some(entries.len()))?;
            for (key, value) in &entries {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

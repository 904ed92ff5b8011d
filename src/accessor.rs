//! Accessor variants and the generated get/set logic bound to a bit offset.
//!
//! An [Accessor] describes one field kind and its bit width. Calling
//! [Accessor::generate] with a property name and an absolute bit offset
//! yields a [GeneratedAccessor]: an enum of precomputed byte offsets, masks
//! and shifts that reads and writes the field through a [ByteView].

use std::{fmt, sync::Arc};

use crate::{
    bits::{self, BitSlot},
    buffer::ByteView,
    encoding::TextEncoder,
    errors::{Error, Result},
    record::{Record, RecordType},
    value::Value,
};

/// Immutable description of a field kind.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// Unsigned bitfield of 0 to 7 bits at any bit offset.
    Bit(u32),
    /// Signed big-endian integer of 8, 16 or 32 bits.
    Int(u32),
    /// Unsigned big-endian integer of 8, 16 or 32 bits.
    Uint(u32),
    /// IEEE 754 float of 32 or 64 bits.
    Float(u32),
    /// NUL-terminated text of fixed byte capacity.
    String { encoding: String, byte_length: usize },
    /// Nested record, addressed in place.
    Record(Arc<RecordType>),
}

impl Accessor {
    pub fn bit(width: u32) -> Result<Self> {
        if width > 7 {
            return Err(Error::UnknownType(format!("bit{width}")));
        }
        Ok(Accessor::Bit(width))
    }

    pub fn int(bits: u32) -> Result<Self> {
        match bits {
            8 | 16 | 32 => Ok(Accessor::Int(bits)),
            _ => Err(Error::UnknownType(format!("int{bits}"))),
        }
    }

    pub fn uint(bits: u32) -> Result<Self> {
        match bits {
            8 | 16 | 32 => Ok(Accessor::Uint(bits)),
            _ => Err(Error::UnknownType(format!("uint{bits}"))),
        }
    }

    pub fn float(bits: u32) -> Result<Self> {
        match bits {
            32 | 64 => Ok(Accessor::Float(bits)),
            _ => Err(Error::UnknownType(format!("float{bits}"))),
        }
    }

    pub fn string(encoding: impl Into<String>, byte_length: usize) -> Self {
        Accessor::String {
            encoding: encoding.into(),
            byte_length,
        }
    }

    /// Canonical name. Two accessors with the same name behave identically.
    pub fn name(&self) -> String {
        match self {
            Accessor::Bit(w) => format!("bit{w}"),
            Accessor::Int(w) => format!("int{w}"),
            Accessor::Uint(w) => format!("uint{w}"),
            Accessor::Float(w) => format!("float{w}"),
            Accessor::String {
                encoding,
                byte_length,
            } => format!("string({encoding},{byte_length})"),
            Accessor::Record(record) => format!("{}#{}", record.name(), record.uid()),
        }
    }

    /// Width of the field in bits.
    pub fn bits(&self) -> usize {
        match self {
            Accessor::Bit(w) | Accessor::Int(w) | Accessor::Uint(w) | Accessor::Float(w) => {
                *w as usize
            }
            Accessor::String { byte_length, .. } => byte_length.saturating_mul(8),
            Accessor::Record(record) => record.bit_length(),
        }
    }

    pub fn sub_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            Accessor::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Whether the accessor can only be placed on a byte boundary.
    pub fn byte_aligned(&self) -> bool {
        !matches!(self, Accessor::Bit(_))
    }

    /// Generates the get/set logic for `property` at `bit_offset`.
    ///
    /// String accessors capture `encoder`; defining one without an encoder,
    /// or with an encoding the encoder does not know, fails.
    pub fn generate(
        &self,
        property: &str,
        bit_offset: usize,
        encoder: Option<&Arc<dyn TextEncoder>>,
    ) -> Result<GeneratedAccessor> {
        if self.byte_aligned() && bit_offset % 8 != 0 {
            return Err(Error::Alignment {
                field: property.to_string(),
                accessor: self.name(),
                bit_offset,
            });
        }

        let byte_offset = bit_offset >> 3;
        let logic = match self {
            Accessor::Bit(width) => Logic::Bit(BitSlot::new(bit_offset, *width)),
            Accessor::Int(w) | Accessor::Uint(w) => {
                let signed = matches!(self, Accessor::Int(_));
                let (min, max) = bits::int_range(*w, signed);
                Logic::Int {
                    byte_offset,
                    bytes: (*w / 8) as usize,
                    signed,
                    min,
                    max,
                }
            }
            Accessor::Float(w) => Logic::Float {
                byte_offset,
                bytes: (*w / 8) as usize,
            },
            Accessor::String {
                encoding,
                byte_length,
            } => {
                let encoder = encoder.ok_or_else(|| {
                    Error::Configuration(format!(
                        "no text encoder installed, cannot define string field {property}"
                    ))
                })?;
                if !encoder.encoding_exists(encoding) {
                    return Err(Error::Configuration(format!(
                        "encoding {encoding:?} of {property} is not supported by the text encoder"
                    )));
                }
                Logic::Str {
                    byte_offset,
                    byte_length: *byte_length,
                    encoding: encoding.clone(),
                    encoder: encoder.clone(),
                }
            }
            Accessor::Record(record) => Logic::Record {
                byte_offset,
                record: record.clone(),
            },
        };

        Ok(GeneratedAccessor {
            property: property.to_string(),
            logic,
        })
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Accessor::Record(a), Accessor::Record(b)) => a.uid() == b.uid(),
            _ => self.name() == other.name(),
        }
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Get/set logic of one field, bound to its position in the owning record.
#[derive(Debug, Clone)]
pub struct GeneratedAccessor {
    property: String,
    logic: Logic,
}

#[derive(Debug, Clone)]
enum Logic {
    Bit(BitSlot),
    Int {
        byte_offset: usize,
        bytes: usize,
        signed: bool,
        min: i64,
        max: i64,
    },
    Float {
        byte_offset: usize,
        bytes: usize,
    },
    Str {
        byte_offset: usize,
        byte_length: usize,
        encoding: String,
        encoder: Arc<dyn TextEncoder>,
    },
    Record {
        byte_offset: usize,
        record: Arc<RecordType>,
    },
}

impl GeneratedAccessor {
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Reads the field from the record bytes covered by `view`.
    pub fn get(&self, view: &ByteView) -> Result<Value> {
        match &self.logic {
            Logic::Bit(slot) => view.read(|data| slot.read(data)).map(|v| Value::Int(v as i64)),
            Logic::Int {
                byte_offset,
                bytes,
                signed,
                ..
            } => {
                let raw = view.read(|data| bits::read_uint_be(data, *byte_offset, *bytes))?;
                Ok(Value::Int(if *signed {
                    bits::sign_extend(raw, bytes * 8)
                } else {
                    raw as i64
                }))
            }
            Logic::Float { byte_offset, bytes } => {
                let raw = view.read(|data| bits::read_uint_be(data, *byte_offset, *bytes))?;
                Ok(Value::Float(match bytes {
                    4 => f32::from_bits(raw as u32) as f64,
                    _ => f64::from_bits(raw),
                }))
            }
            Logic::Str {
                byte_offset,
                byte_length,
                encoding,
                encoder,
            } => {
                let bytes = view.read(|data| {
                    let field = region(data, *byte_offset, *byte_length)?;
                    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
                    Ok::<_, Error>(field[..end].to_vec())
                })?;
                encoder.decode(&bytes, encoding).map(Value::Str)
            }
            Logic::Record {
                byte_offset,
                record,
            } => {
                let sub = view.subview(*byte_offset, record.byte_length())?;
                Ok(Value::Record(Record::from_view(record.clone(), sub)))
            }
        }
    }

    /// Validates `value` and writes it into the record bytes covered by
    /// `view`. Nothing is written when validation fails.
    pub fn set(&self, view: &ByteView, value: Value) -> Result<()> {
        let field = self.property.as_str();

        match &self.logic {
            Logic::Bit(slot) => {
                let v = integer(field, &value, 0, slot.max() as i64)?;
                view.write(|data| slot.write(data, v as u64))
            }
            Logic::Int {
                byte_offset,
                bytes,
                min,
                max,
                ..
            } => {
                let v = integer(field, &value, *min, *max)?;
                view.write(|data| bits::write_uint_be(data, *byte_offset, *bytes, v as u64))
            }
            Logic::Float { byte_offset, bytes } => {
                let v = match value {
                    Value::Int(v) => v as f64,
                    Value::Float(v) if v.is_finite() => v,
                    Value::Float(v) => {
                        return Err(Error::range(field, format!("{v} is not finite")));
                    }
                    other => {
                        return Err(Error::range(
                            field,
                            format!("expected a number, got {}", other.kind()),
                        ));
                    }
                };
                let raw = match bytes {
                    4 => (v as f32).to_bits() as u64,
                    _ => v.to_bits(),
                };
                view.write(|data| bits::write_uint_be(data, *byte_offset, *bytes, raw))
            }
            Logic::Str {
                byte_offset,
                byte_length,
                encoding,
                encoder,
            } => {
                let kind = value.kind();
                let Value::Str(text) = value else {
                    return Err(Error::range(field, format!("expected text, got {kind}")));
                };
                let encoded = encoder.encode(&text, encoding)?;
                if encoded.len() > *byte_length {
                    return Err(Error::Capacity {
                        field: field.to_string(),
                        byte_length: *byte_length,
                        encoded: encoded.len(),
                    });
                }
                view.write(|data| {
                    let region = region_mut(data, *byte_offset, *byte_length)?;
                    let (head, tail) = region.split_at_mut(encoded.len());
                    head.copy_from_slice(&encoded);
                    tail.fill(0);
                    Ok(())
                })
            }
            Logic::Record {
                byte_offset,
                record,
            } => {
                let kind = value.kind();
                let Value::Record(source) = value else {
                    return Err(Error::range(
                        field,
                        format!("expected a {} record, got {kind}", record.name()),
                    ));
                };
                if source.record_type().uid() != record.uid() {
                    return Err(Error::TypeIdentity {
                        field: field.to_string(),
                        expected: record.uid(),
                        found: source.record_type().uid(),
                    });
                }
                // Snapshot first: source and destination may share a buffer.
                let bytes = source.byte_view().to_vec();
                let tail_bits = (record.bit_length() % 8) as u32;
                view.write(|data| {
                    let dest = region_mut(data, *byte_offset, bytes.len())?;
                    copy_record_bits(dest, &bytes, tail_bits);
                    Ok(())
                })
            }
        }
    }
}

/// Checks that `value` is an integer within `[min, max]`.
fn integer(field: &str, value: &Value, min: i64, max: i64) -> Result<i64> {
    let v = match value {
        Value::Int(v) => *v,
        Value::Float(f) => {
            if !f.is_finite() || f.fract() != 0.0 {
                return Err(Error::range(field, format!("{f} is not an integer")));
            }
            if *f < min as f64 || *f > max as f64 {
                return Err(Error::range(
                    field,
                    format!("{f} is outside [{min}, {max}]"),
                ));
            }
            *f as i64
        }
        other => {
            return Err(Error::range(
                field,
                format!("expected an integer, got {}", other.kind()),
            ));
        }
    };

    if v < min || v > max {
        return Err(Error::range(field, format!("{v} is outside [{min}, {max}]")));
    }

    Ok(v)
}

/// Copies a record's bytes, keeping only the high `tail_bits` of the last
/// byte when the record ends mid-byte. The low bits belong to the next field.
fn copy_record_bits(dest: &mut [u8], src: &[u8], tail_bits: u32) {
    let full = if tail_bits == 0 { src.len() } else { src.len() - 1 };
    dest[..full].copy_from_slice(&src[..full]);
    if tail_bits != 0 {
        let mask = !(0xffu8 >> tail_bits);
        dest[full] = (src[full] & mask) | (dest[full] & !mask);
    }
}

fn region(data: &[u8], byte_offset: usize, byte_length: usize) -> Result<&[u8]> {
    let available = data.len();
    data.get(byte_offset..byte_offset + byte_length)
        .ok_or(Error::Bounds {
            byte_offset,
            byte_length,
            available,
        })
}

fn region_mut(data: &mut [u8], byte_offset: usize, byte_length: usize) -> Result<&mut [u8]> {
    let available = data.len();
    data.get_mut(byte_offset..byte_offset + byte_length)
        .ok_or(Error::Bounds {
            byte_offset,
            byte_length,
            available,
        })
}

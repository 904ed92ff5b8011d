//! Object record compiler: allocates bit offsets for named fields and
//! generates their accessors.

use std::{collections::HashMap, sync::Arc};

use log::error;

use crate::{
    accessor::Accessor,
    encoding::TextEncoder,
    errors::{Error, Result},
    field::{validate_field_name, validate_record_name},
    record::{CompiledField, LayoutRow, RecordType, Shape, render_layout},
};

/// A field whose data type has already been resolved.
pub(crate) struct ResolvedField {
    pub name: String,
    pub accessor: Accessor,
    pub bit_offset: Option<usize>,
}

/// Compiles an object record type.
///
/// Fields are placed sequentially from bit 0; an explicit offset may skip
/// forward but never move backward. `bit_length` may pad the record but never
/// truncate it.
pub(crate) fn compile(
    name: &str,
    fields: Vec<ResolvedField>,
    bit_length: Option<usize>,
    encoder: Option<&Arc<dyn TextEncoder>>,
) -> Result<RecordType> {
    validate_record_name(name)?;

    let mut index = HashMap::with_capacity(fields.len());
    let mut compiled = Vec::with_capacity(fields.len());
    let mut offset = 0usize;

    for field in fields {
        validate_field_name(&field.name)?;
        if index.contains_key(&field.name) {
            return Err(Error::DuplicateField(field.name));
        }

        if let Some(explicit) = field.bit_offset {
            if explicit < offset {
                return Err(Error::InvalidOffset {
                    field: field.name,
                    bit_offset: explicit,
                    min: offset,
                });
            }
            offset = explicit;
        }

        let generated = field.accessor.generate(&field.name, offset, encoder)?;
        let bit_offset = offset;
        offset = match offset.checked_add(field.accessor.bits()) {
            Some(next) => next,
            None => {
                return Err(internal(
                    name,
                    &compiled,
                    offset,
                    format!("bit offset of {} overflows", field.name),
                ));
            }
        };

        index.insert(field.name.clone(), compiled.len());
        compiled.push(CompiledField {
            name: field.name,
            accessor: field.accessor,
            bit_offset,
            generated,
        });
    }

    let bit_length = match bit_length {
        Some(requested) if requested < offset => {
            return Err(Error::InvalidBitLength {
                requested,
                required: offset,
            });
        }
        Some(requested) => requested,
        None => offset,
    };

    verify(name, &compiled, bit_length)?;

    Ok(RecordType::new(
        name.to_string(),
        bit_length,
        Shape::Object {
            fields: compiled,
            index,
        },
    ))
}

/// Checks that every generated field lies inside the record and that no two
/// fields overlap.
fn verify(name: &str, fields: &[CompiledField], bit_length: usize) -> Result<()> {
    let mut end = 0usize;

    for field in fields {
        if field.bit_offset < end {
            return Err(internal(
                name,
                fields,
                bit_length,
                format!("{} overlaps the previous field", field.name),
            ));
        }
        end = field.bit_offset + field.accessor.bits();
        if end > bit_length {
            return Err(internal(
                name,
                fields,
                bit_length,
                format!("{} ends past the record", field.name),
            ));
        }
    }

    Ok(())
}

fn internal(name: &str, fields: &[CompiledField], bit_length: usize, reason: String) -> Error {
    let rows: Vec<LayoutRow> = fields
        .iter()
        .map(|f| LayoutRow::new(&f.name, &f.accessor, f.bit_offset))
        .collect();
    let layout = render_layout(name, &rows, bit_length);

    error!("failed to compile record {name}: {reason}\n{layout}");

    Error::InternalCompile { layout, reason }
}

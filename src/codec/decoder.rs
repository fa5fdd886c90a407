use crate::error::CodecError;
use crate::protocol::skip::{skip_elements, skip_map_entries};
use crate::protocol::{ProtocolReader, RecursionGuard};
use crate::types::{FieldType, Schema, StructDescriptor, WireType};
use crate::value::{StructValue, Value};

use super::skip_field;

/// Read one struct from `iprot` according to `descriptor`.
///
/// Unknown ids and wire-type mismatches are skipped; they never fail the
/// decode. Only the fields actually read end up present in the result.
pub fn read_struct<R: ProtocolReader + ?Sized>(
    schema: &Schema,
    descriptor: &StructDescriptor,
    iprot: &mut R,
) -> Result<StructValue, CodecError> {
    let mut iprot = RecursionGuard::enter(iprot)?;
    iprot.read_struct_begin()?;

    let mut value = StructValue::new();
    loop {
        let header = iprot.read_field_begin()?;
        if header.is_stop() {
            break;
        }

        match descriptor.find_field_by_id(header.id) {
            Some(field) if field.wire_type() == header.wire_type => {
                if let Some(v) = read_value(schema, &field.field_type, &mut *iprot)? {
                    value.set(field.id, v);
                }
            }
            Some(field) => {
                skip_field(&mut *iprot, &descriptor.name, &header, Some(field.wire_type()))?;
            }
            None => skip_field(&mut *iprot, &descriptor.name, &header, None)?,
        }

        iprot.read_field_end()?;
    }

    iprot.read_struct_end()?;
    Ok(value)
}

/// Read one value of type `ty`, whose wire type was already checked.
///
/// Returns `None` when a container's element types on the wire disagree with
/// `ty`. The container is consumed either way.
pub fn read_value<R: ProtocolReader + ?Sized>(
    schema: &Schema,
    ty: &FieldType,
    iprot: &mut R,
) -> Result<Option<Value>, CodecError> {
    let value = match ty {
        FieldType::Bool => Value::Bool(iprot.read_bool()?),
        FieldType::I8 => Value::I8(iprot.read_i8()?),
        FieldType::I16 => Value::I16(iprot.read_i16()?),
        FieldType::I32 => Value::I32(iprot.read_i32()?),
        FieldType::I64 => Value::I64(iprot.read_i64()?),
        FieldType::Double => Value::Double(iprot.read_double()?),
        FieldType::String => Value::String(iprot.read_string()?),
        FieldType::Binary => Value::Binary(iprot.read_binary()?),
        FieldType::Struct(name) => {
            let descriptor = schema
                .get_type(name)
                .ok_or_else(|| CodecError::UnknownType(name.clone()))?;
            Value::Struct(read_struct(schema, descriptor, iprot)?)
        }
        FieldType::List(elem) => {
            let header = iprot.read_list_begin()?;
            let items = read_elements(schema, elem, header.element_type, header.size, iprot)?;
            iprot.read_list_end()?;
            match items {
                Some(items) => Value::List(items),
                None => return Ok(None),
            }
        }
        FieldType::Set(elem) => {
            let header = iprot.read_set_begin()?;
            let items = read_elements(schema, elem, header.element_type, header.size, iprot)?;
            iprot.read_set_end()?;
            match items {
                Some(items) => Value::Set(items),
                None => return Ok(None),
            }
        }
        FieldType::Map(key_ty, value_ty) => {
            let header = iprot.read_map_begin()?;
            let entries = if header.size == 0 {
                Some(Vec::new())
            } else if header.key_type != Some(key_ty.wire_type())
                || header.value_type != Some(value_ty.wire_type())
            {
                tracing::debug!(
                    expected = %ty,
                    size = header.size,
                    "map entry types mismatch, skipping payload"
                );
                skip_map_entries(iprot, header.key_type, header.value_type, header.size)?;
                None
            } else {
                let mut entries = Vec::new();
                let mut complete = true;
                for _ in 0..header.size {
                    let k = read_value(schema, key_ty, iprot)?;
                    let v = read_value(schema, value_ty, iprot)?;
                    match (k, v) {
                        (Some(k), Some(v)) => entries.push((k, v)),
                        _ => complete = false,
                    }
                }
                complete.then_some(entries)
            };
            iprot.read_map_end()?;
            match entries {
                Some(entries) => Value::Map(entries),
                None => return Ok(None),
            }
        }
    };
    Ok(Some(value))
}

fn read_elements<R: ProtocolReader + ?Sized>(
    schema: &Schema,
    elem: &FieldType,
    wire_elem: WireType,
    size: usize,
    iprot: &mut R,
) -> Result<Option<Vec<Value>>, CodecError> {
    if size > 0 && wire_elem != elem.wire_type() {
        tracing::debug!(
            expected = %elem,
            actual = %wire_elem,
            size,
            "element type mismatch, skipping payload"
        );
        skip_elements(iprot, wire_elem, size)?;
        return Ok(None);
    }

    let mut items = Vec::new();
    let mut complete = true;
    for _ in 0..size {
        match read_value(schema, elem, iprot)? {
            Some(v) => items.push(v),
            // keep consuming so the stream stays aligned
            None => complete = false,
        }
    }
    Ok(complete.then_some(items))
}

use crate::error::{CodecError, EncodeError};
use crate::protocol::{CollectionHeader, MapHeader, ProtocolWriter, RecursionGuard};
use crate::types::{FieldType, Schema, StructDescriptor};
use crate::value::{StructValue, Value};

/// Write the present fields of `value` in declared order, then the stop marker.
///
/// Present ids that `descriptor` does not declare are not written.
pub fn write_struct<W: ProtocolWriter + ?Sized>(
    schema: &Schema,
    descriptor: &StructDescriptor,
    value: &StructValue,
    oprot: &mut W,
) -> Result<(), CodecError> {
    let mut oprot = RecursionGuard::enter(oprot)?;
    oprot.write_struct_begin(&descriptor.name)?;

    for field in &descriptor.fields {
        let Some(v) = value.get(field.id) else {
            continue;
        };
        // no header goes out for a value that cannot be written
        if !fits(&field.field_type, v) {
            return Err(type_mismatch(&field.name, &field.field_type, v));
        }
        oprot.write_field_begin(&field.name, field.wire_type(), field.id)?;
        write_value(schema, &field.name, &field.field_type, v, &mut *oprot)?;
        oprot.write_field_end()?;
    }

    oprot.write_field_stop()?;
    oprot.write_struct_end()
}

/// Write `value` as type `ty`. `field` names the enclosing field in errors.
pub fn write_value<W: ProtocolWriter + ?Sized>(
    schema: &Schema,
    field: &str,
    ty: &FieldType,
    value: &Value,
    oprot: &mut W,
) -> Result<(), CodecError> {
    match (ty, value) {
        (FieldType::Bool, Value::Bool(v)) => oprot.write_bool(*v),
        (FieldType::I8, Value::I8(v)) => oprot.write_i8(*v),
        (FieldType::I16, Value::I16(v)) => oprot.write_i16(*v),
        (FieldType::I32, Value::I32(v)) => oprot.write_i32(*v),
        (FieldType::I64, Value::I64(v)) => oprot.write_i64(*v),
        (FieldType::Double, Value::Double(v)) => oprot.write_double(*v),
        (FieldType::String, Value::String(v)) => oprot.write_string(v),
        (FieldType::Binary, Value::Binary(v)) => oprot.write_binary(v),
        (FieldType::Struct(name), Value::Struct(v)) => {
            let descriptor = schema
                .get_type(name)
                .ok_or_else(|| CodecError::UnknownType(name.clone()))?;
            write_struct(schema, descriptor, v, oprot)
        }
        (FieldType::List(elem), Value::List(items)) => {
            oprot.write_list_begin(&CollectionHeader::new(elem.wire_type(), items.len()))?;
            for item in items {
                write_value(schema, field, elem, item, oprot)?;
            }
            oprot.write_list_end()
        }
        (FieldType::Set(elem), Value::Set(items)) => {
            oprot.write_set_begin(&CollectionHeader::new(elem.wire_type(), items.len()))?;
            for item in items {
                write_value(schema, field, elem, item, oprot)?;
            }
            oprot.write_set_end()
        }
        (FieldType::Map(key_ty, value_ty), Value::Map(entries)) => {
            oprot.write_map_begin(&MapHeader::new(
                key_ty.wire_type(),
                value_ty.wire_type(),
                entries.len(),
            ))?;
            for (k, v) in entries {
                write_value(schema, field, key_ty, k, oprot)?;
                write_value(schema, field, value_ty, v, oprot)?;
            }
            oprot.write_map_end()
        }
        _ => Err(type_mismatch(field, ty, value)),
    }
}

/// Whether `value` is the variant `ty` calls for. Container elements are checked as they are written.
fn fits(ty: &FieldType, value: &Value) -> bool {
    matches!(
        (ty, value),
        (FieldType::Bool, Value::Bool(_))
            | (FieldType::I8, Value::I8(_))
            | (FieldType::I16, Value::I16(_))
            | (FieldType::I32, Value::I32(_))
            | (FieldType::I64, Value::I64(_))
            | (FieldType::Double, Value::Double(_))
            | (FieldType::String, Value::String(_))
            | (FieldType::Binary, Value::Binary(_))
            | (FieldType::Struct(_), Value::Struct(_))
            | (FieldType::List(_), Value::List(_))
            | (FieldType::Set(_), Value::Set(_))
            | (FieldType::Map(_, _), Value::Map(_))
    )
}

fn type_mismatch(field: &str, ty: &FieldType, value: &Value) -> CodecError {
    EncodeError::TypeMismatch {
        field: field.to_string(),
        expected: ty.to_string(),
        actual: value.type_name().to_string(),
    }
    .into()
}

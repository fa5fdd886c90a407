//! Required-field checks, applied only when the caller asks for them.
//!
//! Neither encode nor decode looks at `FieldDescriptor::required`.

use crate::error::ValidationError;
use crate::presence::Presence;
use crate::types::{FieldType, Schema, StructDescriptor};
use crate::value::{StructValue, Value};

/// Fail on the first required field of `descriptor` that `value` lacks.
pub fn validate_required<P: Presence + ?Sized>(
    descriptor: &StructDescriptor,
    value: &P,
) -> Result<(), ValidationError> {
    match descriptor
        .fields
        .iter()
        .find(|field| field.required && !value.is_set(field.id))
    {
        Some(field) => Err(ValidationError::MissingRequired {
            struct_name: descriptor.name.clone(),
            field: field.name.clone(),
            id: field.id,
        }),
        None => Ok(()),
    }
}

/// Like `validate_required`, but also descends into nested struct values,
/// including those inside lists, sets and maps.
pub fn validate_tree(
    schema: &Schema,
    descriptor: &StructDescriptor,
    value: &StructValue,
) -> Result<(), ValidationError> {
    validate_required(descriptor, value)?;
    for field in &descriptor.fields {
        if let Some(v) = value.get(field.id) {
            validate_nested(schema, &field.field_type, v)?;
        }
    }
    Ok(())
}

fn validate_nested(schema: &Schema, ty: &FieldType, value: &Value) -> Result<(), ValidationError> {
    match (ty, value) {
        (FieldType::Struct(name), Value::Struct(v)) => match schema.get_type(name) {
            Some(descriptor) => validate_tree(schema, descriptor, v),
            None => Ok(()),
        },
        (FieldType::List(elem), Value::List(items)) | (FieldType::Set(elem), Value::Set(items)) => {
            items.iter().try_for_each(|item| validate_nested(schema, elem, item))
        }
        (FieldType::Map(key_ty, value_ty), Value::Map(entries)) => {
            entries.iter().try_for_each(|(k, v)| {
                validate_nested(schema, key_ty, k)?;
                validate_nested(schema, value_ty, v)
            })
        }
        _ => Ok(()),
    }
}

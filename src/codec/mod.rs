//! Descriptor-driven struct codec over the protocol traits.
//!
//! `read_struct`/`write_struct` work with any `ProtocolReader`/`ProtocolWriter`;
//! `encode`/`decode` are shortcuts over an in-memory `BinaryProtocol`.

pub mod decoder;
pub mod encoder;

pub use decoder::read_struct;
pub use encoder::write_struct;

use crate::error::CodecError;
use crate::protocol::{BinaryProtocol, FieldHeader, ProtocolReader};
use crate::types::{Schema, StructDescriptor, WireType};
use crate::value::StructValue;

/// Encode a struct value with the binary protocol.
pub fn encode(
    schema: &Schema,
    descriptor: &StructDescriptor,
    value: &StructValue,
) -> Result<Vec<u8>, CodecError> {
    let mut oprot = BinaryProtocol::new(Vec::new());
    write_struct(schema, descriptor, value, &mut oprot)?;
    Ok(oprot.into_inner())
}

/// Decode a struct value written by the binary protocol.
pub fn decode(
    schema: &Schema,
    descriptor: &StructDescriptor,
    data: &[u8],
) -> Result<StructValue, CodecError> {
    let mut iprot = BinaryProtocol::new(data);
    read_struct(schema, descriptor, &mut iprot)
}

/// Discard the payload of a field the struct does not accept.
///
/// `expected` is the declared wire type when the id is known but the wire
/// type disagrees, `None` when the id is unknown.
pub fn skip_field<R: ProtocolReader + ?Sized>(
    iprot: &mut R,
    struct_name: &str,
    header: &FieldHeader,
    expected: Option<WireType>,
) -> Result<(), CodecError> {
    match expected {
        Some(expected) => tracing::debug!(
            struct_name,
            id = header.id,
            expected = %expected,
            actual = %header.wire_type,
            "wire type mismatch, skipping field"
        ),
        None => tracing::trace!(
            struct_name,
            id = header.id,
            wire_type = %header.wire_type,
            "skipping unknown field"
        ),
    }
    iprot.skip(header.wire_type)
}

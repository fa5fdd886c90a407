//! Type-directed skipping of values the codec does not want to materialize.

use crate::error::{CodecError, ProtocolError};
use crate::types::WireType;

use super::{ProtocolReader, RecursionGuard};

/// Consume and discard one value of `wire_type`.
///
/// Structs and containers recurse element by element, each level under the
/// reader's recursion guard, so a hostile stream of nested empty structs or
/// lists cannot exhaust the stack.
pub fn skip<R: ProtocolReader + ?Sized>(iprot: &mut R, wire_type: WireType) -> Result<(), CodecError> {
    match wire_type {
        WireType::Bool => iprot.read_bool().map(drop),
        WireType::I8 => iprot.read_i8().map(drop),
        WireType::I16 => iprot.read_i16().map(drop),
        WireType::I32 => iprot.read_i32().map(drop),
        WireType::I64 => iprot.read_i64().map(drop),
        WireType::Double => iprot.read_double().map(drop),
        // binary, not string: the payload may not be utf-8
        WireType::String => iprot.read_binary().map(drop),
        WireType::Struct => {
            let mut iprot = RecursionGuard::enter(iprot)?;
            iprot.read_struct_begin()?;
            loop {
                let header = iprot.read_field_begin()?;
                if header.is_stop() {
                    break;
                }
                skip(&mut *iprot, header.wire_type)?;
                iprot.read_field_end()?;
            }
            iprot.read_struct_end()
        }
        WireType::List => {
            let mut iprot = RecursionGuard::enter(iprot)?;
            let header = iprot.read_list_begin()?;
            skip_elements(&mut *iprot, header.element_type, header.size)?;
            iprot.read_list_end()
        }
        WireType::Set => {
            let mut iprot = RecursionGuard::enter(iprot)?;
            let header = iprot.read_set_begin()?;
            skip_elements(&mut *iprot, header.element_type, header.size)?;
            iprot.read_set_end()
        }
        WireType::Map => {
            let mut iprot = RecursionGuard::enter(iprot)?;
            let header = iprot.read_map_begin()?;
            skip_map_entries(&mut *iprot, header.key_type, header.value_type, header.size)?;
            iprot.read_map_end()
        }
        WireType::Stop => Err(ProtocolError::Unskippable(wire_type).into()),
    }
}

/// Discard `size` elements of a list or set whose header was already read.
pub(crate) fn skip_elements<R: ProtocolReader + ?Sized>(
    iprot: &mut R,
    element_type: WireType,
    size: usize,
) -> Result<(), CodecError> {
    for _ in 0..size {
        skip(iprot, element_type)?;
    }
    Ok(())
}

/// Discard `size` entries of a map whose header was already read.
pub(crate) fn skip_map_entries<R: ProtocolReader + ?Sized>(
    iprot: &mut R,
    key_type: Option<WireType>,
    value_type: Option<WireType>,
    size: usize,
) -> Result<(), CodecError> {
    if size == 0 {
        return Ok(());
    }
    let (Some(key_type), Some(value_type)) = (key_type, value_type) else {
        return Err(ProtocolError::UntypedMap { size }.into());
    };
    for _ in 0..size {
        skip(iprot, key_type)?;
        skip(iprot, value_type)?;
    }
    Ok(())
}

//! The protocol reader/writer contract the struct codec is written against.
//!
//! A protocol frames typed values onto a byte transport. The codec only ever
//! talks to `ProtocolReader`/`ProtocolWriter`, so the byte layout (binary,
//! compact, ...) is interchangeable.

pub mod binary;
pub mod compact;
pub mod recursion;
pub mod skip;
pub mod wire;

pub use binary::BinaryProtocol;
pub use compact::CompactProtocol;
pub use recursion::{RecursionCounter, RecursionGuard, RecursionTracker};
pub use skip::skip;

use crate::error::CodecError;
use crate::types::WireType;

/// Identifies one field on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHeader {
    /// Only text protocols carry names; binary encodings leave this `None`.
    pub name: Option<String>,
    pub wire_type: WireType,
    /// Meaningless when `wire_type` is `Stop`.
    pub id: i16,
}

impl FieldHeader {
    pub fn new(wire_type: WireType, id: i16) -> Self {
        FieldHeader {
            name: None,
            wire_type,
            id,
        }
    }

    /// The marker that terminates a struct's field stream.
    pub fn stop() -> Self {
        Self::new(WireType::Stop, 0)
    }

    pub fn is_stop(&self) -> bool {
        self.wire_type == WireType::Stop
    }
}

/// Element type and count of a list or set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionHeader {
    pub element_type: WireType,
    pub size: usize,
}

impl CollectionHeader {
    pub fn new(element_type: WireType, size: usize) -> Self {
        CollectionHeader { element_type, size }
    }
}

/// Key/value types and entry count of a map.
///
/// Compact encoding omits the types of an empty map, hence the `Option`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub key_type: Option<WireType>,
    pub value_type: Option<WireType>,
    pub size: usize,
}

impl MapHeader {
    pub fn new(key_type: WireType, value_type: WireType, size: usize) -> Self {
        MapHeader {
            key_type: Some(key_type),
            value_type: Some(value_type),
            size,
        }
    }
}

/// Reads typed values off a transport.
pub trait ProtocolReader: RecursionTracker {
    fn read_struct_begin(&mut self) -> Result<(), CodecError>;
    fn read_struct_end(&mut self) -> Result<(), CodecError>;

    /// Read the next field header. A `Stop` header ends the struct.
    fn read_field_begin(&mut self) -> Result<FieldHeader, CodecError>;
    fn read_field_end(&mut self) -> Result<(), CodecError>;

    fn read_bool(&mut self) -> Result<bool, CodecError>;
    fn read_i8(&mut self) -> Result<i8, CodecError>;
    fn read_i16(&mut self) -> Result<i16, CodecError>;
    fn read_i32(&mut self) -> Result<i32, CodecError>;
    fn read_i64(&mut self) -> Result<i64, CodecError>;
    fn read_double(&mut self) -> Result<f64, CodecError>;
    fn read_string(&mut self) -> Result<String, CodecError>;
    fn read_binary(&mut self) -> Result<Vec<u8>, CodecError>;

    fn read_list_begin(&mut self) -> Result<CollectionHeader, CodecError>;
    fn read_list_end(&mut self) -> Result<(), CodecError>;
    fn read_set_begin(&mut self) -> Result<CollectionHeader, CodecError>;
    fn read_set_end(&mut self) -> Result<(), CodecError>;
    fn read_map_begin(&mut self) -> Result<MapHeader, CodecError>;
    fn read_map_end(&mut self) -> Result<(), CodecError>;

    /// Consume and discard one value of `wire_type`.
    fn skip(&mut self, wire_type: WireType) -> Result<(), CodecError> {
        skip::skip(self, wire_type)
    }
}

/// Writes typed values onto a transport.
pub trait ProtocolWriter: RecursionTracker {
    fn write_struct_begin(&mut self, name: &str) -> Result<(), CodecError>;
    fn write_struct_end(&mut self) -> Result<(), CodecError>;

    fn write_field_begin(&mut self, name: &str, wire_type: WireType, id: i16) -> Result<(), CodecError>;
    fn write_field_end(&mut self) -> Result<(), CodecError>;
    fn write_field_stop(&mut self) -> Result<(), CodecError>;

    fn write_bool(&mut self, v: bool) -> Result<(), CodecError>;
    fn write_i8(&mut self, v: i8) -> Result<(), CodecError>;
    fn write_i16(&mut self, v: i16) -> Result<(), CodecError>;
    fn write_i32(&mut self, v: i32) -> Result<(), CodecError>;
    fn write_i64(&mut self, v: i64) -> Result<(), CodecError>;
    fn write_double(&mut self, v: f64) -> Result<(), CodecError>;
    fn write_string(&mut self, v: &str) -> Result<(), CodecError>;
    fn write_binary(&mut self, v: &[u8]) -> Result<(), CodecError>;

    fn write_list_begin(&mut self, header: &CollectionHeader) -> Result<(), CodecError>;
    fn write_list_end(&mut self) -> Result<(), CodecError>;
    fn write_set_begin(&mut self, header: &CollectionHeader) -> Result<(), CodecError>;
    fn write_set_end(&mut self) -> Result<(), CodecError>;
    fn write_map_begin(&mut self, header: &MapHeader) -> Result<(), CodecError>;
    fn write_map_end(&mut self) -> Result<(), CodecError>;

    fn flush(&mut self) -> Result<(), CodecError>;
}

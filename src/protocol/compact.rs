//! Compact encoding: zigzag varints, delta-coded field ids, and booleans
//! folded into their field header.

use std::io::{Read, Write};

use crate::config::ProtocolConfig;
use crate::error::{CodecError, ProtocolError};
use crate::types::WireType;

use super::wire::{
    encode_varint, zigzag_decode_32, zigzag_decode_64, zigzag_encode_32, zigzag_encode_64,
    MAX_VARINT_LEN,
};
use super::{
    CollectionHeader, FieldHeader, MapHeader, ProtocolReader, ProtocolWriter, RecursionCounter,
    RecursionTracker,
};

const COMPACT_STOP: u8 = 0x00;
const COMPACT_BOOL_TRUE: u8 = 0x01;
const COMPACT_BOOL_FALSE: u8 = 0x02;
const COMPACT_BYTE: u8 = 0x03;
const COMPACT_I16: u8 = 0x04;
const COMPACT_I32: u8 = 0x05;
const COMPACT_I64: u8 = 0x06;
const COMPACT_DOUBLE: u8 = 0x07;
const COMPACT_BINARY: u8 = 0x08;
const COMPACT_LIST: u8 = 0x09;
const COMPACT_SET: u8 = 0x0A;
const COMPACT_MAP: u8 = 0x0B;
const COMPACT_STRUCT: u8 = 0x0C;

/// Largest field id delta that fits in the short header form.
const MAX_SHORT_DELTA: i32 = 15;
/// Collection sizes below this fit in the header nibble.
const SHORT_COLLECTION_LIMIT: usize = 15;

fn to_compact_type(wire_type: WireType) -> u8 {
    match wire_type {
        WireType::Stop => COMPACT_STOP,
        WireType::Bool => COMPACT_BOOL_TRUE,
        WireType::I8 => COMPACT_BYTE,
        WireType::I16 => COMPACT_I16,
        WireType::I32 => COMPACT_I32,
        WireType::I64 => COMPACT_I64,
        WireType::Double => COMPACT_DOUBLE,
        WireType::String => COMPACT_BINARY,
        WireType::List => COMPACT_LIST,
        WireType::Set => COMPACT_SET,
        WireType::Map => COMPACT_MAP,
        WireType::Struct => COMPACT_STRUCT,
    }
}

fn from_compact_type(b: u8) -> Result<WireType, ProtocolError> {
    Ok(match b {
        COMPACT_STOP => WireType::Stop,
        COMPACT_BOOL_TRUE | COMPACT_BOOL_FALSE => WireType::Bool,
        COMPACT_BYTE => WireType::I8,
        COMPACT_I16 => WireType::I16,
        COMPACT_I32 => WireType::I32,
        COMPACT_I64 => WireType::I64,
        COMPACT_DOUBLE => WireType::Double,
        COMPACT_BINARY => WireType::String,
        COMPACT_LIST => WireType::List,
        COMPACT_SET => WireType::Set,
        COMPACT_MAP => WireType::Map,
        COMPACT_STRUCT => WireType::Struct,
        other => return Err(ProtocolError::InvalidWireType(other)),
    })
}

/// Compact protocol over any `Read` and/or `Write` transport.
///
/// Field ids are written as deltas from the previous id in the same struct,
/// so the protocol keeps a stack of "last id" values, one per open struct.
#[derive(Debug)]
pub struct CompactProtocol<T> {
    transport: T,
    config: ProtocolConfig,
    recursion: RecursionCounter,

    last_read_field_id: i16,
    read_field_stack: Vec<i16>,
    // value of a bool field, already decoded from its header
    pending_read_bool: Option<bool>,

    last_write_field_id: i16,
    write_field_stack: Vec<i16>,
    // id of a bool field whose header waits for the value
    pending_write_field: Option<i16>,
}

impl<T> CompactProtocol<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ProtocolConfig::default())
    }

    pub fn with_config(transport: T, config: ProtocolConfig) -> Self {
        CompactProtocol {
            transport,
            recursion: RecursionCounter::new(config.max_recursion_depth),
            config,
            last_read_field_id: 0,
            read_field_stack: Vec::new(),
            pending_read_bool: None,
            last_write_field_id: 0,
            write_field_stack: Vec::new(),
            pending_write_field: None,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T> RecursionTracker for CompactProtocol<T> {
    fn recursion_counter(&self) -> &RecursionCounter {
        &self.recursion
    }

    fn recursion_counter_mut(&mut self) -> &mut RecursionCounter {
        &mut self.recursion
    }
}

impl<T: Read> CompactProtocol<T> {
    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let mut buf = [0u8; 1];
        self.transport.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_varint_u64(&mut self) -> Result<u64, CodecError> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let b = self.read_u8()?;
            result |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(ProtocolError::InvalidVarint.into())
    }

    fn read_varint_u32(&mut self) -> Result<u32, CodecError> {
        let v = self.read_varint_u64()?;
        u32::try_from(v).map_err(|_| ProtocolError::InvalidVarint.into())
    }

    fn read_size(&mut self, what: &'static str) -> Result<usize, CodecError> {
        let size = self.read_varint_u32()? as i32;
        if size < 0 {
            return Err(ProtocolError::NegativeSize {
                what,
                size: size as i64,
            }
            .into());
        }
        Ok(size as usize)
    }

    fn read_collection_header(&mut self) -> Result<CollectionHeader, CodecError> {
        let header = self.read_u8()?;
        let element_type = from_compact_type(header & 0x0f)?;
        let short_size = (header >> 4) as usize;
        let size = if short_size == SHORT_COLLECTION_LIMIT {
            self.read_size("container")?
        } else {
            short_size
        };
        self.config.check_container_len(size)?;
        Ok(CollectionHeader::new(element_type, size))
    }
}

impl<T: Read> ProtocolReader for CompactProtocol<T> {
    fn read_struct_begin(&mut self) -> Result<(), CodecError> {
        self.read_field_stack.push(self.last_read_field_id);
        self.last_read_field_id = 0;
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), CodecError> {
        self.last_read_field_id = self.read_field_stack.pop().unwrap_or_default();
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<FieldHeader, CodecError> {
        let header = self.read_u8()?;
        let compact_type = header & 0x0f;
        if compact_type == COMPACT_STOP {
            return Ok(FieldHeader::stop());
        }
        let wire_type = from_compact_type(compact_type)?;

        let delta = (header >> 4) as i16;
        let id = if delta == 0 {
            self.read_i16()?
        } else {
            self.last_read_field_id.checked_add(delta).ok_or_else(|| {
                ProtocolError::InvalidData(format!(
                    "field id delta {} overflows after id {}",
                    delta, self.last_read_field_id
                ))
            })?
        };
        self.last_read_field_id = id;

        if wire_type == WireType::Bool {
            self.pending_read_bool = Some(compact_type == COMPACT_BOOL_TRUE);
        }
        Ok(FieldHeader::new(wire_type, id))
    }

    fn read_field_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, CodecError> {
        if let Some(v) = self.pending_read_bool.take() {
            return Ok(v);
        }
        // some writers emit 0 for a false element
        match self.read_u8()? {
            COMPACT_BOOL_TRUE => Ok(true),
            COMPACT_BOOL_FALSE | 0 => Ok(false),
            other => Err(ProtocolError::InvalidData(format!("invalid bool byte {other:#04x}")).into()),
        }
    }

    fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, CodecError> {
        let v = zigzag_decode_32(self.read_varint_u32()?);
        i16::try_from(v).map_err(|_| ProtocolError::InvalidData(format!("{v} does not fit in i16")).into())
    }

    fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(zigzag_decode_32(self.read_varint_u32()?))
    }

    fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(zigzag_decode_64(self.read_varint_u64()?))
    }

    fn read_double(&mut self) -> Result<f64, CodecError> {
        let mut buf = [0u8; 8];
        self.transport.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let bytes = self.read_binary()?;
        Ok(String::from_utf8(bytes).map_err(ProtocolError::from)?)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, CodecError> {
        let size = self.read_size("string")?;
        self.config.check_string_len(size)?;
        let mut buf = Vec::new();
        (&mut self.transport).take(size as u64).read_to_end(&mut buf)?;
        if buf.len() != size {
            return Err(ProtocolError::Truncated.into());
        }
        Ok(buf)
    }

    fn read_list_begin(&mut self) -> Result<CollectionHeader, CodecError> {
        self.read_collection_header()
    }

    fn read_list_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<CollectionHeader, CodecError> {
        self.read_collection_header()
    }

    fn read_set_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<MapHeader, CodecError> {
        let size = self.read_size("map")?;
        if size == 0 {
            return Ok(MapHeader {
                key_type: None,
                value_type: None,
                size: 0,
            });
        }
        self.config.check_container_len(size)?;
        let types = self.read_u8()?;
        let key_type = from_compact_type(types >> 4)?;
        let value_type = from_compact_type(types & 0x0f)?;
        Ok(MapHeader::new(key_type, value_type, size))
    }

    fn read_map_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<T: Write> CompactProtocol<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.transport.write_all(bytes)?;
        Ok(())
    }

    fn write_varint(&mut self, v: u64) -> Result<(), CodecError> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(v, &mut buf);
        self.write_bytes(&buf[..n])
    }

    fn write_size(&mut self, what: &'static str, size: usize) -> Result<(), CodecError> {
        if size > i32::MAX as usize {
            return Err(ProtocolError::SizeLimit {
                what,
                size,
                limit: i32::MAX as usize,
            }
            .into());
        }
        self.write_varint(size as u64)
    }

    fn write_field_header(&mut self, compact_type: u8, id: i16) -> Result<(), CodecError> {
        let delta = id as i32 - self.last_write_field_id as i32;
        if delta > 0 && delta <= MAX_SHORT_DELTA {
            self.write_bytes(&[((delta as u8) << 4) | compact_type])?;
        } else {
            self.write_bytes(&[compact_type])?;
            self.write_i16(id)?;
        }
        self.last_write_field_id = id;
        Ok(())
    }

    fn check_no_pending_bool(&mut self) -> Result<(), CodecError> {
        match self.pending_write_field.take() {
            Some(id) => Err(ProtocolError::InvalidData(format!(
                "bool field {id} was begun but never given a value"
            ))
            .into()),
            None => Ok(()),
        }
    }

    fn write_collection_header(&mut self, header: &CollectionHeader) -> Result<(), CodecError> {
        let element_type = to_compact_type(header.element_type);
        if header.size < SHORT_COLLECTION_LIMIT {
            self.write_bytes(&[((header.size as u8) << 4) | element_type])
        } else {
            self.write_bytes(&[0xf0 | element_type])?;
            self.write_size("container", header.size)
        }
    }
}

impl<T: Write> ProtocolWriter for CompactProtocol<T> {
    fn write_struct_begin(&mut self, _name: &str) -> Result<(), CodecError> {
        // a bool header left over from an abandoned struct must not leak into this one
        self.pending_write_field = None;
        self.write_field_stack.push(self.last_write_field_id);
        self.last_write_field_id = 0;
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<(), CodecError> {
        self.last_write_field_id = self.write_field_stack.pop().unwrap_or_default();
        Ok(())
    }

    fn write_field_begin(&mut self, _name: &str, wire_type: WireType, id: i16) -> Result<(), CodecError> {
        self.check_no_pending_bool()?;
        if wire_type == WireType::Bool {
            self.pending_write_field = Some(id);
            return Ok(());
        }
        self.write_field_header(to_compact_type(wire_type), id)
    }

    fn write_field_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn write_field_stop(&mut self) -> Result<(), CodecError> {
        self.check_no_pending_bool()?;
        self.write_bytes(&[COMPACT_STOP])
    }

    fn write_bool(&mut self, v: bool) -> Result<(), CodecError> {
        let compact_type = if v { COMPACT_BOOL_TRUE } else { COMPACT_BOOL_FALSE };
        match self.pending_write_field.take() {
            Some(id) => self.write_field_header(compact_type, id),
            None => self.write_bytes(&[compact_type]),
        }
    }

    fn write_i8(&mut self, v: i8) -> Result<(), CodecError> {
        self.write_bytes(&[v as u8])
    }

    fn write_i16(&mut self, v: i16) -> Result<(), CodecError> {
        self.write_varint(zigzag_encode_32(v as i32) as u64)
    }

    fn write_i32(&mut self, v: i32) -> Result<(), CodecError> {
        self.write_varint(zigzag_encode_32(v) as u64)
    }

    fn write_i64(&mut self, v: i64) -> Result<(), CodecError> {
        self.write_varint(zigzag_encode_64(v))
    }

    fn write_double(&mut self, v: f64) -> Result<(), CodecError> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_string(&mut self, v: &str) -> Result<(), CodecError> {
        self.write_binary(v.as_bytes())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<(), CodecError> {
        self.write_size("string", v.len())?;
        self.write_bytes(v)
    }

    fn write_list_begin(&mut self, header: &CollectionHeader) -> Result<(), CodecError> {
        self.write_collection_header(header)
    }

    fn write_list_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn write_set_begin(&mut self, header: &CollectionHeader) -> Result<(), CodecError> {
        self.write_collection_header(header)
    }

    fn write_set_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn write_map_begin(&mut self, header: &MapHeader) -> Result<(), CodecError> {
        if header.size == 0 {
            return self.write_bytes(&[0]);
        }
        let (Some(key_type), Some(value_type)) = (header.key_type, header.value_type) else {
            return Err(ProtocolError::UntypedMap { size: header.size }.into());
        };
        self.write_size("map", header.size)?;
        self.write_bytes(&[(to_compact_type(key_type) << 4) | to_compact_type(value_type)])
    }

    fn write_map_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        self.transport.flush()?;
        Ok(())
    }
}

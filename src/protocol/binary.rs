//! Binary encoding: fixed-width big-endian integers, `i32` length prefixes,
//! and a one-byte type tag plus `i16` id in front of each field.

use std::io::{Read, Write};

use crate::config::ProtocolConfig;
use crate::error::{CodecError, ProtocolError};
use crate::types::WireType;

use super::{
    CollectionHeader, FieldHeader, MapHeader, ProtocolReader, ProtocolWriter, RecursionCounter,
    RecursionTracker,
};

/// Binary protocol over any `Read` and/or `Write` transport.
#[derive(Debug)]
pub struct BinaryProtocol<T> {
    transport: T,
    config: ProtocolConfig,
    recursion: RecursionCounter,
}

impl<T> BinaryProtocol<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ProtocolConfig::default())
    }

    pub fn with_config(transport: T, config: ProtocolConfig) -> Self {
        BinaryProtocol {
            transport,
            recursion: RecursionCounter::new(config.max_recursion_depth),
            config,
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

impl<T> RecursionTracker for BinaryProtocol<T> {
    fn recursion_counter(&self) -> &RecursionCounter {
        &self.recursion
    }

    fn recursion_counter_mut(&mut self) -> &mut RecursionCounter {
        &mut self.recursion
    }
}

impl<T: Read> BinaryProtocol<T> {
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut buf = [0u8; N];
        self.transport.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_wire_type(&mut self) -> Result<WireType, CodecError> {
        Ok(WireType::try_from(self.read_u8()?)?)
    }

    fn read_size(&mut self, what: &'static str) -> Result<usize, CodecError> {
        let size = i32::from_be_bytes(self.read_array()?);
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
        let element_type = self.read_wire_type()?;
        let size = self.read_size("container")?;
        self.config.check_container_len(size)?;
        Ok(CollectionHeader::new(element_type, size))
    }
}

impl<T: Read> ProtocolReader for BinaryProtocol<T> {
    fn read_struct_begin(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<FieldHeader, CodecError> {
        let wire_type = self.read_wire_type()?;
        if wire_type == WireType::Stop {
            return Ok(FieldHeader::stop());
        }
        let id = self.read_i16()?;
        Ok(FieldHeader::new(wire_type, id))
    }

    fn read_field_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? != 0)
    }

    fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    fn read_double(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.read_array()?)))
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let bytes = self.read_binary()?;
        Ok(String::from_utf8(bytes).map_err(ProtocolError::from)?)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, CodecError> {
        let size = self.read_size("string")?;
        self.config.check_string_len(size)?;
        // Grow with the data actually present instead of trusting the prefix.
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
        let key_type = self.read_wire_type()?;
        let value_type = self.read_wire_type()?;
        let size = self.read_size("map")?;
        self.config.check_container_len(size)?;
        Ok(MapHeader::new(key_type, value_type, size))
    }

    fn read_map_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<T: Write> BinaryProtocol<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.transport.write_all(bytes)?;
        Ok(())
    }

    fn write_size(&mut self, what: &'static str, size: usize) -> Result<(), CodecError> {
        let size = i32::try_from(size).map_err(|_| ProtocolError::SizeLimit {
            what,
            size,
            limit: i32::MAX as usize,
        })?;
        self.write_i32(size)
    }

    fn write_collection_header(&mut self, header: &CollectionHeader) -> Result<(), CodecError> {
        self.write_bytes(&[header.element_type as u8])?;
        self.write_size("container", header.size)
    }
}

impl<T: Write> ProtocolWriter for BinaryProtocol<T> {
    fn write_struct_begin(&mut self, _name: &str) -> Result<(), CodecError> {
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn write_field_begin(&mut self, _name: &str, wire_type: WireType, id: i16) -> Result<(), CodecError> {
        self.write_bytes(&[wire_type as u8])?;
        self.write_i16(id)
    }

    fn write_field_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn write_field_stop(&mut self) -> Result<(), CodecError> {
        self.write_bytes(&[WireType::Stop as u8])
    }

    fn write_bool(&mut self, v: bool) -> Result<(), CodecError> {
        self.write_bytes(&[v as u8])
    }

    fn write_i8(&mut self, v: i8) -> Result<(), CodecError> {
        self.write_bytes(&[v as u8])
    }

    fn write_i16(&mut self, v: i16) -> Result<(), CodecError> {
        self.write_bytes(&v.to_be_bytes())
    }

    fn write_i32(&mut self, v: i32) -> Result<(), CodecError> {
        self.write_bytes(&v.to_be_bytes())
    }

    fn write_i64(&mut self, v: i64) -> Result<(), CodecError> {
        self.write_bytes(&v.to_be_bytes())
    }

    fn write_double(&mut self, v: f64) -> Result<(), CodecError> {
        self.write_bytes(&v.to_bits().to_be_bytes())
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
        let (Some(key_type), Some(value_type)) = (header.key_type, header.value_type) else {
            return Err(ProtocolError::UntypedMap { size: header.size }.into());
        };
        self.write_bytes(&[key_type as u8, value_type as u8])?;
        self.write_size("map", header.size)
    }

    fn write_map_end(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        self.transport.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut BinaryProtocol<Vec<u8>>) -> Result<(), CodecError>) -> Vec<u8> {
        let mut p = BinaryProtocol::new(Vec::new());
        f(&mut p).unwrap();
        p.into_inner()
    }

    #[test]
    fn test_field_header_layout() {
        let bytes = written(|p| {
            p.write_field_begin("MyErrorCode", WireType::I32, 1)?;
            p.write_i32(42)?;
            p.write_field_end()?;
            p.write_field_stop()
        });
        assert_eq!(bytes, vec![0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2a, 0x00]);
    }

    #[test]
    fn test_scalars_big_endian() {
        let bytes = written(|p| {
            p.write_i16(-2)?;
            p.write_i64(1)?;
            p.write_double(1.0)?;
            p.write_string("hi")
        });
        assert_eq!(
            bytes,
            vec![
                0xff, 0xfe, // i16
                0, 0, 0, 0, 0, 0, 0, 1, // i64
                0x3f, 0xf0, 0, 0, 0, 0, 0, 0, // double
                0, 0, 0, 2, b'h', b'i', // string
            ]
        );

        let mut p = BinaryProtocol::new(bytes.as_slice());
        assert_eq!(p.read_i16().unwrap(), -2);
        assert_eq!(p.read_i64().unwrap(), 1);
        assert_eq!(p.read_double().unwrap(), 1.0);
        assert_eq!(p.read_string().unwrap(), "hi");
    }

    #[test]
    fn test_read_stop() {
        let mut p = BinaryProtocol::new(&[0u8][..]);
        assert!(p.read_field_begin().unwrap().is_stop());
    }

    #[test]
    fn test_truncated_string() {
        let data = [0u8, 0, 0, 10, b'a', b'b'];
        let mut p = BinaryProtocol::new(&data[..]);
        assert!(matches!(
            p.read_binary(),
            Err(CodecError::Protocol(ProtocolError::Truncated))
        ));
    }

    #[test]
    fn test_negative_size() {
        let data = [0xffu8, 0xff, 0xff, 0xff];
        let mut p = BinaryProtocol::new(&data[..]);
        assert!(matches!(
            p.read_binary(),
            Err(CodecError::Protocol(ProtocolError::NegativeSize { size: -1, .. }))
        ));
    }

    #[test]
    fn test_string_limit() {
        let data = [0u8, 0, 0, 5, b'h', b'e', b'l', b'l', b'o'];
        let config = ProtocolConfig::default().with_max_string_len(4);
        let mut p = BinaryProtocol::with_config(&data[..], config);
        assert!(matches!(
            p.read_string(),
            Err(CodecError::Protocol(ProtocolError::SizeLimit { size: 5, limit: 4, .. }))
        ));
    }

    #[test]
    fn test_invalid_wire_type() {
        let mut p = BinaryProtocol::new(&[0x07u8, 0, 1][..]);
        assert!(matches!(
            p.read_field_begin(),
            Err(CodecError::Protocol(ProtocolError::InvalidWireType(0x07)))
        ));
    }

    #[test]
    fn test_map_header() {
        let bytes = written(|p| p.write_map_begin(&MapHeader::new(WireType::String, WireType::I64, 3)));
        assert_eq!(bytes, vec![11, 10, 0, 0, 0, 3]);
        let mut p = BinaryProtocol::new(bytes.as_slice());
        assert_eq!(
            p.read_map_begin().unwrap(),
            MapHeader::new(WireType::String, WireType::I64, 3)
        );
    }
}

//! Recursion ceiling and guard balance on decode, encode and skip.

use tagwire::codec;
use tagwire::error::CodecError;
use tagwire::protocol::{BinaryProtocol, CompactProtocol, RecursionTracker};
use tagwire::types::{FieldDescriptor, FieldType, Schema, StructDescriptor};
use tagwire::value::{StructValue, Value};
use tagwire::ProtocolConfig;

fn schema() -> Schema {
    Schema::from_types(vec![
        StructDescriptor::new("Node")
            .with_field(FieldDescriptor::new(1, "next", FieldType::Struct("Node".into())))
            .with_field(FieldDescriptor::new(2, "value", FieldType::I32)),
        StructDescriptor::new("Opaque"),
    ])
    .unwrap()
}

/// A chain of `depth` nested nodes; decoding it needs `depth` guard levels.
fn chain(depth: usize) -> StructValue {
    let mut node = StructValue::from_fields(vec![(2, Value::I32(depth as i32))]);
    for _ in 1..depth {
        node = StructValue::from_fields(vec![(1, node.into())]);
    }
    node
}

fn encode_unbounded(value: &StructValue) -> Vec<u8> {
    let schema = schema();
    let config = ProtocolConfig::default().with_max_recursion_depth(1000);
    let mut oprot = BinaryProtocol::with_config(Vec::new(), config);
    codec::write_struct(&schema, schema.get_type("Node").unwrap(), value, &mut oprot).unwrap();
    oprot.into_inner()
}

fn decode_with_limit(bytes: &[u8], ty: &str, limit: usize) -> (Result<StructValue, CodecError>, usize) {
    let schema = schema();
    let config = ProtocolConfig::default().with_max_recursion_depth(limit);
    let mut iprot = BinaryProtocol::with_config(bytes, config);
    let result = codec::read_struct(&schema, schema.get_type(ty).unwrap(), &mut iprot);
    (result, iprot.recursion_depth())
}

#[test]
fn test_decode_at_ceiling_succeeds() {
    let bytes = encode_unbounded(&chain(8));
    let (result, depth) = decode_with_limit(&bytes, "Node", 8);
    assert_eq!(result.unwrap(), chain(8));
    assert_eq!(depth, 0);
}

#[test]
fn test_decode_past_ceiling_fails() {
    let bytes = encode_unbounded(&chain(9));
    let (result, depth) = decode_with_limit(&bytes, "Node", 8);
    assert!(matches!(
        result,
        Err(CodecError::RecursionLimitExceeded { limit: 8 })
    ));
    assert_eq!(depth, 0);
}

#[test]
fn test_default_ceiling() {
    let schema = schema();
    let ty = schema.get_type("Node").unwrap();

    let ok = encode_unbounded(&chain(64));
    assert_eq!(codec::decode(&schema, ty, &ok).unwrap(), chain(64));

    let too_deep = encode_unbounded(&chain(65));
    assert!(matches!(
        codec::decode(&schema, ty, &too_deep),
        Err(CodecError::RecursionLimitExceeded { limit: 64 })
    ));
}

#[test]
fn test_encode_past_ceiling_fails() {
    let schema = schema();
    let ty = schema.get_type("Node").unwrap();
    let config = ProtocolConfig::default().with_max_recursion_depth(4);

    let mut oprot = CompactProtocol::with_config(Vec::new(), config);
    codec::write_struct(&schema, ty, &chain(4), &mut oprot).unwrap();
    assert_eq!(oprot.recursion_depth(), 0);

    let mut oprot = CompactProtocol::with_config(Vec::new(), config);
    assert!(matches!(
        codec::write_struct(&schema, ty, &chain(5), &mut oprot),
        Err(CodecError::RecursionLimitExceeded { limit: 4 })
    ));
    assert_eq!(oprot.recursion_depth(), 0);
}

#[test]
fn test_skip_is_guarded() {
    // "Opaque" knows no fields, so the whole chain goes through skip
    let bytes = encode_unbounded(&chain(20));
    let (result, depth) = decode_with_limit(&bytes, "Opaque", 20);
    assert_eq!(result.unwrap(), StructValue::new());
    assert_eq!(depth, 0);

    let (result, depth) = decode_with_limit(&bytes, "Opaque", 19);
    assert!(matches!(
        result,
        Err(CodecError::RecursionLimitExceeded { limit: 19 })
    ));
    assert_eq!(depth, 0);
}

#[test]
fn test_hostile_nested_lists() {
    // unknown field 1: list<list<list<...>>> two hundred levels deep
    let mut data = vec![15u8, 0, 1];
    for _ in 0..200 {
        data.extend_from_slice(&[15, 0, 0, 0, 1]);
    }
    data.extend_from_slice(&[8, 0, 0, 0, 0, 0]);

    let (result, depth) = decode_with_limit(&data, "Opaque", 64);
    assert!(matches!(
        result,
        Err(CodecError::RecursionLimitExceeded { limit: 64 })
    ));
    assert_eq!(depth, 0);
}

#[test]
fn test_guard_balanced_across_calls() {
    let schema = schema();
    let ty = schema.get_type("Node").unwrap();
    let config = ProtocolConfig::default().with_max_recursion_depth(3);
    let too_deep = encode_unbounded(&chain(5));
    let fits = encode_unbounded(&chain(3));

    // a failed decode leaves the counter where it started, so the same
    // protocol instance can read the next stream
    let mut iprot = BinaryProtocol::with_config(&too_deep[..], config);
    assert!(matches!(
        codec::read_struct(&schema, ty, &mut iprot),
        Err(CodecError::RecursionLimitExceeded { limit: 3 })
    ));
    assert_eq!(iprot.recursion_depth(), 0);

    *iprot.get_mut() = &fits[..];
    assert_eq!(codec::read_struct(&schema, ty, &mut iprot).unwrap(), chain(3));
    assert_eq!(iprot.recursion_depth(), 0);
}

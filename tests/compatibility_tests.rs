//! Skip tolerance: unknown ids and wire-type mismatches never fail a decode.
//!
//! A v2 writer adds fields a v1 reader has never heard of, and a v3 writer
//! changes the type of an existing id.

use pretty_assertions::assert_eq;
use tagwire::codec;
use tagwire::protocol::{CompactProtocol, ProtocolReader, RecursionTracker};
use tagwire::types::{FieldDescriptor, FieldType, Schema, StructDescriptor};
use tagwire::value::{StructValue, Value};

fn schema_v1() -> Schema {
    Schema::from_types(vec![StructDescriptor::new("Person")
        .with_field(FieldDescriptor::new(1, "name", FieldType::String))
        .with_field(FieldDescriptor::new(2, "age", FieldType::I32))])
    .unwrap()
}

fn schema_v2() -> Schema {
    Schema::from_types(vec![
        StructDescriptor::new("Address")
            .with_field(FieldDescriptor::new(1, "city", FieldType::String))
            .with_field(FieldDescriptor::new(
                2,
                "lines",
                FieldType::list(FieldType::String),
            )),
        StructDescriptor::new("Person")
            .with_field(FieldDescriptor::new(4, "email", FieldType::String))
            .with_field(FieldDescriptor::new(1, "name", FieldType::String))
            .with_field(FieldDescriptor::new(5, "address", FieldType::Struct("Address".into())))
            .with_field(FieldDescriptor::new(2, "age", FieldType::I32))
            .with_field(FieldDescriptor::new(
                6,
                "scores",
                FieldType::map(FieldType::String, FieldType::Double),
            ))
            .with_field(FieldDescriptor::new(7, "flags", FieldType::set(FieldType::Bool)))
            .with_field(FieldDescriptor::new(8, "nested", FieldType::list(FieldType::list(FieldType::I64)))),
    ])
    .unwrap()
}

fn schema_v3() -> Schema {
    Schema::from_types(vec![StructDescriptor::new("Person")
        .with_field(FieldDescriptor::new(1, "name", FieldType::String))
        .with_field(FieldDescriptor::new(2, "age", FieldType::String))
        .with_field(FieldDescriptor::new(3, "extra", FieldType::I64))])
    .unwrap()
}

fn person_v2() -> StructValue {
    let address = StructValue::from_fields(vec![
        (1, "Oslo".into()),
        (2, Value::List(vec!["Main St 1".into(), "c/o Bob".into()])),
    ]);
    StructValue::from_fields(vec![
        (4, "alice@example.com".into()),
        (1, "Alice".into()),
        (5, address.into()),
        (2, 30i32.into()),
        (
            6,
            Value::Map(vec![(Value::from("math"), Value::Double(9.5))]),
        ),
        (7, Value::Set(vec![true.into()])),
        (
            8,
            Value::List(vec![Value::List(vec![1i64.into()]), Value::List(vec![])]),
        ),
    ])
}

#[test]
fn test_new_fields_skipped_binary() {
    let v2 = schema_v2();
    let bytes = codec::encode(&v2, v2.get_type("Person").unwrap(), &person_v2()).unwrap();

    let v1 = schema_v1();
    let decoded = codec::decode(&v1, v1.get_type("Person").unwrap(), &bytes).unwrap();

    // identical to decoding a stream that never carried the new fields
    let trimmed = StructValue::from_fields(vec![(1, "Alice".into()), (2, 30i32.into())]);
    let trimmed_bytes = codec::encode(&v1, v1.get_type("Person").unwrap(), &trimmed).unwrap();
    let expected = codec::decode(&v1, v1.get_type("Person").unwrap(), &trimmed_bytes).unwrap();
    assert_eq!(decoded, expected);
}

#[test]
fn test_new_fields_skipped_compact() {
    let v2 = schema_v2();
    let mut oprot = CompactProtocol::new(Vec::new());
    codec::write_struct(&v2, v2.get_type("Person").unwrap(), &person_v2(), &mut oprot).unwrap();
    let bytes = oprot.into_inner();

    let v1 = schema_v1();
    let mut iprot = CompactProtocol::new(bytes.as_slice());
    let decoded = codec::read_struct(&v1, v1.get_type("Person").unwrap(), &mut iprot).unwrap();
    assert_eq!(
        decoded,
        StructValue::from_fields(vec![(1, "Alice".into()), (2, 30i32.into())])
    );
    assert_eq!(iprot.recursion_depth(), 0);
}

#[test]
fn test_type_mismatch_is_skipped() {
    let v3 = schema_v3();
    let written = StructValue::from_fields(vec![
        (1, "Bob".into()),
        (2, "thirty".into()),
        (3, 99i64.into()),
    ]);
    let bytes = codec::encode(&v3, v3.get_type("Person").unwrap(), &written).unwrap();

    let v1 = schema_v1();
    let decoded = codec::decode(&v1, v1.get_type("Person").unwrap(), &bytes).unwrap();
    assert_eq!(decoded, StructValue::from_fields(vec![(1, "Bob".into())]));
}

#[test]
fn test_old_reader_of_old_data() {
    let v1 = schema_v1();
    let value = StructValue::from_fields(vec![(2, 41i32.into())]);
    let bytes = codec::encode(&v1, v1.get_type("Person").unwrap(), &value).unwrap();

    // a newer reader sees the v1 stream with every new field absent
    let v2 = schema_v2();
    let decoded = codec::decode(&v2, v2.get_type("Person").unwrap(), &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_stream_position_after_skip() {
    // two back-to-back structs: skipping inside the first must not eat the second
    let v2 = schema_v2();
    let ty = v2.get_type("Person").unwrap();
    let mut oprot = CompactProtocol::new(Vec::new());
    codec::write_struct(&v2, ty, &person_v2(), &mut oprot).unwrap();
    codec::write_struct(&v2, ty, &StructValue::from_fields(vec![(1, "Carol".into())]), &mut oprot)
        .unwrap();
    let bytes = oprot.into_inner();

    let v1 = schema_v1();
    let mut iprot = CompactProtocol::new(bytes.as_slice());
    let first = codec::read_struct(&v1, v1.get_type("Person").unwrap(), &mut iprot).unwrap();
    let second = codec::read_struct(&v1, v1.get_type("Person").unwrap(), &mut iprot).unwrap();
    assert_eq!(first.get(1).and_then(Value::as_str), Some("Alice"));
    assert_eq!(second, StructValue::from_fields(vec![(1, "Carol".into())]));
}

#[test]
fn test_skip_whole_struct() {
    let v2 = schema_v2();
    let mut oprot = CompactProtocol::new(Vec::new());
    codec::write_struct(&v2, v2.get_type("Person").unwrap(), &person_v2(), &mut oprot).unwrap();
    let bytes = oprot.into_inner();

    let mut iprot = CompactProtocol::new(bytes.as_slice());
    iprot.skip(tagwire::types::WireType::Struct).unwrap();
    assert_eq!(iprot.recursion_depth(), 0);
    assert!(iprot.into_inner().is_empty());
}

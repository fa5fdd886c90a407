//! Tests for `#[derive(TStruct)]`.

#![cfg(feature = "derive")]

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use pretty_assertions::assert_eq;
use tagwire::codec;
use tagwire::error::{CodecError, ValidationError};
use tagwire::protocol::{CompactProtocol, RecursionTracker};
use tagwire::types::{FieldType, Schema, WireType};
use tagwire::{Binary, Presence, ProtocolConfig, TStruct, WireValue};

#[derive(TStruct, Debug, Clone, Default)]
#[tagwire(exception)]
struct CrashBoomBang {
    #[tagwire(id = 1, name = "MyErrorCode")]
    my_error_code: Option<i32>,
}

#[derive(TStruct, Debug, Clone, Default)]
struct Address {
    #[tagwire(id = 1)]
    city: Option<String>,
    #[tagwire(id = 2)]
    zip: Option<i32>,
}

#[derive(TStruct, Debug, Clone, Default)]
#[tagwire(name = "Person")]
struct PersonRecord {
    #[tagwire(id = 1, required)]
    name: Option<String>,
    #[tagwire(id = 2)]
    age: Option<i16>,
    #[tagwire(id = 3)]
    active: Option<bool>,
    #[tagwire(id = 4)]
    score: Option<f64>,
    #[tagwire(id = 5)]
    tags: Option<Vec<String>>,
    #[tagwire(id = 6)]
    lucky: Option<BTreeSet<i64>>,
    #[tagwire(id = 7)]
    attrs: Option<BTreeMap<String, i32>>,
    #[tagwire(id = 8)]
    address: Option<Address>,
    #[tagwire(id = 9)]
    avatar: Option<Binary>,
    #[tagwire(id = -1)]
    level: Option<i8>,
    #[tagwire(skip)]
    cached_len: usize,
}

/// Older shape of `Person`: fewer fields, and `age` declared as a string.
#[derive(TStruct, Debug, Clone, Default)]
#[tagwire(name = "Person")]
struct PersonV1 {
    #[tagwire(id = 1)]
    name: Option<String>,
    #[tagwire(id = 2)]
    age: Option<String>,
}

#[derive(TStruct, Debug, Clone, Default)]
struct Node {
    #[tagwire(id = 1)]
    value: Option<i32>,
    #[tagwire(id = 2)]
    next: Option<Box<Node>>,
}

fn hash_of<T: Hash>(v: &T) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

fn full_person() -> PersonRecord {
    PersonRecord {
        name: Some("Ann".into()),
        age: Some(41),
        active: Some(false),
        score: Some(2.5),
        tags: Some(vec!["x".into(), "y".into()]),
        lucky: Some([3, 1, 2].into_iter().collect()),
        attrs: Some([("k".to_string(), 7)].into_iter().collect()),
        address: Some(Address {
            city: Some("Oslo".into()),
            zip: None,
        }),
        avatar: Some(Binary(vec![1, 2, 3])),
        level: Some(-5),
        cached_len: 99,
    }
}

fn chain(depth: usize) -> Node {
    let mut node = Node {
        value: Some(depth as i32),
        next: None,
    };
    for _ in 1..depth {
        node = Node {
            value: None,
            next: Some(Box::new(node)),
        };
    }
    node
}

#[test]
fn test_crash_boom_bang_wire() {
    let v = CrashBoomBang {
        my_error_code: Some(42),
    };
    assert_eq!(
        v.to_bytes().unwrap(),
        vec![0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2a, 0x00]
    );

    let mut oprot = CompactProtocol::new(Vec::new());
    v.write(&mut oprot).unwrap();
    assert_eq!(oprot.into_inner(), vec![0x15, 0x54, 0x00]);

    let decoded = CrashBoomBang::from_bytes(&[0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2a, 0x00]).unwrap();
    assert!(decoded.is_set(1));
    assert_eq!(decoded.my_error_code, Some(42));
    assert_eq!(decoded.to_string(), "CrashBoomBang(MyErrorCode: 42)");
}

#[test]
fn test_crash_boom_bang_empty() {
    let decoded = CrashBoomBang::from_bytes(&[0x00]).unwrap();
    assert!(!decoded.is_set(1));
    assert_eq!(decoded.my_error_code, None);
    assert_eq!(decoded.to_string(), "CrashBoomBang()");
    assert_eq!(decoded, CrashBoomBang::default());
}

fn fail_with(code: i32) -> Result<(), CrashBoomBang> {
    Err(CrashBoomBang {
        my_error_code: Some(code),
    })
}

#[test]
fn test_exception_struct_is_error() {
    let boxed: Box<dyn std::error::Error> = match fail_with(7) {
        Err(e) => Box::new(e),
        Ok(()) => panic!("expected an error"),
    };
    assert_eq!(boxed.to_string(), "CrashBoomBang(MyErrorCode: 7)");

    // still a regular wire struct
    let err = fail_with(42).unwrap_err();
    assert_eq!(
        err.to_bytes().unwrap(),
        vec![0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2a, 0x00]
    );
}

#[test]
fn test_full_roundtrip_both_protocols() {
    let person = full_person();

    let decoded = PersonRecord::from_bytes(&person.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, person);
    // skipped fields stay off the wire and out of equality
    assert_eq!(decoded.cached_len, 0);

    let mut oprot = CompactProtocol::new(Vec::new());
    person.write(&mut oprot).unwrap();
    let bytes = oprot.into_inner();
    let mut iprot = CompactProtocol::new(bytes.as_slice());
    assert_eq!(PersonRecord::read(&mut iprot).unwrap(), person);
    assert_eq!(iprot.recursion_depth(), 0);
}

#[test]
fn test_presence_queries() {
    let mut person = PersonRecord {
        level: Some(0),
        name: Some(String::new()),
        ..Default::default()
    };
    assert!(person.is_set(1));
    assert!(person.is_set(-1));
    assert!(!person.is_set(2));
    assert!(!person.is_set(100));
    assert_eq!(person.present_ids(), vec![1, -1]);

    assert!(person.clear(1));
    assert!(!person.clear(1));
    assert_eq!(person.name, None);
    assert_eq!(person.present_ids(), vec![-1]);
}

#[test]
fn test_zero_versus_absent() {
    let absent = PersonRecord::default();
    let zero = PersonRecord {
        age: Some(0),
        ..Default::default()
    };
    assert_ne!(absent, zero);
    assert_ne!(hash_of(&absent), hash_of(&zero));

    // the zero survives the wire
    let back = PersonRecord::from_bytes(&zero.to_bytes().unwrap()).unwrap();
    assert_eq!(back.age, Some(0));
    assert_eq!(back, zero);
}

#[test]
fn test_equal_values_hash_equal() {
    let a = full_person();
    let mut b = full_person();
    b.cached_len = 0;
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let nan_a = PersonRecord {
        score: Some(f64::NAN),
        ..Default::default()
    };
    let nan_b = nan_a.clone();
    assert_eq!(nan_a, nan_b);
    assert_eq!(hash_of(&nan_a), hash_of(&nan_b));
}

#[test]
fn test_deep_copy() {
    let original = full_person();
    let mut copy = original.clone();
    if let Some(address) = copy.address.as_mut() {
        address.city = Some("Bergen".into());
    }
    if let Some(tags) = copy.tags.as_mut() {
        tags.push("z".into());
    }
    assert_ne!(copy, original);
    assert_eq!(original.address.as_ref().and_then(|a| a.city.as_deref()), Some("Oslo"));
    assert_eq!(original.tags.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_display() {
    let person = PersonRecord {
        name: Some("Ann".into()),
        address: Some(Address {
            city: Some("Oslo".into()),
            zip: None,
        }),
        level: Some(-5),
        ..Default::default()
    };
    assert_eq!(
        person.to_string(),
        r#"Person(name: "Ann", address: Address(city: "Oslo"), level: -5)"#
    );
    assert_eq!(
        full_person().to_string(),
        r#"Person(name: "Ann", age: 41, active: false, score: 2.5, tags: ["x", "y"], lucky: {1, 2, 3}, attrs: {"k": 7}, address: Address(city: "Oslo"), avatar: <binary 3 bytes>, level: -5)"#
    );
}

#[test]
fn test_descriptor() {
    let desc = PersonRecord::descriptor();
    assert_eq!(desc.name, "Person");
    assert_eq!(PersonRecord::NAME, "Person");
    assert_eq!(desc.fields.len(), 10);

    let name = desc.find_field_by_id(1).unwrap();
    assert_eq!(name.name, "name");
    assert!(name.required);
    assert_eq!(name.field_type, FieldType::String);

    let attrs = desc.find_field_by_name("attrs").unwrap();
    assert_eq!(attrs.field_type, FieldType::map(FieldType::String, FieldType::I32));
    assert_eq!(
        desc.find_field_by_id(8).unwrap().field_type,
        FieldType::Struct("Address".into())
    );
    assert!(desc.find_field_by_name("cached_len").is_none());

    assert_eq!(<PersonRecord as WireValue>::WIRE_TYPE, WireType::Struct);
}

#[test]
fn test_typed_and_dynamic_agree() {
    let schema = Schema::from_types(vec![Address::descriptor(), PersonRecord::descriptor()]).unwrap();
    let ty = schema.get_type("Person").unwrap();
    let person = full_person();

    let dynamic = codec::decode(&schema, ty, &person.to_bytes().unwrap()).unwrap();
    assert_eq!(dynamic.present_ids(), vec![-1, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(dynamic.display(&schema, ty).to_string(), person.to_string());

    let bytes = codec::encode(&schema, ty, &dynamic).unwrap();
    assert_eq!(bytes, person.to_bytes().unwrap());
    assert_eq!(PersonRecord::from_bytes(&bytes).unwrap(), person);
}

#[test]
fn test_skip_tolerance() {
    let person = full_person();
    let v1 = PersonV1::from_bytes(&person.to_bytes().unwrap()).unwrap();
    // unknown ids are dropped and the i16 age does not fit the string slot
    assert_eq!(v1.name.as_deref(), Some("Ann"));
    assert_eq!(v1.age, None);
    assert_eq!(v1.present_ids(), vec![1]);

    let old = PersonV1 {
        name: Some("Old".into()),
        age: Some("forty".into()),
    };
    let upgraded = PersonRecord::from_bytes(&old.to_bytes().unwrap()).unwrap();
    assert_eq!(
        upgraded,
        PersonRecord {
            name: Some("Old".into()),
            ..Default::default()
        }
    );
}

#[test]
fn test_validate_required() {
    assert!(full_person().validate().is_ok());
    match PersonRecord::default().validate() {
        Err(ValidationError::MissingRequired {
            struct_name,
            field,
            id,
        }) => {
            assert_eq!(struct_name, "Person");
            assert_eq!(field, "name");
            assert_eq!(id, 1);
        }
        other => panic!("expected missing required field, got {:?}", other),
    }
    // the codec itself is permissive
    assert!(PersonRecord::default().to_bytes().is_ok());
}

#[test]
fn test_recursive_type_ceiling() {
    let ok = chain(64);
    let back = Node::from_bytes(&ok.to_bytes().unwrap()).unwrap();
    assert_eq!(back, ok);

    let deep = chain(65);
    assert!(matches!(
        deep.to_bytes(),
        Err(CodecError::RecursionLimitExceeded { limit: 64 })
    ));

    let config = ProtocolConfig::default().with_max_recursion_depth(100);
    let mut oprot = tagwire::BinaryProtocol::with_config(Vec::new(), config);
    deep.write(&mut oprot).unwrap();
    let bytes = oprot.into_inner();

    let mut iprot = tagwire::BinaryProtocol::new(bytes.as_slice());
    assert!(matches!(
        Node::read(&mut iprot),
        Err(CodecError::RecursionLimitExceeded { limit: 64 })
    ));
    assert_eq!(iprot.recursion_depth(), 0);
}

#[test]
fn test_truncated_is_error() {
    let bytes = full_person().to_bytes().unwrap();
    for len in [0, 1, bytes.len() / 2, bytes.len() - 1] {
        assert!(PersonRecord::from_bytes(&bytes[..len]).is_err(), "len {}", len);
    }
}

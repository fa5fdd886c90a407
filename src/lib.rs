//! tagwire: a field-tagged binary struct codec.
//!
//! Structs travel as a sequence of `(wire type, field id, payload)` triples
//! closed by a stop marker. Decoding skips ids it does not know, so old
//! readers accept data from newer writers. Optional fields track presence, and
//! equality, hashing and display only ever look at present fields.
//!
//! Two ways to describe a struct:
//!
//! - a runtime [`Schema`] of [`StructDescriptor`]s, driving the dynamic
//!   [`codec`] over [`StructValue`]s;
//! - `#[derive(TStruct)]` on a Rust struct whose wire fields are `Option<T>`.
//!
//! Both run over the [`protocol::ProtocolReader`]/[`protocol::ProtocolWriter`]
//! traits; [`BinaryProtocol`] and [`CompactProtocol`] implement them.
//!
//! # Quick Start
//!
//! ```rust
//! use tagwire::codec;
//! use tagwire::types::{FieldDescriptor, FieldType, Schema, StructDescriptor};
//! use tagwire::value::StructValue;
//!
//! let schema = Schema::from_types(vec![StructDescriptor::new("Person")
//!     .with_field(FieldDescriptor::new(1, "name", FieldType::String))
//!     .with_field(FieldDescriptor::new(2, "age", FieldType::I32))])
//! .unwrap();
//!
//! let person_type = schema.get_type("Person").unwrap();
//! let value = StructValue::from_fields(vec![(1, "Alice".into()), (2, 30i32.into())]);
//!
//! let encoded = codec::encode(&schema, person_type, &value).unwrap();
//! let decoded = codec::decode(&schema, person_type, &encoded).unwrap();
//! assert_eq!(value, decoded);
//! assert_eq!(
//!     decoded.display(&schema, person_type).to_string(),
//!     r#"Person(name: "Alice", age: 30)"#
//! );
//! ```

pub mod codec;
pub mod config;
pub mod derive_traits;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod types;
pub mod validate;
pub mod value;

pub use config::ProtocolConfig;
pub use derive_traits::{TStruct, WireValue};
pub use error::{CodecError, Error, ProtocolError, Result};
pub use presence::Presence;
pub use protocol::{BinaryProtocol, CompactProtocol};
pub use types::{Schema, StructDescriptor};
pub use value::{Binary, StructValue, Value};

// Re-export the derive macro when the feature is enabled
#[cfg(feature = "derive")]
pub use tagwire_derive::TStruct;

//! Traits behind `#[derive(TStruct)]`.
//!
//! `WireValue` is implemented for every type a typed struct field may hold,
//! and by the derive for the struct itself so structs nest. `TStruct` is the
//! per-struct codec entry point.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{CodecError, ValidationError};
use crate::presence::Presence;
use crate::protocol::skip::{skip_elements, skip_map_entries};
use crate::protocol::{
    BinaryProtocol, CollectionHeader, MapHeader, ProtocolReader, ProtocolWriter,
};
use crate::types::{FieldType, StructDescriptor, WireType};
use crate::validate::validate_required;
use crate::value::Binary;

/// A type that can sit in a typed struct field.
///
/// Besides framing, the trait carries the value semantics the derive needs
/// for fields whose Rust types lack them (`f64` has no `Eq`/`Hash`, and
/// containers have no `Display`).
///
/// # Example
///
/// ```rust
/// use tagwire::{TStruct, WireValue};
/// use tagwire::types::{FieldType, WireType};
///
/// #[derive(TStruct, Debug, Clone, Default)]
/// struct Point {
///     #[tagwire(id = 1)]
///     x: Option<i32>,
/// }
///
/// assert_eq!(<Vec<i64> as WireValue>::WIRE_TYPE, WireType::List);
/// assert_eq!(<Point as WireValue>::field_type(), FieldType::Struct("Point".into()));
/// ```
pub trait WireValue: Sized {
    const WIRE_TYPE: WireType;

    fn field_type() -> FieldType;

    /// Read one value whose wire type already matched `WIRE_TYPE`.
    ///
    /// `None` means a container's element types disagreed with `Self`; the
    /// payload has been consumed and the field should stay absent.
    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError>;

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError>;

    fn wire_eq(&self, other: &Self) -> bool;

    fn wire_hash<H: Hasher>(&self, state: &mut H);

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// A struct with a generated codec.
///
/// Normally derived with `#[derive(TStruct)]`:
///
/// ```rust
/// use tagwire::{Presence, TStruct};
///
/// #[derive(TStruct, Debug, Clone, Default)]
/// struct CrashBoomBang {
///     #[tagwire(id = 1, name = "MyErrorCode")]
///     my_error_code: Option<i32>,
/// }
///
/// let v = CrashBoomBang { my_error_code: Some(42) };
/// let bytes = v.to_bytes().unwrap();
/// assert_eq!(bytes, [0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2a, 0x00]);
///
/// let empty = CrashBoomBang::from_bytes(&[0x00]).unwrap();
/// assert!(!empty.is_set(1));
/// assert_eq!(empty.to_string(), "CrashBoomBang()");
/// ```
pub trait TStruct: Presence + Sized {
    /// Struct name on the wire and in `Display`.
    const NAME: &'static str;

    fn descriptor() -> StructDescriptor;

    fn read<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Self, CodecError>;

    fn write<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError>;

    /// Encode with the binary protocol.
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut oprot = BinaryProtocol::new(Vec::new());
        self.write(&mut oprot)?;
        Ok(oprot.into_inner())
    }

    /// Decode from binary protocol bytes.
    fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        Self::read(&mut BinaryProtocol::new(data))
    }

    /// Check that every field marked `required` is present.
    fn validate(&self) -> Result<(), ValidationError> {
        validate_required(&Self::descriptor(), self)
    }
}

macro_rules! impl_scalar_wire_value {
    ($ty:ty, $variant:ident, $read:ident, $write:ident) => {
        impl WireValue for $ty {
            const WIRE_TYPE: WireType = WireType::$variant;

            fn field_type() -> FieldType {
                FieldType::$variant
            }

            fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
                iprot.$read().map(Some)
            }

            fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
                oprot.$write(*self)
            }

            fn wire_eq(&self, other: &Self) -> bool {
                self == other
            }

            fn wire_hash<H: Hasher>(&self, state: &mut H) {
                self.hash(state)
            }

            fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

impl_scalar_wire_value!(bool, Bool, read_bool, write_bool);
impl_scalar_wire_value!(i8, I8, read_i8, write_i8);
impl_scalar_wire_value!(i16, I16, read_i16, write_i16);
impl_scalar_wire_value!(i32, I32, read_i32, write_i32);
impl_scalar_wire_value!(i64, I64, read_i64, write_i64);

impl WireValue for f64 {
    const WIRE_TYPE: WireType = WireType::Double;

    fn field_type() -> FieldType {
        FieldType::Double
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        iprot.read_double().map(Some)
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        oprot.write_double(*self)
    }

    // bitwise, so NaN == NaN and Eq stays reflexive
    fn wire_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state)
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl WireValue for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn field_type() -> FieldType {
        FieldType::String
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        iprot.read_string().map(Some)
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        oprot.write_string(self)
    }

    fn wire_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        self.hash(state)
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl WireValue for Binary {
    const WIRE_TYPE: WireType = WireType::String;

    fn field_type() -> FieldType {
        FieldType::Binary
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        iprot.read_binary().map(|v| Some(Binary(v)))
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        oprot.write_binary(&self.0)
    }

    fn wire_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        self.hash(state)
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<binary {} bytes>", self.0.len())
    }
}

impl<T: WireValue> WireValue for Box<T> {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;

    fn field_type() -> FieldType {
        T::field_type()
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        Ok(T::read_wire(iprot)?.map(Box::new))
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        (**self).write_wire(oprot)
    }

    fn wire_eq(&self, other: &Self) -> bool {
        (**self).wire_eq(other)
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        (**self).wire_hash(state)
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).wire_fmt(f)
    }
}

/// Read `size` elements of `T`, or drain them if the wire element type differs.
fn read_elements<T: WireValue, R: ProtocolReader + ?Sized>(
    iprot: &mut R,
    header: CollectionHeader,
) -> Result<Option<Vec<T>>, CodecError> {
    if header.size > 0 && header.element_type != T::WIRE_TYPE {
        tracing::debug!(
            expected = %T::WIRE_TYPE,
            actual = %header.element_type,
            size = header.size,
            "element type mismatch, skipping payload"
        );
        skip_elements(iprot, header.element_type, header.size)?;
        return Ok(None);
    }

    let mut items = Vec::new();
    let mut complete = true;
    for _ in 0..header.size {
        match T::read_wire(iprot)? {
            Some(v) => items.push(v),
            None => complete = false,
        }
    }
    Ok(complete.then_some(items))
}

fn fmt_elements<'a, T: WireValue + 'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a T>,
    open: &str,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.wire_fmt(f)?;
    }
    f.write_str(close)
}

impl<T: WireValue> WireValue for Vec<T> {
    const WIRE_TYPE: WireType = WireType::List;

    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        let header = iprot.read_list_begin()?;
        let items = read_elements(iprot, header)?;
        iprot.read_list_end()?;
        Ok(items)
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        oprot.write_list_begin(&CollectionHeader::new(T::WIRE_TYPE, self.len()))?;
        for item in self {
            item.write_wire(oprot)?;
        }
        oprot.write_list_end()
    }

    fn wire_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.wire_eq(b))
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.wire_hash(state);
        }
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_elements(f, self.iter(), "[", "]")
    }
}

impl<T: WireValue + Ord> WireValue for BTreeSet<T> {
    const WIRE_TYPE: WireType = WireType::Set;

    fn field_type() -> FieldType {
        FieldType::set(T::field_type())
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        let header = iprot.read_set_begin()?;
        let items: Option<Vec<T>> = read_elements(iprot, header)?;
        iprot.read_set_end()?;
        Ok(items.map(|items| items.into_iter().collect()))
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        oprot.write_set_begin(&CollectionHeader::new(T::WIRE_TYPE, self.len()))?;
        for item in self {
            item.write_wire(oprot)?;
        }
        oprot.write_set_end()
    }

    fn wire_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.wire_eq(b))
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.wire_hash(state);
        }
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_elements(f, self.iter(), "{", "}")
    }
}

impl<K: WireValue + Ord, V: WireValue> WireValue for BTreeMap<K, V> {
    const WIRE_TYPE: WireType = WireType::Map;

    fn field_type() -> FieldType {
        FieldType::map(K::field_type(), V::field_type())
    }

    fn read_wire<R: ProtocolReader + ?Sized>(iprot: &mut R) -> Result<Option<Self>, CodecError> {
        let header = iprot.read_map_begin()?;
        let mut map = BTreeMap::new();
        if header.size > 0
            && (header.key_type != Some(K::WIRE_TYPE) || header.value_type != Some(V::WIRE_TYPE))
        {
            tracing::debug!(
                expected = %Self::field_type(),
                size = header.size,
                "map entry types mismatch, skipping payload"
            );
            skip_map_entries(iprot, header.key_type, header.value_type, header.size)?;
            iprot.read_map_end()?;
            return Ok(None);
        }

        let mut complete = true;
        for _ in 0..header.size {
            let k = K::read_wire(iprot)?;
            let v = V::read_wire(iprot)?;
            match (k, v) {
                (Some(k), Some(v)) => {
                    map.insert(k, v);
                }
                _ => complete = false,
            }
        }
        iprot.read_map_end()?;
        Ok(complete.then_some(map))
    }

    fn write_wire<W: ProtocolWriter + ?Sized>(&self, oprot: &mut W) -> Result<(), CodecError> {
        oprot.write_map_begin(&MapHeader::new(K::WIRE_TYPE, V::WIRE_TYPE, self.len()))?;
        for (k, v) in self {
            k.write_wire(oprot)?;
            v.write_wire(oprot)?;
        }
        oprot.write_map_end()
    }

    fn wire_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((ka, va), (kb, vb))| ka.wire_eq(kb) && va.wire_eq(vb))
    }

    fn wire_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.wire_hash(state);
            v.wire_hash(state);
        }
    }

    fn wire_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            k.wire_fmt(f)?;
            f.write_str(": ")?;
            v.wire_fmt(f)?;
        }
        f.write_str("}")
    }
}

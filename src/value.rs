use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use crate::types::{FieldType, Schema, StructDescriptor};

/// Raw bytes carried in a `binary` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binary(pub Vec<u8>);

impl From<Vec<u8>> for Binary {
    fn from(v: Vec<u8>) -> Self {
        Binary(v)
    }
}

impl From<&[u8]> for Binary {
    fn from(v: &[u8]) -> Self {
        Binary(v.to_vec())
    }
}

impl Deref for Binary {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Dynamic value type, the payload of one field.
///
/// Sets and maps keep the order in which their elements were read or built.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Struct(StructValue),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Returns a short type description string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Struct(_) => "struct",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer width, widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(v) => Some(v),
            _ => None,
        }
    }

    /// Elements of a list or set.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) | Value::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Binary(v) => v.hash(state),
            Value::Struct(v) => v.hash(state),
            Value::List(v) | Value::Set(v) => v.hash(state),
            Value::Map(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Binary(v) => write!(f, "<binary {} bytes>", v.len()),
            Value::Struct(v) => write!(f, "{}", v),
            Value::List(items) | Value::Set(items) => {
                let (open, close) = if matches!(self, Value::Set(_)) {
                    ("{", "}")
                } else {
                    ("[", "]")
                };
                f.write_str(open)?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str(close)
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A struct value: present fields keyed by id.
///
/// A field is present iff it has an entry; there is no "declared but unset" state.
/// Hashing folds the field count, then each present `(id, value)` in id order,
/// so it never depends on how or in what order the fields were set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StructValue {
    fields: BTreeMap<i16, Value>,
}

impl StructValue {
    /// Create an empty value with no fields present.
    pub fn new() -> Self {
        Self::default()
    }

    /// Helper to build a struct from id/value pairs.
    pub fn from_fields(fields: Vec<(i16, Value)>) -> Self {
        let mut value = Self::new();
        for (id, v) in fields {
            value.set(id, v);
        }
        value
    }

    /// Store a value, marking the field present. Returns the previous value.
    pub fn set(&mut self, id: i16, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(id, value.into())
    }

    pub fn get(&self, id: i16) -> Option<&Value> {
        self.fields.get(&id)
    }

    pub fn get_mut(&mut self, id: i16) -> Option<&mut Value> {
        self.fields.get_mut(&id)
    }

    /// Remove a field, making it absent.
    pub fn unset(&mut self, id: i16) -> Option<Value> {
        self.fields.remove(&id)
    }

    /// Present fields in id order.
    pub fn iter(&self) -> impl Iterator<Item = (i16, &Value)> {
        self.fields.iter().map(|(id, v)| (*id, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render with field names and declared order taken from `descriptor`.
    pub fn display<'a>(
        &'a self,
        schema: &'a Schema,
        descriptor: &'a StructDescriptor,
    ) -> StructDisplay<'a> {
        StructDisplay {
            schema,
            descriptor,
            value: self,
        }
    }
}

/// Schema-free rendering, keyed by field id.
impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (id, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", id, v)?;
        }
        f.write_str(")")
    }
}

/// `TypeName(Name: value, ...)` rendering of a `StructValue`, present fields only.
pub struct StructDisplay<'a> {
    schema: &'a Schema,
    descriptor: &'a StructDescriptor,
    value: &'a StructValue,
}

impl fmt::Display for StructDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.descriptor.name)?;
        let mut written = 0;
        for field in &self.descriptor.fields {
            let Some(v) = self.value.get(field.id) else {
                continue;
            };
            if written > 0 {
                f.write_str(", ")?;
            }
            written += 1;
            write!(f, "{}: ", field.name)?;
            fmt_typed(self.schema, &field.field_type, v, f)?;
        }
        f.write_str(")")
    }
}

fn fmt_typed(schema: &Schema, ty: &FieldType, value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (ty, value) {
        (FieldType::Struct(name), Value::Struct(v)) => match schema.get_type(name) {
            Some(desc) => write!(f, "{}", v.display(schema, desc)),
            None => write!(f, "{}", v),
        },
        (FieldType::List(elem), Value::List(items)) | (FieldType::Set(elem), Value::Set(items)) => {
            let (open, close) = if matches!(value, Value::Set(_)) {
                ("{", "}")
            } else {
                ("[", "]")
            };
            f.write_str(open)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_typed(schema, elem, item, f)?;
            }
            f.write_str(close)
        }
        (FieldType::Map(kt, vt), Value::Map(entries)) => {
            f.write_str("{")?;
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_typed(schema, kt, k, f)?;
                f.write_str(": ")?;
                fmt_typed(schema, vt, v, f)?;
            }
            f.write_str("}")
        }
        _ => write!(f, "{}", value),
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Value::Binary(v.0)
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

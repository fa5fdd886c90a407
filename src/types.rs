use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{ProtocolError, SchemaError};

/// Tag identifying how a value is framed on the wire.
///
/// Numeric values are the ones the binary protocol writes verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WireType {
    Stop = 0,
    Bool = 2,
    I8 = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
}

impl WireType {
    pub fn name(self) -> &'static str {
        match self {
            WireType::Stop => "stop",
            WireType::Bool => "bool",
            WireType::I8 => "i8",
            WireType::Double => "double",
            WireType::I16 => "i16",
            WireType::I32 => "i32",
            WireType::I64 => "i64",
            WireType::String => "string",
            WireType::Struct => "struct",
            WireType::Map => "map",
            WireType::Set => "set",
            WireType::List => "list",
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => WireType::Stop,
            2 => WireType::Bool,
            3 => WireType::I8,
            4 => WireType::Double,
            6 => WireType::I16,
            8 => WireType::I32,
            10 => WireType::I64,
            11 => WireType::String,
            12 => WireType::Struct,
            13 => WireType::Map,
            14 => WireType::Set,
            15 => WireType::List,
            other => return Err(ProtocolError::InvalidWireType(other)),
        })
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The full static type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    /// Raw bytes. Framed as `WireType::String`.
    Binary,
    /// A struct type, by name. Resolved through a `Schema`.
    Struct(String),
    List(Box<FieldType>),
    Set(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
}

impl FieldType {
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldType::Bool => WireType::Bool,
            FieldType::I8 => WireType::I8,
            FieldType::I16 => WireType::I16,
            FieldType::I32 => WireType::I32,
            FieldType::I64 => WireType::I64,
            FieldType::Double => WireType::Double,
            FieldType::String | FieldType::Binary => WireType::String,
            FieldType::Struct(_) => WireType::Struct,
            FieldType::List(_) => WireType::List,
            FieldType::Set(_) => WireType::Set,
            FieldType::Map(_, _) => WireType::Map,
        }
    }

    pub fn list(elem: FieldType) -> Self {
        FieldType::List(Box::new(elem))
    }

    pub fn set(elem: FieldType) -> Self {
        FieldType::Set(Box::new(elem))
    }

    pub fn map(key: FieldType, value: FieldType) -> Self {
        FieldType::Map(Box::new(key), Box::new(value))
    }

    /// Visit every struct name referenced by this type, including inside containers.
    fn struct_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FieldType::Struct(name) => out.push(name),
            FieldType::List(elem) | FieldType::Set(elem) => elem.struct_refs(out),
            FieldType::Map(key, value) => {
                key.struct_refs(out);
                value.struct_refs(out);
            }
            _ => {}
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Binary => f.write_str("binary"),
            FieldType::Struct(name) => f.write_str(name),
            FieldType::List(elem) => write!(f, "list<{}>", elem),
            FieldType::Set(elem) => write!(f, "set<{}>", elem),
            FieldType::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            other => f.write_str(other.wire_type().name()),
        }
    }
}

/// Static metadata describing one struct member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    /// Field id, unique within the struct.
    pub id: i16,
    /// Field name, used for display and `write_field_begin`.
    pub name: String,
    pub field_type: FieldType,
    /// Only consulted by the `validate` policy, never by the codec.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(id: i16, name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            id,
            name: name.into(),
            field_type,
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn wire_type(&self) -> WireType {
        self.field_type.wire_type()
    }
}

/// The shape of a struct: its name and fields in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructDescriptor {
    pub name: String,
    /// Fields in declared order. Encode emits them in this order.
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        StructDescriptor {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Find a field by id.
    pub fn find_field_by_id(&self, id: i16) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Find a field by name.
    pub fn find_field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn check_fields(&self) -> Result<(), SchemaError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for field in &self.fields {
            if !ids.insert(field.id) {
                return Err(SchemaError::DuplicateFieldId {
                    type_name: self.name.clone(),
                    id: field.id,
                });
            }
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateFieldName {
                    type_name: self.name.clone(),
                    field_name: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A name-indexed set of struct descriptors.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<StructDescriptor>", into = "Vec<StructDescriptor>")
)]
pub struct Schema {
    types_list: Vec<StructDescriptor>,
    types_by_name: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema, checking for duplicates and dangling struct references.
    pub fn from_types(types: Vec<StructDescriptor>) -> Result<Self, SchemaError> {
        let mut types_by_name = HashMap::with_capacity(types.len());
        for (idx, ty) in types.iter().enumerate() {
            ty.check_fields()?;
            if types_by_name.insert(ty.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateType {
                    name: ty.name.clone(),
                });
            }
        }

        for ty in &types {
            for field in &ty.fields {
                let mut refs = Vec::new();
                field.field_type.struct_refs(&mut refs);
                if let Some(missing) = refs.into_iter().find(|r| !types_by_name.contains_key(*r)) {
                    return Err(SchemaError::UndefinedType {
                        type_name: missing.to_string(),
                        referenced_by: format!("{}.{}", ty.name, field.name),
                    });
                }
            }
        }

        Ok(Schema {
            types_list: types,
            types_by_name,
        })
    }

    /// Get a type by name.
    pub fn get_type(&self, name: &str) -> Option<&StructDescriptor> {
        self.types_by_name
            .get(name)
            .map(|&idx| &self.types_list[idx])
    }

    /// All types in definition order.
    pub fn types(&self) -> &[StructDescriptor] {
        &self.types_list
    }
}

impl TryFrom<Vec<StructDescriptor>> for Schema {
    type Error = SchemaError;

    fn try_from(types: Vec<StructDescriptor>) -> Result<Self, Self::Error> {
        Schema::from_types(types)
    }
}

impl From<Schema> for Vec<StructDescriptor> {
    fn from(schema: Schema) -> Self {
        schema.types_list
    }
}

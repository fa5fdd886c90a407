use std::io;

use crate::types::WireType;

/// Malformed or truncated wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unexpected end of stream")]
    Truncated,

    #[error("invalid wire type tag {0:#04x}")]
    InvalidWireType(u8),

    #[error("negative {what} size {size}")]
    NegativeSize { what: &'static str, size: i64 },

    #[error("{what} size {size} exceeds limit {limit}")]
    SizeLimit {
        what: &'static str,
        size: usize,
        limit: usize,
    },

    #[error("malformed varint")]
    InvalidVarint,

    #[error("invalid utf-8 string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("cannot skip a value of wire type {0}")]
    Unskippable(WireType),

    #[error("map of {size} entries has no key/value wire types")]
    UntypedMap { size: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised while writing a dynamic value against its descriptor.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

/// Errors from the struct codec and the protocol implementations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("recursion depth limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },

    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("unknown struct type '{0}'")]
    UnknownType(String),
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        // A short read means the stream ended mid-value, which is a wire problem.
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::Protocol(ProtocolError::Truncated)
        } else {
            CodecError::Transport(e)
        }
    }
}

/// Errors from building a `Schema` out of struct descriptors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate field id {id} in type '{type_name}'")]
    DuplicateFieldId { type_name: String, id: i16 },

    #[error("duplicate field '{field_name}' in type '{type_name}'")]
    DuplicateFieldName {
        type_name: String,
        field_name: String,
    },

    #[error("redefined type '{name}'")]
    DuplicateType { name: String },

    #[error("undefined type '{type_name}' referenced by '{referenced_by}'")]
    UndefinedType {
        type_name: String,
        referenced_by: String,
    },
}

/// Errors from the optional required-field policy.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("required field '{field}' (id {id}) of '{struct_name}' is not set")]
    MissingRequired {
        struct_name: String,
        field: String,
        id: i16,
    },
}

/// Top-level error type that wraps all sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Codec(e.into())
    }
}

/// Result type alias for tagwire operations.
pub type Result<T> = std::result::Result<T, Error>;

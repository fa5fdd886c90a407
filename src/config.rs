//! Limits applied by the protocol implementations while reading and writing.

use crate::error::ProtocolError;

/// Default ceiling for nested struct/container depth.
pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// Tunables handed to a protocol constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProtocolConfig {
    /// Maximum nesting depth of structs (and skipped containers).
    pub max_recursion_depth: usize,
    /// Maximum accepted string/binary length, if any.
    pub max_string_len: Option<usize>,
    /// Maximum accepted list/set/map element count, if any.
    pub max_container_len: Option<usize>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_RECURSION_LIMIT,
            max_string_len: None,
            max_container_len: None,
        }
    }
}

impl ProtocolConfig {
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = Some(len);
        self
    }

    pub fn with_max_container_len(mut self, len: usize) -> Self {
        self.max_container_len = Some(len);
        self
    }

    pub(crate) fn check_string_len(&self, size: usize) -> Result<(), ProtocolError> {
        check_limit("string", size, self.max_string_len)
    }

    pub(crate) fn check_container_len(&self, size: usize) -> Result<(), ProtocolError> {
        check_limit("container", size, self.max_container_len)
    }
}

fn check_limit(what: &'static str, size: usize, limit: Option<usize>) -> Result<(), ProtocolError> {
    match limit {
        Some(limit) if size > limit => Err(ProtocolError::SizeLimit { what, size, limit }),
        _ => Ok(()),
    }
}

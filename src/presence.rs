//! Presence tracking: which fields of a struct currently hold a value.
//!
//! Presence is the sole source of truth for equality, hashing, display and
//! encode. A field explicitly set to its type's zero value is present; a field
//! that was never set is absent, and the two are never conflated.
//!
//! Marking a field present only happens by giving it a value (a setter, or
//! decode reading it off the wire), so there is no separate `mark` operation.

use crate::value::StructValue;

/// Per-struct presence queries, keyed by field id.
///
/// Implemented by `StructValue` and by every `#[derive(TStruct)]` type.
pub trait Presence {
    /// Whether field `id` currently holds a value.
    fn is_set(&self, id: i16) -> bool;

    /// Make field `id` absent. Returns whether it was present.
    fn clear(&mut self, id: i16) -> bool;

    /// Ids of present fields. Typed structs list them in declared order,
    /// `StructValue` in id order.
    fn present_ids(&self) -> Vec<i16>;
}

impl Presence for StructValue {
    fn is_set(&self, id: i16) -> bool {
        self.get(id).is_some()
    }

    fn clear(&mut self, id: i16) -> bool {
        self.unset(id).is_some()
    }

    fn present_ids(&self) -> Vec<i16> {
        self.iter().map(|(id, _)| id).collect()
    }
}

//! Nesting-depth bookkeeping for decode, encode and skip.
//!
//! Each protocol instance owns one `RecursionCounter`, so the counter is
//! scoped to the call chain driving that reader or writer. Two decodes on two
//! readers never see each other's depth.

use std::ops::{Deref, DerefMut};

use crate::error::CodecError;

/// Current depth and the ceiling it may not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionCounter {
    depth: usize,
    limit: usize,
}

impl RecursionCounter {
    pub fn new(limit: usize) -> Self {
        RecursionCounter { depth: 0, limit }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Enter one level. Fails without changing the depth once at the ceiling.
    pub fn increment(&mut self) -> Result<(), CodecError> {
        if self.depth >= self.limit {
            tracing::warn!(
                depth = self.depth,
                limit = self.limit,
                "recursion depth limit exceeded"
            );
            return Err(CodecError::RecursionLimitExceeded { limit: self.limit });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave one level.
    pub fn decrement(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced recursion counter");
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Access to a protocol's recursion counter.
pub trait RecursionTracker {
    fn recursion_counter(&self) -> &RecursionCounter;
    fn recursion_counter_mut(&mut self) -> &mut RecursionCounter;

    fn recursion_depth(&self) -> usize {
        self.recursion_counter().depth()
    }

    fn increment_recursion_depth(&mut self) -> Result<(), CodecError> {
        self.recursion_counter_mut().increment()
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_counter_mut().decrement()
    }
}

/// One level of nesting, released when dropped.
///
/// Derefs to the protocol, so code holding the guard keeps reading or writing
/// through it. The decrement runs on every exit path, `?` included.
pub struct RecursionGuard<'a, P: RecursionTracker + ?Sized> {
    inner: &'a mut P,
}

impl<'a, P: RecursionTracker + ?Sized> RecursionGuard<'a, P> {
    pub fn enter(inner: &'a mut P) -> Result<Self, CodecError> {
        inner.increment_recursion_depth()?;
        Ok(RecursionGuard { inner })
    }
}

impl<P: RecursionTracker + ?Sized> Deref for RecursionGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.inner
    }
}

impl<P: RecursionTracker + ?Sized> DerefMut for RecursionGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.inner
    }
}

impl<P: RecursionTracker + ?Sized> Drop for RecursionGuard<'_, P> {
    fn drop(&mut self) {
        self.inner.decrement_recursion_depth();
    }
}

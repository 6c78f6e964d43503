//! Identifiers and simple allocators for scheduler entities.

use serde::{Deserialize, Serialize};

/// Identifies one animated object owned by a [`crate::Scheduler`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

slotmap::new_key_type! {
    /// Versioned handle to one checked-out execution context inside a
    /// [`crate::ContextPool`].
    ///
    /// The version changes every time the context goes back to the pool, so a
    /// handle kept past `abort`/`release` is detected instead of silently
    /// driving whichever procedure is bound next.
    pub struct ContextHandle;
}

/// Monotonic allocator for ObjectId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_object: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_object(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object = self.next_object.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Generational handle types
//!
//! Windows and resources are addressed through `slotmap` keys. A key carries a
//! version, so a handle to a destroyed window or a deleted resource can never
//! resolve to a newer object that happens to reuse the slot.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle of a window and the rendering context it owns
    pub struct WindowId;

    /// Untyped handle of a GPU resource
    pub struct ResourceId;
}

/// Typed handle for type-safe resource references
pub struct TypedHandle<T> {
    key: ResourceId,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    pub(crate) fn new(key: ResourceId) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> ResourceId {
        self.key
    }
}

// Manual impls: derives would put bounds on `T`.
impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.key).finish()
    }
}

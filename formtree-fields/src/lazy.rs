//! Memoizing cell for ambient properties.
//!
//! Every ambient accessor on a node (owning form, owning field-schema, config,
//! schema, template files) is a [`Lazy`]: computed on first successful
//! access, cached, overridable by explicit assignment and cleared by
//! [`Lazy::invalidate`]. Unresolved results are not cached, so a context that
//! becomes available later is still found.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

pub struct Lazy<T> {
    slot: Mutex<Option<T>>,
}

impl<T: Clone> Lazy<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value, or compute it with `init` and cache a `Some` result.
    ///
    /// `init` runs without the internal lock held, so it may read other
    /// cells of the same node.
    pub fn get(&self, init: impl FnOnce() -> Option<T>) -> Option<T> {
        if let Some(value) = self.peek() {
            return Some(value);
        }
        let value = init()?;
        let mut slot = self.lock();
        Some(slot.get_or_insert(value).clone())
    }

    /// Explicitly assign the value. `None` clears the cache.
    pub fn set(&self, value: Option<T>) {
        *self.lock() = value;
    }

    /// Drop the cached value so the next `get` recomputes it.
    pub fn invalidate(&self) {
        self.lock().take();
    }

    /// The cached value, without computing anything.
    pub fn peek(&self) -> Option<T> {
        self.lock().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("lazy property lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl<T: Clone> Default for Lazy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lazy").field(&self.peek()).finish()
    }
}

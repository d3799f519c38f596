//! Change notifications between fields.
//!
//! A field publishes its new value after every write; a sub-schema node whose
//! schema depends on that field subscribes. Subscriptions unsubscribe when
//! dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;

/// Callback invoked with the publisher's new value
pub type ChangeCallback = Arc<dyn Fn(&Value) + Send + Sync>;

type Listeners = Mutex<Vec<(u64, ChangeCallback)>>;

/// Something whose value changes can be observed.
pub trait ChangePublisher {
    fn on_change(&self, callback: ChangeCallback) -> Subscription;
}

/// Listener list owned by a publisher.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    listeners: Arc<Listeners>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, callback));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Call every listener with `value`.
    ///
    /// Listeners run without the list locked, so they may subscribe,
    /// unsubscribe or write to other fields.
    pub fn notify(&self, value: &Value) {
        let listeners: Vec<ChangeCallback> = lock(&self.listeners)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in listeners {
            callback(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Registration handle; dropping it removes the listener.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(self) {}

    /// Whether the publisher still exists.
    pub fn is_active(&self) -> bool {
        self.listeners.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

fn lock(listeners: &Listeners) -> MutexGuard<'_, Vec<(u64, ChangeCallback)>> {
    listeners.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("change listener lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

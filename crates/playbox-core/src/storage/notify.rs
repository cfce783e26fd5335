//! In-process change notification.
//!
//! Stores that share a [`ChangeBus`] announce every successful mutation to
//! listeners subscribed to the same namespace. Delivery is synchronous and in
//! subscription order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::storage::types::{Change, Namespace};

/// Callback invoked for each change in a subscribed namespace.
pub type Listener = Arc<dyn Fn(&Change) + Send + Sync>;

struct Registered {
    id: u64,
    namespace: Namespace,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Registered>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // Listeners never run under the lock, so a poisoned registry is still consistent.
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared listener registry. Clones share the same listeners.
#[derive(Clone, Default)]
pub struct ChangeBus {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for changes in `namespace`.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe<F>(&self, namespace: Namespace, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push(Registered {
            id,
            namespace,
            listener: Arc::new(listener),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `change` to every listener of `namespace`.
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    pub fn publish(&self, namespace: &Namespace, change: &Change) {
        let targets: Vec<Listener> = lock(&self.registry)
            .listeners
            .iter()
            .filter(|registered| &registered.namespace == namespace)
            .map(|registered| Arc::clone(&registered.listener))
            .collect();

        for listener in targets {
            if catch_unwind(AssertUnwindSafe(|| listener(change))).is_err() {
                tracing::warn!(
                    namespace = %namespace,
                    key = change.key().unwrap_or("*"),
                    "change listener panicked"
                );
            }
        }
    }

    /// Remove every listener of `namespace`, detached ones included.
    ///
    /// Returns how many were removed. Outstanding [`Subscription`]s for them
    /// become no-ops.
    pub fn unsubscribe_all(&self, namespace: &Namespace) -> usize {
        let mut registry = lock(&self.registry);
        let before = registry.listeners.len();
        registry
            .listeners
            .retain(|registered| &registered.namespace != namespace);
        before - registry.listeners.len()
    }

    /// Number of listeners registered for `namespace`.
    pub fn listener_count(&self, namespace: &Namespace) -> usize {
        lock(&self.registry)
            .listeners
            .iter()
            .filter(|registered| &registered.namespace == namespace)
            .count()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &lock(&self.registry).listeners.len())
            .finish()
    }
}

/// Handle keeping a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Keep the listener registered for the lifetime of the bus.
    ///
    /// A detached listener can only be removed with
    /// [`ChangeBus::unsubscribe_all`].
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry)
                .listeners
                .retain(|registered| registered.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    #[test]
    fn test_publish_reaches_only_matching_namespace() {
        let bus = ChangeBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = bus.subscribe(ns("a"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&ns("a"), &Change::Cleared);
        bus.publish(&ns("b"), &Change::Cleared);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = ChangeBus::new();
        let sub = bus.subscribe(ns("a"), |_| {});
        assert_eq!(bus.listener_count(&ns("a")), 1);
        drop(sub);
        assert_eq!(bus.listener_count(&ns("a")), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let bus = ChangeBus::new();
        bus.subscribe(ns("a"), |_| {}).detach();
        assert_eq!(bus.listener_count(&ns("a")), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_delivery() {
        let bus = ChangeBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _bad = bus.subscribe(ns("a"), |_| panic!("listener bug"));
        let _good = bus.subscribe(ns("a"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&ns("a"), &Change::Cleared);
        bus.publish(&ns("a"), &Change::Cleared);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_subscribe_during_publish() {
        let bus = ChangeBus::new();
        let inner = bus.clone();
        let sub = bus.subscribe(ns("a"), move |_| {
            inner.subscribe(ns("b"), |_| {}).detach();
        });

        bus.publish(&ns("a"), &Change::Cleared);
        assert_eq!(bus.listener_count(&ns("b")), 1);

        // The listener owning a bus clone goes away with its subscription
        drop(sub);
        assert_eq!(Arc::strong_count(&bus.registry), 1);
    }

    #[test]
    fn test_unsubscribe_all_removes_detached_listeners() {
        let bus = ChangeBus::new();
        for _ in 0..3 {
            bus.subscribe(ns("a"), |_| {}).detach();
        }
        let sub = bus.subscribe(ns("a"), |_| {});
        let _other = bus.subscribe(ns("b"), |_| {});

        assert_eq!(bus.unsubscribe_all(&ns("a")), 4);
        assert_eq!(bus.listener_count(&ns("a")), 0);
        assert_eq!(bus.listener_count(&ns("b")), 1);

        drop(sub);
        assert_eq!(bus.listener_count(&ns("b")), 1);
    }
}

//! Callback registry shared by the outbound adapters.
//!
//! Entries are keyed by a monotonically increasing id. The [`Subscription`]
//! returned by [`ListenerRegistry::register`] removes its entry on release and
//! holds only a weak reference, so a dropped registry never keeps callbacks
//! alive.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::domain::IdentityId;
use crate::domain::ports::Subscription;

/// Shared form of an identity-change callback.
pub(crate) type IdentityListener = dyn Fn(Option<IdentityId>) + Send + Sync;

struct Entries<H: ?Sized> {
    next_id: u64,
    handlers: BTreeMap<u64, Arc<H>>,
}

/// Registry of callbacks of type `H`.
pub(crate) struct ListenerRegistry<H: ?Sized> {
    inner: Arc<Mutex<Entries<H>>>,
}

impl<H: ?Sized> Clone for ListenerRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: ?Sized> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                next_id: 0,
                handlers: BTreeMap::new(),
            })),
        }
    }
}

impl<H> ListenerRegistry<H>
where
    H: ?Sized + Send + Sync + 'static,
{
    /// Store `handler` and return the handle that removes it.
    pub(crate) fn register(&self, handler: Arc<H>) -> Subscription {
        let id = {
            let mut entries = lock(&self.inner);
            let id = entries.next_id;
            entries.next_id += 1;
            entries.handlers.insert(id, handler);
            id
        };
        let registry: Weak<Mutex<Entries<H>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                lock(&inner).handlers.remove(&id);
            }
        })
    }

    /// Snapshot of the registered handlers in registration order.
    ///
    /// Callers invoke the snapshot after the registry lock is released.
    pub(crate) fn listeners(&self) -> Vec<Arc<H>> {
        lock(&self.inner).handlers.values().cloned().collect()
    }

    /// Number of live registrations.
    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).handlers.len()
    }
}

fn lock<H: ?Sized>(inner: &Mutex<Entries<H>>) -> MutexGuard<'_, Entries<H>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

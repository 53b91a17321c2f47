use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::Disposer;

/// Identifier of one registered handler, unique within its [`EventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Handlers<T> {
    next_id: AtomicU64,
    map: Mutex<HashMap<HandlerId, Handler<T>>>,
}

impl<T> Handlers<T> {
    fn remove(&self, id: HandlerId) -> bool {
        self.map.lock().remove(&id).is_some()
    }
}

/// A typed set of callbacks notified together.
///
/// # Dispatch policy
///
/// [`notify`](Self::notify) takes a snapshot of the registered handlers and
/// then walks it in registration order:
///
/// - a handler registered while a pass is running is not called in that pass;
/// - a handler unregistered while a pass is running is skipped if its turn has
///   not come yet.
///
/// No lock is held while a handler runs, so handlers may register, unregister
/// or notify re-entrantly.
///
/// Cloning an `EventSource` yields another handle to the same handler set.
pub struct EventSource<T> {
    inner: Arc<Handlers<T>>,
}

impl<T> Clone for EventSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventSource<T> {
    /// Creates a source with no handlers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Handlers {
                next_id: AtomicU64::new(1),
                map: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Removes a handler by id. Returns `false` if it was not registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        self.inner.remove(id)
    }

    /// Whether the handler is still registered.
    pub fn contains(&self, id: HandlerId) -> bool {
        self.inner.map.lock().contains_key(&id)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.inner.map.lock().len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.map.lock().is_empty()
    }

    /// Calls every registered handler with `value`.
    pub fn notify(&self, value: &T) {
        let mut snapshot: Vec<(HandlerId, Handler<T>)> = {
            let map = self.inner.map.lock();
            map.iter().map(|(id, h)| (*id, Arc::clone(h))).collect()
        };
        snapshot.sort_unstable_by_key(|(id, _)| *id);

        tracing::trace!(
            target: "hotconf::events",
            handlers = snapshot.len(),
            "dispatching notification"
        );

        for (id, handler) in snapshot {
            if !self.contains(id) {
                continue;
            }
            handler(value);
        }
    }
}

impl<T: 'static> EventSource<T> {
    /// Registers a handler and returns the token that removes it.
    pub fn register<F>(&self, handler: F) -> Disposer
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.map.lock().insert(id, Arc::new(handler));

        let weak: Weak<Handlers<T>> = Arc::downgrade(&self.inner);
        Disposer::for_handler(id, move || {
            if let Some(handlers) = weak.upgrade() {
                handlers.remove(id);
            }
        })
    }
}

impl<T> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("handlers", &self.len())
            .finish()
    }
}

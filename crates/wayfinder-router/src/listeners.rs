//! Listener lists for registry and UI events.
//!
//! Listeners are stored with a process-unique [`ListenerId`] so one listener
//! can sit in several lists (a session registry also listens to its parent)
//! and still be removed with a single id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned when a listener is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ordered, thread-safe list of listeners.
///
/// Listeners run in the order they were added. Dispatch works on a snapshot,
/// so a listener may add or remove listeners while it runs.
pub struct ListenerList<T: ?Sized> {
    listeners: RwLock<Vec<(ListenerId, Arc<T>)>>,
}

impl<T: ?Sized> Default for ListenerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ListenerList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: ?Sized> ListenerList<T> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Adds a listener and returns its id.
    pub fn add(&self, listener: Arc<T>) -> ListenerId {
        let id = ListenerId::next();
        self.insert(id, listener);
        id
    }

    /// Adds a listener under an existing id, replacing any listener with that id.
    pub fn insert(&self, id: ListenerId, listener: Arc<T>) {
        let mut listeners = self.listeners.write().expect("listener lock poisoned");
        if let Some(entry) = listeners.iter_mut().find(|(existing, _)| *existing == id) {
            entry.1 = listener;
        } else {
            listeners.push((id, listener));
        }
    }

    /// Removes the listener with `id`. Returns `true` if one was removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().expect("listener lock poisoned");
        let len_before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() < len_before
    }

    /// Returns the current listeners in order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.listeners
            .read()
            .expect("listener lock poisoned")
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Returns the ids of the current listeners in order.
    pub fn ids(&self) -> Vec<ListenerId> {
        self.listeners
            .read()
            .expect("listener lock poisoned")
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().expect("listener lock poisoned").len()
    }

    /// Returns `true` if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> ListenerList<dyn Fn(&E) + Send + Sync> {
    /// Calls every listener with `event`.
    pub fn fire(&self, event: &E) {
        for listener in self.snapshot() {
            listener(event);
        }
    }
}

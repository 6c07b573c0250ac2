//! Typed publish/subscribe used by the player and all of its collaborators.
//!
//! Every event enum implements [`BusEvent`] so listeners can be keyed by a
//! cheap discriminant. Handlers run synchronously on the emitting thread, in
//! registration order, and no internal lock is held while a handler runs. A
//! handler may therefore subscribe, unsubscribe or emit again from inside a
//! callback without deadlocking the bus.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// An event that can travel over an [`EventBus`].
pub trait BusEvent: Send + Sync + 'static {
    type Kind: Copy + Eq + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listener<E: BusEvent> {
    id: u64,
    kind: E::Kind,
    handler: Handler<E>,
}

struct Listeners<E: BusEvent> {
    next_id: AtomicU64,
    entries: Mutex<Vec<Listener<E>>>,
}

impl<E: BusEvent> Listeners<E> {
    fn entries(&self) -> MutexGuard<'_, Vec<Listener<E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|l| l.id != id);
        before != entries.len()
    }

    fn contains(&self, id: u64) -> bool {
        self.entries().iter().any(|l| l.id == id)
    }
}

pub struct EventBus<E: BusEvent> {
    listeners: Arc<Listeners<E>>,
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Listeners {
                next_id: AtomicU64::new(1),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a durable handler for `kind`.
    pub fn on<F>(&self, kind: E::Kind, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.insert(id, kind, Arc::new(handler));
        self.subscription(id)
    }

    /// Register a handler that is released before its first invocation.
    pub fn once<F>(&self, kind: E::Kind, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        let listeners = Arc::downgrade(&self.listeners);
        let fired = AtomicBool::new(false);

        let wrapped = move |event: &E| {
            if fired.swap(true, Ordering::AcqRel) {
                return;
            }
            if let Some(listeners) = listeners.upgrade() {
                listeners.remove(id);
            }
            handler(event);
        };

        self.insert(id, kind, Arc::new(wrapped));
        self.subscription(id)
    }

    /// Invoke every handler registered for the event's kind.
    pub fn emit(&self, event: E) {
        let kind = event.kind();
        let snapshot: Vec<(u64, Handler<E>)> = self
            .listeners
            .entries()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| (l.id, Arc::clone(&l.handler)))
            .collect();

        for (id, handler) in snapshot {
            // An earlier handler may have released this one
            if !self.listeners.contains(id) {
                continue;
            }
            handler(&event);
        }
    }

    /// Drop every listener on this bus.
    pub fn un_all(&self) {
        self.listeners.entries().clear();
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners
            .entries()
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }

    fn insert(&self, id: u64, kind: E::Kind, handler: Handler<E>) {
        self.listeners.entries().push(Listener { id, kind, handler });
    }

    fn subscription(&self, id: u64) -> Subscription {
        let listeners: Weak<Listeners<E>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.remove(id);
            }
        })
    }
}

/// Handle to a registered listener.
///
/// Releasing is idempotent. Dropping the handle leaves the listener attached.
pub struct Subscription {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    pub fn unsubscribe(&self) {
        let release = self
            .release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(release) = release {
            release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.is_released())
            .finish()
    }
}

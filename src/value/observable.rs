use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::options::{ListenerOptions, Reason, SetOptions};

type Callback<V> = Rc<dyn Fn(&str, &V, &SetOptions)>;

/// Handle identifying one registered listener of an [`ObservableValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener<V> {
    id: ListenerId,
    callback: Callback<V>,
    // Cleared on removal so a snapshot taken by an in-flight notify skips it.
    live: Rc<Cell<bool>>,
}

/// One observable field: a key, its current value and its listeners.
///
/// Writes go through [`notify`](Self::notify), which compares the new value
/// with the current one and only calls listeners when it changed (or when the
/// write is forced). Listener calls are synchronous and no borrow is held
/// while they run, so a listener may read or write this value again.
pub struct ObservableValue<V> {
    key: Rc<str>,
    value: RefCell<V>,
    listeners: RefCell<Vec<Listener<V>>>,
    next_listener: Cell<u64>,
}

impl<V> ObservableValue<V> {
    /// Create a value with no listeners.
    pub fn new(key: impl Into<Rc<str>>, initial: V) -> Self {
        Self {
            key: key.into(),
            value: RefCell::new(initial),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    /// The field name this value is published under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Unregister a listener.
    ///
    /// Returns `false` if the listener was already removed. A listener removed
    /// while a notification is in flight is not called for the rest of it.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|listener| listener.id == id) {
            Some(index) => {
                let listener = listeners.remove(index);
                listener.live.set(false);
                true
            }
            None => false,
        }
    }

    /// Whether `id` is currently registered.
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|listener| listener.id == id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn snapshot(&self) -> Vec<(Callback<V>, Rc<Cell<bool>>)> {
        self.listeners
            .borrow()
            .iter()
            .map(|listener| (Rc::clone(&listener.callback), Rc::clone(&listener.live)))
            .collect()
    }
}

impl<V: Clone + PartialEq + 'static> ObservableValue<V> {
    /// Get a clone of the current value.
    pub fn get(&self) -> V {
        self.value.borrow().clone()
    }

    /// Store `value` and notify listeners.
    ///
    /// Returns `false` without touching anything when `value` equals the
    /// current value and `options.always_notify` is unset.
    pub fn notify(&self, value: V, options: SetOptions) -> bool {
        {
            let mut slot = self.value.borrow_mut();
            if !options.always_notify && *slot == value {
                return false;
            }
            *slot = value.clone();
        }

        for (callback, live) in self.snapshot() {
            if live.get() {
                callback(&self.key, &value, &options);
            }
        }
        true
    }

    /// Register a listener.
    ///
    /// With [`ListenerOptions::auto_call`] the listener is called with the
    /// current value before this returns, tagged [`Reason::AutoCall`].
    pub fn add_listener<F>(&self, callback: F, options: ListenerOptions) -> ListenerId
    where
        F: Fn(&str, &V, &SetOptions) + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        let callback: Callback<V> = Rc::new(callback);
        self.listeners.borrow_mut().push(Listener {
            id,
            callback: Rc::clone(&callback),
            live: Rc::new(Cell::new(true)),
        });

        if options.auto_call {
            let current = self.get();
            callback(&self.key, &current, &SetOptions::with_reason(Reason::AutoCall));
        }
        id
    }

    /// Register a listener and return a guard that removes it on drop.
    pub fn subscribe<F>(self: &Rc<Self>, callback: F, options: ListenerOptions) -> Subscription<V>
    where
        F: Fn(&str, &V, &SetOptions) + 'static,
    {
        let id = self.add_listener(callback, options);
        Subscription {
            value: Rc::downgrade(self),
            id,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ObservableValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("key", &self.key)
            .field("value", &self.value.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// RAII guard for a listener registered through `subscribe`.
///
/// Dropping the guard unregisters the listener. The guard does not keep the
/// observed value alive.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription<V> {
    value: Weak<ObservableValue<V>>,
    id: ListenerId,
}

impl<V> Subscription<V> {
    /// The id of the guarded listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still registered on a live value.
    pub fn is_active(&self) -> bool {
        self.value
            .upgrade()
            .is_some_and(|value| value.has_listener(self.id))
    }

    /// Unregister now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<V> Drop for Subscription<V> {
    fn drop(&mut self) {
        if let Some(value) = self.value.upgrade() {
            value.remove_listener(self.id);
        }
    }
}

impl<V> fmt::Debug for Subscription<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

//! Observer registry and memoized derived values.
//!
//! Derived views (sorted/grouped trees, mutation lists) follow a
//! memoized-pull model: every source carries a [`Version`] that is bumped on
//! write, and a [`Memo`] recomputes only when the versions it was built from
//! no longer match. Writes additionally notify [`Subscribers`] so hosts can
//! schedule a re-render.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); engine operations
//! run to completion on the caller's thread.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A monotonically increasing change counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(u64);

impl Version {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next version.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

/// Registry of change callbacks for one source.
pub struct Subscribers<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked on every [`notify`](Self::notify).
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Deliver an event to every subscriber in registration order.
    pub fn notify(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A cached derived value, tagged with the dependency key it was built from.
///
/// `K` is typically a tuple of [`Version`]s. Reads with an unchanged key
/// return the cached `Rc` without recomputing.
pub struct Memo<K, T> {
    cached: RefCell<Option<(K, Rc<T>)>>,
    builds: Cell<u64>,
}

impl<K, T> Default for Memo<K, T> {
    fn default() -> Self {
        Self {
            cached: RefCell::new(None),
            builds: Cell::new(0),
        }
    }
}

impl<K: fmt::Debug, T> fmt::Debug for Memo<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.cached.borrow().as_ref().map(|(k, _)| format!("{k:?}"));
        f.debug_struct("Memo")
            .field("key", &key)
            .field("builds", &self.builds.get())
            .finish()
    }
}

impl<K: PartialEq + Clone, T> Memo<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it if the key changed.
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> T) -> Rc<T> {
        match self.try_get_or_compute(key, || Ok::<T, std::convert::Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_compute`](Self::get_or_compute). A
    /// failed computation leaves the previous cache entry untouched.
    pub fn try_get_or_compute<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<Rc<T>, E> {
        if let Some((cached_key, value)) = self.cached.borrow().as_ref() {
            if *cached_key == key {
                return Ok(Rc::clone(value));
            }
        }
        let value = Rc::new(compute()?);
        self.builds.set(self.builds.get() + 1);
        *self.cached.borrow_mut() = Some((key, Rc::clone(&value)));
        Ok(value)
    }

    /// Returns `true` if a value is cached for exactly `key`.
    pub fn is_fresh(&self, key: &K) -> bool {
        self.cached
            .borrow()
            .as_ref()
            .is_some_and(|(cached_key, _)| cached_key == key)
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
    }

    /// Number of times the value has been (re)computed.
    pub fn builds(&self) -> u64 {
        self.builds.get()
    }
}

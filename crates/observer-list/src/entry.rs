#![forbid(unsafe_code)]

//! Per-key record: identity token, weak key handle, observer list.

use std::fmt;

use smallvec::SmallVec;

use crate::handle::{KeyRef, WeakHandle};
use crate::identity::{ObjectId, ObserverIdentity};

/// Inline capacity of an entry's observer list. Most keys carry one or two.
pub(crate) const INLINE_OBSERVERS: usize = 2;

pub(crate) type Observers<P> = SmallVec<[P; INLINE_OBSERVERS]>;

/// One registered key and the observers bound to it.
///
/// # Invariants
///
/// 1. `id` is captured from the key at creation and never changes.
/// 2. `observers` holds no two elements for which `same_observer` is true when
///    populated only through [`Entry::push_unique`].
pub(crate) struct Entry<K: KeyRef, P> {
    id: ObjectId,
    key: K::Weak,
    observers: Observers<P>,
}

impl<K: KeyRef, P> Entry<K, P> {
    pub(crate) fn new(key: &K) -> Self {
        Self {
            id: K::object_id(key),
            key: K::downgrade(key),
            observers: SmallVec::new(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ObjectId {
        self.id
    }

    /// Strong key handle, if the owner still holds the object.
    #[inline]
    pub(crate) fn resolve(&self) -> Option<K> {
        self.key.resolve()
    }

    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        self.key.is_alive()
    }

    #[inline]
    pub(crate) fn observers(&self) -> &[P] {
        &self.observers
    }

    pub(crate) fn into_observers(self) -> Vec<P> {
        self.observers.into_vec()
    }
}

impl<K: KeyRef, P: ObserverIdentity> Entry<K, P> {
    pub(crate) fn position(&self, observer: &P) -> Option<usize> {
        self.observers.iter().position(|o| o.same_observer(observer))
    }

    /// Append `observer` unless an equal one is already present.
    pub(crate) fn push_unique(&mut self, observer: P) -> bool {
        if self.position(&observer).is_some() {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Remove the first observer equal to `observer`.
    pub(crate) fn remove_first(&mut self, observer: &P) -> Option<P> {
        let index = self.position(observer)?;
        Some(self.observers.remove(index))
    }
}

impl<K: KeyRef, P> fmt::Debug for Entry<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .field("observers", &self.observers.len())
            .finish()
    }
}

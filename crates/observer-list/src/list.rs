#![forbid(unsafe_code)]

//! Identity-keyed observer registry with weak keys and lazy pruning.
//!
//! # Design
//!
//! [`ObserverList<K, P>`] maps a key object to an ordered list of observers
//! without owning the key. Each entry stores the key's [`ObjectId`] and a weak
//! handle; the id is the map key, so an entry stays addressable after its key
//! is released. Dead entries are only dropped by a traversal
//! ([`for_each`](ObserverList::for_each), [`for_each_with_key`](ObserverList::for_each_with_key),
//! [`prune`](ObserverList::prune)), which first scans and then removes what
//! the scan marked, never mutating the map while iterating it.
//!
//! # Performance
//!
//! | Operation          | Complexity                  |
//! |--------------------|-----------------------------|
//! | `add`              | O(1) + O(P) dedup scan      |
//! | `add_if_absent`    | O(1) (`Key` policy)         |
//! | `remove_key`       | O(1)                        |
//! | `remove_observer`  | O(E × P)                    |
//! | `for_each*`        | O(E × P)                    |
//! | `len` / `is_empty` | O(1)                        |
//!
//! E = entries, P = observers per entry.
//!
//! # Invariants
//!
//! 1. At most one entry exists per key identity.
//! 2. An entry is non-empty right after a successful insertion; removals may
//!    empty it, and an empty entry is kept.
//! 3. A dead entry (key released) is removed only by a traversal or by an
//!    explicit `remove_key`/`clear`, never by insertion.
//! 4. Observers within an entry are visited in insertion order; entry order is
//!    unspecified.
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation**: callbacks receive shared borrows while the list
//!   is mutably borrowed, so mutating the list from a callback does not compile.
//! - **Key released mid-traversal**: the strong handle resolved for an entry is
//!   held until its observers have been visited, so the entry is seen as live
//!   for that traversal and pruned on the next one.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::{AbsentPolicy, ObserverListConfig};
use crate::entry::Entry;
use crate::handle::KeyRef;
use crate::identity::{ObjectId, ObserverIdentity};

/// Counters reported by a traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Live entries whose observers were visited.
    pub entries_visited: usize,
    /// Callback invocations.
    pub observers_visited: usize,
    /// Entries removed by this traversal.
    pub entries_pruned: usize,
}

/// Registry of observers keyed by externally-owned objects.
///
/// The list never holds a strong reference to a key. When every owner of a
/// key drops it, the key's observers stop being visited and the entry is
/// purged by the next traversal.
///
/// Not `Sync`-aware: callers sharing a list across threads wrap it in their
/// own lock.
pub struct ObserverList<K: KeyRef, P> {
    entries: FxHashMap<ObjectId, Entry<K, P>>,
    config: ObserverListConfig,
}

impl<K: KeyRef, P> Default for ObserverList<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeyRef, P> fmt::Debug for ObserverList<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("entries", &self.entries.len())
            .field("observers", &self.observer_count())
            .field("config", &self.config)
            .finish()
    }
}

impl<K: KeyRef, P> ObserverList<K, P> {
    /// Create an empty list with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ObserverListConfig::default())
    }

    /// Create an empty list with an explicit config.
    #[must_use]
    pub fn with_config(config: ObserverListConfig) -> Self {
        Self {
            entries: FxHashMap::default(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ObserverListConfig {
        &self.config
    }

    /// `true` when no entry is stored (dead entries included).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored entries, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries whose key is still alive. Does not prune.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.entries.values().filter(|e| e.is_alive()).count()
    }

    /// Total observers across all entries, including dead ones.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.entries.values().map(|e| e.observers().len()).sum()
    }

    /// `true` if `key` has an entry, even an empty one.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(&K::object_id(key))
    }

    /// Observers registered under `key`, in insertion order.
    #[must_use]
    pub fn observers(&self, key: &K) -> Option<&[P]> {
        self.entries
            .get(&K::object_id(key))
            .map(|entry| entry.observers())
    }

    /// Drop `key`'s entry and hand back its observers.
    pub fn remove_key(&mut self, key: &K) -> Option<Vec<P>> {
        let entry = self.entries.remove(&K::object_id(key))?;
        trace!(id = %entry.id(), observers = entry.observers().len(), "observer list: key removed");
        Some(entry.into_observers())
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Visit every observer of every live key, then purge dead entries.
    pub fn for_each<F>(&mut self, mut f: F) -> TraversalStats
    where
        F: FnMut(&P),
    {
        self.traverse(|_, observer| f(observer))
    }

    /// Like [`for_each`](Self::for_each), also passing the resolved key.
    pub fn for_each_with_key<F>(&mut self, f: F) -> TraversalStats
    where
        F: FnMut(&K, &P),
    {
        self.traverse(f)
    }

    /// Purge dead entries without visiting observers. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let prune_empty = self.config.prune_empty;
        let doomed: SmallVec<[ObjectId; 8]> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                !entry.is_alive() || (prune_empty && entry.observers().is_empty())
            })
            .map(|(id, _)| *id)
            .collect();
        self.purge(&doomed)
    }

    fn traverse<F>(&mut self, mut visit: F) -> TraversalStats
    where
        F: FnMut(&K, &P),
    {
        let prune_empty = self.config.prune_empty;
        let mut stats = TraversalStats::default();
        let mut doomed: SmallVec<[ObjectId; 8]> = SmallVec::new();

        // Scan: visit live entries, remember the rest.
        for (id, entry) in &self.entries {
            let Some(key) = entry.resolve() else {
                doomed.push(*id);
                continue;
            };
            if prune_empty && entry.observers().is_empty() {
                doomed.push(*id);
                continue;
            }
            stats.entries_visited += 1;
            for observer in entry.observers() {
                visit(&key, observer);
                stats.observers_visited += 1;
            }
        }

        // Rebuild: only now is the map mutated.
        stats.entries_pruned = self.purge(&doomed);
        stats
    }

    fn purge(&mut self, doomed: &[ObjectId]) -> usize {
        if doomed.is_empty() {
            return 0;
        }
        for id in doomed {
            self.entries.remove(id);
        }
        debug!(
            pruned = doomed.len(),
            remaining = self.entries.len(),
            "observer list: pruned entries"
        );
        doomed.len()
    }

    fn entry_mut(&mut self, key: &K) -> &mut Entry<K, P> {
        self.entries.entry(K::object_id(key)).or_insert_with(|| {
            let entry = Entry::new(key);
            trace!(id = %entry.id(), "observer list: entry created");
            entry
        })
    }
}

impl<K: KeyRef, P: ObserverIdentity> ObserverList<K, P> {
    /// Register `observer` under `key`, skipping it if an equal observer is
    /// already there. Returns `true` if it was appended.
    pub fn add(&mut self, key: &K, observer: P) -> bool {
        self.entry_mut(key).push_unique(observer)
    }

    /// Register `observer` only if the configured [`AbsentPolicy`] considers
    /// it absent. Returns `true` if it was appended.
    ///
    /// With the default [`AbsentPolicy::Key`], a key that already has an
    /// entry never receives another observer through this call, even one it
    /// does not hold yet.
    pub fn add_if_absent(&mut self, key: &K, observer: P) -> bool {
        match self.config.absent_policy {
            AbsentPolicy::Key if self.contains_key(key) => false,
            AbsentPolicy::Key | AbsentPolicy::Observer => self.add(key, observer),
        }
    }

    /// Remove the first matching observer from every entry. Entries left empty
    /// are kept. Returns the number of entries it was removed from.
    pub fn remove_observer(&mut self, observer: &P) -> usize {
        self.entries
            .values_mut()
            .filter_map(|entry| entry.remove_first(observer))
            .count()
    }
}

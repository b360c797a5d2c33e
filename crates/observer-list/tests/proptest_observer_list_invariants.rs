//! Property-based invariant tests for `ObserverList`.
//!
//! Random operation sequences are applied to the list and to a plain model
//! that tracks every entry (live or dead) by a serial number. After each step:
//!
//! 1. `len()` equals the number of model entries, dead ones included.
//! 2. `live_len()` equals the number of live model entries.
//! 3. Every live key's observers match the model, in insertion order.
//! 4. A key's observers never contain duplicates.
//!
//! Traversals additionally check that exactly the live entries' observers are
//! visited, each key's observers in order, and that dead entries are gone
//! afterwards.

use std::collections::BTreeMap;
use std::rc::Rc;

use observer_list::{AbsentPolicy, ByValue, ObserverList, ObserverListConfig};
use proptest::prelude::*;

const SLOTS: usize = 4;

// ── Operations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Add(usize, u8),
    AddIfAbsent(usize, u8),
    RemoveKey(usize),
    RemoveObserver(u8),
    Release(usize),
    ForEach,
    Prune,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let slot = 0..SLOTS;
    let obs = 0u8..6;
    prop_oneof![
        4 => (slot.clone(), obs.clone()).prop_map(|(s, o)| Op::Add(s, o)),
        2 => (slot.clone(), obs.clone()).prop_map(|(s, o)| Op::AddIfAbsent(s, o)),
        1 => slot.clone().prop_map(Op::RemoveKey),
        2 => obs.prop_map(Op::RemoveObserver),
        1 => slot.prop_map(Op::Release),
        1 => Just(Op::ForEach),
        1 => Just(Op::Prune),
    ]
}

fn policy_strategy() -> impl Strategy<Value = AbsentPolicy> {
    prop_oneof![Just(AbsentPolicy::Key), Just(AbsentPolicy::Observer)]
}

// ── Model ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ModelEntry {
    alive: bool,
    observers: Vec<u8>,
}

struct Harness {
    list: ObserverList<Rc<u64>, ByValue<u8>>,
    policy: AbsentPolicy,
    slots: Vec<Rc<u64>>,
    next_serial: u64,
    model: BTreeMap<u64, ModelEntry>,
}

impl Harness {
    fn new(policy: AbsentPolicy) -> Self {
        let config = ObserverListConfig::new().with_absent_policy(policy);
        let mut harness = Self {
            list: ObserverList::with_config(config),
            policy,
            slots: Vec::with_capacity(SLOTS),
            next_serial: 0,
            model: BTreeMap::new(),
        };
        for _ in 0..SLOTS {
            let key = harness.fresh_key();
            harness.slots.push(key);
        }
        harness
    }

    fn fresh_key(&mut self) -> Rc<u64> {
        let serial = self.next_serial;
        self.next_serial += 1;
        Rc::new(serial)
    }

    fn model_add(&mut self, serial: u64, observer: u8) {
        let entry = self.model.entry(serial).or_insert_with(|| ModelEntry {
            alive: true,
            observers: Vec::new(),
        });
        if !entry.observers.contains(&observer) {
            entry.observers.push(observer);
        }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Add(slot, observer) => {
                let key = Rc::clone(&self.slots[slot]);
                self.list.add(&key, ByValue(observer));
                self.model_add(*key, observer);
            }
            Op::AddIfAbsent(slot, observer) => {
                let key = Rc::clone(&self.slots[slot]);
                self.list.add_if_absent(&key, ByValue(observer));
                let present = self.model.contains_key(&*key);
                let skip = match self.policy {
                    AbsentPolicy::Key => present,
                    AbsentPolicy::Observer => false,
                };
                if !skip {
                    self.model_add(*key, observer);
                }
            }
            Op::RemoveKey(slot) => {
                let key = Rc::clone(&self.slots[slot]);
                let removed = self.list.remove_key(&key);
                let expected = self.model.remove(&*key).map(|e| e.observers);
                assert_eq!(
                    removed.map(|v| v.into_iter().map(ByValue::into_inner).collect::<Vec<_>>()),
                    expected
                );
            }
            Op::RemoveObserver(observer) => {
                let hits = self.list.remove_observer(&ByValue(observer));
                let mut expected = 0;
                for entry in self.model.values_mut() {
                    if let Some(pos) = entry.observers.iter().position(|o| *o == observer) {
                        entry.observers.remove(pos);
                        expected += 1;
                    }
                }
                assert_eq!(hits, expected);
            }
            Op::Release(slot) => {
                let fresh = self.fresh_key();
                let old = std::mem::replace(&mut self.slots[slot], fresh);
                if let Some(entry) = self.model.get_mut(&*old) {
                    entry.alive = false;
                }
            }
            Op::ForEach => {
                let mut visited: BTreeMap<u64, Vec<u8>> = BTreeMap::new();
                let stats = self
                    .list
                    .for_each_with_key(|key, o| visited.entry(**key).or_default().push(o.0));

                let before = self.model.len();
                self.model.retain(|_, e| e.alive);
                let expected: BTreeMap<u64, Vec<u8>> = self
                    .model
                    .iter()
                    .filter(|(_, e)| !e.observers.is_empty())
                    .map(|(k, e)| (*k, e.observers.clone()))
                    .collect();
                assert_eq!(visited, expected);
                assert_eq!(stats.entries_pruned, before - self.model.len());
                assert_eq!(stats.entries_visited, self.model.len());
            }
            Op::Prune => {
                let before = self.model.len();
                self.model.retain(|_, e| e.alive);
                assert_eq!(self.list.prune(), before - self.model.len());
            }
        }
    }

    fn check(&self) {
        assert_eq!(self.list.len(), self.model.len());
        assert_eq!(self.list.is_empty(), self.model.is_empty());
        assert_eq!(
            self.list.live_len(),
            self.model.values().filter(|e| e.alive).count()
        );
        for key in &self.slots {
            let actual: Option<Vec<u8>> = self
                .list
                .observers(key)
                .map(|obs| obs.iter().map(|o| o.0).collect());
            let expected = self.model.get(&**key).map(|e| e.observers.clone());
            assert_eq!(actual, expected, "observers for key {key}");
            if let Some(obs) = actual {
                let mut deduped = obs.clone();
                deduped.sort_unstable();
                deduped.dedup();
                assert_eq!(deduped.len(), obs.len());
            }
        }
    }
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn list_matches_model(
        policy in policy_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..64),
    ) {
        let mut harness = Harness::new(policy);
        for op in &ops {
            harness.apply(op);
            harness.check();
        }
    }

    #[test]
    fn add_then_remove_key_is_neutral(
        observers in proptest::collection::vec(0u8..10, 1..8),
    ) {
        let mut list = ObserverList::new();
        let anchor = Rc::new(0u64);
        list.add(&anchor, ByValue(0u8));
        let before = list.len();

        let key = Rc::new(1u64);
        for o in &observers {
            list.add(&key, ByValue(*o));
        }
        list.remove_key(&key);
        prop_assert_eq!(list.len(), before);

        let mut seen = Vec::new();
        list.for_each(|o| seen.push(o.0));
        prop_assert_eq!(seen, vec![0u8]);
    }

    #[test]
    fn released_keys_are_never_visited(
        live in 0usize..6,
        dead in 1usize..6,
    ) {
        let mut list = ObserverList::new();
        let live_keys: Vec<Rc<u64>> = (0..live as u64).map(Rc::new).collect();
        for key in &live_keys {
            list.add(key, ByValue(true));
        }
        for i in 0..dead as u64 {
            let key = Rc::new(100 + i);
            list.add(&key, ByValue(false));
        }
        prop_assert_eq!(list.len(), live + dead);

        let mut saw_dead = false;
        let stats = list.for_each(|o| saw_dead |= !o.0);
        prop_assert!(!saw_dead);
        prop_assert_eq!(stats.entries_pruned, dead);
        prop_assert_eq!(list.len(), live);
    }
}

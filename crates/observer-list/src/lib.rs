#![forbid(unsafe_code)]

//! Observer registry keyed by objects it does not own.
//!
//! # Role
//! `observer-list` backs observer/delegate patterns where the objects holding
//! callbacks routinely go away without unregistering. Keys are registered as
//! strong handles (`Rc<T>`, `Arc<T>`) but stored as weak ones, so the list is
//! never what keeps a key alive.
//!
//! # Primary pieces
//! - [`ObserverList`]: the registry, with insertion, removal, and traversals
//!   that prune entries whose key has been released.
//! - [`KeyRef`] / [`WeakHandle`]: how a key is downgraded, resolved, and
//!   identified.
//! - [`ObserverIdentity`] / [`ByValue`]: how observers are compared when
//!   deduplicating or removing.
//! - [`ObserverListConfig`]: dedup and pruning switches, env-overridable.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use observer_list::ObserverList;
//!
//! let mut list: ObserverList<Rc<str>, Rc<Cell<u32>>> = ObserverList::new();
//! let owner: Rc<str> = Rc::from("window");
//! let hits = Rc::new(Cell::new(0));
//!
//! list.add(&owner, Rc::clone(&hits));
//! list.for_each(|h| h.set(h.get() + 1));
//! assert_eq!(hits.get(), 1);
//!
//! drop(owner);
//! list.for_each(|h| h.set(h.get() + 1));
//! assert_eq!(hits.get(), 1);
//! assert!(list.is_empty());
//! ```

pub mod config;
mod entry;
pub mod handle;
pub mod identity;
pub mod list;

pub use config::{AbsentPolicy, ConfigError, ObserverListConfig, ObserverListConfigParse};
pub use handle::{KeyRef, WeakHandle};
pub use identity::{ByValue, ObjectId, ObserverIdentity};
pub use list::{ObserverList, TraversalStats};

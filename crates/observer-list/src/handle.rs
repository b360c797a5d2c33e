#![forbid(unsafe_code)]

//! Non-owning key handles.
//!
//! [`KeyRef`] is implemented by the strong handle a caller registers with
//! (`Rc<T>` or `Arc<T>`). It knows how to produce a [`WeakHandle`] that does
//! not keep the object alive and how to derive the [`ObjectId`] used for
//! lookups. Both impls accept unsized targets, so `Rc<dyn Trait>` keys work.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Owner released | Last strong handle dropped | `resolve()` returns `None` |
//! | Key already dead | Only reachable via a `Weak` | Not representable: a `KeyRef` is always a live strong handle |

use std::rc::{self, Rc};
use std::sync::{self, Arc};

use crate::identity::ObjectId;

/// A reference that can be checked for validity without extending the
/// referent's lifetime.
pub trait WeakHandle {
    /// Strong handle produced by a successful [`resolve`](Self::resolve).
    type Strong;

    /// Upgrade to a strong handle if the referent is still alive.
    fn resolve(&self) -> Option<Self::Strong>;

    /// Cheap liveness check that does not touch the strong count.
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized> WeakHandle for rc::Weak<T> {
    type Strong = Rc<T>;

    #[inline]
    fn resolve(&self) -> Option<Rc<T>> {
        self.upgrade()
    }

    #[inline]
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

impl<T: ?Sized> WeakHandle for sync::Weak<T> {
    type Strong = Arc<T>;

    #[inline]
    fn resolve(&self) -> Option<Arc<T>> {
        self.upgrade()
    }

    #[inline]
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Strong handle that can be registered as a key.
pub trait KeyRef: Sized {
    /// Weak counterpart stored by the registry.
    type Weak: WeakHandle<Strong = Self>;

    /// Create the non-owning handle kept in the entry.
    fn downgrade(this: &Self) -> Self::Weak;

    /// Identity token for this key.
    fn object_id(this: &Self) -> ObjectId;
}

impl<T: ?Sized> KeyRef for Rc<T> {
    type Weak = rc::Weak<T>;

    #[inline]
    fn downgrade(this: &Self) -> rc::Weak<T> {
        Rc::downgrade(this)
    }

    #[inline]
    fn object_id(this: &Self) -> ObjectId {
        ObjectId::of_rc(this)
    }
}

impl<T: ?Sized> KeyRef for Arc<T> {
    type Weak = sync::Weak<T>;

    #[inline]
    fn downgrade(this: &Self) -> sync::Weak<T> {
        Arc::downgrade(this)
    }

    #[inline]
    fn object_id(this: &Self) -> ObjectId {
        ObjectId::of_arc(this)
    }
}

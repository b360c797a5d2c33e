#![forbid(unsafe_code)]

//! Identity tokens for keys and equality rules for observers.
//!
//! Keys are compared by the address of their shared allocation, captured once
//! when an entry is created and stored next to the weak handle. The token stays
//! usable after the handle stops resolving, so a dead entry can still be found
//! and removed until a traversal prunes it.
//!
//! Observers are compared through [`ObserverIdentity`]. Reference-counted
//! observers compare by pointer; plain values opt into value equality by being
//! wrapped in [`ByValue`].
//!
//! # Invariants
//!
//! 1. Two live `Rc`/`Arc` handles share an [`ObjectId`] iff they point to the
//!    same allocation (pointer metadata is ignored for trait objects).
//! 2. An allocation referenced by a `Weak` is never freed, so its address cannot
//!    be handed to a new object while the registry still holds the entry.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::{self, Rc};
use std::sync::{self, Arc};

/// Address-derived identity of a shared object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Wrap a caller-supplied token (an arena index, a handle id, ...).
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw token value.
    #[must_use]
    pub const fn as_raw(self) -> usize {
        self.0
    }

    /// Identity of the allocation behind an `Rc`.
    #[must_use]
    pub fn of_rc<T: ?Sized>(value: &Rc<T>) -> Self {
        Self::of_ptr(Rc::as_ptr(value))
    }

    /// Identity of the allocation behind an `Arc`.
    #[must_use]
    pub fn of_arc<T: ?Sized>(value: &Arc<T>) -> Self {
        Self::of_ptr(Arc::as_ptr(value))
    }

    #[inline]
    fn of_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>() as usize)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Equality rule used when deduplicating or removing observers.
pub trait ObserverIdentity {
    /// `true` when `self` and `other` denote the same observer.
    fn same_observer(&self, other: &Self) -> bool;
}

impl<T: ?Sized> ObserverIdentity for Rc<T> {
    #[inline]
    fn same_observer(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(self), Rc::as_ptr(other))
    }
}

impl<T: ?Sized> ObserverIdentity for Arc<T> {
    #[inline]
    fn same_observer(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(other))
    }
}

impl<T: ?Sized> ObserverIdentity for rc::Weak<T> {
    #[inline]
    fn same_observer(&self, other: &Self) -> bool {
        rc::Weak::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ObserverIdentity for sync::Weak<T> {
    #[inline]
    fn same_observer(&self, other: &Self) -> bool {
        sync::Weak::ptr_eq(self, other)
    }
}

/// Observer compared by value (`PartialEq`) instead of by pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByValue<T>(pub T);

impl<T> ByValue<T> {
    /// Unwrap the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: PartialEq> ObserverIdentity for ByValue<T> {
    #[inline]
    fn same_observer(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> From<T> for ByValue<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for ByValue<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for ByValue<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

//! Test utilities and instrumented types for Coffer development.
//!
//! Element types that record their own lifecycle ([`Tracked`],
//! [`CloneBomb`]) let container tests assert that every constructed value
//! is destroyed exactly once, including after a mid-operation panic. The
//! [`fixtures`] module provides allocator stand-ins that count or refuse
//! requests.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod fixtures;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub use fixtures::{CountingAlloc, FailingAlloc};

/// Shared tally of values created and dropped.
///
/// Clones share the same tally.
#[derive(Clone, Default)]
pub struct DropCounter {
    created: Rc<Cell<usize>>,
    dropped: Rc<Cell<usize>>,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `value` so that its creation and drop are counted here.
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        self.created.set(self.created.get() + 1);
        Tracked {
            value,
            counter: self.clone(),
        }
    }

    /// Values created (including clones).
    pub fn created(&self) -> usize {
        self.created.get()
    }

    /// Values dropped.
    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    /// Values created but not yet dropped.
    pub fn live(&self) -> usize {
        self.created() - self.dropped()
    }
}

impl fmt::Debug for DropCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropCounter")
            .field("created", &self.created())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// A value whose lifetime is recorded in a [`DropCounter`].
pub struct Tracked<T> {
    pub value: T,
    counter: DropCounter,
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        self.counter.track(self.value.clone())
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        let dropped = &self.counter.dropped;
        dropped.set(dropped.get() + 1);
    }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tracked").field(&self.value).finish()
    }
}

/// Number of clones left before a [`CloneBomb`] goes off.
///
/// Shared by every bomb armed with it, so "panic on the k-th clone" holds
/// across a whole container.
#[derive(Clone, Debug)]
pub struct Fuse(Rc<Cell<usize>>);

impl Fuse {
    /// A fuse that lets `clones` clones succeed and panics on the next.
    pub fn new(clones: usize) -> Self {
        Self(Rc::new(Cell::new(clones)))
    }

    /// Clones still allowed.
    pub fn remaining(&self) -> usize {
        self.0.get()
    }

    fn burn(&self) {
        let left = self.0.get();
        assert!(left > 0, "clone bomb detonated");
        self.0.set(left - 1);
    }
}

/// A tracked value whose `clone` panics once its [`Fuse`] runs out.
pub struct CloneBomb {
    pub id: usize,
    fuse: Fuse,
    tracked: Tracked<()>,
}

impl CloneBomb {
    pub fn new(id: usize, counter: &DropCounter, fuse: &Fuse) -> Self {
        Self {
            id,
            fuse: fuse.clone(),
            tracked: counter.track(()),
        }
    }
}

impl Clone for CloneBomb {
    fn clone(&self) -> Self {
        self.fuse.burn();
        Self {
            id: self.id,
            fuse: self.fuse.clone(),
            tracked: self.tracked.clone(),
        }
    }
}

impl fmt::Debug for CloneBomb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloneBomb").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn counter_tracks_clones_and_drops() {
        let counter = DropCounter::new();
        let a = counter.track(5);
        let b = a.clone();
        assert_eq!(counter.created(), 2);
        drop(a);
        assert_eq!(counter.live(), 1);
        drop(b);
        assert_eq!(counter.dropped(), 2);
    }

    #[test]
    fn bomb_goes_off_on_schedule() {
        let counter = DropCounter::new();
        let fuse = Fuse::new(2);
        let bomb = CloneBomb::new(0, &counter, &fuse);
        let c1 = bomb.clone();
        let c2 = bomb.clone();
        assert_eq!(fuse.remaining(), 0);
        let third = catch_unwind(AssertUnwindSafe(|| bomb.clone()));
        assert!(third.is_err());
        drop((bomb, c1, c2));
        assert_eq!(counter.live(), 0);
    }
}

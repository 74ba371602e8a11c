//! The strong/weak reference count pair.

use std::cell::Cell;

/// What a strong release asks the caller to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrongRelease {
    /// Other strong owners remain; nothing to do.
    Shared,
    /// That was the last strong owner: destroy the object, then give up
    /// the weak reference held on behalf of the strong owners.
    LastOwner,
}

/// Strong and weak counts of one control block.
///
/// Both start at 1. The weak count includes one reference held jointly
/// by all strong owners, so the block outlives the object until the last
/// strong owner has finished destroying it.
///
/// State transitions:
///
/// ```text
/// (s, w) --acquire_strong--> (s+1, w)        s > 0
/// (s, w) --release_strong--> (s-1, w)        Shared     if s > 1
/// (1, w) --release_strong--> (0, w)          LastOwner
/// (s, w) --acquire_weak----> (s, w+1)
/// (s, w) --release_weak----> (s, w-1)        true iff w-1 == 0
/// ```
#[derive(Debug)]
pub struct Counter {
    strong: Cell<usize>,
    weak: Cell<usize>,
}

impl Counter {
    /// A fresh pair: one strong owner, and its implicit weak reference.
    pub fn new() -> Self {
        Self {
            strong: Cell::new(1),
            weak: Cell::new(1),
        }
    }

    /// Strong owners.
    pub fn strong(&self) -> usize {
        self.strong.get()
    }

    /// Weak references, including the one held for the strong owners.
    pub fn weak(&self) -> usize {
        self.weak.get()
    }

    /// Register another strong owner of a live object.
    pub fn acquire_strong(&self) {
        let strong = self.strong.get();
        debug_assert!(strong > 0, "acquire_strong on a destroyed object");
        self.strong.set(strong + 1);
    }

    /// Register a strong owner if the object is still alive.
    pub fn try_acquire_strong(&self) -> bool {
        let strong = self.strong.get();
        if strong == 0 {
            return false;
        }
        self.strong.set(strong + 1);
        true
    }

    /// Drop one strong owner.
    pub fn release_strong(&self) -> StrongRelease {
        let strong = self.strong.get();
        debug_assert!(strong > 0, "release_strong underflow");
        self.strong.set(strong - 1);
        if strong == 1 {
            StrongRelease::LastOwner
        } else {
            StrongRelease::Shared
        }
    }

    /// Register another weak reference.
    pub fn acquire_weak(&self) {
        self.weak.set(self.weak.get() + 1);
    }

    /// Drop one weak reference. Returns `true` when none remain and the
    /// block must be released.
    pub fn release_weak(&self) -> bool {
        let weak = self.weak.get();
        debug_assert!(weak > 0, "release_weak underflow");
        self.weak.set(weak - 1);
        weak == 1
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

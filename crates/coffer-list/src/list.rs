//! The sentinel-closed ring list.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use coffer_core::{handle_alloc_error, AllocError, Global, RawAlloc};

use crate::cursor::CursorMut;
use crate::iter::{IntoIter, Iter, IterMut};
use crate::node::{Node, NodePtr, Slot};

/// A circular doubly-linked list whose nodes come from an allocator `A`.
///
/// The ring is closed through a sentinel node that holds no value; an
/// empty list is a sentinel linked to itself. Inserting or removing a node
/// never moves any other node, so references obtained through a cursor
/// stay valid until that node itself is removed.
///
/// The allocator is consulted once per node, with the node's own layout.
/// Assignment follows the allocator's propagation policy: see
/// [`clone_from`](Clone::clone_from) and [`move_assign`](Self::move_assign).
pub struct List<T, A: RawAlloc = Global> {
    sentinel: NodePtr<T>,
    len: usize,
    alloc: A,
    _marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: the list owns its nodes exclusively, like a `Box` would; moving
// it to another thread moves the values and the allocator handle.
unsafe impl<T: Send, A: RawAlloc + Send> Send for List<T, A> {}

// SAFETY: `&List` only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for List<T, A> {}

/// Releases the storage of a node whose value has not been written yet.
struct NodeGuard<'a, T, A: RawAlloc> {
    alloc: &'a A,
    node: NodePtr<T>,
}

impl<T, A: RawAlloc> NodeGuard<'_, T, A> {
    fn disarm(self) {
        mem::forget(self);
    }
}

impl<T, A: RawAlloc> Drop for NodeGuard<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: `node` came from `allocate_one::<Node<T>>` on this allocator
        // and was never initialized or linked.
        unsafe { self.alloc.deallocate_one(self.node) }
    }
}

impl<T> List<T> {
    /// Create an empty list on the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A: RawAlloc> List<T, A> {
    /// Create an empty list allocating through `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if the sentinel cannot be allocated.
    pub fn new_in(alloc: A) -> Self {
        Self::try_new_in(alloc).unwrap_or_else(|err| handle_alloc_error(err))
    }

    /// Create an empty list, reporting sentinel allocation failure.
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        let sentinel = alloc.allocate_one::<Node<T>>()?;
        // SAFETY: fresh storage sized and aligned for a `Node<T>`.
        unsafe {
            sentinel.as_ptr().write(Node {
                prev: sentinel,
                next: sentinel,
                slot: Slot::Sentinel,
            });
        }
        Ok(Self {
            sentinel,
            len: 0,
            alloc,
            _marker: PhantomData,
        })
    }

    /// A list of `n` default values.
    pub fn with_len_in(n: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut list = Self::new_in(alloc);
        for _ in 0..n {
            list.push_back(T::default());
        }
        list
    }

    /// A list of `n` clones of `value`.
    ///
    /// If a clone panics, the values already inserted are destroyed and
    /// every node is returned to `alloc`.
    pub fn from_elem_in(n: usize, value: T, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut list = Self::new_in(alloc);
        for _ in 0..n {
            list.push_back(value.clone());
        }
        list
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The allocator nodes are drawn from.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Append `value`.
    ///
    /// # Panics
    ///
    /// Panics if the node cannot be allocated.
    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            handle_alloc_error(err);
        }
    }

    /// Prepend `value`.
    ///
    /// # Panics
    ///
    /// Panics if the node cannot be allocated.
    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            handle_alloc_error(err);
        }
    }

    /// Append `value`, reporting allocation failure. On failure `value` is
    /// dropped and the list is unchanged.
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        self.try_insert_with(self.sentinel, || value).map(|_| ())
    }

    /// Prepend `value`, reporting allocation failure.
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        let first = self.first();
        self.try_insert_with(first, || value).map(|_| ())
    }

    /// Remove and return the last value.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is non-empty, so the sentinel's prev is a value node.
        Some(unsafe { self.remove_node(Node::prev(self.sentinel)) })
    }

    /// Remove and return the first value.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is non-empty, so the sentinel's next is a value node.
        Some(unsafe { self.remove_node(self.first()) })
    }

    /// The first value.
    pub fn front(&self) -> Option<&T> {
        // SAFETY: the node is live while `self` is borrowed.
        unsafe { Node::value(self.first()) }
    }

    /// The first value, mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        // SAFETY: the node is live and exclusively borrowed through `self`.
        unsafe { Node::value_mut(self.first()) }
    }

    /// The last value.
    pub fn back(&self) -> Option<&T> {
        // SAFETY: the node is live while `self` is borrowed.
        unsafe { Node::value(Node::prev(self.sentinel)) }
    }

    /// The last value, mutably.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        // SAFETY: the node is live and exclusively borrowed through `self`.
        unsafe { Node::value_mut(Node::prev(self.sentinel)) }
    }

    /// Destroy every value and release every node except the sentinel.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Exchange the contents (and allocators) of two lists. O(1).
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Replace the contents of `self` with those of `other`.
    ///
    /// If `A::PROPAGATE_ON_MOVE_ASSIGN` holds, `self` takes `other` whole,
    /// allocator included. Otherwise `self` keeps its allocator: when the
    /// two allocators can release each other's storage the ring is stolen
    /// in O(1), and when they cannot every value is moved into a fresh node
    /// from `self`'s allocator.
    pub fn move_assign(&mut self, mut other: Self) {
        if A::PROPAGATE_ON_MOVE_ASSIGN {
            *self = other;
        } else if self.alloc.same_source(&other.alloc) {
            mem::swap(&mut self.sentinel, &mut other.sentinel);
            mem::swap(&mut self.len, &mut other.len);
        } else {
            self.clear();
            self.extend(other);
        }
    }

    /// Iterate over shared references, front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        // SAFETY: the sentinel is live while `self` is borrowed.
        unsafe { Iter::new(self.first(), Node::prev(self.sentinel), self.len) }
    }

    /// Iterate over mutable references, front to back.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        // SAFETY: the sentinel is live while `self` is borrowed.
        unsafe { IterMut::new(self.first(), Node::prev(self.sentinel), self.len) }
    }

    /// A cursor on the first value (or the end position if empty).
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
        let first = self.first();
        CursorMut::new(self, first)
    }

    /// A cursor on the end position, just past the last value.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, A> {
        let end = self.sentinel;
        CursorMut::new(self, end)
    }

    pub(crate) fn end(&self) -> NodePtr<T> {
        self.sentinel
    }

    pub(crate) fn first(&self) -> NodePtr<T> {
        // SAFETY: the sentinel lives as long as the list.
        unsafe { Node::next(self.sentinel) }
    }

    /// Allocate a node, construct its value with `f`, then link it before
    /// `pos`. If `f` panics the node's storage is released and the ring is
    /// untouched.
    pub(crate) fn try_insert_with<F>(
        &mut self,
        pos: NodePtr<T>,
        f: F,
    ) -> Result<NodePtr<T>, AllocError>
    where
        F: FnOnce() -> T,
    {
        let node = self.alloc.allocate_one::<Node<T>>()?;
        let guard = NodeGuard {
            alloc: &self.alloc,
            node,
        };
        let value = f();
        guard.disarm();
        // SAFETY: `node` is fresh storage for a `Node<T>`; `pos` belongs to
        // this list's ring.
        unsafe {
            node.as_ptr().write(Node {
                prev: node,
                next: node,
                slot: Slot::Value(value),
            });
            Node::link_before(node, pos);
        }
        self.len += 1;
        Ok(node)
    }

    /// Unlink `node`, release its storage and return its value.
    ///
    /// # Safety
    ///
    /// `node` must be a value node of this list.
    pub(crate) unsafe fn remove_node(&mut self, node: NodePtr<T>) -> T {
        // SAFETY: caller contract; the node is read out before its storage
        // goes back to the allocator it came from.
        let slot = unsafe {
            Node::unlink(node);
            let Node { slot, .. } = node.as_ptr().read();
            self.alloc.deallocate_one(node);
            slot
        };
        self.len -= 1;
        match slot {
            Slot::Value(value) => value,
            Slot::Sentinel => unreachable!("sentinel removed from its own list"),
        }
    }

    /// Empty the ring without releasing any node, yielding the detached
    /// value nodes in their old order.
    ///
    /// Every yielded node must be relinked with [`Node::link_before`]
    /// before the list is used again; `len` is left as it was.
    pub(crate) fn detach_ring(&mut self) -> DetachedRing<T> {
        let first = self.first();
        // SAFETY: the sentinel is live; the old chain keeps its own links.
        unsafe {
            (*self.sentinel.as_ptr()).next = self.sentinel;
            (*self.sentinel.as_ptr()).prev = self.sentinel;
        }
        DetachedRing {
            cur: first,
            end: self.sentinel,
        }
    }
}

/// Walks a chain severed by [`List::detach_ring`].
pub(crate) struct DetachedRing<T> {
    cur: NodePtr<T>,
    end: NodePtr<T>,
}

impl<T> Iterator for DetachedRing<T> {
    type Item = NodePtr<T>;

    fn next(&mut self) -> Option<NodePtr<T>> {
        if self.cur == self.end {
            return None;
        }
        let node = self.cur;
        // SAFETY: the chain's nodes are live; the successor is read before
        // the caller relinks `node`.
        self.cur = unsafe { Node::next(node) };
        Some(node)
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAlloc> Drop for List<T, A> {
    fn drop(&mut self) {
        struct Rest<'a, T, A: RawAlloc>(&'a mut List<T, A>);

        impl<T, A: RawAlloc> Drop for Rest<'_, T, A> {
            fn drop(&mut self) {
                // Only reached if a value's destructor panicked.
                while self.0.pop_front().is_some() {}
                self.0.free_sentinel();
            }
        }

        let rest = Rest(self);
        while rest.0.pop_front().is_some() {}
        mem::forget(rest);
        self.free_sentinel();
    }
}

impl<T, A: RawAlloc> List<T, A> {
    fn free_sentinel(&mut self) {
        // SAFETY: the ring is empty and the sentinel came from this allocator.
        unsafe {
            self.sentinel.as_ptr().drop_in_place();
            self.alloc.deallocate_one(self.sentinel);
        }
    }
}

impl<T: Clone, A: RawAlloc> Clone for List<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.alloc.select_on_copy());
        out.extend(self.iter().cloned());
        out
    }

    /// Copy-assignment. The destination keeps its allocator unless
    /// `A::PROPAGATE_ON_COPY_ASSIGN` holds. The copy is built in a
    /// temporary list and swapped in, so a panicking clone leaves `self`
    /// untouched.
    fn clone_from(&mut self, source: &Self) {
        let alloc = if A::PROPAGATE_ON_COPY_ASSIGN {
            source.alloc.clone()
        } else {
            self.alloc.clone()
        };
        let mut temp = Self::new_in(alloc);
        temp.extend(source.iter().cloned());
        self.swap(&mut temp);
    }
}

impl<T: PartialEq, A: RawAlloc> PartialEq for List<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: RawAlloc> Eq for List<T, A> {}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for List<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: RawAlloc> Extend<T> for List<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, A: RawAlloc> IntoIterator for List<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a List<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut List<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_arena::{Arena, ArenaAlloc, ArenaConfig};
    use coffer_test_utils::{CountingAlloc, DropCounter, FailingAlloc};
    use std::alloc::Layout;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::ptr::NonNull;

    #[test]
    fn push_pop_both_ends() {
        let mut list = List::new();
        list.push_back(2);
        list.push_front(1);
        list.push_back(3);
        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn front_back_mut() {
        let mut list: List<_> = (1..=3).collect();
        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 30;
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![10, 2, 30]);
    }

    #[test]
    fn every_node_goes_back_to_the_allocator() {
        let alloc = CountingAlloc::new();
        {
            let mut list = List::new_in(alloc.clone());
            for i in 0..10 {
                list.push_back(i.to_string());
            }
            list.pop_front();
            assert_eq!(alloc.outstanding(), 10, "nine values plus the sentinel");
        }
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn list_lives_in_an_arena() {
        let arena = Arena::new(ArenaConfig::new(4096)).unwrap();
        {
            let mut list = List::new_in(ArenaAlloc::<u64>::new(&arena));
            for i in 0..20u64 {
                list.push_back(i);
            }
            assert_eq!(list.iter().sum::<u64>(), 190);
            assert_eq!(arena.allocation_count(), 21);
        }
        assert!(arena.used() > 0, "non-LIFO releases leave the cursor in place");
    }

    #[test]
    fn arena_exhaustion_surfaces_from_try_push() {
        let arena = Arena::new(ArenaConfig::new(256)).unwrap();
        let mut list = List::new_in(ArenaAlloc::<[u8; 64]>::new(&arena));
        let mut pushed = 0;
        let err = loop {
            match list.try_push_back([0u8; 64]) {
                Ok(()) => pushed += 1,
                Err(err) => break err,
            }
        };
        assert!(matches!(err, AllocError::Exhausted { .. }));
        assert_eq!(list.len(), pushed);
    }

    #[test]
    fn failed_node_allocation_leaves_list_unchanged() {
        let alloc = FailingAlloc::new(2);
        let mut list = List::new_in(alloc.clone());
        list.push_back(1);
        assert!(list.try_push_front(0).is_err());
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1]);
        drop(list);
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    #[should_panic(expected = "allocator refused")]
    fn infallible_push_panics_on_failure() {
        let mut list = List::new_in(FailingAlloc::new(1));
        list.push_back(1);
    }

    #[test]
    fn panicking_constructor_releases_node_storage() {
        let alloc = CountingAlloc::new();
        let mut list = List::new_in(alloc.clone());
        list.push_back(1);
        let end = list.end();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = list.try_insert_with(end, || panic!("constructor failure"));
        }));
        assert!(outcome.is_err());
        assert_eq!(list.len(), 1);
        assert_eq!(alloc.outstanding(), 2);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn clone_is_deep() {
        let counter = DropCounter::new();
        let list: List<_> = (0..5).map(|i| counter.track(i)).collect();
        let copy = list.clone();
        assert_eq!(counter.live(), 10);
        assert_eq!(copy, list);
        drop(copy);
        drop(list);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn clone_from_keeps_destination_allocator() {
        let src_alloc = CountingAlloc::new();
        let dst_alloc = CountingAlloc::new();
        let mut src = List::new_in(src_alloc.clone());
        src.extend([1, 2, 3]);
        let mut dst = List::new_in(dst_alloc.clone());
        dst.push_back(9);

        dst.clone_from(&src);
        assert_eq!(dst, src);
        assert!(dst.allocator().same_source(&dst_alloc));
        assert_eq!(dst_alloc.outstanding(), 4);
        assert_eq!(src_alloc.outstanding(), 4);
    }

    /// `CountingAlloc` with propagation switched around.
    #[derive(Clone, Debug)]
    struct Sticky(CountingAlloc);

    impl RawAlloc for Sticky {
        const PROPAGATE_ON_COPY_ASSIGN: bool = true;
        const PROPAGATE_ON_MOVE_ASSIGN: bool = false;

        fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
            self.0.allocate(layout)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            unsafe { self.0.deallocate(ptr, layout) }
        }

        fn same_source(&self, other: &Self) -> bool {
            self.0.same_source(&other.0)
        }
    }

    #[test]
    fn clone_from_propagates_when_allowed() {
        let a = Sticky(CountingAlloc::new());
        let b = Sticky(CountingAlloc::new());
        let src = List::from_elem_in(3, 7, a.clone());
        let mut dst = List::new_in(b.clone());
        dst.clone_from(&src);
        assert!(dst.allocator().same_source(&a));
        assert_eq!(b.0.outstanding(), 0);
    }

    #[test]
    fn move_assign_element_wise_across_allocators() {
        let a = Sticky(CountingAlloc::new());
        let b = Sticky(CountingAlloc::new());
        let src = List::from_elem_in(4, 1, a.clone());
        let mut dst = List::new_in(b.clone());
        dst.move_assign(src);
        assert_eq!(dst.len(), 4);
        assert!(dst.allocator().same_source(&b));
        assert_eq!(a.0.outstanding(), 0, "source nodes released");
        assert_eq!(b.0.outstanding(), 5);
    }

    #[test]
    fn move_assign_steals_ring_from_same_source() {
        let a = Sticky(CountingAlloc::new());
        let src = List::from_elem_in(4, 1, a.clone());
        let mut dst = List::new_in(a.clone());
        dst.push_back(0);
        let allocations = a.0.allocations();
        dst.move_assign(src);
        assert_eq!(dst.len(), 4);
        assert_eq!(a.0.allocations(), allocations, "no node was reallocated");
        assert_eq!(a.0.outstanding(), 5);
    }

    #[test]
    fn move_assign_propagates_by_default() {
        let src_alloc = CountingAlloc::new();
        let mut dst = List::new_in(CountingAlloc::new());
        dst.move_assign(List::from_elem_in(2, 'x', src_alloc.clone()));
        assert!(dst.allocator().same_source(&src_alloc));
    }

    #[test]
    fn with_len_defaults() {
        let list: List<String> = List::with_len_in(3, Global);
        assert!(list.iter().all(String::is_empty));
    }

    #[test]
    fn drop_continues_after_panicking_destructor() {
        struct Grenade(DropCounter, bool);
        impl Drop for Grenade {
            fn drop(&mut self) {
                let _ = self.0.track(());
                assert!(!self.1, "destructor failure");
            }
        }

        let counter = DropCounter::new();
        let alloc = CountingAlloc::new();
        let mut list = List::new_in(alloc.clone());
        for i in 0..4 {
            list.push_back(Grenade(counter.clone(), i == 1));
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| drop(list)));
        assert!(outcome.is_err());
        assert_eq!(counter.created(), 4, "every destructor ran");
        assert_eq!(alloc.outstanding(), 0);
    }
}

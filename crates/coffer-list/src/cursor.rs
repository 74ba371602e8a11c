//! Editing cursor over a [`List`].

use std::fmt;

use coffer_core::{handle_alloc_error, AllocError, RawAlloc};

use crate::list::List;
use crate::node::{Node, NodePtr};

/// A position in a list that can read, insert and remove in O(1).
///
/// The positions form a ring: every value plus one end position between
/// the last value and the first. Moving past either edge lands on the end
/// position and continues from the other side.
pub struct CursorMut<'a, T, A: RawAlloc> {
    list: &'a mut List<T, A>,
    current: NodePtr<T>,
}

impl<'a, T, A: RawAlloc> CursorMut<'a, T, A> {
    pub(crate) fn new(list: &'a mut List<T, A>, current: NodePtr<T>) -> Self {
        Self { list, current }
    }

    /// The value under the cursor, or `None` at the end position.
    pub fn current(&self) -> Option<&T> {
        // SAFETY: `current` is a live node of the borrowed list.
        unsafe { Node::value(self.current) }
    }

    /// The value under the cursor, mutably.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as above; `&mut self` makes the access exclusive.
        unsafe { Node::value_mut(self.current) }
    }

    /// Whether the cursor is on the end position.
    pub fn is_end(&self) -> bool {
        self.current == self.list.end()
    }

    /// Step towards the back.
    pub fn move_next(&mut self) {
        // SAFETY: `current` is a live node of the borrowed list.
        self.current = unsafe { Node::next(self.current) };
    }

    /// Step towards the front.
    pub fn move_prev(&mut self) {
        // SAFETY: `current` is a live node of the borrowed list.
        self.current = unsafe { Node::prev(self.current) };
    }

    /// Insert `value` just before the cursor. The cursor does not move.
    ///
    /// # Panics
    ///
    /// Panics if the node cannot be allocated.
    pub fn insert_before(&mut self, value: T) {
        if let Err(err) = self.try_insert_before_with(|| value) {
            handle_alloc_error(err);
        }
    }

    /// Allocate a node, build its value in place with `f`, and link it just
    /// before the cursor.
    ///
    /// Storage is obtained before `f` runs. If allocation fails `f` is never
    /// called; if `f` panics the storage is released and the list is left
    /// exactly as it was.
    pub fn try_insert_before_with<F>(&mut self, f: F) -> Result<(), AllocError>
    where
        F: FnOnce() -> T,
    {
        self.list.try_insert_with(self.current, f).map(|_| ())
    }

    /// Remove the value under the cursor and move to the next position.
    /// Returns `None` (and stays put) at the end position.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }
        let node = self.current;
        // SAFETY: `node` is a value node of this list, and its successor
        // is read before it is unlinked.
        unsafe {
            self.current = Node::next(node);
            Some(self.list.remove_node(node))
        }
    }

    /// The list this cursor edits.
    pub fn as_list(&self) -> &List<T, A> {
        self.list
    }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for CursorMut<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.current()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::List;
    use coffer_test_utils::{CountingAlloc, FailingAlloc};

    fn collect(list: &List<i32, impl coffer_core::RawAlloc>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn insert_before_keeps_position() {
        let mut list: List<_> = [1, 3].into_iter().collect();
        let mut cursor = list.cursor_front_mut();
        cursor.move_next();
        assert_eq!(cursor.current(), Some(&3));
        cursor.insert_before(2);
        assert_eq!(cursor.current(), Some(&3));
        cursor.move_next();
        assert!(cursor.is_end());
        cursor.insert_before(4);
        assert_eq!(collect(&list), vec![1, 2, 3, 4]);
    }

    #[test]
    fn ring_wraps_through_end() {
        let mut list: List<_> = (1..=3).collect();
        let mut cursor = list.cursor_end_mut();
        cursor.move_next();
        assert_eq!(cursor.current(), Some(&1));
        cursor.move_prev();
        cursor.move_prev();
        assert_eq!(cursor.current(), Some(&3));
    }

    #[test]
    fn remove_current_advances() {
        let mut list: List<_> = (1..=4).collect();
        let mut cursor = list.cursor_front_mut();
        cursor.move_next();
        assert_eq!(cursor.remove_current(), Some(2));
        assert_eq!(cursor.current(), Some(&3));
        *cursor.current_mut().unwrap() = 30;
        cursor.move_next();
        cursor.move_next();
        assert_eq!(cursor.remove_current(), None);
        assert_eq!(cursor.as_list().len(), 3);
        assert_eq!(collect(&list), vec![1, 30, 4]);
    }

    #[test]
    fn other_nodes_survive_edits() {
        let mut list: List<_> = (0..5).collect();
        let third: *const i32 = list.iter().nth(3).unwrap();
        let mut cursor = list.cursor_front_mut();
        cursor.remove_current();
        cursor.insert_before(-1);
        cursor.move_next();
        cursor.remove_current();
        assert_eq!(cursor.current(), Some(&3));
        assert!(std::ptr::eq(cursor.current().unwrap(), third));
    }

    #[test]
    fn failed_allocation_skips_constructor() {
        let mut list = List::new_in(FailingAlloc::new(1));
        let mut called = false;
        let result = list.cursor_end_mut().try_insert_before_with(|| {
            called = true;
            0
        });
        assert!(result.is_err());
        assert!(!called);
        assert!(list.is_empty());
    }

    #[test]
    fn panicking_constructor_is_rolled_back() {
        let alloc = CountingAlloc::new();
        let mut list = List::new_in(alloc.clone());
        list.extend([1, 2]);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut cursor = list.cursor_front_mut();
            let _ = cursor.try_insert_before_with(|| -> i32 { panic!("constructor failure") });
        }));
        assert!(outcome.is_err());
        assert_eq!(collect(&list), vec![1, 2]);
        assert_eq!(alloc.outstanding(), 3);
    }
}

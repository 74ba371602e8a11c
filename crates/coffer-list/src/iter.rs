//! Iterators over a [`List`](crate::List).

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use coffer_core::RawAlloc;

use crate::list::List;
use crate::node::{Node, NodePtr};

/// Shared iterator, front to back.
pub struct Iter<'a, T> {
    head: NodePtr<T>,
    tail: NodePtr<T>,
    len: usize,
    _marker: PhantomData<&'a Node<T>>,
}

impl<T> Iter<'_, T> {
    /// # Safety
    ///
    /// `head..=tail` must be `len` live value nodes that outlive `'a`.
    pub(crate) unsafe fn new(head: NodePtr<T>, tail: NodePtr<T>, len: usize) -> Self {
        Self {
            head,
            tail,
            len,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.head;
        // SAFETY: `node` is one of the `len` live value nodes.
        unsafe {
            self.head = Node::next(node);
            Node::value(node)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.tail;
        // SAFETY: `node` is one of the `len` live value nodes.
        unsafe {
            self.tail = Node::prev(node);
            Node::value(node)
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Mutable iterator, front to back.
pub struct IterMut<'a, T> {
    head: NodePtr<T>,
    tail: NodePtr<T>,
    len: usize,
    _marker: PhantomData<&'a mut Node<T>>,
}

impl<T> IterMut<'_, T> {
    /// # Safety
    ///
    /// As for [`Iter::new`], and the nodes must be exclusively borrowed.
    pub(crate) unsafe fn new(head: NodePtr<T>, tail: NodePtr<T>, len: usize) -> Self {
        Self {
            head,
            tail,
            len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.head;
        // SAFETY: each node is yielded at most once, so the `&mut` is unique.
        unsafe {
            self.head = Node::next(node);
            Node::value_mut(node)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.tail;
        // SAFETY: each node is yielded at most once, so the `&mut` is unique.
        unsafe {
            self.tail = Node::prev(node);
            Node::value_mut(node)
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("len", &self.len).finish()
    }
}

/// Owning iterator; nodes are released as values are taken.
pub struct IntoIter<T, A: RawAlloc> {
    list: List<T, A>,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
    pub(crate) fn new(list: List<T, A>) -> Self {
        Self { list }
    }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: RawAlloc> FusedIterator for IntoIter<T, A> {}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.list).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::List;

    #[test]
    fn iter_both_ends_meet() {
        let list: List<_> = (0..5).collect();
        let mut it = list.iter();
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next_back(), Some(&4));
        assert_eq!(it.len(), 3);
        assert_eq!(it.collect::<Vec<_>>(), vec![&1, &2, &3]);
    }

    #[test]
    fn iter_mut_edits_in_place() {
        let mut list: List<_> = (0..4).collect();
        for v in list.iter_mut().rev() {
            *v *= 10;
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 10, 20, 30]);
    }

    #[test]
    fn into_iter_reverse() {
        let list: List<_> = (0..4).collect();
        assert_eq!(list.into_iter().rev().collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    }
}

//! Iterators over a [`Deque`].

use std::fmt;
use std::iter::FusedIterator;
use std::slice;

use coffer_arena::RawSlots;

use crate::deque::{Deque, BUCKET_SIZE};

/// Shared iterator, front to back. Created by [`Deque::iter`].
///
/// Positions are logical indices, so [`nth`](Iterator::nth) is O(1).
pub struct Iter<'a, T> {
    deque: &'a Deque<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(deque: &'a Deque<T>) -> Self {
        Self {
            deque,
            front: 0,
            back: deque.len(),
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
        if self.front == self.back {
            return None;
        }
        let item = self.deque.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.deque.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Mutable iterator, front to back. Created by [`Deque::iter_mut`].
///
/// Walks the live part of the first bucket, then each full middle bucket,
/// then the live part of the last bucket.
pub struct IterMut<'a, T> {
    front: slice::IterMut<'a, T>,
    middle: slice::IterMut<'a, RawSlots<T>>,
    back: slice::IterMut<'a, T>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn empty() -> Self {
        Self::from_parts(&mut [], &mut [], &mut [], 0)
    }

    /// Every bucket in `middle` must be full.
    pub(crate) fn from_parts(
        head: &'a mut [T],
        middle: &'a mut [RawSlots<T>],
        tail: &'a mut [T],
        remaining: usize,
    ) -> Self {
        Self {
            front: head.iter_mut(),
            middle: middle.iter_mut(),
            back: tail.iter_mut(),
            remaining,
        }
    }
}

fn full_bucket<T>(bucket: &mut RawSlots<T>) -> &mut [T] {
    // SAFETY: `from_parts` only receives full buckets in `middle`.
    unsafe { bucket.slice_mut(0..BUCKET_SIZE) }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        let item = loop {
            if let Some(item) = self.front.next() {
                break Some(item);
            }
            match self.middle.next() {
                Some(bucket) => self.front = full_bucket(bucket).iter_mut(),
                None => break self.back.next(),
            }
        };
        if item.is_some() {
            self.remaining -= 1;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        let item = loop {
            if let Some(item) = self.back.next_back() {
                break Some(item);
            }
            match self.middle.next_back() {
                Some(bucket) => self.back = full_bucket(bucket).iter_mut(),
                None => break self.front.next_back(),
            }
        };
        if item.is_some() {
            self.remaining -= 1;
        }
        item
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Owning iterator. Created by [`Deque::into_iter`](IntoIterator::into_iter).
pub struct IntoIter<T> {
    deque: Deque<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(deque: Deque<T>) -> Self {
        Self { deque }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len(), Some(self.deque.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

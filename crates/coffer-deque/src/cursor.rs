//! Random-access positions into a [`Deque`].

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use crate::deque::Deque;

/// A position in a deque, from the first element up to one past the last.
///
/// A cursor is a single logical index, so arithmetic, distance and
/// ordering are O(1) and unaffected by where the elements sit physically.
/// Cursors into different deques must not be compared or subtracted;
/// doing so panics.
pub struct Cursor<'a, T> {
    deque: &'a Deque<T>,
    index: usize,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(deque: &'a Deque<T>, index: usize) -> Self {
        Self { deque, index }
    }

    /// Logical index of this position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The element here, or `None` at the end position.
    pub fn get(&self) -> Option<&'a T> {
        self.deque.get(self.index)
    }

    /// Whether this is the one-past-the-end position.
    pub fn is_end(&self) -> bool {
        self.index == self.deque.len()
    }

    /// The position `delta` elements away.
    ///
    /// # Panics
    ///
    /// Panics if the result lies before the front or past the end.
    pub fn offset(self, delta: isize) -> Self {
        let index = self
            .index
            .checked_add_signed(delta)
            .filter(|&i| i <= self.deque.len())
            .unwrap_or_else(|| {
                panic!(
                    "cursor offset {delta} from {} leaves deque of length {}",
                    self.index,
                    self.deque.len()
                )
            });
        Self { index, ..self }
    }

    /// Signed number of steps from `self` to `other`.
    pub fn distance_to(&self, other: &Self) -> isize {
        self.assert_same_deque(other);
        other.index as isize - self.index as isize
    }

    /// Step forward. Returns `false` (and stays put) at the end position.
    pub fn move_next(&mut self) -> bool {
        if self.is_end() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step backward. Returns `false` (and stays put) at the front.
    pub fn move_prev(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn assert_same_deque(&self, other: &Self) {
        assert!(
            std::ptr::eq(self.deque, other.deque),
            "cursors belong to different deques"
        );
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> Add<isize> for Cursor<'_, T> {
    type Output = Self;

    fn add(self, rhs: isize) -> Self {
        self.offset(rhs)
    }
}

impl<T> Sub<isize> for Cursor<'_, T> {
    type Output = Self;

    fn sub(self, rhs: isize) -> Self {
        self.offset(-rhs)
    }
}

impl<'a, T> Sub for Cursor<'a, T> {
    type Output = isize;

    fn sub(self, rhs: Self) -> isize {
        rhs.distance_to(&self)
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.assert_same_deque(other);
        self.index == other.index
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> PartialOrd for Cursor<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Cursor<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.assert_same_deque(other);
        self.index.cmp(&other.index)
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("len", &self.deque.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_and_distance() {
        let d: Deque<_> = (0..20).collect();
        let begin = d.cursor_front();
        let end = d.cursor_end();
        assert_eq!(end - begin, 20);
        assert_eq!((begin + 9).get(), Some(&9));
        assert_eq!((end - 1).get(), Some(&19));
        assert!(end.is_end());
        assert_eq!(end.get(), None);
        assert!(begin < end);
    }

    #[test]
    fn stepping_crosses_buckets() {
        let mut d: Deque<_> = (0..10).collect();
        d.push_front(-1);
        let mut c = d.cursor_front();
        let mut seen = Vec::new();
        while let Some(v) = c.get() {
            seen.push(*v);
            c.move_next();
        }
        assert_eq!(seen, d.iter().copied().collect::<Vec<_>>());
        assert!(!c.move_next());
        while c.move_prev() {}
        assert_eq!(c.index(), 0);
    }

    #[test]
    #[should_panic(expected = "leaves deque")]
    fn offset_before_front_panics() {
        let d: Deque<u8> = (0..3).collect();
        let _ = d.cursor_front() - 1;
    }

    #[test]
    #[should_panic(expected = "different deques")]
    fn comparing_foreign_cursors_panics() {
        let a: Deque<u8> = Deque::new();
        let b: Deque<u8> = Deque::new();
        let _ = a.cursor_front() == b.cursor_front();
    }
}

//! The bucketed deque and its growth policy.

use std::convert::Infallible;
use std::fmt;
use std::ops::{Index, IndexMut};

use coffer_arena::{RawSlots, SlotRange};
use coffer_core::AccessError;

use crate::cursor::Cursor;
use crate::iter::{IntoIter, Iter, IterMut};

/// Number of element slots per bucket.
pub const BUCKET_SIZE: usize = 8;

/// Buckets allocated by an empty deque.
const INITIAL_BUCKETS: usize = 3;

/// A double-ended queue stored as an array of fixed-size buckets.
///
/// Slots are addressed by a flat index `bucket * BUCKET_SIZE + offset`.
/// The live elements occupy the contiguous flat range `live`; every slot
/// outside it is uninitialized.
///
/// When a push would step past either physical end of the indirection
/// array, the array is reallocated to three times the occupied-bucket
/// span: the occupied buckets move (by pointer) into the middle third and
/// the outer thirds are fresh empty buckets. Elements themselves are never
/// moved by growth.
pub struct Deque<T> {
    /// Indirection array. Every entry holds `BUCKET_SIZE` slots.
    buckets: Vec<RawSlots<T>>,
    /// Flat indices of the live slots.
    live: SlotRange,
}

const fn split(flat: usize) -> (usize, usize) {
    (flat / BUCKET_SIZE, flat % BUCKET_SIZE)
}

fn fresh_buckets<T>(count: usize) -> impl Iterator<Item = RawSlots<T>> {
    (0..count).map(|_| RawSlots::new(BUCKET_SIZE))
}

impl<T> Deque<T> {
    /// Create an empty deque.
    pub fn new() -> Self {
        Self::with_span(1)
    }

    /// Empty deque laid out for `n` elements: `3 * ceil(n / BUCKET_SIZE)`
    /// buckets with the elements destined for the middle third.
    fn with_layout(n: usize) -> Self {
        Self::with_span(n.div_ceil(BUCKET_SIZE).max(1))
    }

    fn with_span(span: usize) -> Self {
        let bucket_count = (span * 3).max(INITIAL_BUCKETS);
        Self {
            buckets: fresh_buckets(bucket_count).collect(),
            live: SlotRange::empty_at(span * BUCKET_SIZE),
        }
    }

    /// Build a deque of `n` elements produced by `f(index)`.
    ///
    /// If `f` fails (returns `Err` or panics) partway through, every element
    /// already produced is destroyed and all storage is released before
    /// the failure propagates.
    pub fn try_from_fn<E, F>(n: usize, mut f: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        let mut deque = Self::with_layout(n);
        let mut produced = 0;
        while produced < n {
            let (bucket, offset) = split(deque.live.end);
            let count = (BUCKET_SIZE - offset).min(n - produced);
            let base = produced;
            // A failure inside this bucket is rolled back by `try_fill`;
            // earlier buckets are covered by `live` and dropped with `deque`.
            deque.buckets[bucket].try_fill(offset, count, |i| f(base + i))?;
            deque.live.end += count;
            produced += count;
        }
        Ok(deque)
    }

    /// Build a deque of `n` clones of `value`.
    ///
    /// A panicking `clone` leaves nothing behind: already-cloned elements
    /// are destroyed and the buckets released during unwinding.
    pub fn from_elem(n: usize, value: T) -> Self
    where
        T: Clone,
    {
        match Self::try_from_fn(n, |_| Ok::<_, Infallible>(value.clone())) {
            Ok(deque) => deque,
            Err(never) => match never {},
        }
    }

    /// Build a deque of `n` default values.
    pub fn with_len(n: usize) -> Self
    where
        T: Default,
    {
        match Self::try_from_fn(n, |_| Ok::<_, Infallible>(T::default())) {
            Ok(deque) => deque,
            Err(never) => match never {},
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether the deque holds no elements.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of buckets in the indirection array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn slot_capacity(&self) -> usize {
        self.buckets.len() * BUCKET_SIZE
    }

    /// Shared reference to the element at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        let (bucket, offset) = split(self.live.start + index);
        // SAFETY: index < len, so the flat slot lies inside `live`.
        Some(unsafe { self.buckets[bucket].get(offset) })
    }

    /// Mutable reference to the element at `index`, or `None` if out of range.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        let (bucket, offset) = split(self.live.start + index);
        // SAFETY: index < len, so the flat slot lies inside `live`.
        Some(unsafe { self.buckets[bucket].get_mut(offset) })
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T, AccessError> {
        let len = self.len();
        self.get(index)
            .ok_or(AccessError::OutOfRange { index, len })
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, AccessError> {
        let len = self.len();
        self.get_mut(index)
            .ok_or(AccessError::OutOfRange { index, len })
    }

    /// The first element.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// The first element, mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// The last element.
    pub fn back(&self) -> Option<&T> {
        let last = self.len().checked_sub(1)?;
        self.get(last)
    }

    /// The last element, mutably.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.len().checked_sub(1)?;
        self.get_mut(last)
    }

    /// Append `value` at the back. Amortized O(1).
    pub fn push_back(&mut self, value: T) {
        if self.live.end == self.slot_capacity() {
            self.grow();
        }
        self.construct(self.live.end, value);
        self.live.end += 1;
    }

    /// Prepend `value` at the front. Amortized O(1).
    pub fn push_front(&mut self, value: T) {
        if self.live.start == 0 {
            self.grow();
        }
        self.construct(self.live.start - 1, value);
        self.live.start -= 1;
    }

    /// Remove and return the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.live.end -= 1;
        // SAFETY: the slot was the last live one and is now outside `live`.
        Some(unsafe { self.take(self.live.end) })
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let flat = self.live.start;
        self.live.start += 1;
        // SAFETY: the slot was the first live one and is now outside `live`.
        Some(unsafe { self.take(flat) })
    }

    /// Insert `value` so that it ends up at `index`.
    ///
    /// Elements between `index` and the nearer end shift by one slot, so
    /// this is O(min(index, len - index)). At either end this is a push.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.len();
        assert!(index <= len, "insert index {index} out of range for length {len}");

        if index == len {
            return self.push_back(value);
        }
        if index == 0 {
            return self.push_front(value);
        }

        if index < len - index {
            if self.live.start == 0 {
                self.grow();
            }
            let start = self.live.start;
            for flat in start..start + index {
                // SAFETY: `flat` is live, `flat - 1` is free (the slot before
                // `start`, or the one vacated by the previous iteration).
                unsafe { self.relocate(flat, flat - 1) };
            }
            self.live.start -= 1;
            self.construct(start - 1 + index, value);
        } else {
            if self.live.end == self.slot_capacity() {
                self.grow();
            }
            let at = self.live.start + index;
            for flat in (at..self.live.end).rev() {
                // SAFETY: `flat` is live, `flat + 1` is free (the slot after
                // `end`, or the one vacated by the previous iteration).
                unsafe { self.relocate(flat, flat + 1) };
            }
            self.live.end += 1;
            self.construct(at, value);
        }
    }

    /// Remove and return the element at `index`, or `None` if out of range.
    ///
    /// Elements between `index` and the nearer end shift by one slot to
    /// close the gap. At either end this is a pop.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let len = self.len();
        if index >= len {
            return None;
        }
        if index == 0 {
            return self.pop_front();
        }
        if index == len - 1 {
            return self.pop_back();
        }

        let at = self.live.start + index;
        // SAFETY: `at` is live; its slot is refilled below before `live` is
        // observed again.
        let value = unsafe { self.take(at) };
        if index < len - 1 - index {
            for flat in (self.live.start..at).rev() {
                // SAFETY: `flat` is live and `flat + 1` was just vacated.
                unsafe { self.relocate(flat, flat + 1) };
            }
            self.live.start += 1;
        } else {
            for flat in at + 1..self.live.end {
                // SAFETY: `flat` is live and `flat - 1` was just vacated.
                unsafe { self.relocate(flat, flat - 1) };
            }
            self.live.end -= 1;
        }
        Some(value)
    }

    /// Destroy every element. The bucket layout is kept.
    pub fn clear(&mut self) {
        let live = self.live;
        // Forget the elements first so a panicking destructor cannot lead
        // to a second drop.
        self.live = SlotRange::empty_at(live.start);

        let mut flat = live.start;
        while flat < live.end {
            let (bucket, offset) = split(flat);
            let run = (BUCKET_SIZE - offset).min(live.end - flat);
            // SAFETY: [offset, offset + run) of this bucket was inside `live`.
            unsafe {
                self.buckets[bucket].destroy_range(SlotRange::with_len(offset, run));
            }
            flat += run;
        }
    }

    /// Exchange the contents of two deques. O(1).
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Iterate over shared references, front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Iterate over mutable references, front to back.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let live = self.live;
        if live.is_empty() {
            return IterMut::empty();
        }
        let (first, first_off) = split(live.start);
        let (last, last_off) = split(live.end - 1);
        let len = live.len();

        // SAFETY (every arm): the ranges below are exactly the live slots of
        // each occupied bucket; buckets strictly between the first and last
        // are full.
        match &mut self.buckets[first..=last] {
            [] => IterMut::empty(),
            [only] => {
                let head = unsafe { only.slice_mut(first_off..last_off + 1) };
                IterMut::from_parts(head, &mut [], &mut [], len)
            }
            [head, middle @ .., tail] => {
                let head = unsafe { head.slice_mut(first_off..BUCKET_SIZE) };
                let tail = unsafe { tail.slice_mut(0..last_off + 1) };
                IterMut::from_parts(head, middle, tail, len)
            }
        }
    }

    /// A cursor at the first element.
    pub fn cursor_front(&self) -> Cursor<'_, T> {
        Cursor::new(self, 0)
    }

    /// A cursor one past the last element.
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.len())
    }

    /// A cursor at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn cursor_at(&self, index: usize) -> Cursor<'_, T> {
        assert!(index <= self.len(), "cursor index {index} out of range");
        Cursor::new(self, index)
    }

    fn construct(&mut self, flat: usize, value: T) {
        let (bucket, offset) = split(flat);
        self.buckets[bucket].construct_in_place(offset, value);
    }

    /// # Safety
    ///
    /// Slot `flat` must hold a value the caller is taking ownership of.
    unsafe fn take(&mut self, flat: usize) -> T {
        let (bucket, offset) = split(flat);
        // SAFETY: forwarded caller contract.
        unsafe { self.buckets[bucket].take(offset) }
    }

    /// Move the value in slot `from` into slot `to`.
    ///
    /// # Safety
    ///
    /// `from` must be initialized and `to` uninitialized.
    unsafe fn relocate(&mut self, from: usize, to: usize) {
        let (from_bucket, from_offset) = split(from);
        let (to_bucket, to_offset) = split(to);
        if from_bucket == to_bucket {
            // SAFETY: forwarded caller contract.
            unsafe { self.buckets[from_bucket].move_slot(from_offset, to_offset) };
        } else {
            // SAFETY: forwarded caller contract.
            let value = unsafe { self.take(from) };
            self.construct(to, value);
        }
    }

    /// Make room at whichever end is touching the physical boundary.
    fn grow(&mut self) {
        let len = self.len();
        let old_count = self.buckets.len();

        if self.live.is_empty() {
            // Nothing to move: recentre on the middle bucket.
            self.live = SlotRange::empty_at(old_count / 2 * BUCKET_SIZE);
            return;
        }

        let first = self.live.start / BUCKET_SIZE;
        let last = (self.live.end - 1) / BUCKET_SIZE;
        let span = last - first + 1;

        let mut buckets = Vec::with_capacity(span * 3);
        buckets.extend(fresh_buckets(span));
        buckets.extend(self.buckets.drain(first..=last));
        buckets.extend(fresh_buckets(span));

        // The buckets left in `self.buckets` hold no live slots.
        self.buckets = buckets;
        self.live = SlotRange::with_len(span * BUCKET_SIZE + self.live.start % BUCKET_SIZE, len);

        tracing::debug!(
            old_buckets = old_count,
            new_buckets = self.buckets.len(),
            len,
            "deque indirection array reallocated"
        );
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Deque<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone> Clone for Deque<T> {
    fn clone(&self) -> Self {
        match Self::try_from_fn(self.len(), |i| Ok::<_, Infallible>(self[i].clone())) {
            Ok(deque) => deque,
            Err(never) => match never {},
        }
    }
}

impl<T> Index<usize> for Deque<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len();
        self.get(index)
            .unwrap_or_else(|| panic!("index {index} out of range for deque of length {len}"))
    }
}

impl<T> IndexMut<usize> for Deque<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        self.get_mut(index)
            .unwrap_or_else(|| panic!("index {index} out of range for deque of length {len}"))
    }
}

impl<T: PartialEq> PartialEq for Deque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Deque<T> {}

impl<T: fmt::Debug> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T> IntoIterator for Deque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Deque<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

//! Low-level primitives for uninitialized typed storage.
//!
//! [`RawSlots`] is a fixed-capacity block of `MaybeUninit<T>` slots. It does
//! not know which slots are live: the owner tracks that (usually as a
//! [`SlotRange`]) and is responsible for destroying live slots before the
//! block is dropped. Dropping a `RawSlots` frees the memory and never runs
//! element destructors.

use std::fmt;
use std::mem::MaybeUninit;
use std::ops::Range;
use std::ptr;

/// A half-open range `[start, end)` of live slot indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SlotRange {
    /// First live index.
    pub start: usize,
    /// One past the last live index.
    pub end: usize,
}

impl SlotRange {
    /// An empty range positioned at `at`.
    pub const fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// The range `[start, start + len)`.
    pub const fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Number of live slots.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether no slot is live.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `index` lies inside the range.
    pub const fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// The range as a std [`Range`].
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A fixed-capacity block of uninitialized `T` slots.
pub struct RawSlots<T> {
    slots: Box<[MaybeUninit<T>]>,
}

impl<T> RawSlots<T> {
    /// Allocate a block of `capacity` uninitialized slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Box::new_uninit_slice(capacity),
        }
    }

    /// Number of slots in the block.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Move `value` into slot `index`, returning a reference to it.
    ///
    /// The slot is overwritten without dropping its previous content; if it
    /// was live, that value is leaked.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn construct_in_place(&mut self, index: usize, value: T) -> &mut T {
        self.slots[index].write(value)
    }

    /// Run the destructor of the value in slot `index`.
    ///
    /// # Safety
    ///
    /// Slot `index` must be live. It is free afterwards.
    pub unsafe fn destroy_in_place(&mut self, index: usize) {
        // SAFETY: caller guarantees the slot is initialized.
        unsafe { self.slots[index].assume_init_drop() }
    }

    /// Move the value out of slot `index`.
    ///
    /// # Safety
    ///
    /// Slot `index` must be live. It is free afterwards.
    pub unsafe fn take(&mut self, index: usize) -> T {
        // SAFETY: caller guarantees the slot is initialized; the bitwise copy
        // becomes the only owner because the slot is now considered free.
        unsafe { self.slots[index].assume_init_read() }
    }

    /// Move the value in slot `from` into slot `to`.
    ///
    /// # Safety
    ///
    /// Slot `from` must be live and slot `to` free. Afterwards `from` is
    /// free and `to` is live.
    pub unsafe fn move_slot(&mut self, from: usize, to: usize) {
        // SAFETY: caller guarantees `from` is initialized; it is treated as
        // free from here on, so the value has exactly one owner.
        let value = unsafe { self.slots[from].assume_init_read() };
        self.slots[to].write(value);
    }

    /// Shared reference to the value in slot `index`.
    ///
    /// # Safety
    ///
    /// Slot `index` must be live.
    pub unsafe fn get(&self, index: usize) -> &T {
        // SAFETY: caller guarantees the slot is initialized.
        unsafe { self.slots[index].assume_init_ref() }
    }

    /// Mutable reference to the value in slot `index`.
    ///
    /// # Safety
    ///
    /// Slot `index` must be live.
    pub unsafe fn get_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: caller guarantees the slot is initialized.
        unsafe { self.slots[index].assume_init_mut() }
    }

    /// The values in `range` as a shared slice.
    ///
    /// # Safety
    ///
    /// Every slot in `range` must be live.
    pub unsafe fn slice(&self, range: Range<usize>) -> &[T] {
        let uninit = &self.slots[range];
        // SAFETY: MaybeUninit<T> has the layout of T and the caller guarantees
        // every slot in the range is initialized.
        unsafe { &*(uninit as *const [MaybeUninit<T>] as *const [T]) }
    }

    /// The values in `range` as a mutable slice.
    ///
    /// # Safety
    ///
    /// Every slot in `range` must be live.
    pub unsafe fn slice_mut(&mut self, range: Range<usize>) -> &mut [T] {
        let uninit = &mut self.slots[range];
        // SAFETY: as in `slice`, plus exclusivity from `&mut self`.
        unsafe { &mut *(uninit as *mut [MaybeUninit<T>] as *mut [T]) }
    }

    /// Destroy every slot in `range`.
    ///
    /// If a destructor panics, the remaining slots in the range are still
    /// destroyed before the panic resumes.
    ///
    /// # Safety
    ///
    /// Every slot in `range` must be live. All of them are free afterwards.
    pub unsafe fn destroy_range(&mut self, range: SlotRange) {
        // SAFETY: caller guarantees the range is live. Slice drop glue keeps
        // dropping the remaining elements if one destructor panics.
        unsafe { ptr::drop_in_place(self.slice_mut(range.as_range())) }
    }

    /// Construct `count` values starting at slot `start`, calling `f` with
    /// the offset of each value within the run.
    ///
    /// On success the returned range is live. If `f` returns an error or
    /// panics, every value already constructed by this call is destroyed
    /// and the block is left exactly as it was.
    ///
    /// # Panics
    ///
    /// Panics if `start + count > capacity`.
    pub fn try_fill<E, F>(&mut self, start: usize, count: usize, mut f: F) -> Result<SlotRange, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        assert!(
            start + count <= self.capacity(),
            "fill of {count} slots at {start} exceeds block capacity {}",
            self.capacity()
        );
        let mut guard = FillGuard {
            slots: self,
            live: SlotRange::empty_at(start),
        };
        for offset in 0..count {
            let value = f(offset)?;
            let end = guard.live.end;
            guard.slots.construct_in_place(end, value);
            guard.live.end += 1;
        }
        Ok(guard.disarm())
    }
}

impl<T> fmt::Debug for RawSlots<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSlots")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Tracks slots constructed by an in-progress bulk fill.
///
/// Dropping an armed guard destroys exactly the slots it recorded.
struct FillGuard<'a, T> {
    slots: &'a mut RawSlots<T>,
    live: SlotRange,
}

impl<T> FillGuard<'_, T> {
    fn disarm(self) -> SlotRange {
        let live = self.live;
        std::mem::forget(self);
        live
    }
}

impl<T> Drop for FillGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `live` covers exactly the slots this fill constructed.
        unsafe { self.slots.destroy_range(self.live) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn slot_range_bookkeeping() {
        let r = SlotRange::with_len(3, 4);
        assert_eq!(r.len(), 4);
        assert!(r.contains(3));
        assert!(r.contains(6));
        assert!(!r.contains(7));
        assert!(SlotRange::empty_at(5).is_empty());
        assert_eq!(r.as_range(), 3..7);
    }

    #[test]
    fn construct_get_take() {
        let mut slots = RawSlots::new(4);
        slots.construct_in_place(2, String::from("x"));
        unsafe {
            assert_eq!(slots.get(2), "x");
            slots.get_mut(2).push('y');
            assert_eq!(slots.take(2), "xy");
        }
    }

    #[test]
    fn move_slot_transfers_ownership() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = RawSlots::new(4);
        slots.construct_in_place(0, Counted(drops.clone()));
        unsafe {
            slots.move_slot(0, 3);
            slots.destroy_in_place(3);
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn destroy_runs_destructor_once() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = RawSlots::new(2);
        slots.construct_in_place(0, Counted(drops.clone()));
        unsafe { slots.destroy_in_place(0) };
        assert_eq!(drops.get(), 1);
        drop(slots);
        assert_eq!(drops.get(), 1, "dropping the block never runs destructors");
    }

    #[test]
    fn destroy_range_covers_all() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = RawSlots::new(8);
        for i in 2..6 {
            slots.construct_in_place(i, Counted(drops.clone()));
        }
        unsafe { slots.destroy_range(SlotRange { start: 2, end: 6 }) };
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn destroy_range_survives_panicking_destructor() {
        struct Grenade(Rc<Cell<usize>>, bool);
        impl Drop for Grenade {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
                assert!(!self.1, "destructor failure");
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut slots = RawSlots::new(4);
        for i in 0..4 {
            slots.construct_in_place(i, Grenade(drops.clone(), i == 1));
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| unsafe {
            slots.destroy_range(SlotRange::with_len(0, 4));
        }));
        assert!(outcome.is_err());
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn try_fill_success() {
        let mut slots = RawSlots::new(8);
        let live = slots
            .try_fill(1, 3, |i| Ok::<_, ()>(i * 10))
            .unwrap();
        assert_eq!(live, SlotRange { start: 1, end: 4 });
        unsafe {
            assert_eq!(*slots.get(1), 0);
            assert_eq!(*slots.get(3), 20);
        }
    }

    #[test]
    fn try_fill_error_rolls_back() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = RawSlots::new(8);
        let result = slots.try_fill(0, 5, |i| {
            if i == 3 {
                Err("boom")
            } else {
                Ok(Counted(drops.clone()))
            }
        });
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(drops.get(), 3, "the three constructed values were destroyed");
    }

    #[test]
    fn try_fill_panic_rolls_back() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = RawSlots::new(8);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = slots.try_fill(0, 5, |i| {
                assert!(i != 2, "constructor failure");
                Ok::<_, ()>(Counted(drops.clone()))
            });
        }));
        assert!(outcome.is_err());
        assert_eq!(drops.get(), 2);
    }
}

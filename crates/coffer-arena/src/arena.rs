//! Fixed-capacity byte arena with a bump cursor.
//!
//! An [`Arena`] owns one contiguous buffer allocated up front. Requests are
//! carved from the front by advancing a cursor; the only way to get bytes
//! back is to release the most recent allocation (the cursor rewinds) or
//! to [`reset`](Arena::reset) the whole arena.

use std::alloc::{self as sys, Layout};
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use coffer_core::AllocError;

use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// A single contiguous byte buffer with bump allocation.
///
/// The arena is shared by reference: allocator views
/// ([`ArenaAlloc`](crate::ArenaAlloc)) borrow it, so the borrow checker
/// guarantees it outlives every container that allocates from it. The
/// cursor lives in a [`Cell`] so that many views can allocate through a
/// shared `&Arena`.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe and is neither `Send` nor `Sync`.
pub struct Arena {
    /// Base of the backing buffer, aligned to `layout.align()`.
    base: NonNull<u8>,
    /// Layout of the backing buffer (capacity + max alignment).
    layout: Layout,
    /// Bump pointer: offset of the next free byte.
    cursor: Cell<usize>,
    /// Number of successful allocations since creation or the last reset.
    allocations: Cell<usize>,
}

impl Arena {
    /// Create an arena from a validated config.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        let layout = config.validate()?;
        // SAFETY: validate() rejects zero capacity, so the layout is non-zero-sized.
        let raw = unsafe { sys::alloc(layout) };
        let Some(base) = NonNull::new(raw) else {
            sys::handle_alloc_error(layout);
        };
        Ok(Self {
            base,
            layout,
            cursor: Cell::new(0),
            allocations: Cell::new(0),
        })
    }

    /// Create an arena of `capacity` bytes with the default alignment.
    pub fn with_capacity(capacity: usize) -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::new(capacity))
    }

    /// Bump-allocate storage for `layout`.
    ///
    /// Padding is inserted before the allocation so that the returned
    /// pointer satisfies `layout.align()`. On failure the cursor is left
    /// exactly where it was.
    pub fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.align() > self.max_align() {
            return Err(AllocError::UnsupportedAlignment {
                align: layout.align(),
                max_align: self.max_align(),
            });
        }

        let cursor = self.cursor.get();
        // The base is max-aligned, so aligning the offset aligns the address.
        let padding = cursor.wrapping_neg() & (layout.align() - 1);
        let start = cursor
            .checked_add(padding)
            .ok_or(AllocError::CapacityOverflow)?;
        let end = start
            .checked_add(layout.size())
            .ok_or(AllocError::CapacityOverflow)?;

        if end > self.capacity() {
            let err = AllocError::Exhausted {
                requested: padding + layout.size(),
                remaining: self.remaining(),
            };
            tracing::warn!(capacity = self.capacity(), used = cursor, "{err}");
            return Err(err);
        }

        self.cursor.set(end);
        self.allocations.set(self.allocations.get() + 1);
        // SAFETY: start <= end <= capacity, so the offset stays within (or one
        // past the end of) the buffer, and the buffer base is non-null.
        Ok(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(start)) })
    }

    /// Release `size` bytes at `ptr`.
    ///
    /// Only the most recent allocation can be reclaimed: if `ptr + size`
    /// equals the cursor, the cursor rewinds to `ptr` and this returns
    /// `true`. Every other release is a no-op returning `false`.
    ///
    /// A rewind hands `ptr..ptr + size` to the next allocation, so the
    /// caller must be done with those bytes:
    ///
    /// ```compile_fail,E0133
    /// # use std::alloc::Layout;
    /// # use coffer_arena::Arena;
    /// let arena = Arena::with_capacity(64).unwrap();
    /// let p = arena.allocate(Layout::new::<u64>()).unwrap();
    /// arena.release(p, 8);
    /// ```
    ///
    /// # Safety
    ///
    /// If the release rewinds, every byte in `ptr..ptr + size` must belong
    /// to allocations from this arena that the caller owns and will not
    /// touch again. Releasing storage still held by a container (or by
    /// anyone else) lets the arena hand it out twice.
    pub unsafe fn release(&self, ptr: NonNull<u8>, size: usize) -> bool {
        let Some(offset) = self.offset_of(ptr) else {
            return false;
        };
        if offset.checked_add(size) != Some(self.cursor.get()) {
            return false;
        }
        tracing::trace!(from = self.cursor.get(), to = offset, "arena cursor rewound");
        self.cursor.set(offset);
        true
    }

    /// Whether `ptr` points into (or one past the end of) this arena.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.offset_of(ptr).is_some()
    }

    /// Reset the cursor to zero.
    ///
    /// Taking `&mut self` proves no allocator view is still borrowing the
    /// arena, so no container can observe the reclaimed storage.
    pub fn reset(&mut self) {
        self.cursor.set(0);
        self.allocations.set(0);
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Largest alignment a single allocation may request.
    pub fn max_align(&self) -> usize {
        self.layout.align()
    }

    /// Bytes consumed so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Bytes still available after the cursor.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor.get()
    }

    /// Successful allocations since creation or the last reset.
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.base.as_ptr() as usize)?;
        (offset <= self.capacity()).then_some(offset)
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: base was allocated in `new` with exactly this layout.
        unsafe { sys::dealloc(self.base.as_ptr(), self.layout) }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("max_align", &self.max_align())
            .field("used", &self.used())
            .field("allocations", &self.allocation_count())
            .finish()
    }
}

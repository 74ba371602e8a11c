//! Typed allocator views over an [`Arena`].

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use coffer_core::{AllocError, RawAlloc};

use crate::arena::Arena;

/// A copyable allocator handle bound to an [`Arena`] and an element type.
///
/// The element type only fixes the unit of [`allocate`](Self::allocate);
/// the [`RawAlloc`] impl serves any layout, so a container handed an
/// `ArenaAlloc<'a, T>` can place its node types in the same arena without
/// rebinding. Explicit [`rebind`](Self::rebind) is still available and
/// keeps the arena reference.
///
/// Two views compare equal iff they reference the same arena, regardless
/// of element type.
pub struct ArenaAlloc<'a, T> {
    arena: &'a Arena,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ArenaAlloc<'a, T> {
    /// Create a view over `arena`.
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            _marker: PhantomData,
        }
    }

    /// The arena this view allocates from.
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// The same arena viewed as an allocator of `U`.
    pub fn rebind<U>(&self) -> ArenaAlloc<'a, U> {
        ArenaAlloc::new(self.arena)
    }

    /// Allocate `n` contiguous, aligned, uninitialized `T` slots.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        RawAlloc::allocate_array::<T>(self, n)
    }

    /// Release `n` slots at `ptr`.
    ///
    /// Only rewinds the arena if this was the most recent allocation.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`allocate`](Self::allocate) on a view of the
    /// same arena with the same `n`.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { RawAlloc::deallocate_array(self, ptr, n) }
    }
}

impl<T> Clone for ArenaAlloc<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaAlloc<'_, T> {}

impl<'a, T, U> PartialEq<ArenaAlloc<'a, U>> for ArenaAlloc<'a, T> {
    fn eq(&self, other: &ArenaAlloc<'a, U>) -> bool {
        ptr::eq(self.arena, other.arena)
    }
}

impl<T> Eq for ArenaAlloc<'_, T> {}

impl<T> fmt::Debug for ArenaAlloc<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAlloc")
            .field("element", &std::any::type_name::<T>())
            .field("arena", &(self.arena as *const Arena))
            .finish()
    }
}

impl<T> RawAlloc for ArenaAlloc<'_, T> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.arena.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller hands back an allocation it owns and is done
        // with; `deallocate` never touches the bytes again.
        unsafe { self.arena.release(ptr, layout.size()) };
    }

    fn same_source(&self, other: &Self) -> bool {
        self == other
    }
}

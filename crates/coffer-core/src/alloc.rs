//! The allocation seam shared by every container.
//!
//! [`RawAlloc`] is a byte-level allocator: it hands out storage for a
//! [`Layout`] and takes it back. Containers never need a second allocator
//! type for their internal node or block types; the provided typed helpers
//! ([`RawAlloc::allocate_one`], [`RawAlloc::allocate_array`]) derive the
//! layout from the type at the call site.

use std::alloc::{self as sys, Layout};
use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// A byte-level allocator that containers allocate their storage through.
///
/// Implementations are cheap handles (a unit struct, or a reference to a
/// shared arena). Cloning a handle must yield one that can release storage
/// obtained through the original, i.e. `a.same_source(&a.clone())`.
///
/// The associated consts express the propagation policy containers apply
/// on assignment:
///
/// - [`PROPAGATE_ON_COPY_ASSIGN`](Self::PROPAGATE_ON_COPY_ASSIGN): on
///   `clone_from`, adopt the source container's allocator.
/// - [`PROPAGATE_ON_MOVE_ASSIGN`](Self::PROPAGATE_ON_MOVE_ASSIGN): on a
///   move-assignment, adopt the moved-from container's allocator (and
///   with it, its storage).
pub trait RawAlloc: Clone {
    /// Whether copy-assignment hands the source allocator to the target.
    const PROPAGATE_ON_COPY_ASSIGN: bool = false;

    /// Whether move-assignment hands the source allocator to the target.
    const PROPAGATE_ON_MOVE_ASSIGN: bool = true;

    /// Allocate uninitialized storage for `layout`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Return storage previously obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this handle, or on a
    /// handle for which [`same_source`](Self::same_source) holds, with the
    /// same `layout`, and must not have been deallocated since.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether storage from `other` may be released through `self`.
    fn same_source(&self, other: &Self) -> bool;

    /// The allocator a copy-constructed container should use.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }

    /// Allocate storage for a single `U`.
    fn allocate_one<U>(&self) -> Result<NonNull<U>, AllocError> {
        self.allocate(Layout::new::<U>()).map(NonNull::cast)
    }

    /// Release storage for a single `U`.
    ///
    /// # Safety
    ///
    /// Same contract as [`deallocate`](Self::deallocate), with the layout of `U`.
    unsafe fn deallocate_one<U>(&self, ptr: NonNull<U>) {
        // SAFETY: forwarded caller contract.
        unsafe { self.deallocate(ptr.cast(), Layout::new::<U>()) }
    }

    /// Allocate storage for `n` contiguous `U`s.
    fn allocate_array<U>(&self, n: usize) -> Result<NonNull<U>, AllocError> {
        let layout = Layout::array::<U>(n).map_err(|_| AllocError::CapacityOverflow)?;
        self.allocate(layout).map(NonNull::cast)
    }

    /// Release storage for `n` contiguous `U`s.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`allocate_array`](Self::allocate_array) with the
    /// same `n`, under the [`deallocate`](Self::deallocate) contract.
    unsafe fn deallocate_array<U>(&self, ptr: NonNull<U>, n: usize) {
        // allocate_array already proved this layout valid.
        if let Ok(layout) = Layout::array::<U>(n) {
            // SAFETY: forwarded caller contract.
            unsafe { self.deallocate(ptr.cast(), layout) }
        }
    }
}

/// Report an allocation failure from an infallible entry point.
///
/// Containers call this when a non-`try_*` operation could not obtain
/// storage: the failure is logged at `error` level and then raised as a
/// panic carrying the error's message.
#[cold]
#[track_caller]
pub fn handle_alloc_error(err: AllocError) -> ! {
    tracing::error!(error = %err, "fatal allocation failure");
    panic!("{err}")
}

/// The process allocator.
///
/// Zero-sized requests are answered with a dangling, well-aligned pointer
/// and never reach the system allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

impl RawAlloc for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return NonNull::new(ptr::without_provenance_mut(layout.align()))
                .ok_or(AllocError::Refused { size: 0 });
        }
        // SAFETY: layout has non-zero size.
        let raw = unsafe { sys::alloc(layout) };
        NonNull::new(raw).ok_or(AllocError::Refused {
            size: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: caller guarantees ptr came from `allocate` with this layout,
        // and non-zero sizes went through `sys::alloc`.
        unsafe { sys::dealloc(ptr.as_ptr(), layout) }
    }

    fn same_source(&self, _other: &Self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trip() {
        let alloc = Global;
        let p = alloc.allocate_one::<u64>().unwrap();
        unsafe {
            p.as_ptr().write(0xdead_beef);
            assert_eq!(p.as_ptr().read(), 0xdead_beef);
            alloc.deallocate_one(p);
        }
    }

    #[test]
    fn global_array_is_aligned() {
        let alloc = Global;
        let p = alloc.allocate_array::<u128>(4).unwrap();
        assert_eq!(p.as_ptr() as usize % std::mem::align_of::<u128>(), 0);
        unsafe { alloc.deallocate_array(p, 4) };
    }

    #[test]
    fn zero_sized_request_is_dangling_and_aligned() {
        let alloc = Global;
        let p = alloc.allocate_array::<u32>(0).unwrap();
        assert_eq!(p.as_ptr() as usize % std::mem::align_of::<u32>(), 0);
        unsafe { alloc.deallocate_array(p, 0) };
    }

    #[test]
    fn array_overflow_is_reported() {
        let alloc = Global;
        let err = alloc.allocate_array::<u64>(usize::MAX).unwrap_err();
        assert_eq!(err, AllocError::CapacityOverflow);
    }

    #[test]
    #[should_panic(expected = "allocator refused a request of 12 bytes")]
    fn fatal_failure_panics_with_message() {
        handle_alloc_error(AllocError::Refused { size: 12 });
    }

    #[test]
    fn default_policy_matches_standard_containers() {
        assert!(!Global::PROPAGATE_ON_COPY_ASSIGN);
        assert!(Global::PROPAGATE_ON_MOVE_ASSIGN);
        assert!(Global.same_source(&Global.select_on_copy()));
    }
}

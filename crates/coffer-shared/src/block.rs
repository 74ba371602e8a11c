//! Control blocks.
//!
//! Every block starts with a [`Header`] (`#[repr(C)]`, so a pointer to the
//! block is a pointer to its header). Handles only ever hold a
//! `NonNull<Header>` and go through the header's [`BlockOps`] table for
//! anything that depends on the concrete block type.

use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

use coffer_core::{AllocError, RawAlloc};

use crate::counter::{Counter, StrongRelease};
use crate::deleter::Deleter;

/// Type-specific operations of a control block.
pub(crate) struct BlockOps {
    /// Destroy the managed object. Runs once, when the strong count hits 0.
    delete_object: unsafe fn(NonNull<Header>),
    /// Release the block's own storage. Runs once, when the weak count hits 0.
    deallocate: unsafe fn(NonNull<Header>),
}

#[repr(C)]
pub(crate) struct Header {
    pub(crate) counter: Counter,
    ops: &'static BlockOps,
}

/// Block for an object allocated elsewhere and disposed of by `D`.
#[repr(C)]
struct PointerBlock<T, D, A> {
    header: Header,
    object: NonNull<T>,
    deleter: ManuallyDrop<D>,
    alloc: ManuallyDrop<A>,
}

/// Block that embeds the object itself.
#[repr(C)]
struct ValueBlock<T, A> {
    header: Header,
    value: ManuallyDrop<T>,
    alloc: ManuallyDrop<A>,
}

impl<T, D: Deleter<T>, A: RawAlloc> PointerBlock<T, D, A> {
    const OPS: BlockOps = BlockOps {
        delete_object: Self::delete_object,
        deallocate: Self::deallocate,
    };

    /// # Safety
    ///
    /// `header` heads a live `PointerBlock<T, D, A>` whose object has not
    /// been deleted yet.
    unsafe fn delete_object(header: NonNull<Header>) {
        let block = header.cast::<Self>().as_ptr();
        // SAFETY: caller contract; the deleter is taken exactly once.
        unsafe {
            let deleter = ManuallyDrop::take(&mut (*block).deleter);
            deleter.delete((*block).object);
        }
    }

    /// # Safety
    ///
    /// `header` heads a `PointerBlock<T, D, A>` whose object was deleted and
    /// whose weak count reached zero.
    unsafe fn deallocate(header: NonNull<Header>) {
        let block = header.cast::<Self>();
        // SAFETY: caller contract; the allocator is moved out before the
        // storage it describes is returned to it.
        unsafe {
            let alloc = ManuallyDrop::take(&mut (*block.as_ptr()).alloc);
            alloc.deallocate_one(block);
        }
    }
}

impl<T, A: RawAlloc> ValueBlock<T, A> {
    const OPS: BlockOps = BlockOps {
        delete_object: Self::delete_object,
        deallocate: Self::deallocate,
    };

    /// # Safety
    ///
    /// As for [`PointerBlock::delete_object`].
    unsafe fn delete_object(header: NonNull<Header>) {
        let block = header.cast::<Self>().as_ptr();
        // SAFETY: caller contract; the value is dropped exactly once.
        unsafe { ManuallyDrop::drop(&mut (*block).value) }
    }

    /// # Safety
    ///
    /// As for [`PointerBlock::deallocate`].
    unsafe fn deallocate(header: NonNull<Header>) {
        let block = header.cast::<Self>();
        // SAFETY: caller contract.
        unsafe {
            let alloc = ManuallyDrop::take(&mut (*block.as_ptr()).alloc);
            alloc.deallocate_one(block);
        }
    }
}

/// Place `object` under a new pointer-owning block from `alloc`.
///
/// If the block cannot be allocated the deleter runs on `object` before
/// the error is returned, so ownership is never lost.
///
/// # Safety
///
/// `deleter` must be able to dispose of `object`.
pub(crate) unsafe fn new_pointer_block<T, D, A>(
    object: NonNull<T>,
    deleter: D,
    alloc: A,
) -> Result<NonNull<Header>, AllocError>
where
    D: Deleter<T>,
    A: RawAlloc,
{
    let block = match alloc.allocate_one::<PointerBlock<T, D, A>>() {
        Ok(block) => block,
        Err(err) => {
            // SAFETY: caller contract; the object was never shared.
            unsafe { deleter.delete(object) };
            return Err(err);
        }
    };
    // SAFETY: fresh storage sized and aligned for the block.
    unsafe {
        block.as_ptr().write(PointerBlock {
            header: Header {
                counter: Counter::new(),
                ops: &PointerBlock::<T, D, A>::OPS,
            },
            object,
            deleter: ManuallyDrop::new(deleter),
            alloc: ManuallyDrop::new(alloc),
        });
    }
    Ok(block.cast())
}

/// Move `value` into a new value-owning block from `alloc`.
///
/// Returns the header and a pointer to the embedded value.
pub(crate) fn new_value_block<T, A: RawAlloc>(
    value: T,
    alloc: A,
) -> Result<(NonNull<Header>, NonNull<T>), AllocError> {
    let block = alloc.allocate_one::<ValueBlock<T, A>>()?;
    // SAFETY: fresh storage sized and aligned for the block; the value
    // pointer is derived from the block pointer after the write.
    unsafe {
        block.as_ptr().write(ValueBlock {
            header: Header {
                counter: Counter::new(),
                ops: &ValueBlock::<T, A>::OPS,
            },
            value: ManuallyDrop::new(value),
            alloc: ManuallyDrop::new(alloc),
        });
        let value = ptr::addr_of_mut!((*block.as_ptr()).value).cast::<T>();
        Ok((block.cast(), NonNull::new_unchecked(value)))
    }
}

/// Give up one strong reference to `header`'s block.
///
/// # Safety
///
/// The caller must own a strong reference to a live block.
pub(crate) unsafe fn release_strong(header: NonNull<Header>) {
    // SAFETY: the block is live while the caller's reference is counted.
    let (counter, ops) = unsafe {
        let h = header.as_ref();
        (&h.counter, h.ops)
    };
    if counter.release_strong() == StrongRelease::LastOwner {
        // Released after the deletion, even if the deleter panics.
        let _implicit = ImplicitWeak(header);
        // SAFETY: this was the last strong owner; the implicit weak
        // reference keeps the block alive through the deletion.
        unsafe { (ops.delete_object)(header) };
    }
}

/// The weak reference held on behalf of all strong owners.
struct ImplicitWeak(NonNull<Header>);

impl Drop for ImplicitWeak {
    fn drop(&mut self) {
        // SAFETY: created only once the strong count reached zero, which
        // hands the implicit weak reference to this guard.
        unsafe { release_weak(self.0) };
    }
}

/// Give up one weak reference to `header`'s block.
///
/// # Safety
///
/// The caller must own a weak reference (or the implicit one) to a live
/// block.
pub(crate) unsafe fn release_weak(header: NonNull<Header>) {
    // SAFETY: the block is live while the caller's reference is counted.
    let (last, ops) = unsafe {
        let h = header.as_ref();
        (h.counter.release_weak(), h.ops)
    };
    if last {
        tracing::trace!(block = ?header, "control block released");
        // SAFETY: no references remain and the object is already gone.
        unsafe { (ops.deallocate)(header) };
    }
}

/// The block's counters.
///
/// # Safety
///
/// `header` must be a live block and the result must not outlive it.
pub(crate) unsafe fn counter<'a>(header: NonNull<Header>) -> &'a Counter {
    // SAFETY: caller contract.
    unsafe { &(*header.as_ptr()).counter }
}

//! The owning handle.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

use coffer_core::{handle_alloc_error, AllocError, Global, RawAlloc};

use crate::block::{self, Header};
use crate::deleter::{DefaultDelete, Deleter};
use crate::weak::WeakPtr;

/// Block plus the object it manages.
pub(crate) struct Inner<T> {
    pub(crate) block: NonNull<Header>,
    pub(crate) object: NonNull<T>,
}

impl<T> Clone for Inner<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Inner<T> {}

/// A reference-counted owning pointer.
///
/// Every clone shares one control block. The object is destroyed when the
/// last `SharedPtr` goes away, even if [`WeakPtr`]s remain.
///
/// A `SharedPtr` may be empty (see [`SharedPtr::empty`]); dereferencing an
/// empty pointer panics, [`get`](SharedPtr::get) returns `None`.
pub struct SharedPtr<T> {
    inner: Option<Inner<T>>,
    _owns: PhantomData<T>,
}

impl<T> SharedPtr<T> {
    /// Move `value` into a new block from the global allocator.
    pub fn new(value: T) -> Self {
        Self::allocate_in(value, Global)
    }

    /// Move `value` into a new block from `alloc`.
    ///
    /// Object and counters share one allocation. The allocator is erased
    /// from the handle's type and so must be `'static`.
    pub fn allocate_in<A: RawAlloc + 'static>(value: T, alloc: A) -> Self {
        Self::try_allocate_in(value, alloc).unwrap_or_else(|err| handle_alloc_error(err))
    }

    /// Fallible [`allocate_in`](Self::allocate_in). On failure `value` is
    /// dropped.
    pub fn try_allocate_in<A>(value: T, alloc: A) -> Result<Self, AllocError>
    where
        A: RawAlloc + 'static,
    {
        let (block, object) = block::new_value_block(value, alloc)?;
        Ok(Self::from_inner(Inner { block, object }))
    }

    /// Take ownership of a boxed object.
    pub fn from_box(boxed: Box<T>) -> Self {
        let object = NonNull::from(Box::leak(boxed));
        // SAFETY: `DefaultDelete` reclaims exactly what `Box::leak` gave up.
        unsafe { Self::from_raw_in(object, DefaultDelete, Global) }
    }

    /// Take ownership of `object`, to be disposed of by `deleter`. The
    /// control block comes from `alloc`.
    ///
    /// If the block cannot be allocated, `deleter` runs on `object` before
    /// the failure is reported.
    ///
    /// # Safety
    ///
    /// `object` must stay valid until `deleter` is called on it, and
    /// nothing else may free it.
    pub unsafe fn from_raw_in<D, A>(object: NonNull<T>, deleter: D, alloc: A) -> Self
    where
        D: Deleter<T> + 'static,
        A: RawAlloc + 'static,
    {
        // SAFETY: forwarded caller contract.
        let shared = unsafe { Self::try_from_raw_in(object, deleter, alloc) };
        shared.unwrap_or_else(|err| handle_alloc_error(err))
    }

    /// Fallible [`from_raw_in`](Self::from_raw_in). The deleter has already
    /// run when this returns an error.
    ///
    /// # Safety
    ///
    /// As for [`from_raw_in`](Self::from_raw_in).
    pub unsafe fn try_from_raw_in<D, A>(
        object: NonNull<T>,
        deleter: D,
        alloc: A,
    ) -> Result<Self, AllocError>
    where
        D: Deleter<T> + 'static,
        A: RawAlloc + 'static,
    {
        // SAFETY: forwarded caller contract.
        let block = unsafe { block::new_pointer_block(object, deleter, alloc)? };
        Ok(Self::from_inner(Inner { block, object }))
    }

    /// A pointer that owns nothing.
    pub const fn empty() -> Self {
        Self {
            inner: None,
            _owns: PhantomData,
        }
    }

    /// Wrap a block whose strong count already accounts for this handle.
    pub(crate) fn from_inner(inner: Inner<T>) -> Self {
        Self {
            inner: Some(inner),
            _owns: PhantomData,
        }
    }

    pub(crate) fn inner(&self) -> Option<Inner<T>> {
        self.inner
    }

    /// Number of `SharedPtr`s sharing this object; 0 when empty.
    pub fn use_count(&self) -> usize {
        self.inner
            // SAFETY: a non-empty handle keeps its block alive.
            .map_or(0, |inner| unsafe { block::counter(inner.block) }.strong())
    }

    /// Number of [`WeakPtr`]s observing this object.
    pub fn weak_count(&self) -> usize {
        self.inner.map_or(0, |inner| {
            // SAFETY: a non-empty handle keeps its block alive.
            let counter = unsafe { block::counter(inner.block) };
            // One weak reference is held for all strong owners together.
            counter.weak() - 1
        })
    }

    /// The object, or `None` when empty.
    pub fn get(&self) -> Option<&T> {
        // SAFETY: the object lives while this handle holds a strong count.
        self.inner.map(|inner| unsafe { inner.object.as_ref() })
    }

    /// Whether this handle owns nothing.
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Give up ownership, leaving this handle empty.
    pub fn reset(&mut self) {
        if let Some(inner) = self.inner.take() {
            // SAFETY: this handle owned one strong count.
            unsafe { block::release_strong(inner.block) };
        }
    }

    /// Give up the current object and take ownership of `object` instead,
    /// as [`from_raw_in`](Self::from_raw_in) would.
    ///
    /// The new block is allocated before the old ownership is released; if
    /// that fails, `deleter` runs on `object` and the panic leaves `self`
    /// untouched.
    ///
    /// # Safety
    ///
    /// As for [`from_raw_in`](Self::from_raw_in).
    pub unsafe fn reset_in<D, A>(&mut self, object: NonNull<T>, deleter: D, alloc: A)
    where
        D: Deleter<T> + 'static,
        A: RawAlloc + 'static,
    {
        // SAFETY: forwarded caller contract.
        let replaced = unsafe { self.try_reset_in(object, deleter, alloc) };
        replaced.unwrap_or_else(|err| handle_alloc_error(err));
    }

    /// Fallible [`reset_in`](Self::reset_in). On error the deleter has
    /// already run on `object` and `self` still owns what it did before.
    ///
    /// # Safety
    ///
    /// As for [`from_raw_in`](Self::from_raw_in).
    pub unsafe fn try_reset_in<D, A>(
        &mut self,
        object: NonNull<T>,
        deleter: D,
        alloc: A,
    ) -> Result<(), AllocError>
    where
        D: Deleter<T> + 'static,
        A: RawAlloc + 'static,
    {
        // SAFETY: forwarded caller contract.
        let mut fresh = unsafe { Self::try_from_raw_in(object, deleter, alloc)? };
        self.swap(&mut fresh);
        Ok(())
    }

    /// Exchange what `self` and `other` own.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }

    /// A weak handle to the same object.
    pub fn downgrade(&self) -> WeakPtr<T> {
        WeakPtr::from(self)
    }

    /// Whether both handles share one control block. Two empty handles
    /// compare equal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.map(|i| i.block) == other.inner.map(|i| i.block)
    }
}

impl<T> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for SharedPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.get() {
            Some(object) => object,
            None => panic!("dereferenced an empty SharedPtr"),
        }
    }
}

impl<T> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner {
            // SAFETY: a non-empty handle keeps its block alive.
            let counter = unsafe { block::counter(inner.block) };
            counter.acquire_strong();
        }
        Self {
            inner: self.inner,
            _owns: PhantomData,
        }
    }
}

impl<T> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(object) => f
                .debug_struct("SharedPtr")
                .field("object", object)
                .field("use_count", &self.use_count())
                .finish(),
            None => f.write_str("SharedPtr(empty)"),
        }
    }
}

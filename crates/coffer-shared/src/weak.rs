//! The observing handle.

use std::fmt;
use std::marker::PhantomData;

use crate::block;
use crate::shared::{Inner, SharedPtr};

/// A non-owning reference to an object managed by [`SharedPtr`].
///
/// A weak pointer keeps the control block alive but never the object:
/// once the last `SharedPtr` is gone the pointer is
/// [`expired`](WeakPtr::expired) and [`lock`](WeakPtr::lock) yields an
/// empty `SharedPtr`.
pub struct WeakPtr<T> {
    inner: Option<Inner<T>>,
    _observes: PhantomData<T>,
}

impl<T> WeakPtr<T> {
    /// A weak pointer to nothing. Always expired.
    pub const fn new() -> Self {
        Self {
            inner: None,
            _observes: PhantomData,
        }
    }

    /// Owners of the observed object; 0 once expired.
    pub fn use_count(&self) -> usize {
        self.inner
            // SAFETY: a weak reference keeps the block alive.
            .map_or(0, |inner| unsafe { block::counter(inner.block) }.strong())
    }

    /// Whether the object has been destroyed (or there never was one).
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// A new owner of the object, or an empty `SharedPtr` if it expired.
    pub fn lock(&self) -> SharedPtr<T> {
        self.upgrade().unwrap_or_default()
    }

    /// A new owner of the object, or `None` if it expired.
    pub fn upgrade(&self) -> Option<SharedPtr<T>> {
        let inner = self.inner?;
        // SAFETY: a weak reference keeps the block alive.
        let counter = unsafe { block::counter(inner.block) };
        counter
            .try_acquire_strong()
            .then(|| SharedPtr::from_inner(inner))
    }

    /// Stop observing, leaving this handle empty.
    pub fn reset(&mut self) {
        if let Some(inner) = self.inner.take() {
            // SAFETY: this handle owned one weak count.
            unsafe { block::release_weak(inner.block) };
        }
    }

    /// Exchange what `self` and `other` observe.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }
}

impl<T> From<&SharedPtr<T>> for WeakPtr<T> {
    fn from(shared: &SharedPtr<T>) -> Self {
        let inner = shared.inner();
        if let Some(inner) = inner {
            // SAFETY: `shared` keeps the block alive.
            let counter = unsafe { block::counter(inner.block) };
            counter.acquire_weak();
        }
        Self {
            inner,
            _observes: PhantomData,
        }
    }
}

impl<T> Default for WeakPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner {
            // SAFETY: a weak reference keeps the block alive.
            let counter = unsafe { block::counter(inner.block) };
            counter.acquire_weak();
        }
        Self {
            inner: self.inner,
            _observes: PhantomData,
        }
    }
}

impl<T> Drop for WeakPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> fmt::Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtr")
            .field("use_count", &self.use_count())
            .finish_non_exhaustive()
    }
}

//! How a pointer-owning control block disposes of its object.

use std::ptr::NonNull;

/// Destroys an object handed to [`SharedPtr::from_raw_in`](crate::SharedPtr::from_raw_in).
///
/// Implemented by [`DefaultDelete`] and by every `FnOnce(NonNull<T>)`
/// closure.
pub trait Deleter<T> {
    /// Destroy the object at `ptr` and release its storage.
    ///
    /// # Safety
    ///
    /// Called exactly once, with the pointer the deleter was paired with.
    unsafe fn delete(self, ptr: NonNull<T>);
}

/// Reclaims an object that was allocated as a `Box<T>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDelete;

impl<T> Deleter<T> for DefaultDelete {
    unsafe fn delete(self, ptr: NonNull<T>) {
        // SAFETY: paired pointers come from `Box::into_raw` (see `from_box`).
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

impl<T, F> Deleter<T> for F
where
    F: FnOnce(NonNull<T>),
{
    unsafe fn delete(self, ptr: NonNull<T>) {
        self(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn closure_deleter_receives_pointer() {
        let seen = Cell::new(None);
        let mut value = 5u32;
        let ptr = NonNull::from(&mut value);
        let deleter = |p: NonNull<u32>| seen.set(Some(p));
        unsafe { deleter.delete(ptr) };
        assert_eq!(seen.get(), Some(ptr));
    }

    #[test]
    fn default_delete_frees_box() {
        let ptr = NonNull::from(Box::leak(Box::new(String::from("owned"))));
        unsafe { Deleter::<String>::delete(DefaultDelete, ptr) };
    }
}

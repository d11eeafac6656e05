// A value is published behind a `crossbeam_epoch::Atomic`. Readers pin an epoch
// before dereferencing it, and a replaced value is handed to
// `Guard::defer_destroy` so it is freed only after every pinned reader is gone.

use crossbeam_epoch::{Atomic, CompareExchangeError, Guard, Owned, Shared};
use crossbeam_utils::Backoff;
use std::sync::atomic::Ordering;

/// A lock-free cell holding one immutable value of type `T`.
///
/// Readers never block and never copy the value; writers replace the whole value
/// with a single atomic pointer swap.
pub(crate) struct EpochCell<T> {
    current: Atomic<T>,
}

impl<T: Send + Sync> EpochCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            current: Atomic::new(value),
        }
    }

    /// Calls `with_value` with a reference to the current value.
    ///
    /// The reference is valid for the duration of the closure even if a writer
    /// publishes a new value concurrently.
    pub(crate) fn read<F, R>(&self, with_value: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = &crossbeam_epoch::pin();
        with_value(self.load(guard))
    }

    /// Unconditionally publishes `value`.
    pub(crate) fn replace(&self, value: T) {
        let guard = &crossbeam_epoch::pin();
        let previous = self.current.swap(Owned::new(value), Ordering::AcqRel, guard);
        unsafe { defer_destroy(guard, previous) };
    }

    /// Publishes the value computed by `derive` from the current value.
    ///
    /// `derive` returns `None` when there is nothing to publish. If another writer
    /// installs a value between the read and the swap, `derive` is called again
    /// with the newer value. Returns `true` if a value was published.
    pub(crate) fn update<F>(&self, mut derive: F) -> bool
    where
        F: FnMut(&T) -> Option<T>,
    {
        let guard = &crossbeam_epoch::pin();
        let backoff = Backoff::new();
        let mut current = self.current.load(Ordering::Acquire, guard);

        loop {
            // Safety: `current` was loaded under `guard` and is never null.
            let next = match derive(unsafe { current.deref() }) {
                Some(next) => Owned::new(next),
                None => return false,
            };

            match self.current.compare_exchange(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(_) => {
                    unsafe { defer_destroy(guard, current) };
                    return true;
                }
                Err(CompareExchangeError { current: newer, .. }) => {
                    current = newer;
                    backoff.spin();
                }
            }
        }
    }

    fn load<'g>(&self, guard: &'g Guard) -> &'g T {
        let shared = self.current.load(Ordering::Acquire, guard);
        // Safety: the pointer is set in `new` and only ever swapped for another
        // non-null pointer. Replaced values are destroyed through
        // `defer_destroy`, so they outlive every guard pinned before the swap.
        unsafe { shared.deref() }
    }
}

impl<T: Clone + Send + Sync> EpochCell<T> {
    pub(crate) fn load_cloned(&self) -> T {
        self.read(T::clone)
    }
}

impl<T> Drop for EpochCell<T> {
    fn drop(&mut self) {
        // Safety: `&mut self` guarantees that no other thread can access the
        // pointer anymore.
        unsafe {
            let guard = crossbeam_epoch::unprotected();
            let current = self.current.load(Ordering::Relaxed, guard);
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}

unsafe fn defer_destroy<T>(guard: &Guard, ptr: Shared<'_, T>) {
    if !ptr.is_null() {
        guard.defer_destroy(ptr);
    }
}

//! Explicitly resettable memoization.

use std::sync::{Mutex, MutexGuard};

/// A value computed at most once until [`Memo::reset`] is called.
///
/// The initializer runs with the slot locked, so concurrent callers wait
/// for the first computation instead of repeating it.
#[derive(Debug, Default)]
pub struct Memo<T> {
    slot: Mutex<Option<T>>,
}

impl<T: Clone> Memo<T> {
    pub const fn new() -> Self {
        Memo {
            slot: Mutex::new(None),
        }
    }

    /// Whether a value has been computed since creation or the last reset.
    pub fn is_probed(&self) -> bool {
        self.lock().is_some()
    }

    /// The cached value, if any.
    pub fn get(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Return the cached value, computing it with `init` on first use.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return value.clone();
        }
        let value = init();
        *slot = Some(value.clone());
        value
    }

    /// Like [`Memo::get_or_init`], but errors are returned uncached so the
    /// next call tries again.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }
        let value = init()?;
        *slot = Some(value.clone());
        Ok(value)
    }

    /// Forget the cached value.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A panicking initializer leaves the slot empty, never half-written.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::sync::{Mutex, MutexGuard};

/// A single value of type `T` behind an exclusive async lock.
///
/// At most one critical section per cell runs at a time; critical sections on
/// two different cells never block each other. The lock is released on every
/// exit path (normal return, early return via `?`, panic) because all access
/// flows through either the scoped [`Self::with_lock`] closure or the RAII
/// guard from [`Self::lock`].
///
/// Cells compose: the value may itself be a [`MutexMap`], which is how the
/// group subsystem nests per-group state inside an outer keyed store.
///
/// [`MutexMap`]: crate::MutexMap
#[derive(Debug, Default)]
pub struct MutexCell<T> {
    inner: Mutex<T>,
}

impl<T> MutexCell<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Run `critical_section` with exclusive mutable access to the value,
    /// suspending until the lock is free.
    pub async fn with_lock<R>(&self, critical_section: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().await;
        critical_section(&mut guard)
    }

    /// Acquire the lock and return its guard, for critical sections that must
    /// span nested async operations (eg: locking a tracker that is stored
    /// inside this cell). Prefer [`Self::with_lock`] everywhere else.
    pub async fn lock(&self) -> MutexGuard<'_, T> { self.inner.lock().await }
}

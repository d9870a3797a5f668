// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{future::Future,
          panic::AssertUnwindSafe,
          sync::{Arc, Mutex}};

use futures_util::FutureExt;
use tokio::{sync::broadcast, task::JoinHandle};

/// A shared failure signal that any spawned background task can raise, used
/// by the surrounding process to begin orderly shutdown.
///
/// The signal is advisory: it wakes whoever is parked in
/// [`Self::wait_for_shutdown`] but does not cancel any in-flight task. Only
/// the first failure notifies; later failures are still logged and then
/// dropped.
///
/// Cloning is cheap; all clones share the same latch.
#[derive(Clone, Debug)]
pub struct ShutdownLatch {
    inner: Arc<LatchInner>,
}

#[derive(Debug)]
struct LatchInner {
    /// Sticky flag, so a waiter that subscribes after the signal was raised
    /// still returns immediately.
    is_signaled: Mutex<bool>,
    sender: broadcast::Sender<()>,
}

impl Default for ShutdownLatch {
    fn default() -> Self { Self::new() }
}

impl ShutdownLatch {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel::<()>(1);
        Self {
            inner: Arc::new(LatchInner {
                is_signaled: Mutex::new(false),
                sender,
            }),
        }
    }

    /// Record that a background task failed, and wake anyone parked in
    /// [`Self::wait_for_shutdown`]. The error is logged here, once, at the
    /// task boundary; it is not retried and not swallowed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned, which can only happen if a
    /// thread panicked while holding it.
    pub fn signal_failure(&self, error: &miette::Report) {
        tracing::error!(%error, "encountered an unhandled task failure, starting to shutdown");
        let mut is_signaled = self.inner.is_signaled.lock().unwrap();
        if *is_signaled {
            return;
        }
        *is_signaled = true;
        // No receiver yet is fine: wait_for_shutdown re-checks the sticky flag
        // after subscribing.
        self.inner.sender.send(()).ok();
    }

    /// Suspend until any supervised task has signaled failure. Returns
    /// immediately if the signal was already raised.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned, which can only happen if a
    /// thread panicked while holding it.
    pub async fn wait_for_shutdown(&self) {
        let mut receiver = self.inner.sender.subscribe();
        // Subscribe first, check second: a signal raised in between is caught
        // by the flag, one raised after is caught by the receiver.
        if *self.inner.is_signaled.lock().unwrap() {
            return;
        }
        receiver.recv().await.ok();
    }

    /// Spawn `task` with this latch supervising its boundary: an `Err` return
    /// or a panic inside the task is caught, logged, and converted into a
    /// single latch signal. Fire-and-forget; the returned handle does not need
    /// to be awaited.
    pub fn spawn_supervised<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = miette::Result<()>> + Send + 'static,
    {
        let latch = self.clone();
        tokio::spawn(async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(report)) => latch.signal_failure(&report),
                Err(panic_payload) => {
                    let message = panic_payload
                        .downcast_ref::<&str>()
                        .map(ToString::to_string)
                        .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    latch.signal_failure(&miette::miette!("task panicked: {message}"));
                }
            }
        })
    }
}

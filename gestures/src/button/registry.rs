// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{ButtonAction, ButtonId, GestureError, GestureNotification, GestureTracker,
            MutexMap, ShutdownLatch, watch_gesture};

/// Routes each inbound press / release signal to the in-flight gesture
/// tracker for its remote, creating a fresh tracker (and spawning its watcher
/// task) when no usable one exists.
///
/// Built on [`MutexMap`] keyed by remote id, so the outer lock only ever
/// covers O(1) key operations, and the reuse-vs-replace decision, the
/// increment, and the store-back of a possibly-new tracker all happen while
/// the per-key cell lock is held. Two concurrent actions for the same remote
/// can therefore never both decide to create a tracker, and the `button_id` a
/// new tracker's watcher is bound to is deterministic: it is carried by
/// whichever action wins creation.
///
/// A finished or timed-out tracker is discarded silently; its watcher, if
/// still running, keeps sampling only its own tracker and ages out on its
/// own.
///
/// Cloning is cheap; clones share the same tracker map, notification channel,
/// and latch.
#[derive(Clone, Debug)]
pub struct TrackerRegistry {
    trackers_by_remote_id: MutexMap<String, Option<Arc<GestureTracker>>>,
    notification_sender: mpsc::Sender<GestureNotification>,
    shutdown_latch: ShutdownLatch,
}

impl TrackerRegistry {
    #[must_use]
    pub fn new(
        notification_sender: mpsc::Sender<GestureNotification>,
        shutdown_latch: ShutdownLatch,
    ) -> Self {
        Self {
            trackers_by_remote_id: MutexMap::new(),
            notification_sender,
            shutdown_latch,
        }
    }

    /// Route one press / release signal to `remote_id`'s gesture.
    ///
    /// # Errors
    ///
    /// [`GestureError::IllegalTransition`] if the action is not legal for the
    /// tracker's current state. An out-of-order signal means the upstream
    /// source is desynchronized, so callers on the dispatch path should let
    /// the failure reach the shutdown latch (see
    /// [`Self::deliver_in_background`]) instead of recovering per event.
    pub async fn deliver(
        &self,
        remote_id: &str,
        button_id: ButtonId,
        action: ButtonAction,
    ) -> Result<(), GestureError> {
        tracing::info!(%remote_id, %button_id, %action, "got a button event");

        let cell = self
            .trackers_by_remote_id
            .get_or_create(remote_id.to_string(), || None)
            .await;
        let mut slot = cell.lock().await;

        if let Some(tracker) = slot.as_ref() {
            if tracker.is_usable().await {
                return tracker.increment(action).await;
            }
        }

        // No usable tracker for this remote: start a fresh gesture. The stale
        // one (if any) is dropped on store-back.
        let tracker = Arc::new(GestureTracker::new());
        tracker.increment(action).await?;
        self.shutdown_latch.spawn_supervised(watch_gesture(
            tracker.clone(),
            remote_id.to_string(),
            button_id,
            self.notification_sender.clone(),
        ));
        *slot = Some(tracker);
        Ok(())
    }

    /// The shape the bridge glue wants for its synchronous button callback:
    /// process the signal on its own supervised task, so an
    /// [`GestureError::IllegalTransition`] becomes a logged failure plus one
    /// shutdown-latch signal rather than a value the callback would have to
    /// handle.
    pub fn deliver_in_background(
        &self,
        remote_id: impl Into<String>,
        button_id: ButtonId,
        action: ButtonAction,
    ) {
        let registry = self.clone();
        let remote_id = remote_id.into();
        self.shutdown_latch.spawn_supervised(async move {
            registry.deliver(&remote_id, button_id, action).await?;
            Ok(())
        });
    }
}

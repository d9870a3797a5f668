// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::{sync::mpsc,
            time::{Instant, sleep}};

use crate::{ButtonId, DOUBLE_CLICK_WINDOW, GestureError, GestureNotification,
            GestureTracker, MAX_TRACKING_WINDOW, SamplePass, WATCHER_POLL_INTERVAL};

/// Watch one freshly created [`GestureTracker`] and emit classified gesture
/// events at fixed checkpoints, until a terminal state or the end of the
/// tracking window.
///
/// One task per new tracker, bound to one remote + button pair, spawned
/// (supervised) by the registry. The algorithm:
///
/// 1. Suspend for [`DOUBLE_CLICK_WINDOW`].
/// 2. Sample the tracker. A press-and-release by now is a completed single
///    press (terminate); a still-held press is an ongoing long press
///    (continue); a finished double press terminates.
/// 3. Until [`MAX_TRACKING_WINDOW`] from task start: suspend for
///    [`WATCHER_POLL_INTERVAL`] and re-sample, with press-and-release now
///    classifying as a finished long press.
/// 4. If the window ends first, mark the tracker finished with no emission:
///    the gesture was abandoned mid-flight.
///
/// Polling is what surfaces "long press ongoing / finished" even when no
/// further physical signal ever arrives - the press / release signals carry
/// no grouping, and nothing wakes this task on a release that never happens.
///
/// There is no external cancellation: the task self-terminates, so an
/// abandoned tracker's watcher runs out its full window even if a
/// contradicting action has already replaced the tracker in the registry (it
/// only ever samples its own tracker).
///
/// # Errors
///
/// [`GestureError::NotificationChannelClosed`] if the consumer dropped the
/// receiver; the supervising latch turns that into a shutdown signal.
pub(crate) async fn watch_gesture(
    tracker: Arc<GestureTracker>,
    remote_id: String,
    button_id: ButtonId,
    notification_sender: mpsc::Sender<GestureNotification>,
) -> miette::Result<()> {
    let tracking_window_end = Instant::now() + MAX_TRACKING_WINDOW;

    sleep(DOUBLE_CLICK_WINDOW).await;
    if checkpoint(
        &tracker,
        &remote_id,
        button_id,
        &notification_sender,
        SamplePass::Initial,
    )
    .await?
    {
        return Ok(());
    }

    while Instant::now() < tracking_window_end {
        sleep(WATCHER_POLL_INTERVAL).await;
        if checkpoint(
            &tracker,
            &remote_id,
            button_id,
            &notification_sender,
            SamplePass::Subsequent,
        )
        .await?
        {
            return Ok(());
        }
    }

    tracker.finish().await;
    tracing::debug!(
        %remote_id,
        %button_id,
        "the tracking window ended without the button reaching a terminal state"
    );
    Ok(())
}

/// Sample the tracker once and emit if the state classifies. Returns true
/// when the watcher should terminate. The classification decision and the
/// finished flag were already committed atomically by
/// [`GestureTracker::observe`]; only the channel send happens outside the
/// tracker's lock.
async fn checkpoint(
    tracker: &GestureTracker,
    remote_id: &str,
    button_id: ButtonId,
    notification_sender: &mpsc::Sender<GestureNotification>,
    pass: SamplePass,
) -> Result<bool, GestureError> {
    match tracker.observe(pass).await {
        Some(event) => {
            tracing::debug!(%remote_id, %button_id, %event, "gesture checkpoint");
            notification_sender
                .send(GestureNotification {
                    remote_id: remote_id.to_string(),
                    button_id,
                    event,
                })
                .await
                .map_err(|_| GestureError::NotificationChannelClosed)?;
            Ok(event.is_terminal())
        }
        None => {
            let state = tracker.current_state().await;
            tracing::debug!(
                %remote_id,
                %button_id,
                state = ?state,
                "gesture checkpoint, nothing to emit yet"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ButtonAction, GestureEvent};
    use pretty_assertions::assert_eq;
    use tokio::time::{Duration, sleep};

    fn spawn_watcher(
        tracker: &Arc<GestureTracker>,
    ) -> mpsc::Receiver<GestureNotification> {
        let (notification_sender, notification_receiver) = mpsc::channel(64);
        tokio::spawn(watch_gesture(
            tracker.clone(),
            "study pico".to_string(),
            ButtonId::PowerOn,
            notification_sender,
        ));
        notification_receiver
    }

    fn drain(receiver: &mut mpsc::Receiver<GestureNotification>) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        while let Ok(notification) = receiver.try_recv() {
            events.push(notification.event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_and_release_within_the_window_is_one_single_press() {
        let tracker = Arc::new(GestureTracker::new());
        tracker.increment(ButtonAction::Press).await.unwrap();
        let mut receiver = spawn_watcher(&tracker);

        sleep(Duration::from_millis(100)).await;
        tracker.increment(ButtonAction::Release).await.unwrap();

        // Run well past the whole tracking window: nothing further may come.
        sleep(Duration::from_secs(6)).await;
        assert_eq!(drain(&mut receiver), vec![GestureEvent::SinglePressCompleted]);
        assert!(tracker.is_finished().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_held_past_the_window_then_released_is_a_long_press() {
        let tracker = Arc::new(GestureTracker::new());
        tracker.increment(ButtonAction::Press).await.unwrap();
        let mut receiver = spawn_watcher(&tracker);

        // Release between the first checkpoint (500ms) and the first poll
        // (750ms).
        sleep(Duration::from_millis(600)).await;
        tracker.increment(ButtonAction::Release).await.unwrap();

        sleep(Duration::from_secs(6)).await;
        assert_eq!(
            drain(&mut receiver),
            vec![GestureEvent::LongPressOngoing, GestureEvent::LongPressFinished]
        );
        assert!(tracker.is_finished().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_quick_press_release_pairs_are_one_double_press() {
        let tracker = Arc::new(GestureTracker::new());
        tracker.increment(ButtonAction::Press).await.unwrap();
        let mut receiver = spawn_watcher(&tracker);

        for action in [ButtonAction::Release, ButtonAction::Press, ButtonAction::Release] {
            sleep(Duration::from_millis(100)).await;
            tracker.increment(action).await.unwrap();
        }

        sleep(Duration::from_secs(6)).await;
        assert_eq!(drain(&mut receiver), vec![GestureEvent::DoublePressFinished]);
        assert!(tracker.is_finished().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_never_released_is_finalized_silently_at_window_end() {
        let tracker = Arc::new(GestureTracker::new());
        tracker.increment(ButtonAction::Press).await.unwrap();
        let mut receiver = spawn_watcher(&tracker);

        sleep(Duration::from_secs(6)).await;
        let events = drain(&mut receiver);

        // Checkpoints at 500ms then every 250ms through 5s: all ongoing, and
        // nothing after the window closed the tracker.
        assert_eq!(events.len(), 19);
        assert!(events.iter().all(|event| *event == GestureEvent::LongPressOngoing));
        assert!(tracker.is_finished().await);

        sleep(Duration::from_secs(6)).await;
        assert_eq!(drain(&mut receiver), vec![]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_surfaces_as_a_channel_error() {
        let tracker = Arc::new(GestureTracker::new());
        tracker.increment(ButtonAction::Press).await.unwrap();
        tracker.increment(ButtonAction::Release).await.unwrap();

        let (notification_sender, notification_receiver) = mpsc::channel(64);
        drop(notification_receiver);

        let result = watch_gesture(
            tracker.clone(),
            "study pico".to_string(),
            ButtonId::PowerOn,
            notification_sender,
        )
        .await;
        assert!(result.is_err());
    }
}

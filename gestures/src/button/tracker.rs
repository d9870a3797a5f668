// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::time::Instant;

use crate::{ButtonAction, ButtonState, GestureError, GestureEvent,
            MAX_TRACKING_WINDOW, MutexCell, SamplePass};

/// The live, mutable record of one in-flight gesture.
///
/// The whole record sits inside one [`MutexCell`], so validating a signal,
/// stamping the start instant, and advancing the state are a single critical
/// section: increments to one tracker are totally ordered, while increments
/// to different trackers are unordered with respect to each other.
///
/// Lifecycle: created by the registry when an action arrives for a remote
/// with no usable tracker; mutated by [`Self::increment`]; marked finished by
/// its watcher task (on a terminal checkpoint, or on tracking-window expiry);
/// once finished or timed out it is eligible for silent replacement by the
/// next action for its remote. Exactly one registry entry owns a tracker at a
/// time - two trackers are never live for the same remote simultaneously.
#[derive(Debug, Default)]
pub struct GestureTracker {
    record: MutexCell<TrackingRecord>,
}

#[derive(Debug)]
struct TrackingRecord {
    state: ButtonState,
    /// Set exactly once, on the first transition out of
    /// [`ButtonState::NotPressed`].
    tracking_started_at: Option<Instant>,
    /// Set only by the watcher task.
    is_finished: bool,
}

impl Default for TrackingRecord {
    fn default() -> Self {
        Self {
            state: ButtonState::NotPressed,
            tracking_started_at: None,
            is_finished: false,
        }
    }
}

impl TrackingRecord {
    fn is_timed_out(&self, now: Instant) -> bool {
        self.tracking_started_at
            .is_some_and(|started_at| now - started_at > MAX_TRACKING_WINDOW)
    }
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Apply one press / release signal to this gesture.
    ///
    /// # Errors
    ///
    /// [`GestureError::IllegalTransition`] if `action` is not legal for the
    /// current state; the tracker is left untouched.
    pub async fn increment(&self, action: ButtonAction) -> Result<(), GestureError> {
        self.record
            .with_lock(|record| {
                if !record.state.is_action_valid(action) {
                    return Err(GestureError::IllegalTransition {
                        state: record.state,
                        action,
                    });
                }
                if record.state == ButtonState::NotPressed {
                    record.tracking_started_at = Some(Instant::now());
                }
                record.state = record.state.next_state()?;
                Ok(())
            })
            .await
    }

    /// True once the watcher has reached a terminal checkpoint for this
    /// gesture, or its tracking window expired.
    pub async fn is_finished(&self) -> bool {
        self.record.with_lock(|record| record.is_finished).await
    }

    /// True once more than [`MAX_TRACKING_WINDOW`] has elapsed since tracking
    /// started (the first press). False while tracking never started.
    pub async fn is_timed_out(&self) -> bool {
        let now = Instant::now();
        self.record
            .with_lock(move |record| record.is_timed_out(now))
            .await
    }

    /// Whether the registry may keep routing actions to this tracker.
    pub(crate) async fn is_usable(&self) -> bool {
        let now = Instant::now();
        self.record
            .with_lock(move |record| !record.is_finished && !record.is_timed_out(now))
            .await
    }

    /// Sample the state for a watcher checkpoint. The classification and the
    /// finished flag commit in the same critical section, so the registry can
    /// never reuse a tracker whose terminal event is about to be emitted.
    pub(crate) async fn observe(&self, pass: SamplePass) -> Option<GestureEvent> {
        self.record
            .with_lock(|record| {
                let maybe_event = record.state.classify(pass);
                if maybe_event.is_some_and(GestureEvent::is_terminal) {
                    record.is_finished = true;
                }
                maybe_event
            })
            .await
    }

    /// Finalize with no emission: the tracking window expired and the gesture
    /// was abandoned mid-flight (eg: a long press whose release never
    /// arrived).
    pub(crate) async fn finish(&self) {
        self.record.with_lock(|record| record.is_finished = true).await;
    }

    /// Current state, for checkpoint logging.
    pub(crate) async fn current_state(&self) -> ButtonState {
        self.record.with_lock(|record| record.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::{Duration, advance};

    #[tokio::test]
    async fn test_full_double_press_sequence_advances_one_state_at_a_time() {
        let tracker = GestureTracker::new();
        assert_eq!(tracker.current_state().await, ButtonState::NotPressed);

        tracker.increment(ButtonAction::Press).await.unwrap();
        assert_eq!(
            tracker.current_state().await,
            ButtonState::FirstPressAwaitingRelease
        );

        tracker.increment(ButtonAction::Release).await.unwrap();
        assert_eq!(
            tracker.current_state().await,
            ButtonState::FirstPressAndFirstRelease
        );

        tracker.increment(ButtonAction::Press).await.unwrap();
        assert_eq!(
            tracker.current_state().await,
            ButtonState::SecondPressAwaitingRelease
        );

        tracker.increment(ButtonAction::Release).await.unwrap();
        assert_eq!(
            tracker.current_state().await,
            ButtonState::DoublePressFinished
        );
    }

    #[tokio::test]
    async fn test_increment_after_a_finished_double_press_always_fails() {
        let tracker = GestureTracker::new();
        for action in [
            ButtonAction::Press,
            ButtonAction::Release,
            ButtonAction::Press,
            ButtonAction::Release,
        ] {
            tracker.increment(action).await.unwrap();
        }

        for action in [ButtonAction::Press, ButtonAction::Release] {
            let result = tracker.increment(action).await;
            assert!(matches!(
                result,
                Err(GestureError::IllegalTransition {
                    state: ButtonState::DoublePressFinished,
                    ..
                })
            ));
        }
    }

    #[tokio::test]
    async fn test_out_of_order_signals_fail_and_leave_the_tracker_untouched() {
        let tracker = GestureTracker::new();

        let result = tracker.increment(ButtonAction::Release).await;
        assert!(matches!(
            result,
            Err(GestureError::IllegalTransition {
                state: ButtonState::NotPressed,
                action: ButtonAction::Release,
            })
        ));
        assert_eq!(tracker.current_state().await, ButtonState::NotPressed);

        tracker.increment(ButtonAction::Press).await.unwrap();
        let result = tracker.increment(ButtonAction::Press).await;
        assert!(matches!(
            result,
            Err(GestureError::IllegalTransition {
                state: ButtonState::FirstPressAwaitingRelease,
                action: ButtonAction::Press,
            })
        ));
        assert_eq!(
            tracker.current_state().await,
            ButtonState::FirstPressAwaitingRelease
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_only_after_the_tracking_window() {
        let tracker = GestureTracker::new();
        // Tracking never started: no amount of waiting times it out.
        advance(Duration::from_secs(60)).await;
        assert!(!tracker.is_timed_out().await);

        tracker.increment(ButtonAction::Press).await.unwrap();
        assert!(!tracker.is_timed_out().await);

        advance(MAX_TRACKING_WINDOW).await;
        assert!(!tracker.is_timed_out().await, "exactly at the window edge");

        advance(Duration::from_millis(1)).await;
        assert!(tracker.is_timed_out().await);
        assert!(!tracker.is_usable().await);
    }

    #[tokio::test]
    async fn test_terminal_observation_marks_the_tracker_finished() {
        let tracker = GestureTracker::new();
        tracker.increment(ButtonAction::Press).await.unwrap();
        tracker.increment(ButtonAction::Release).await.unwrap();

        let event = tracker.observe(SamplePass::Initial).await;
        assert_eq!(event, Some(GestureEvent::SinglePressCompleted));
        assert!(tracker.is_finished().await);
        assert!(!tracker.is_usable().await);
    }

    #[tokio::test]
    async fn test_ongoing_observation_leaves_the_tracker_usable() {
        let tracker = GestureTracker::new();
        tracker.increment(ButtonAction::Press).await.unwrap();

        let event = tracker.observe(SamplePass::Initial).await;
        assert_eq!(event, Some(GestureEvent::LongPressOngoing));
        assert!(!tracker.is_finished().await);
        assert!(tracker.is_usable().await);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The pure model of a single button's click progression: which signals are
//! legal in which state, and what a sampled state means at a watcher
//! checkpoint. No side effects or timers live here.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, FromRepr};

/// A single discrete physical signal from a remote button.
///
/// The upstream bridge reports these as the strings `"press"` and
/// `"release"`; parse with [`str::parse`] (case-insensitive).
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Press,
    Release,
}

/// The five physical buttons, consistent across both supported remote
/// layouts. Discriminants are the raw button numbers the bridge reports;
/// convert with [`ButtonId::from_repr`].
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Display, Eq, FromRepr, Hash, PartialEq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    PowerOn = 0,
    Favorite = 1,
    PowerOff = 2,
    Increase = 3,
    Decrease = 4,
}

/// Progression of one in-flight gesture. The order is total: a tracker only
/// ever advances one position at a time via [`ButtonState::next_state`], and
/// nothing follows [`ButtonState::DoublePressFinished`].
///
/// Every state is either "awaiting press" ([`ButtonState::NotPressed`],
/// [`ButtonState::FirstPressAndFirstRelease`]) or "awaiting release" (the two
/// `*AwaitingRelease` states), except the terminal
/// [`ButtonState::DoublePressFinished`] which accepts neither signal.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, FromRepr, Ord, PartialEq, PartialOrd)]
pub enum ButtonState {
    NotPressed = 0,
    FirstPressAwaitingRelease = 1,
    FirstPressAndFirstRelease = 2,
    SecondPressAwaitingRelease = 3,
    DoublePressFinished = 4,
}

impl ButtonState {
    /// The state one position later in the total order.
    ///
    /// # Errors
    ///
    /// [`GestureError::NoNextState`] when called on the final state.
    pub fn next_state(self) -> Result<Self, GestureError> {
        Self::from_repr(self as u8 + 1).ok_or(GestureError::NoNextState)
    }

    #[must_use]
    pub fn is_awaiting_press(self) -> bool {
        matches!(self, Self::NotPressed | Self::FirstPressAndFirstRelease)
    }

    #[must_use]
    pub fn is_awaiting_release(self) -> bool {
        matches!(
            self,
            Self::FirstPressAwaitingRelease | Self::SecondPressAwaitingRelease
        )
    }

    /// Whether `action` is legal in this state.
    #[must_use]
    pub fn is_action_valid(self, action: ButtonAction) -> bool {
        (self.is_awaiting_press() && action == ButtonAction::Press)
            || (self.is_awaiting_release() && action == ButtonAction::Release)
    }

    /// The watcher's four-way checkpoint branch as a pure function: what a
    /// sampled state classifies to, given which pass is sampling. Returns
    /// [`None`] when there is nothing to emit yet (still mid-gesture, or the
    /// first press was never even seen).
    pub(crate) fn classify(self, pass: SamplePass) -> Option<GestureEvent> {
        match self {
            Self::FirstPressAndFirstRelease => Some(match pass {
                SamplePass::Initial => GestureEvent::SinglePressCompleted,
                SamplePass::Subsequent => GestureEvent::LongPressFinished,
            }),
            Self::FirstPressAwaitingRelease => Some(GestureEvent::LongPressOngoing),
            Self::DoublePressFinished => Some(GestureEvent::DoublePressFinished),
            Self::NotPressed | Self::SecondPressAwaitingRelease => None,
        }
    }
}

/// Distinguishes a watcher's first sample (taken right after the double-click
/// window) from the later polling-loop samples. A press-and-release observed
/// by the first sample is a completed single press; the same observation on a
/// later pass means a long press just finished, since ongoing notifications
/// were already sent for it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SamplePass {
    Initial,
    Subsequent,
}

/// The classified outcome of a gesture, delivered to the consumer.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureEvent {
    SinglePressCompleted,
    LongPressOngoing,
    LongPressFinished,
    DoublePressFinished,
}

impl GestureEvent {
    /// Terminal events end their gesture's watcher task; only
    /// [`Self::LongPressOngoing`] leaves it running.
    #[must_use]
    pub fn is_terminal(self) -> bool { !matches!(self, Self::LongPressOngoing) }
}

/// One classified gesture, as handed to the consumer channel. The consumer is
/// responsible for whatever happens next (eg: translating the gesture into a
/// device command).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GestureNotification {
    pub remote_id: String,
    pub button_id: ButtonId,
    pub event: GestureEvent,
}

/// Failure taxonomy for the gesture engine.
///
/// An out-of-order signal ([`Self::IllegalTransition`]) means the upstream
/// source is desynchronized, so it is treated as fatal for the whole process
/// (logged once at the task boundary, then the shutdown latch fires) rather
/// than recovered per event. Timeout / abandonment of a gesture is NOT an
/// error: the watcher finalizes the tracker silently.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GestureError {
    /// `action` arrived while the gesture state machine could not accept it,
    /// eg: a release while awaiting a press, or anything at all after a
    /// finished double press.
    #[error("button action `{action}` is not valid in gesture state `{state:?}`")]
    #[diagnostic(
        code(r3bl_gestures::illegal_transition),
        help(
            "the upstream signal source is desynchronized; trust in ongoing \
             tracking is not warranted, so shut down instead of recovering \
             per event"
        )
    )]
    IllegalTransition {
        state: ButtonState,
        action: ButtonAction,
    },

    /// [`ButtonState::next_state`] was called on the final state.
    #[error("there is no state after finishing a double press")]
    #[diagnostic(code(r3bl_gestures::no_next_state))]
    NoNextState,

    /// The consumer side of the notification channel was dropped while a
    /// watcher tried to emit.
    #[error("gesture notification receiver has been dropped")]
    #[diagnostic(
        code(r3bl_gestures::notification_channel_closed),
        help("keep the notification receiver alive for the lifetime of the registry")
    )]
    NotificationChannelClosed,
}

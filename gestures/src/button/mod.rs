// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Gesture disambiguation for physical remote buttons.
//!
//! Press / release signals arrive as independent events with no built-in
//! grouping; this module decides, per remote, whether they add up to a single
//! press, a long press (with ongoing progress notifications), or a double
//! press:
//! - [`mod@model`] - the pure state machine and the enums that cross the
//!   crate boundary.
//! - [`mod@tracker`] - the live, lock-guarded record of one in-flight
//!   gesture.
//! - [`mod@watcher`] - the timer-driven task that samples a tracker and
//!   emits classified events.
//! - [`mod@registry`] - routes each inbound action to an existing tracker or
//!   creates a fresh one.

// Attach sources.
pub mod model;
pub mod registry;
pub mod tracker;
pub mod watcher;

// Re-export.
pub use model::*;
pub use registry::*;
pub use tracker::*;
pub use watcher::*;

use std::time::Duration;

/// How long after the first press a watcher waits before deciding between a
/// completed single press and the start of something longer. This is the
/// tie-break that makes press-release-press-release one double press instead
/// of two single presses.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// How often a watcher re-samples tracker state once the double-click window
/// has passed.
pub const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Maximum time one gesture is tracked. A tracker past this window is
/// finalized with no further emission and silently replaced by the next
/// action for its remote.
pub const MAX_TRACKING_WINDOW: Duration = Duration::from_secs(5);

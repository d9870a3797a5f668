// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words pico caseta

//! # r3bl_gestures
//!
//! Async gesture disambiguation for physical remote buttons. Press / release
//! signals arrive from a bridge as independent, unordered events with no
//! built-in grouping; this library decides, per remote, which *gesture* they
//! add up to - a single press, a long press (with ongoing progress
//! notifications), or a double press - and hands the classified events to a
//! consumer channel.
//!
//! The engine is built on a general-purpose concurrent keyed-state-store
//! pattern: a map from key (remote id, or room / group name) to one
//! lock-guarded piece of mutable state, where operations on different keys
//! proceed fully concurrently while operations on the same key are
//! serialized, and where entries are silently superseded once their tracking
//! finished or timed out. The same pattern powers the companion per-group
//! state store with its TTL-aware merge.
//!
//! # Modules
//!
//! | Module         | What lives there                                                                          |
//! |----------------|-------------------------------------------------------------------------------------------|
//! | [`mod@sync`]   | [`MutexCell`], [`MutexMap`], [`ShutdownLatch`] - the locking and supervision primitives   |
//! | [`mod@button`] | The gesture state machine, tracker, watcher task, and [`TrackerRegistry`]                 |
//! | [`mod@group`]  | Per-group lighting state and the TTL-aware [`GroupStateStore`] merge                      |
//!
//! # Usage
//!
//! ```no_run
//! use r3bl_gestures::{ButtonAction, ButtonId, ShutdownLatch, TrackerRegistry};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let (notification_sender, mut notification_receiver) = mpsc::channel(64);
//!     let shutdown_latch = ShutdownLatch::new();
//!     let registry = TrackerRegistry::new(notification_sender, shutdown_latch.clone());
//!
//!     // Wire this into the bridge callback for every press / release signal.
//!     registry.deliver_in_background("living room pico", ButtonId::PowerOn, ButtonAction::Press);
//!
//!     // Consume classified gestures (eg: translate them into device commands).
//!     tokio::spawn(async move {
//!         while let Some(notification) = notification_receiver.recv().await {
//!             println!("{notification:?}");
//!         }
//!     });
//!
//!     // Block until any background task fails, then tear down.
//!     shutdown_latch.wait_for_shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! Errors are fatal by design: an out-of-order signal
//! ([`GestureError::IllegalTransition`]) or a dropped consumer means the
//! world this engine models is no longer trustworthy, so the failure is
//! logged once and converted into a single [`ShutdownLatch`] signal instead
//! of being recovered per event. Timeouts are not errors: an abandoned
//! gesture is finalized silently and superseded by the next signal.
//!
//! This crate deliberately has no wire format of its own. Connecting to the
//! physical bridge, the message bus, and translating gestures into device
//! commands are the surrounding glue's job.

// Attach sources.
pub mod button;
pub mod group;
pub mod sync;

// Re-export.
pub use button::*;
pub use group::*;
pub use sync::*;

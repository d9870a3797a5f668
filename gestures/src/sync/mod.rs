// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Concurrency primitives shared by the gesture and group subsystems: a
//! single lock-guarded value ([`MutexCell`]), a two-level-locked keyed store
//! of such values ([`MutexMap`]), and a fault-propagating supervision latch
//! for spawned tasks ([`ShutdownLatch`]).

// Attach sources.
pub mod mutex_cell;
pub mod mutex_map;
pub mod shutdown_latch;

// Re-export.
pub use mutex_cell::*;
pub use mutex_map::*;
pub use shutdown_latch::*;

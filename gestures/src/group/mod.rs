// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Concurrent per-group (room) lighting state, kept with the same two-level
//! locking pattern as the gesture registry: [`mod@model`] holds the data
//! types, [`mod@store`] the TTL-aware atomic merge.

// Attach sources.
pub mod model;
pub mod store;

// Re-export.
pub use model::*;
pub use store::*;

use std::time::Duration;

/// How long an observed scene stays meaningful. A scene older than this is
/// cleared before any merge and ignored by readers.
pub const SCENE_TTL: Duration = Duration::from_secs(60);

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::time::Instant;

use crate::{GroupState, GroupStateUpdate, MutexMap, SCENE_TTL, Scene};

/// Keyed store of per-group state, with the same two-level locking pattern as
/// the gesture registry: the outer lock covers only key lookup / insert, each
/// group's state sits behind its own cell lock, and the TTL-aware merge is
/// one critical section - no reader ever observes a state mid-merge.
///
/// Cloning is cheap; clones share the same state map.
#[derive(Clone, Debug)]
pub struct GroupStateStore {
    state_by_group_name: MutexMap<String, Option<GroupState>>,
    /// What [`Self::active_scene`] falls back to when no scene has ever been
    /// observed for a group (or the last one went stale). An explicit
    /// initialization decision; never inferred from absent data.
    default_scene: Option<Scene>,
}

impl GroupStateStore {
    #[must_use]
    pub fn new(default_scene: Option<Scene>) -> Self {
        Self {
            state_by_group_name: MutexMap::new(),
            default_scene,
        }
    }

    /// Merge a partial status update into the group's state.
    ///
    /// Under the group's cell lock: seed from `update` if nothing is known
    /// yet; otherwise clear the scene if it has outlived [`SCENE_TTL`], then
    /// take each field from `update` when present and the (possibly
    /// scene-cleared) prior value when not, and stamp the result with the
    /// current instant.
    pub async fn update(&self, group_name: &str, update: GroupStateUpdate) {
        let cell = self
            .state_by_group_name
            .get_or_create(group_name.to_string(), || None)
            .await;
        cell.with_lock(|maybe_state| {
            let now = Instant::now();
            match maybe_state {
                None => {
                    *maybe_state = Some(GroupState {
                        brightness: update.brightness,
                        power: update.power,
                        scene: update.scene,
                        updated_at: now,
                    });
                }
                Some(previous) => {
                    if now - previous.updated_at > SCENE_TTL {
                        previous.scene = None;
                    }
                    previous.brightness = update.brightness.or(previous.brightness);
                    previous.power = update.power.or(previous.power);
                    previous.scene = update.scene.or_else(|| previous.scene.take());
                    previous.updated_at = now;
                }
            }
        })
        .await;

        tracing::debug!(%group_name, "merged a group state update");
    }

    /// Snapshot of the group's state, or [`None`] for a group never seen.
    pub async fn get(&self, group_name: &str) -> Option<GroupState> {
        match self.state_by_group_name.get(group_name).await {
            Some(cell) => cell.with_lock(|maybe_state| maybe_state.clone()).await,
            None => None,
        }
    }

    /// The scene to treat as current for the group: the stored one while it
    /// is fresh, otherwise the configured default. Applies the same staleness
    /// rule as [`Self::update`], so a reader between updates never acts on a
    /// scene that would be cleared by the next merge.
    pub async fn active_scene(&self, group_name: &str) -> Option<Scene> {
        let now = Instant::now();
        let stored = match self.state_by_group_name.get(group_name).await {
            Some(cell) => {
                cell.with_lock(move |maybe_state| {
                    maybe_state.as_ref().and_then(|state| {
                        if now - state.updated_at > SCENE_TTL {
                            None
                        } else {
                            state.scene.clone()
                        }
                    })
                })
                .await
            }
            None => None,
        };
        stored.or_else(|| self.default_scene.clone())
    }
}

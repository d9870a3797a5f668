// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::time::Instant;

/// Whether a group of lights is on or off. The upstream status payload spells
/// these `"ON"` / `"OFF"`.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum OnOrOff {
    On,
    Off,
}

/// Dimming level in the upstream 0..=254 range.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Brightness = Brightness(0);
    pub const MAX: Brightness = Brightness(254);

    /// Clamps to [`Self::MAX`].
    #[must_use]
    pub fn new(value: u8) -> Self { Self(value.min(Self::MAX.0)) }

    #[must_use]
    pub fn value(self) -> u8 { self.0 }
}

/// One recallable scene, as enumerated by the upstream group topology.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: u32,
    pub friendly_name: String,
}

/// Everything this engine knows about one group / room.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupState {
    pub brightness: Option<Brightness>,
    pub power: Option<OnOrOff>,
    /// Cleared once `updated_at` is older than [`SCENE_TTL`].
    ///
    /// [`SCENE_TTL`]: crate::SCENE_TTL
    pub scene: Option<Scene>,
    pub updated_at: Instant,
}

/// A partial update: an incoming status payload supplies any field it knows;
/// a field it does not know keeps its previous value on merge (except a stale
/// scene, which is cleared first - see [`GroupStateStore::update`]).
///
/// Field names follow the upstream JSON status payload, so the transport glue
/// can deserialize one straight from a message body.
///
/// [`GroupStateStore::update`]: crate::GroupStateStore::update
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroupStateUpdate {
    pub brightness: Option<Brightness>,
    #[serde(rename = "state")]
    pub power: Option<OnOrOff>,
    pub scene: Option<Scene>,
}

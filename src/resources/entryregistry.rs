//! Scene entries and the static collision geometry they contribute.
//!
//! An [`Entry`] is a placed, mostly static scene element: a portal, a
//! trigger region, a wall. Each entry may own one logic instance, one sensor
//! and one static collision shape.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::logic::EntryLogic;
use crate::resources::configregistry::{ConfigRef, EntryDescriptor};
use crate::resources::sensors::SensorId;
use crate::shapes::{Shape, Transform2D};
use crate::spatial::SpatialIndex;

/// Map-stable key of a scene entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntryKey(pub u64);

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A placed scene element as the host describes it.
///
/// # Fields
/// - `key` - Stable key; adding an entry with a known key replaces it
/// - `config` - Entry config the descriptor is resolved from
/// - `translation` / `rotation` - Placement of the descriptor's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: EntryKey,
    pub config: ConfigRef,
    pub translation: Vec2,
    pub rotation: f32,
}

impl Entry {
    pub fn new(key: u64, config: impl Into<ConfigRef>, translation: Vec2, rotation: f32) -> Self {
        Self {
            key: EntryKey(key),
            config: config.into(),
            translation,
            rotation,
        }
    }

    pub fn transform(&self) -> Transform2D {
        Transform2D::new(self.translation, self.rotation)
    }
}

pub struct EntryRecord {
    pub entry: Entry,
    pub descriptor: Arc<EntryDescriptor>,
    /// Descriptor shape placed at the entry's transform.
    pub shape: Shape,
    /// Empty when the entry has no logic, or while the logic is being called.
    pub logic: Option<Box<dyn EntryLogic>>,
    /// Lineage of the logic, kept for mapping removal.
    pub lineage: &'static [&'static str],
    pub default_entrance: bool,
    pub sensor: Option<SensorId>,
}

/// Entries currently in the scene, by key.
#[derive(Resource, Default)]
pub struct EntryRegistry {
    records: FxHashMap<EntryKey, EntryRecord>,
}

impl EntryRegistry {
    pub fn insert(&mut self, record: EntryRecord) -> Option<EntryRecord> {
        self.records.insert(record.entry.key, record)
    }

    pub fn remove(&mut self, key: EntryKey) -> Option<EntryRecord> {
        self.records.remove(&key)
    }

    pub fn get(&self, key: EntryKey) -> Option<&EntryRecord> {
        self.records.get(&key)
    }

    pub fn get_mut(&mut self, key: EntryKey) -> Option<&mut EntryRecord> {
        self.records.get_mut(&key)
    }

    pub fn contains(&self, key: EntryKey) -> bool {
        self.records.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Collision flags of the entry's static geometry, zero when it has none.
    pub fn collision_flags(&self, key: EntryKey) -> u32 {
        self.records
            .get(&key)
            .map(|r| r.descriptor.collision_flags)
            .unwrap_or(0)
    }
}

/// Spatial index of entries that block movement.
#[derive(Resource)]
pub struct StaticGeometry(pub SpatialIndex<EntryKey>);

impl StaticGeometry {
    pub fn new(cell_size: f32, depth: u8) -> Self {
        Self(SpatialIndex::new(cell_size, depth))
    }
}

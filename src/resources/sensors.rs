//! Sensor registry and its spatial partition.
//!
//! A sensor is a shape owned by an entry or an actor. Intersection sensors
//! fire when an actor's shape moves into them; interaction sensors fire only
//! when logic explicitly interacts with a shape that touches them.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::logicmappings::LogicRef;
use crate::shapes::Shape;
use crate::spatial::SpatialIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Intersection,
    Interaction,
}

/// A registered sensor. Its shape lives in the registry's spatial index.
#[derive(Debug, Clone)]
pub struct Sensor {
    pub kind: SensorKind,
    pub owner: LogicRef,
}

/// Every sensor in the scene, indexed by shape.
///
/// Entries register a sensor when added and drop it when removed; actors
/// register theirs on activation. Queries return sensors in the index's
/// fixed order, so triggers fire in the same order on every run.
///
/// # Related
/// - [`crate::systems::sensors::trigger_sensors`] – fires the sensors touching a shape
/// - [`crate::events::sensor::SensorTriggered`] – raised for every sensor fired
#[derive(Resource)]
pub struct SensorRegistry {
    last_id: u32,
    sensors: FxHashMap<SensorId, Sensor>,
    space: SpatialIndex<SensorId>,
}

impl SensorRegistry {
    pub fn new(cell_size: f32, depth: u8) -> Self {
        Self {
            last_id: 0,
            sensors: FxHashMap::default(),
            space: SpatialIndex::new(cell_size, depth),
        }
    }

    pub fn add(&mut self, kind: SensorKind, owner: LogicRef, shape: Shape) -> SensorId {
        self.last_id += 1;
        let id = SensorId(self.last_id);
        self.sensors.insert(id, Sensor { kind, owner });
        self.space.insert(id, shape);
        id
    }

    /// Moves a sensor to a new world shape.
    pub fn update(&mut self, id: SensorId, shape: Shape) -> bool {
        self.space.update(id, shape)
    }

    pub fn remove(&mut self, id: SensorId) -> Option<Sensor> {
        self.space.remove(id);
        self.sensors.remove(&id)
    }

    pub fn get(&self, id: SensorId) -> Option<&Sensor> {
        self.sensors.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn space(&self) -> &SpatialIndex<SensorId> {
        &self.space
    }

    /// Sensors of `kind` whose shapes intersect `shape`, in query order.
    pub fn intersecting(&self, kind: SensorKind, shape: &Shape) -> Vec<(SensorId, LogicRef)> {
        self.space
            .intersecting(shape)
            .into_iter()
            .filter_map(|id| {
                self.sensors
                    .get(&id)
                    .filter(|s| s.kind == kind)
                    .map(|s| (id, s.owner))
            })
            .collect()
    }
}

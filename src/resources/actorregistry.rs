//! Primary actor registry and the actor spatial partition.
//!
//! The registry owns the id counter and one record per live actor, kept in
//! spawn order so that iteration is stable for the lifetime of the scene.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::actor::ActorId;
use crate::resources::configregistry::CollisionFlags;
use crate::resources::sceneclock::Timestamp;
use crate::resources::sensors::SensorId;
use crate::spatial::SpatialIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Spawned, waiting for simulation time to reach its creation time.
    Pending,
    /// In the actor space and advanced every tick.
    Active,
}

/// Registry entry of one actor.
///
/// # Fields
/// - `entity` - ECS entity carrying the actor's components
/// - `state` - Pending until `created` is reached, then Active
/// - `collision` - Copy of the descriptor's flags, read by `can_collide`
/// - `created` - Activation time
/// - `destroy_at` - Earliest requested destruction time
#[derive(Debug, Clone)]
pub struct ActorRecord {
    pub entity: Entity,
    pub state: ActorState,
    pub collision: CollisionFlags,
    pub created: Timestamp,
    pub destroy_at: Option<Timestamp>,
    /// Lineage of the actor's logic, kept for mapping removal.
    pub lineage: &'static [&'static str],
    /// Sensor registered on the actor's shape while active.
    pub sensor: Option<SensorId>,
}

/// Primary actor registry.
///
/// Ids come from a counter that only moves forward; a removed actor's id
/// is never handed out again. Records are iterated in spawn order, which
/// is also the order actors tick in.
///
/// # Example
/// ```ignore
/// let mut registry = ActorRegistry::default();
/// let id = registry.allocate_id();
/// let created = record.created;
/// registry.insert(id, record);
/// assert!(registry.due_for_activation(created).contains(&id));
/// ```
#[derive(Resource, Debug, Default)]
pub struct ActorRegistry {
    last_id: u32,
    records: FxHashMap<ActorId, ActorRecord>,
    order: Vec<ActorId>,
}

impl ActorRegistry {
    /// Hands out the next id. Ids are never reused.
    pub fn allocate_id(&mut self) -> ActorId {
        self.last_id += 1;
        ActorId(self.last_id)
    }

    pub fn last_id(&self) -> u32 {
        self.last_id
    }

    pub fn insert(&mut self, id: ActorId, record: ActorRecord) {
        if self.records.insert(id, record).is_none() {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: ActorId) -> Option<ActorRecord> {
        let record = self.records.remove(&id)?;
        if let Some(pos) = self.order.iter().position(|i| *i == id) {
            self.order.remove(pos);
        }
        Some(record)
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn is_active(&self, id: ActorId) -> bool {
        self.records
            .get(&id)
            .is_some_and(|r| r.state == ActorState::Active)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All live ids in spawn order.
    pub fn ids(&self) -> &[ActorId] {
        &self.order
    }

    /// Active ids in spawn order.
    pub fn active_ids(&self) -> Vec<ActorId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.is_active(*id))
            .collect()
    }

    /// Pending actors whose creation time has been reached.
    pub fn due_for_activation(&self, now: Timestamp) -> Vec<ActorId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.records
                    .get(id)
                    .is_some_and(|r| r.state == ActorState::Pending && r.created <= now)
            })
            .collect()
    }

    /// Actors whose destruction time has been reached.
    pub fn due_for_destruction(&self, now: Timestamp) -> Vec<ActorId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.records
                    .get(id)
                    .and_then(|r| r.destroy_at)
                    .is_some_and(|at| at <= now)
            })
            .collect()
    }

    /// Whether actor `a` is blocked by actor `b`.
    pub fn can_collide(&self, a: ActorId, b: ActorId) -> bool {
        match (self.records.get(&a), self.records.get(&b)) {
            (Some(ra), Some(rb)) => ra.collision.can_collide(&rb.collision),
            _ => false,
        }
    }
}

/// Spatial index over active actors' world shapes.
#[derive(Resource)]
pub struct ActorSpace(pub SpatialIndex<ActorId>);

impl ActorSpace {
    pub fn new(cell_size: f32, depth: u8) -> Self {
        Self(SpatialIndex::new(cell_size, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: Entity, created: Timestamp) -> ActorRecord {
        ActorRecord {
            entity,
            state: ActorState::Pending,
            collision: CollisionFlags::default(),
            created,
            destroy_at: None,
            lineage: &["actor"],
            sensor: None,
        }
    }

    #[test]
    fn ids_are_monotonic_and_order_is_spawn_order() {
        let mut world = World::new();
        let mut registry = ActorRegistry::default();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert_eq!((a, b), (ActorId(1), ActorId(2)));
        registry.insert(b, record(world.spawn_empty().id(), 0));
        registry.insert(a, record(world.spawn_empty().id(), 0));
        assert_eq!(registry.ids(), &[b, a]);
        registry.remove(b);
        assert_eq!(registry.ids(), &[a]);
        assert_eq!(registry.allocate_id(), ActorId(3));
    }

    #[test]
    fn due_lists_follow_timestamps() {
        let mut world = World::new();
        let mut registry = ActorRegistry::default();
        let early = registry.allocate_id();
        let late = registry.allocate_id();
        registry.insert(early, record(world.spawn_empty().id(), 50));
        registry.insert(late, record(world.spawn_empty().id(), 100));
        assert_eq!(registry.due_for_activation(75), vec![early]);
        registry.get_mut(late).unwrap().destroy_at = Some(80);
        assert_eq!(registry.due_for_destruction(80), vec![late]);
        assert!(registry.due_for_destruction(79).is_empty());
    }
}

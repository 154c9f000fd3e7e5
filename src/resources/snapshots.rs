//! Immutable views of scene state handed to clients and external readers.
//!
//! Snapshots are plain serde values. The tick thread publishes a fresh
//! [`SceneSnapshot`] at the end of every delta phase; readers on other
//! threads hold a [`SnapshotReader`] and only ever see whole snapshots.

use std::sync::{Arc, RwLock};

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::actor::{ActorId, ActorInfo, Kinematics};
use crate::resources::configregistry::ConfigRef;
use crate::resources::effects::EffectSnapshot;
use crate::resources::sceneclock::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub config: ConfigRef,
    pub translation: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub flags: u32,
    pub created: Timestamp,
    pub destroyed: Option<Timestamp>,
}

impl ActorSnapshot {
    pub fn capture(info: &ActorInfo, kinematics: &Kinematics) -> Self {
        Self {
            id: info.id,
            config: info.config.clone(),
            translation: kinematics.translation,
            rotation: kinematics.rotation,
            velocity: kinematics.velocity,
            flags: kinematics.flags,
            created: info.created,
            destroyed: info.destroyed,
        }
    }
}

/// Per-client update sent once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDelta {
    pub timestamp: Timestamp,
    /// Last input sequence the scene processed for this client.
    pub acknowledge: u32,
    pub ping: Timestamp,
    pub pawn: Option<ActorId>,
    /// Actors that are new to the client or changed since the last delta.
    pub updated: Vec<ActorSnapshot>,
    /// Actors the client knew about that are gone or out of interest.
    pub removed: Vec<ActorId>,
    pub effects: Vec<EffectSnapshot>,
}

impl SceneDelta {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && self.effects.is_empty()
    }
}

/// Whole-scene view published every tick, ordered by actor id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub timestamp: Timestamp,
    pub tick: u64,
    pub actors: Vec<ActorSnapshot>,
    pub effects: Vec<EffectSnapshot>,
}

type SharedSnapshot = Arc<RwLock<Arc<SceneSnapshot>>>;

/// Write side of the published snapshot, owned by the world.
#[derive(Resource, Default)]
pub struct SnapshotBoard {
    latest: SharedSnapshot,
}

impl SnapshotBoard {
    pub fn publish(&self, snapshot: SceneSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.latest.write() {
            Ok(mut slot) => *slot = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            latest: Arc::clone(&self.latest),
        }
    }
}

/// Cloneable read handle, safe to move to any thread.
#[derive(Clone)]
pub struct SnapshotReader {
    latest: SharedSnapshot,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<SceneSnapshot> {
        match self.latest.read() {
            Ok(slot) => Arc::clone(&slot),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_sees_latest_publication() {
        let board = SnapshotBoard::default();
        let reader = board.reader();
        assert_eq!(reader.latest().tick, 0);
        board.publish(SceneSnapshot {
            timestamp: 100,
            tick: 2,
            ..SceneSnapshot::default()
        });
        let seen = reader.clone().latest();
        assert_eq!((seen.timestamp, seen.tick), (100, 2));
    }

    #[test]
    fn delta_serializes_to_json() {
        let delta = SceneDelta {
            timestamp: 50,
            acknowledge: 3,
            ping: 12,
            pawn: Some(ActorId(1)),
            updated: vec![],
            removed: vec![ActorId(2)],
            effects: vec![],
        };
        let json = serde_json::to_string(&delta).unwrap();
        assert!(json.contains("\"removed\":[2]"));
        assert!(!delta.is_empty());
    }
}

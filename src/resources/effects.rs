//! One-tick effects.
//!
//! An effect is a fire-and-forget event with a position and a shape, such
//! as an explosion or a sound cue. Effects live only in the tick they were
//! fired in; the list is cleared at the end of every tick.

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::resources::configregistry::ConfigRef;
use crate::resources::sceneclock::Timestamp;
use crate::shapes::{Rect, Shape};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EffectHandle(pub u32);

#[derive(Debug, Clone)]
pub struct Effect {
    pub handle: EffectHandle,
    pub config: ConfigRef,
    pub translation: Vec2,
    pub rotation: f32,
    pub timestamp: Timestamp,
    /// Effect shape placed at its transform.
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    pub handle: EffectHandle,
    pub config: ConfigRef,
    pub translation: Vec2,
    pub rotation: f32,
    pub timestamp: Timestamp,
}

impl From<&Effect> for EffectSnapshot {
    fn from(effect: &Effect) -> Self {
        Self {
            handle: effect.handle,
            config: effect.config.clone(),
            translation: effect.translation,
            rotation: effect.rotation,
            timestamp: effect.timestamp,
        }
    }
}

/// Effects fired during the current tick, in firing order.
#[derive(Resource, Debug, Default)]
pub struct EffectsFired {
    next: u32,
    fired: Vec<Effect>,
}

impl EffectsFired {
    pub fn fire(
        &mut self,
        config: ConfigRef,
        translation: Vec2,
        rotation: f32,
        timestamp: Timestamp,
        shape: Shape,
    ) -> EffectHandle {
        self.next += 1;
        let handle = EffectHandle(self.next);
        self.fired.push(Effect {
            handle,
            config,
            translation,
            rotation,
            timestamp,
            shape,
        });
        handle
    }

    /// Effects whose shape bounds touch `bounds`.
    pub fn within(&self, bounds: &Rect) -> Vec<EffectSnapshot> {
        self.fired
            .iter()
            .filter(|e| e.shape.bounds().intersects(bounds))
            .map(EffectSnapshot::from)
            .collect()
    }

    pub fn all(&self) -> Vec<EffectSnapshot> {
        self.fired.iter().map(EffectSnapshot::from).collect()
    }

    pub fn clear(&mut self) {
        self.fired.clear();
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

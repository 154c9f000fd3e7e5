//! Actor advancement and collision resolution.
//!
//! [`advance`] is a pure function of its inputs: the same kinematics, shape,
//! elapsed time and environment always produce the same result, bit for
//! bit. The environment answers one question, how far the actor must be
//! pushed back to stop overlapping what it may not overlap.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::actor::{ActorId, Kinematics};
use crate::resources::actorregistry::{ActorRegistry, ActorSpace};
use crate::resources::configregistry::CollisionFlags;
use crate::resources::entryregistry::{EntryRegistry, StaticGeometry};
use crate::shapes::Shape;

pub trait Environment {
    /// Largest penetration of `shape` into anything `actor` collides with,
    /// as the vector to subtract from the actor's translation.
    fn penetration(&self, actor: ActorId, collision: &CollisionFlags, shape: &Shape) -> Vec2;
}

/// Integrates velocity over `elapsed` seconds and resolves the result
/// against the environment. Returns the actor's resolved world shape.
pub fn advance(
    kinematics: &mut Kinematics,
    local: &Shape,
    actor: ActorId,
    collision: &CollisionFlags,
    elapsed: f32,
    env: &impl Environment,
) -> Shape {
    kinematics.translation += kinematics.velocity * elapsed;
    let mut shape = local.transform(&kinematics.transform());

    let penetration = env.penetration(actor, collision, &shape);
    let collided = penetration != Vec2::ZERO;
    if collided {
        kinematics.translation -= penetration;
        shape = local.transform(&kinematics.transform());
    }
    kinematics.set_flag(Kinematics::MOVING, kinematics.velocity != Vec2::ZERO);
    kinematics.set_flag(Kinematics::COLLIDED, collided);
    shape
}

/// [`Environment`] over the scene's static geometry and active actors.
pub struct SceneEnvironment<'w> {
    geometry: &'w StaticGeometry,
    entries: &'w EntryRegistry,
    actors: &'w ActorSpace,
    registry: &'w ActorRegistry,
}

impl<'w> SceneEnvironment<'w> {
    pub fn new(world: &'w World) -> Self {
        Self {
            geometry: world.resource::<StaticGeometry>(),
            entries: world.resource::<EntryRegistry>(),
            actors: world.resource::<ActorSpace>(),
            registry: world.resource::<ActorRegistry>(),
        }
    }

    /// Whether `shape` overlaps anything `actor` collides with.
    pub fn collides(&self, actor: ActorId, shape: &Shape) -> bool {
        let Some(collision) = self.registry.get(actor).map(|r| r.collision) else {
            return false;
        };
        let blocked_by_geometry = self
            .geometry
            .0
            .intersecting(shape)
            .into_iter()
            .any(|key| collision.blocked_by(self.entries.collision_flags(key)));
        blocked_by_geometry
            || self
                .actors
                .0
                .intersecting(shape)
                .into_iter()
                .any(|other| other != actor && self.registry.can_collide(actor, other))
    }
}

impl Environment for SceneEnvironment<'_> {
    fn penetration(&self, actor: ActorId, collision: &CollisionFlags, shape: &Shape) -> Vec2 {
        let mut deepest = Vec2::ZERO;
        let mut consider = |other: &Shape| {
            let p = other.penetration(shape);
            if p.length_squared() > deepest.length_squared() {
                deepest = p;
            }
        };
        for key in self.geometry.0.intersecting(shape) {
            if !collision.blocked_by(self.entries.collision_flags(key)) {
                continue;
            }
            if let Some(other) = self.geometry.0.shape(key) {
                consider(other);
            }
        }
        for other in self.actors.0.intersecting(shape) {
            if other == actor || !self.registry.can_collide(actor, other) {
                continue;
            }
            if let Some(other_shape) = self.actors.0.shape(other) {
                consider(other_shape);
            }
        }
        deepest
    }
}

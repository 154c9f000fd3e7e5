//! Actor components.
//!
//! Every actor is one ECS entity carrying:
//! - [`ActorInfo`] – identity, configuration and lifecycle timestamps
//! - [`Kinematics`] – translation, rotation, velocity and state flags
//! - [`ActorShape`] – local collision shape and its current world placement
//! - [`Behavior`] – the logic instance created from the actor's config
//!
//! The entity is spawned by [`spawn_actor`](crate::systems::actors::spawn_actor)
//! and despawned by [`remove_actor`](crate::systems::actors::remove_actor).
//! Nothing else adds or removes these components.
//!
//! # Related
//!
//! - [`crate::resources::actorregistry::ActorRegistry`] – id allocation and lifecycle state
//! - [`crate::systems::movement::advance_actors`] – the phase that ticks and moves actors
//! - [`crate::resources::snapshots::ActorSnapshot`] – the copy handed to clients

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::logic::ActorLogic;
use crate::resources::configregistry::{ActorDescriptor, ConfigRef};
use crate::resources::sceneclock::Timestamp;
use crate::shapes::{Shape, Transform2D};

/// Scene-unique actor id. Allocated from 1 upwards and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and lifecycle of an actor.
///
/// # Fields
/// - `id` - Scene-unique id, also the key in every actor index
/// - `config` - Name the actor was spawned from
/// - `descriptor` - Compiled config shared by every actor of that name
/// - `created` - Activation time; the actor stays pending until then
/// - `destroyed` - Scheduled destruction time, if any
#[derive(Component, Debug, Clone)]
pub struct ActorInfo {
    pub id: ActorId,
    pub config: ConfigRef,
    pub descriptor: Arc<ActorDescriptor>,
    /// Simulation time at which the actor becomes active.
    pub created: Timestamp,
    /// Scheduled destruction time, once requested.
    pub destroyed: Option<Timestamp>,
}

/// Kinematic state advanced every tick.
///
/// Logic writes `velocity` (and may teleport through `translation`); the
/// advancer integrates it for mobile actors and records the outcome in
/// `flags`.
///
/// # Fields
/// - `translation` - World position of the shape's local origin
/// - `rotation` - Radians, counter-clockwise
/// - `velocity` - World units per second
/// - `flags` - [`Kinematics::MOVING`] and [`Kinematics::COLLIDED`] bits
///
/// # Example
/// ```ignore
/// let mut kin = Kinematics::new(Vec2::new(3.0, 4.0), 0.0);
/// kin.velocity = Vec2::new(10.0, 0.0);
/// if kin.is_set(Kinematics::COLLIDED) {
///     kin.velocity = -kin.velocity;
/// }
/// ```
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    pub translation: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub flags: u32,
}

impl Kinematics {
    /// Set while the actor has a non-zero velocity.
    pub const MOVING: u32 = 1 << 0;
    /// Set when the last advance had to push the actor out of something.
    pub const COLLIDED: u32 = 1 << 1;

    pub fn new(translation: Vec2, rotation: f32) -> Self {
        Self {
            translation,
            rotation,
            velocity: Vec2::ZERO,
            flags: 0,
        }
    }

    pub fn transform(&self) -> Transform2D {
        Transform2D::new(self.translation, self.rotation)
    }

    pub fn is_set(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// Collision shape in local space and its world placement.
///
/// `world` is recomputed only when the kinematics transform differs from
/// `transform`, so actors that stand still never re-transform their shape.
/// The same world shape is stored in the actor space and, if the actor owns
/// one, in its sensor.
#[derive(Component, Debug, Clone)]
pub struct ActorShape {
    pub local: Shape,
    pub world: Shape,
    /// Transform `world` was computed with.
    pub transform: Transform2D,
}

impl ActorShape {
    pub fn new(local: Shape, transform: Transform2D) -> Self {
        let world = local.transform(&transform);
        Self {
            local,
            world,
            transform,
        }
    }
}

/// Actor logic slot.
///
/// The logic is taken out while one of its callbacks runs and put back
/// afterwards (see [`with_actor_logic`](crate::systems::actors::with_actor_logic)).
/// A callback that reaches its own actor again finds the slot empty and
/// is skipped with a warning.
#[derive(Component)]
pub struct Behavior(pub Option<Box<dyn ActorLogic>>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_toggle_independently() {
        let mut kin = Kinematics::new(Vec2::ZERO, 0.0);
        kin.set_flag(Kinematics::MOVING, true);
        kin.set_flag(Kinematics::COLLIDED, true);
        kin.set_flag(Kinematics::MOVING, false);
        assert!(!kin.is_set(Kinematics::MOVING));
        assert!(kin.is_set(Kinematics::COLLIDED));
    }

    #[test]
    fn actor_shape_places_local_shape() {
        let shape = ActorShape::new(
            Shape::circle(Vec2::ZERO, 1.0),
            Transform2D::new(Vec2::new(3.0, 4.0), 0.0),
        );
        assert_eq!(shape.world.bounds().center(), Vec2::new(3.0, 4.0));
    }
}

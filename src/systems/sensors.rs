//! Sensor triggering.
//!
//! Intersection sensors are checked every time an active actor's shape
//! moves, and when it is activated. Interaction sensors are only checked
//! when logic interacts with a shape.
use bevy_ecs::prelude::*;

use crate::components::actor::ActorId;
use crate::events::sensor::SensorTriggered;
use crate::resources::logicmappings::LogicRef;
use crate::resources::sceneclock::Timestamp;
use crate::resources::sensors::{SensorKind, SensorRegistry};
use crate::shapes::Shape;
use crate::systems::actors::with_actor_logic;
use crate::systems::entries::with_entry_logic;

/// Fires every sensor of `kind` touching `shape` on behalf of `actor`.
///
/// Each owning logic gets its callback, then a [`SensorTriggered`] event is
/// raised. Sensors owned by `actor` itself are skipped, as are sensors
/// removed by an earlier callback in the same pass. Returns the number of
/// sensors fired.
pub fn trigger_sensors(
    world: &mut World,
    kind: SensorKind,
    timestamp: Timestamp,
    shape: &Shape,
    actor: ActorId,
) -> usize {
    let hits = world.resource::<SensorRegistry>().intersecting(kind, shape);
    let mut fired = 0;
    for (sensor, owner) in hits {
        if owner == LogicRef::Actor(actor) {
            continue;
        }
        if world.resource::<SensorRegistry>().get(sensor).is_none() {
            continue;
        }
        match owner {
            LogicRef::Entry(key) => {
                with_entry_logic(world, key, |logic, ctx| logic.triggered(ctx, actor));
            }
            LogicRef::Actor(owner_id) => {
                with_actor_logic(world, owner_id, |logic, ctx| {
                    logic.sensor_triggered(ctx, actor)
                });
            }
        }
        world.trigger(SensorTriggered {
            sensor,
            owner,
            kind,
            timestamp,
            actor,
        });
        fired += 1;
    }
    fired
}

pub fn trigger_intersection_sensors(
    world: &mut World,
    timestamp: Timestamp,
    shape: &Shape,
    actor: ActorId,
) -> usize {
    trigger_sensors(world, SensorKind::Intersection, timestamp, shape, actor)
}

pub fn trigger_interaction_sensors(
    world: &mut World,
    timestamp: Timestamp,
    shape: &Shape,
    actor: ActorId,
) -> usize {
    trigger_sensors(world, SensorKind::Interaction, timestamp, shape, actor)
}

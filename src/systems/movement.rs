//! The actor phase of the tick.
//!
//! Order inside the phase:
//! 1. pending actors whose time has come are activated
//! 2. due destructions run (`will_destroy`, `ActorDestroying`, removal)
//! 3. client input frames that are due are applied to their pawns
//! 4. every active actor, in spawn order, ticks its logic; mobile actors are
//!    advanced, then indices are updated and intersection sensors fire if
//!    the actor moved
//! 5. actors spawned during the phase at or before now are activated
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::actor::{ActorId, ActorShape, Kinematics};
use crate::events::actor::{ActorDestroying, RemovalReason};
use crate::resources::actorregistry::{ActorRegistry, ActorState};
use crate::resources::clients::ClientLiaisons;
use crate::resources::sceneclock::{SceneClock, Timestamp};
use crate::shapes::Shape;
use crate::systems::actors::{activate_due_actors, remove_actor, sync_actor_shape, with_actor_logic};
use crate::systems::advancer::{SceneEnvironment, advance};
use crate::systems::sensors::trigger_intersection_sensors;

pub fn advance_actors(world: &mut World) {
    let (now, elapsed) = {
        let clock = world.resource::<SceneClock>();
        (clock.timestamp, clock.delta_seconds())
    };

    activate_due_actors(world, now);
    run_due_destructions(world, now);
    apply_client_input(world, now);

    let ids = world.resource::<ActorRegistry>().active_ids();
    for id in ids {
        if !world.resource::<ActorRegistry>().is_active(id) {
            continue;
        }
        let mobile = with_actor_logic(world, id, |logic, ctx| {
            logic.tick(ctx);
            logic.is_mobile()
        })
        .unwrap_or(false);

        let resolved = if mobile {
            advance_actor(world, id, elapsed)
        } else {
            None
        };
        if let Some((shape, true)) = sync_actor_shape(world, id, resolved) {
            trigger_intersection_sensors(world, now, &shape, id);
        }
    }

    activate_due_actors(world, now);
}

fn run_due_destructions(world: &mut World, now: Timestamp) {
    let due = world.resource::<ActorRegistry>().due_for_destruction(now);
    for id in due {
        let Some(state) = world.resource::<ActorRegistry>().get(id).map(|r| r.state) else {
            continue;
        };
        match state {
            ActorState::Pending => {
                debug!("Actor {} destroyed before activation, dropping it", id);
                remove_actor(world, id, RemovalReason::Removed);
            }
            ActorState::Active => {
                with_actor_logic(world, id, |logic, ctx| logic.will_destroy(ctx));
                world.trigger(ActorDestroying { id, timestamp: now });
                remove_actor(world, id, RemovalReason::Destroyed);
            }
        }
    }
}

fn apply_client_input(world: &mut World, now: Timestamp) {
    let batches: Vec<_> = {
        let mut clients = world.resource_mut::<ClientLiaisons>();
        clients
            .clients
            .values_mut()
            .filter_map(|c| {
                let pawn = c.pawn?;
                let frames = c.take_due_frames(now);
                (!frames.is_empty()).then_some((pawn, frames))
            })
            .collect()
    };
    for (pawn, frames) in batches {
        for frame in frames {
            with_actor_logic(world, pawn, |logic, ctx| logic.apply_input(ctx, &frame));
        }
    }
}

/// Integrates and resolves one actor. Returns the resolved world shape.
fn advance_actor(world: &mut World, id: ActorId, elapsed: f32) -> Option<Shape> {
    let (entity, collision) = {
        let record = world.resource::<ActorRegistry>().get(id)?;
        (record.entity, record.collision)
    };
    let mut kinematics = *world.get::<Kinematics>(entity)?;
    let local = world.get::<ActorShape>(entity)?.local.clone();
    let shape = {
        let env = SceneEnvironment::new(world);
        advance(&mut kinematics, &local, id, &collision, elapsed, &env)
    };
    *world.get_mut::<Kinematics>(entity)? = kinematics;
    Some(shape)
}

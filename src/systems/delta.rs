//! Delta phase of the tick.
//!
//! Each client sees a square area of interest centered on its pawn, on its
//! target when it has no pawn, or on the origin otherwise. The client gets
//! the actors in that area that changed since its previous delta, the ids
//! of actors that left it, and the effects fired in it this tick. Finally a
//! whole-scene snapshot is published for external readers.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::components::actor::ActorId;
use crate::resources::clients::ClientLiaisons;
use crate::resources::effects::EffectsFired;
use crate::resources::sceneclock::SceneClock;
use crate::resources::snapshots::{SceneDelta, SceneSnapshot, SnapshotBoard};
use crate::shapes::Rect;
use crate::systems::actors::{actor_snapshots, all_actor_snapshots, lookup};
use crate::systems::effects::effects_fired;

pub fn dispatch_deltas(world: &mut World) {
    let (timestamp, tick) = {
        let clock = world.resource::<SceneClock>();
        (clock.timestamp, clock.tick_count)
    };

    let focus: Vec<_> = world
        .resource::<ClientLiaisons>()
        .clients
        .values()
        .map(|c| (c.id, c.pawn.or(c.target), c.interest_radius))
        .collect();

    for (client, followed, radius) in focus {
        let center = followed
            .and_then(|id| lookup(world, id))
            .map_or(Vec2::ZERO, |s| s.translation);
        let interest = Rect::from_center(center, Vec2::splat(radius));
        let visible = actor_snapshots(world, &interest);
        let effects = effects_fired(world, &interest);

        let mut clients = world.resource_mut::<ClientLiaisons>();
        let Some(liaison) = clients.get_mut(client) else {
            continue;
        };
        let mut updated: Vec<_> = visible
            .values()
            .filter(|s| liaison.sent.get(&s.id) != Some(*s))
            .cloned()
            .collect();
        updated.sort_by_key(|s| s.id);
        let mut removed: Vec<ActorId> = liaison
            .sent
            .keys()
            .filter(|id| !visible.contains_key(*id))
            .copied()
            .collect();
        removed.sort();

        let delta = SceneDelta {
            timestamp,
            acknowledge: liaison.last_ack,
            ping: liaison.ping,
            pawn: liaison.pawn,
            updated,
            removed,
            effects,
        };
        if liaison.sink.send(delta).is_err() {
            debug!("Client {} is not listening for deltas", client);
        }
        liaison.sent = visible;
    }

    let snapshot = SceneSnapshot {
        timestamp,
        tick,
        actors: all_actor_snapshots(world),
        effects: world.resource::<EffectsFired>().all(),
    };
    world.resource::<SnapshotBoard>().publish(snapshot);
}

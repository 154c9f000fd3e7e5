//! Client lifecycle and input, applied on the tick thread.
//!
//! These run inside work closures posted by the session layer through
//! [`WorkSender`](crate::resources::workqueue::WorkSender).

use bevy_ecs::prelude::*;
use crossbeam_channel::Sender;
use glam::Vec2;
use log::{info, warn};

use crate::components::actor::ActorId;
use crate::error::SceneError;
use crate::events::actor::RemovalReason;
use crate::resources::clients::{ClientId, ClientLiaison, ClientLiaisons, InputFrame};
use crate::resources::entryregistry::{EntryKey, EntryRegistry};
use crate::resources::logicmappings::{LogicMappings, LogicRef};
use crate::resources::sceneclock::{SceneClock, Timestamp};
use crate::resources::snapshots::SceneDelta;
use crate::systems::actors::{remove_actor, spawn_actor};

/// Remembers the portal the client is about to arrive by.
pub fn body_entering(world: &mut World, client: ClientId, portal: EntryKey) {
    world
        .resource_mut::<ClientLiaisons>()
        .entering
        .insert(client, portal);
}

/// Connects a client. If a pawn config is set, the client's pawn is spawned
/// at the next tick, at its entering portal or at a random default
/// entrance. Returns the pawn id, if one was spawned.
///
/// A client that enters again while connected gets a fresh liaison; the
/// pawn of its previous one is removed first.
pub fn body_entered(
    world: &mut World,
    client: ClientId,
    sink: Sender<SceneDelta>,
) -> Option<ActorId> {
    let (previous, portal, pawn_config, radius) = {
        let mut clients = world.resource_mut::<ClientLiaisons>();
        let radius = clients.interest_radius;
        let previous = clients
            .clients
            .insert(client, ClientLiaison::new(client, sink, radius));
        let portal = clients.entering.remove(&client);
        (previous, portal, clients.pawn_config.clone(), radius)
    };
    if let Some(previous) = previous {
        warn!("Client {} entered twice, replacing its liaison", client);
        if let Some(pawn) = previous.pawn {
            remove_actor(world, pawn, RemovalReason::Removed);
        }
    }
    info!("Client {} entered (interest radius {})", client, radius);

    let config = pawn_config?;
    let (translation, rotation) = arrival_point(world, portal);
    let timestamp = world.resource::<SceneClock>().next_timestamp();
    let pawn = spawn_actor(world, &config, translation, rotation, timestamp).ok()?;
    if let Some(liaison) = world.resource_mut::<ClientLiaisons>().get_mut(client) {
        liaison.pawn = Some(pawn);
    }
    info!("Client {} controls pawn {}", client, pawn);
    Some(pawn)
}

fn arrival_point(world: &mut World, portal: Option<EntryKey>) -> (Vec2, f32) {
    if let Some(key) = portal {
        match world.resource::<EntryRegistry>().get(key) {
            Some(record) => return (record.entry.translation, record.entry.rotation),
            None => warn!("Missing portal entry {}, using a default entrance", key),
        }
    }
    let entrances: Vec<EntryKey> = world
        .resource::<LogicMappings>()
        .default_entrances()
        .iter()
        .filter_map(|l| match l {
            LogicRef::Entry(key) => Some(*key),
            LogicRef::Actor(_) => None,
        })
        .collect();
    if entrances.is_empty() {
        return (Vec2::ZERO, 0.0);
    }
    let pick = world
        .resource_mut::<ClientLiaisons>()
        .rng
        .usize(..entrances.len());
    world
        .resource::<EntryRegistry>()
        .get(entrances[pick])
        .map_or((Vec2::ZERO, 0.0), |r| (r.entry.translation, r.entry.rotation))
}

/// Disconnects a client and removes its pawn without a destruction notice.
pub fn body_left(world: &mut World, client: ClientId) -> Result<(), SceneError> {
    let liaison = {
        let mut clients = world.resource_mut::<ClientLiaisons>();
        clients.entering.remove(&client);
        clients.clients.remove(&client)
    };
    let Some(liaison) = liaison else {
        warn!("Unknown client {} left", client);
        return Err(SceneError::UnknownClient(client));
    };
    if let Some(pawn) = liaison.pawn {
        remove_actor(world, pawn, RemovalReason::Removed);
    }
    info!("Client {} left", client);
    Ok(())
}

/// Queues input frames for the client's pawn and updates its ping estimate.
pub fn enqueue_input(
    world: &mut World,
    client: ClientId,
    ack: u32,
    smoothed_time: Timestamp,
    frames: Vec<InputFrame>,
) -> Result<(), SceneError> {
    let now = world.resource::<SceneClock>().now_timestamp();
    let mut clients = world.resource_mut::<ClientLiaisons>();
    let Some(liaison) = clients.get_mut(client) else {
        warn!("Input from unknown client {}", client);
        return Err(SceneError::UnknownClient(client));
    };
    liaison.last_ack = ack;
    liaison.ping = now - smoothed_time;
    liaison.pending.extend(frames);
    Ok(())
}

/// Makes a client without a pawn follow another client's pawn.
pub fn set_target(world: &mut World, client: ClientId, actor: ActorId) -> Result<(), SceneError> {
    let is_pawn = world
        .resource::<LogicMappings>()
        .is_instance_of(LogicRef::Actor(actor), "pawn");
    let mut clients = world.resource_mut::<ClientLiaisons>();
    let Some(liaison) = clients.get_mut(client) else {
        warn!("Target request from unknown client {}", client);
        return Err(SceneError::UnknownClient(client));
    };
    if liaison.pawn.is_some() {
        warn!("Client {} has a pawn and cannot follow actor {}", client, actor);
        return Err(SceneError::ClientHasPawn(client));
    }
    if !is_pawn {
        warn!("Client {} cannot follow actor {}: not a pawn", client, actor);
        return Err(SceneError::NotAPawn(actor));
    }
    liaison.target = Some(actor);
    Ok(())
}

//! Actor lifecycle events.
//!
//! Triggered by the actor systems with `world.trigger`, so observers run
//! immediately, before the triggering operation returns:
//!
//! - [`ActorAdded`] – right after spawn, while the actor is still pending
//! - [`ActorDestroying`] – when a scheduled destruction is reached, after
//!   the logic's `will_destroy` hook and before removal
//! - [`ActorRemoved`] – after the actor left every index and its entity
//!   was despawned
//!
//! # Example
//!
//! ```ignore
//! world.add_observer(|trigger: On<ActorRemoved>| {
//!     println!("actor {} is gone", trigger.event().id);
//! });
//! ```

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::actor::ActorId;
use crate::resources::clients::ClientLiaisons;
use crate::resources::configregistry::ConfigRef;
use crate::resources::sceneclock::Timestamp;

#[derive(Event, Debug, Clone, PartialEq)]
pub struct ActorAdded {
    pub id: ActorId,
    pub entity: Entity,
    pub config: ConfigRef,
    /// Time at which the actor becomes active.
    pub created: Timestamp,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorDestroying {
    pub id: ActorId,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Reached its scheduled destruction.
    Destroyed,
    /// Removed immediately, without a destruction notice.
    Removed,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorRemoved {
    pub id: ActorId,
    pub reason: RemovalReason,
}

pub fn log_actor_added(trigger: On<ActorAdded>) {
    let event = trigger.event();
    debug!(
        "Actor {} added from '{}', active at {}",
        event.id, event.config, event.created
    );
}

pub fn log_actor_removed(trigger: On<ActorRemoved>) {
    let event = trigger.event();
    debug!("Actor {} removed ({:?})", event.id, event.reason);
}

/// Drops client pawn and target references to a removed actor.
pub fn forget_removed_actor(trigger: On<ActorRemoved>, clients: Option<ResMut<ClientLiaisons>>) {
    if let Some(mut clients) = clients {
        clients.forget_actor(trigger.event().id);
    }
}

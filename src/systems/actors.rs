//! Actor lifecycle operations.
//!
//! Everything here takes the world by `&mut` and is called from the tick
//! phases, from work closures and from the [`Scene`](crate::scene::Scene)
//! facade. Index bookkeeping follows one rule: secondary indices (logic
//! mappings, actor space, sensors) are cleared before the registry record
//! and the entity are dropped.
//!
//! # Functions
//!
//! - [`spawn_actor`] – resolve config, build logic, register as pending
//! - [`activate_actor`] – insert into the actor space and run `activated`
//! - [`destroy_actor`] – schedule destruction
//! - [`remove_actor`] – drop the actor from every index immediately
//! - [`with_actor_logic`] – call into an actor's logic with a context
//! - [`process_logic_commands`] – apply commands queued by logic

use std::panic::{self, AssertUnwindSafe};

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;

use crate::components::actor::{ActorId, ActorInfo, ActorShape, Behavior, Kinematics};
use crate::error::SceneError;
use crate::events::actor::{ActorAdded, ActorRemoved, RemovalReason};
use crate::logic::{ActorContext, ActorLogic, LogicCmd};
use crate::resources::actorregistry::{ActorRecord, ActorRegistry, ActorSpace, ActorState};
use crate::resources::configregistry::{ConfigRef, ConfigRegistry};
use crate::resources::logicmappings::{LogicMappings, LogicRef};
use crate::resources::logicregistry::LogicRegistry;
use crate::resources::sceneclock::{SceneClock, Timestamp};
use crate::resources::sensors::SensorRegistry;
use crate::resources::snapshots::ActorSnapshot;
use crate::shapes::{Rect, Shape};
use crate::systems::{effects, panic_message, sensors};

/// Creates an actor that becomes active at `timestamp`.
///
/// Config resolution and logic construction happen before anything is
/// registered, so a failed spawn leaves no trace and consumes no id.
pub fn spawn_actor(
    world: &mut World,
    config: &ConfigRef,
    translation: Vec2,
    rotation: f32,
    timestamp: Timestamp,
) -> Result<ActorId, SceneError> {
    let descriptor = world.resource::<ConfigRegistry>().actor(config)?;
    let logic = world.resource::<LogicRegistry>().create_actor(&descriptor)?;
    let lineage = logic.lineage();
    let destroy_at = descriptor
        .lifespan_ms
        .map(|ms| timestamp.saturating_add(ms));

    let id = world.resource_mut::<ActorRegistry>().allocate_id();
    let kinematics = Kinematics::new(translation, rotation);
    let shape = ActorShape::new(descriptor.shape.clone(), kinematics.transform());
    let entity = world
        .spawn((
            ActorInfo {
                id,
                config: config.clone(),
                descriptor: descriptor.clone(),
                created: timestamp,
                destroyed: destroy_at,
            },
            kinematics,
            shape,
            Behavior(Some(logic)),
        ))
        .id();

    world.resource_mut::<ActorRegistry>().insert(
        id,
        ActorRecord {
            entity,
            state: ActorState::Pending,
            collision: descriptor.collision,
            created: timestamp,
            destroy_at,
            lineage,
            sensor: None,
        },
    );
    world
        .resource_mut::<LogicMappings>()
        .add(LogicRef::Actor(id), &descriptor.tags, lineage, false);

    debug!(
        "Spawned actor {} ('{}', {}) at {:?}, active at {}",
        id,
        config,
        lineage.first().copied().unwrap_or("actor"),
        translation,
        timestamp
    );
    world.trigger(ActorAdded {
        id,
        entity,
        config: config.clone(),
        created: timestamp,
    });
    Ok(id)
}

/// Moves a pending actor into the simulation.
pub fn activate_actor(world: &mut World, id: ActorId) {
    let timestamp = world.resource::<SceneClock>().timestamp;
    let Some(entity) = world
        .resource::<ActorRegistry>()
        .get(id)
        .filter(|r| r.state == ActorState::Pending)
        .map(|r| r.entity)
    else {
        return;
    };
    let Some((shape, sensor_kind)) = world.get::<ActorShape>(entity).and_then(|s| {
        let info = world.get::<ActorInfo>(entity)?;
        Some((s.world.clone(), info.descriptor.sensor))
    }) else {
        warn!("Actor {} has no entity to activate", id);
        return;
    };

    world
        .resource_mut::<ActorSpace>()
        .0
        .insert(id, shape.clone());
    let sensor = sensor_kind.map(|kind| {
        world
            .resource_mut::<SensorRegistry>()
            .add(kind, LogicRef::Actor(id), shape)
    });
    if let Some(record) = world.resource_mut::<ActorRegistry>().get_mut(id) {
        record.state = ActorState::Active;
        record.sensor = sensor;
    }
    debug!("Actor {} activated at {}", id, timestamp);

    with_actor_logic(world, id, |logic, ctx| logic.activated(ctx));
    if let Some((shape, _)) = sync_actor_shape(world, id, None) {
        sensors::trigger_intersection_sensors(world, timestamp, &shape, id);
    }
}

/// Activates every pending actor whose creation time has been reached.
pub fn activate_due_actors(world: &mut World, now: Timestamp) {
    let due = world.resource::<ActorRegistry>().due_for_activation(now);
    for id in due {
        activate_actor(world, id);
    }
}

/// Schedules destruction at `timestamp`. An earlier pending destruction
/// wins over a later one.
pub fn destroy_actor(world: &mut World, id: ActorId, timestamp: Timestamp) -> Result<(), SceneError> {
    let (entity, at) = {
        let mut registry = world.resource_mut::<ActorRegistry>();
        let Some(record) = registry.get_mut(id) else {
            warn!("Missing actor to destroy: {}", id);
            return Err(SceneError::UnknownActor(id));
        };
        let at = record.destroy_at.map_or(timestamp, |t| t.min(timestamp));
        record.destroy_at = Some(at);
        (record.entity, at)
    };
    if let Some(mut info) = world.get_mut::<ActorInfo>(entity) {
        info.destroyed = Some(at);
    }
    Ok(())
}

/// Removes an actor from every index and despawns it.
///
/// Returns `false` and logs a warning if the actor does not exist.
pub fn remove_actor(world: &mut World, id: ActorId, reason: RemovalReason) -> bool {
    let Some(record) = world.resource::<ActorRegistry>().get(id).cloned() else {
        warn!("Missing actor to remove: {}", id);
        return false;
    };
    let tags = world
        .get::<ActorInfo>(record.entity)
        .map(|info| info.descriptor.tags.clone())
        .unwrap_or_default();

    world
        .resource_mut::<LogicMappings>()
        .remove(LogicRef::Actor(id), &tags, record.lineage, false);
    world.resource_mut::<ActorSpace>().0.remove(id);
    if let Some(sensor) = record.sensor {
        world.resource_mut::<SensorRegistry>().remove(sensor);
    }
    world.resource_mut::<ActorRegistry>().remove(id);
    world.despawn(record.entity);

    debug!("Removed actor {} ({:?})", id, reason);
    world.trigger(ActorRemoved { id, reason });
    true
}

/// Runs `f` against the actor's logic with a fresh context.
///
/// The logic is taken out of its component for the duration of the call
/// and put back afterwards, together with any kinematics change. Commands
/// the logic queued are applied once it is back in place. A panic inside
/// the logic is logged and yields `None`.
pub fn with_actor_logic<R>(
    world: &mut World,
    id: ActorId,
    f: impl FnOnce(&mut dyn ActorLogic, &mut ActorContext) -> R,
) -> Option<R> {
    let entity = world.resource::<ActorRegistry>().get(id)?.entity;
    let (timestamp, elapsed) = {
        let clock = world.resource::<SceneClock>();
        (clock.timestamp, clock.delta_seconds())
    };
    let descriptor = world.get::<ActorInfo>(entity)?.descriptor.clone();
    let mut kinematics = *world.get::<Kinematics>(entity)?;
    let Some(mut logic) = world.get_mut::<Behavior>(entity)?.0.take() else {
        warn!("Logic of actor {} is already running", id);
        return None;
    };

    let mut commands = Vec::new();
    let outcome = {
        let mut ctx = ActorContext::new(
            id,
            timestamp,
            elapsed,
            &descriptor,
            &mut kinematics,
            &mut commands,
        );
        panic::catch_unwind(AssertUnwindSafe(|| f(logic.as_mut(), &mut ctx)))
    };

    if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        behavior.0 = Some(logic);
    }
    if let Some(mut kin) = world.get_mut::<Kinematics>(entity) {
        *kin = kinematics;
    }

    let outcome = match outcome {
        Ok(value) => Some(value),
        Err(payload) => {
            error!("Logic of actor {} panicked: {}", id, panic_message(&*payload));
            None
        }
    };
    process_logic_commands(world, commands);
    outcome
}

/// Applies commands queued by actor or entry logic, in order.
pub fn process_logic_commands(world: &mut World, commands: Vec<LogicCmd>) {
    for cmd in commands {
        match cmd {
            LogicCmd::SpawnActor {
                config,
                translation,
                rotation,
                timestamp,
            } => {
                if let Err(err) = spawn_actor(world, &config, translation, rotation, timestamp) {
                    warn!("Logic failed to spawn '{}': {}", config, err);
                }
            }
            LogicCmd::DestroyActor { id, timestamp } => {
                if let Err(err) = destroy_actor(world, id, timestamp) {
                    warn!("Logic failed to destroy actor {}: {}", id, err);
                }
            }
            LogicCmd::RemoveActor { id } => {
                if !remove_actor(world, id, RemovalReason::Removed) {
                    debug!("Logic asked to remove missing actor {}", id);
                }
            }
            LogicCmd::FireEffect {
                config,
                translation,
                rotation,
                timestamp,
            } => {
                if let Err(err) =
                    effects::fire_effect(world, &config, translation, rotation, timestamp)
                {
                    warn!("Logic failed to fire effect '{}': {}", config, err);
                }
            }
            LogicCmd::Interact {
                shape,
                actor,
                timestamp,
            } => {
                sensors::trigger_interaction_sensors(world, timestamp, &shape, actor);
            }
        }
    }
}

/// Brings the actor's world shape, actor-space element and sensor in line
/// with its kinematics.
///
/// `resolved` is a world shape already computed for the current transform.
/// Returns the world shape and whether the transform changed.
pub fn sync_actor_shape(
    world: &mut World,
    id: ActorId,
    resolved: Option<Shape>,
) -> Option<(Shape, bool)> {
    let (entity, active, sensor) = {
        let record = world.resource::<ActorRegistry>().get(id)?;
        (record.entity, record.state == ActorState::Active, record.sensor)
    };
    let transform = world.get::<Kinematics>(entity)?.transform();
    let (shape, moved) = {
        let mut actor_shape = world.get_mut::<ActorShape>(entity)?;
        let moved = actor_shape.transform != transform;
        if moved || resolved.is_some() {
            actor_shape.world = match resolved {
                Some(shape) => shape,
                None => actor_shape.local.transform(&transform),
            };
            actor_shape.transform = transform;
        }
        (actor_shape.world.clone(), moved)
    };
    if active && moved {
        world.resource_mut::<ActorSpace>().0.update(id, shape.clone());
        if let Some(sensor) = sensor {
            world
                .resource_mut::<SensorRegistry>()
                .update(sensor, shape.clone());
        }
    }
    Some((shape, moved))
}

pub fn lookup(world: &World, id: ActorId) -> Option<ActorSnapshot> {
    let entity = world.resource::<ActorRegistry>().get(id)?.entity;
    let info = world.get::<ActorInfo>(entity)?;
    let kinematics = world.get::<Kinematics>(entity)?;
    Some(ActorSnapshot::capture(info, kinematics))
}

/// Snapshots of the active actors whose shapes touch `bounds`.
pub fn actor_snapshots(world: &World, bounds: &Rect) -> FxHashMap<ActorId, ActorSnapshot> {
    world
        .resource::<ActorSpace>()
        .0
        .intersecting_rect(bounds)
        .into_iter()
        .filter_map(|id| lookup(world, id).map(|snapshot| (id, snapshot)))
        .collect()
}

/// Snapshots of every active actor, ordered by id.
pub fn all_actor_snapshots(world: &World) -> Vec<ActorSnapshot> {
    let mut ids = world.resource::<ActorRegistry>().active_ids();
    ids.sort();
    ids.into_iter().filter_map(|id| lookup(world, id)).collect()
}

pub fn log_population(world: &World) {
    let registry = world.resource::<ActorRegistry>();
    info!(
        "{} actors ({} active), last id {}",
        registry.len(),
        registry.active_ids().len(),
        registry.last_id()
    );
}

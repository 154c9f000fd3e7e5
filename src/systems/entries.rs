//! Scene model updates.
//!
//! Entries arrive from the scene document at startup and, later, from
//! whoever edits the scene. Adding an entry builds its logic, registers its
//! sensor and static geometry, and indexes the logic; removal undoes all of
//! it in reverse.

use std::panic::{self, AssertUnwindSafe};

use bevy_ecs::prelude::*;
use log::{debug, error, warn};

use crate::error::SceneError;
use crate::logic::{EntryContext, EntryLogic};
use crate::resources::configregistry::ConfigRegistry;
use crate::resources::entryregistry::{Entry, EntryKey, EntryRecord, EntryRegistry, StaticGeometry};
use crate::resources::logicmappings::{LogicMappings, LogicRef};
use crate::resources::logicregistry::LogicRegistry;
use crate::resources::sceneclock::SceneClock;
use crate::resources::sensors::SensorRegistry;
use crate::systems::actors::process_logic_commands;
use crate::systems::panic_message;

pub fn entry_added(world: &mut World, entry: Entry) -> Result<(), SceneError> {
    let key = entry.key;
    let descriptor = world.resource::<ConfigRegistry>().entry(&entry.config)?;
    let logic = match descriptor.logic.as_deref() {
        Some(kind) => Some(
            world
                .resource::<LogicRegistry>()
                .create_entry(kind, &descriptor)?,
        ),
        None => None,
    };
    if world.resource::<EntryRegistry>().contains(key) {
        warn!("Entry {} added twice, replacing it", key);
        entry_removed(world, key);
    }

    let shape = descriptor.shape.transform(&entry.transform());
    let lineage = logic.as_ref().map(|l| l.lineage()).unwrap_or(&[]);
    let default_entrance = logic.as_ref().is_some_and(|l| l.is_default_entrance());
    let sensor = descriptor.sensor.map(|kind| {
        world
            .resource_mut::<SensorRegistry>()
            .add(kind, LogicRef::Entry(key), shape.clone())
    });
    if descriptor.collision_flags != 0 {
        world
            .resource_mut::<StaticGeometry>()
            .0
            .insert(key, shape.clone());
    }
    if logic.is_some() {
        world.resource_mut::<LogicMappings>().add(
            LogicRef::Entry(key),
            &descriptor.tags,
            lineage,
            default_entrance,
        );
    }
    world.resource_mut::<EntryRegistry>().insert(EntryRecord {
        entry,
        descriptor,
        shape,
        logic,
        lineage,
        default_entrance,
        sensor,
    });
    debug!("Added entry {}", key);

    with_entry_logic(world, key, |logic, ctx| logic.added(ctx));
    Ok(())
}

/// Replaces an entry: the old one is removed before the new one is added.
pub fn entry_updated(world: &mut World, old: &Entry, new: Entry) -> Result<(), SceneError> {
    entry_removed(world, old.key);
    entry_added(world, new)
}

/// Returns `false` and logs a warning if no entry has `key`.
pub fn entry_removed(world: &mut World, key: EntryKey) -> bool {
    if !world.resource::<EntryRegistry>().contains(key) {
        warn!("Missing entry to remove: {}", key);
        return false;
    }
    with_entry_logic(world, key, |logic, ctx| logic.removed(ctx));

    let Some((tags, lineage, default_entrance, sensor, has_logic)) = world
        .resource::<EntryRegistry>()
        .get(key)
        .map(|r| {
            (
                r.descriptor.tags.clone(),
                r.lineage,
                r.default_entrance,
                r.sensor,
                r.logic.is_some(),
            )
        })
    else {
        return false;
    };
    if has_logic {
        world.resource_mut::<LogicMappings>().remove(
            LogicRef::Entry(key),
            &tags,
            lineage,
            default_entrance,
        );
    }
    if let Some(sensor) = sensor {
        world.resource_mut::<SensorRegistry>().remove(sensor);
    }
    world.resource_mut::<StaticGeometry>().0.remove(key);
    world.resource_mut::<EntryRegistry>().remove(key);
    debug!("Removed entry {}", key);
    true
}

/// Runs `f` against the entry's logic, if it has one. Panics are logged and
/// yield `None`; queued commands are applied afterwards.
pub fn with_entry_logic<R>(
    world: &mut World,
    key: EntryKey,
    f: impl FnOnce(&mut dyn EntryLogic, &mut EntryContext) -> R,
) -> Option<R> {
    let timestamp = world.resource::<SceneClock>().timestamp;
    let (mut logic, entry, descriptor) = {
        let mut registry = world.resource_mut::<EntryRegistry>();
        let record = registry.get_mut(key)?;
        let logic = record.logic.take()?;
        (logic, record.entry.clone(), record.descriptor.clone())
    };

    let mut commands = Vec::new();
    let outcome = {
        let mut ctx = EntryContext::new(timestamp, &entry, &descriptor, &mut commands);
        panic::catch_unwind(AssertUnwindSafe(|| f(logic.as_mut(), &mut ctx)))
    };
    if let Some(record) = world.resource_mut::<EntryRegistry>().get_mut(key) {
        record.logic = Some(logic);
    }

    let outcome = match outcome {
        Ok(value) => Some(value),
        Err(payload) => {
            error!("Logic of entry {} panicked: {}", key, panic_message(&*payload));
            None
        }
    };
    process_logic_commands(world, commands);
    outcome
}

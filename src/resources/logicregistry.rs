//! Logic factories keyed by kind name.
//!
//! Descriptors name their logic kind as a string. The registry maps each
//! kind to a factory that builds a fresh instance from the descriptor.
//! Hosts register their own kinds next to the built-in ones.

use bevy_ecs::prelude::Resource;
use log::warn;
use rustc_hash::FxHashMap;

use crate::error::SceneError;
use crate::logic::builtin::{BasicActor, Entrance, MobileActor, Pawn, Region, Switch, Wanderer};
use crate::logic::{ActorLogic, EntryLogic};
use crate::resources::configregistry::{ActorDescriptor, EntryDescriptor};

pub type ActorFactory =
    Box<dyn Fn(&ActorDescriptor) -> Result<Box<dyn ActorLogic>, String> + Send + Sync>;
pub type EntryFactory =
    Box<dyn Fn(&EntryDescriptor) -> Result<Box<dyn EntryLogic>, String> + Send + Sync>;

#[derive(Resource, Default)]
pub struct LogicRegistry {
    actors: FxHashMap<String, ActorFactory>,
    entries: FxHashMap<String, EntryFactory>,
}

impl LogicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_actor("actor", |_| Ok(Box::new(BasicActor)));
        registry.register_actor("mobile", |_| Ok(Box::new(MobileActor)));
        registry.register_actor("pawn", |d| Ok(Box::new(Pawn::new(d))));
        registry.register_actor("wanderer", |d| Ok(Box::new(Wanderer::new(d))));
        registry.register_entry("entrance", |d| Ok(Box::new(Entrance::new(d))));
        registry.register_entry("region", |_| Ok(Box::new(Region::default())));
        registry.register_entry("switch", |_| Ok(Box::new(Switch::default())));
        registry
    }

    /// Registers or replaces the factory for an actor logic kind.
    pub fn register_actor<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&ActorDescriptor) -> Result<Box<dyn ActorLogic>, String> + Send + Sync + 'static,
    {
        self.actors.insert(kind.to_string(), Box::new(factory));
    }

    pub fn register_entry<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&EntryDescriptor) -> Result<Box<dyn EntryLogic>, String> + Send + Sync + 'static,
    {
        self.entries.insert(kind.to_string(), Box::new(factory));
    }

    pub fn create_actor(
        &self,
        descriptor: &ActorDescriptor,
    ) -> Result<Box<dyn ActorLogic>, SceneError> {
        let kind = descriptor.logic.as_str();
        let factory = self.actors.get(kind).ok_or_else(|| {
            failed(kind, &descriptor.name, "no factory registered".to_string())
        })?;
        factory(descriptor).map_err(|reason| failed(kind, &descriptor.name, reason))
    }

    pub fn create_entry(
        &self,
        kind: &str,
        descriptor: &EntryDescriptor,
    ) -> Result<Box<dyn EntryLogic>, SceneError> {
        let factory = self.entries.get(kind).ok_or_else(|| {
            failed(kind, &descriptor.name, "no factory registered".to_string())
        })?;
        factory(descriptor).map_err(|reason| failed(kind, &descriptor.name, reason))
    }
}

fn failed(kind: &str, config: &str, reason: String) -> SceneError {
    warn!(
        "Failed to instantiate logic '{}' for config '{}': {}",
        kind, config, reason
    );
    SceneError::LogicInstantiationFailed {
        kind: kind.to_string(),
        reason,
    }
}

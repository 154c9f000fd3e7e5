//! Actor and entry behavior.
//!
//! Logic never holds a reference to the world. Each callback receives a
//! context with the state it may change directly (its own kinematics) and a
//! command buffer for everything else. Commands are applied by
//! [`process_logic_commands`](crate::systems::actors::process_logic_commands)
//! as soon as the callback returns, in the order they were pushed.
//!
//! A logic reports its lineage, most specific kind first. The scene indexes
//! every kind in it, so a `pawn` is also found among the `mobile` and
//! `actor` instances.

pub mod builtin;

use glam::Vec2;

use crate::components::actor::{ActorId, Kinematics};
use crate::resources::clients::InputFrame;
use crate::resources::configregistry::{ActorDescriptor, ConfigRef, EntryDescriptor};
use crate::resources::entryregistry::{Entry, EntryKey};
use crate::resources::sceneclock::Timestamp;
use crate::shapes::Shape;

/// Deferred scene mutation requested by logic.
#[derive(Debug, Clone)]
pub enum LogicCmd {
    SpawnActor {
        config: ConfigRef,
        translation: Vec2,
        rotation: f32,
        timestamp: Timestamp,
    },
    DestroyActor {
        id: ActorId,
        timestamp: Timestamp,
    },
    RemoveActor {
        id: ActorId,
    },
    FireEffect {
        config: ConfigRef,
        translation: Vec2,
        rotation: f32,
        timestamp: Timestamp,
    },
    /// Fires interaction sensors touching `shape` on behalf of `actor`.
    Interact {
        shape: Shape,
        actor: ActorId,
        timestamp: Timestamp,
    },
}

pub struct ActorContext<'a> {
    pub id: ActorId,
    pub timestamp: Timestamp,
    /// Seconds covered by the current tick.
    pub elapsed: f32,
    pub descriptor: &'a ActorDescriptor,
    pub kinematics: &'a mut Kinematics,
    commands: &'a mut Vec<LogicCmd>,
}

impl<'a> ActorContext<'a> {
    pub fn new(
        id: ActorId,
        timestamp: Timestamp,
        elapsed: f32,
        descriptor: &'a ActorDescriptor,
        kinematics: &'a mut Kinematics,
        commands: &'a mut Vec<LogicCmd>,
    ) -> Self {
        Self {
            id,
            timestamp,
            elapsed,
            descriptor,
            kinematics,
            commands,
        }
    }

    pub fn spawn(&mut self, config: impl Into<ConfigRef>, translation: Vec2, rotation: f32) {
        self.commands.push(LogicCmd::SpawnActor {
            config: config.into(),
            translation,
            rotation,
            timestamp: self.timestamp,
        });
    }

    /// Schedules destruction of this actor at `timestamp`.
    pub fn destroy_at(&mut self, timestamp: Timestamp) {
        self.commands.push(LogicCmd::DestroyActor {
            id: self.id,
            timestamp,
        });
    }

    pub fn fire_effect(&mut self, config: impl Into<ConfigRef>, translation: Vec2, rotation: f32) {
        self.commands.push(LogicCmd::FireEffect {
            config: config.into(),
            translation,
            rotation,
            timestamp: self.timestamp,
        });
    }

    pub fn interact(&mut self, shape: Shape) {
        self.commands.push(LogicCmd::Interact {
            shape,
            actor: self.id,
            timestamp: self.timestamp,
        });
    }
}

pub trait ActorLogic: Send + Sync + 'static {
    /// Kinds this logic is an instance of, most specific first.
    fn lineage(&self) -> &'static [&'static str];

    fn kind(&self) -> &'static str {
        self.lineage().first().copied().unwrap_or("actor")
    }

    /// Whether the advancer integrates and resolves this actor's motion.
    fn is_mobile(&self) -> bool {
        false
    }

    /// Called once, in the tick the actor becomes active.
    fn activated(&mut self, _ctx: &mut ActorContext) {}

    fn tick(&mut self, _ctx: &mut ActorContext) {}

    /// Called for each client input frame addressed to this actor.
    fn apply_input(&mut self, _ctx: &mut ActorContext, _frame: &InputFrame) {}

    /// A sensor owned by this actor was triggered by `actor`.
    fn sensor_triggered(&mut self, _ctx: &mut ActorContext, _actor: ActorId) {}

    /// Last callback before a scheduled destruction removes the actor.
    fn will_destroy(&mut self, _ctx: &mut ActorContext) {}
}

pub struct EntryContext<'a> {
    pub key: EntryKey,
    pub timestamp: Timestamp,
    pub entry: &'a Entry,
    pub descriptor: &'a EntryDescriptor,
    commands: &'a mut Vec<LogicCmd>,
}

impl<'a> EntryContext<'a> {
    pub fn new(
        timestamp: Timestamp,
        entry: &'a Entry,
        descriptor: &'a EntryDescriptor,
        commands: &'a mut Vec<LogicCmd>,
    ) -> Self {
        Self {
            key: entry.key,
            timestamp,
            entry,
            descriptor,
            commands,
        }
    }

    pub fn spawn(&mut self, config: impl Into<ConfigRef>, translation: Vec2, rotation: f32) {
        self.commands.push(LogicCmd::SpawnActor {
            config: config.into(),
            translation,
            rotation,
            timestamp: self.timestamp,
        });
    }

    pub fn fire_effect(&mut self, config: impl Into<ConfigRef>, translation: Vec2, rotation: f32) {
        self.commands.push(LogicCmd::FireEffect {
            config: config.into(),
            translation,
            rotation,
            timestamp: self.timestamp,
        });
    }

    pub fn destroy_actor(&mut self, id: ActorId) {
        self.commands.push(LogicCmd::DestroyActor {
            id,
            timestamp: self.timestamp,
        });
    }

    pub fn remove_actor(&mut self, id: ActorId) {
        self.commands.push(LogicCmd::RemoveActor { id });
    }
}

pub trait EntryLogic: Send + Sync + 'static {
    fn lineage(&self) -> &'static [&'static str];

    fn kind(&self) -> &'static str {
        self.lineage().first().copied().unwrap_or("entry")
    }

    /// Whether clients without a portal may arrive at this entry.
    fn is_default_entrance(&self) -> bool {
        false
    }

    fn added(&mut self, _ctx: &mut EntryContext) {}

    /// The entry's sensor was triggered by `actor`.
    fn triggered(&mut self, _ctx: &mut EntryContext, _actor: ActorId) {}

    fn removed(&mut self, _ctx: &mut EntryContext) {}
}

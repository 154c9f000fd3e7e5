//! Scene facade.
//!
//! [`Scene`] owns the world and the tick schedule. It is the entry point
//! for hosts: build it from a [`SceneConfig`] and a descriptor registry,
//! populate it with entries, hand [`WorkSender`]s and [`SnapshotReader`]s
//! to other threads, then drive it with [`Scene::run_until`] or one tick at
//! a time.
//!
//! # Example
//!
//! ```ignore
//! let mut scene = Scene::new(&config, registry, LogicRegistry::with_builtins());
//! scene.populate(document.layout());
//! let id = scene.spawn_actor(&"ball".into(), Vec2::ZERO, 0.0, 0)?;
//! scene.tick_elapsed(50);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::components::actor::ActorId;
use crate::error::SceneError;
use crate::events::actor::{
    RemovalReason, forget_removed_actor, log_actor_added, log_actor_removed,
};
use crate::events::sensor::log_sensor_triggered;
use crate::resources::actorregistry::{ActorRegistry, ActorSpace};
use crate::resources::clients::ClientLiaisons;
use crate::resources::configregistry::{ConfigRef, ConfigRegistry, SceneDocument};
use crate::resources::effects::{EffectHandle, EffectSnapshot, EffectsFired};
use crate::resources::entryregistry::{Entry, EntryKey, EntryRegistry, StaticGeometry};
use crate::resources::logicmappings::{LogicMappings, LogicRef};
use crate::resources::logicregistry::LogicRegistry;
use crate::resources::participants::{ParticipantId, TickParticipant, TickParticipants};
use crate::resources::sceneclock::{SceneClock, Timestamp};
use crate::resources::sceneconfig::SceneConfig;
use crate::resources::sensors::{SensorId, SensorKind, SensorRegistry};
use crate::resources::snapshots::{ActorSnapshot, SnapshotBoard, SnapshotReader};
use crate::resources::workqueue::{WorkQueue, WorkSender};
use crate::shapes::{Ray, Rect, Shape};
use crate::systems::advancer::SceneEnvironment;
use crate::systems::time::update_scene_clock;
use crate::systems::{actors, build_tick_schedule, effects, entries, sensors};

pub struct Scene {
    world: World,
    schedule: Schedule,
    sender: WorkSender,
    reader: SnapshotReader,
}

impl Scene {
    pub fn new(config: &SceneConfig, configs: ConfigRegistry, logics: LogicRegistry) -> Self {
        let mut world = World::new();
        world.insert_resource(SceneClock::new(config.tick_interval_ms));
        world.insert_resource(configs);
        world.insert_resource(logics);
        world.init_resource::<ActorRegistry>();
        world.insert_resource(ActorSpace::new(config.cell_size, config.depth));
        world.init_resource::<LogicMappings>();
        world.init_resource::<EntryRegistry>();
        world.insert_resource(StaticGeometry::new(config.cell_size, config.depth));
        world.insert_resource(SensorRegistry::new(config.cell_size, config.depth));
        world.init_resource::<EffectsFired>();
        world.init_resource::<WorkQueue>();
        world.init_resource::<TickParticipants>();
        world.insert_resource(ClientLiaisons::new(
            config.pawn.clone().map(ConfigRef::from),
            config.interest_radius,
            config.entrance_seed,
        ));
        world.init_resource::<SnapshotBoard>();

        world.spawn(Observer::new(log_actor_added));
        world.spawn(Observer::new(log_actor_removed));
        world.spawn(Observer::new(forget_removed_actor));
        world.spawn(Observer::new(log_sensor_triggered));
        // Observers must exist before the first operation triggers events.
        world.flush();

        let sender = world.resource::<WorkQueue>().sender();
        let reader = world.resource::<SnapshotBoard>().reader();
        info!(
            "Scene created: tick {}ms, cells {} x {} levels",
            config.tick_interval_ms, config.cell_size, config.depth
        );
        Self {
            world,
            schedule: build_tick_schedule(),
            sender,
            reader,
        }
    }

    /// Builds a scene from a scene document and adds its entries.
    pub fn from_document(
        config: &SceneConfig,
        document: &SceneDocument,
        logics: LogicRegistry,
    ) -> Result<Self, String> {
        let configs = ConfigRegistry::from_document(document)?;
        let mut scene = Self::new(config, configs, logics);
        scene.populate(document.layout());
        Ok(scene)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn sender(&self) -> WorkSender {
        self.sender.clone()
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.world.resource::<SceneClock>().timestamp
    }

    pub fn tick_count(&self) -> u64 {
        self.world.resource::<SceneClock>().tick_count
    }

    // --- ticking -------------------------------------------------------

    /// Runs one tick covering the wall time since the previous one.
    pub fn tick(&mut self) {
        let elapsed = {
            let clock = self.world.resource::<SceneClock>();
            clock
                .last_tick
                .map(|at| at.elapsed().as_millis() as Timestamp)
                .unwrap_or(clock.tick_interval as Timestamp)
        };
        self.tick_elapsed(elapsed);
    }

    /// Runs one tick covering exactly `elapsed_ms` of simulation time.
    pub fn tick_elapsed(&mut self, elapsed_ms: Timestamp) {
        update_scene_clock(&mut self.world, elapsed_ms);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Runs `ticks` ticks paced at the tick interval.
    pub fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.paced_tick();
        }
    }

    /// Runs paced ticks until `stop` is set.
    pub fn run_until(&mut self, stop: &AtomicBool) {
        info!(
            "Running at {} ticks per second",
            self.world.resource::<SceneClock>().ticks_per_second()
        );
        while !stop.load(Ordering::Relaxed) {
            self.paced_tick();
        }
        info!("Stopped after {} ticks", self.tick_count());
    }

    fn paced_tick(&mut self) {
        let started = Instant::now();
        self.tick();
        let interval = Duration::from_millis(self.world.resource::<SceneClock>().tick_interval as u64);
        let spent = started.elapsed();
        if spent < interval {
            thread::sleep(interval - spent);
        } else {
            warn!("Tick overran its interval: {:?}", spent);
        }
    }

    // --- actors --------------------------------------------------------

    pub fn spawn_actor(
        &mut self,
        config: &ConfigRef,
        translation: Vec2,
        rotation: f32,
        timestamp: Timestamp,
    ) -> Result<ActorId, SceneError> {
        actors::spawn_actor(&mut self.world, config, translation, rotation, timestamp)
    }

    pub fn destroy_actor(&mut self, id: ActorId, timestamp: Timestamp) -> Result<(), SceneError> {
        actors::destroy_actor(&mut self.world, id, timestamp)
    }

    /// Removes the actor immediately, without a destruction notice.
    pub fn remove_actor(&mut self, id: ActorId) -> bool {
        actors::remove_actor(&mut self.world, id, RemovalReason::Removed)
    }

    pub fn lookup(&self, id: ActorId) -> Option<ActorSnapshot> {
        actors::lookup(&self.world, id)
    }

    pub fn actor_snapshots(&self, bounds: &Rect) -> FxHashMap<ActorId, ActorSnapshot> {
        actors::actor_snapshots(&self.world, bounds)
    }

    pub fn tagged_with(&self, tag: &str) -> Vec<LogicRef> {
        self.world.resource::<LogicMappings>().tagged(tag).to_vec()
    }

    pub fn instances_of(&self, kind: &str) -> Vec<LogicRef> {
        self.world.resource::<LogicMappings>().instances_of(kind).to_vec()
    }

    pub fn actor_count(&self) -> usize {
        self.world.resource::<ActorRegistry>().len()
    }

    /// Whether `shape` would overlap anything `actor` collides with.
    pub fn collides(&self, actor: ActorId, shape: &Shape) -> bool {
        SceneEnvironment::new(&self.world).collides(actor, shape)
    }

    /// Nearest active actor hit by `ray`, and the hit point.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<(ActorId, Vec2)> {
        self.world.resource::<ActorSpace>().0.ray_intersection(ray)
    }

    // --- effects -------------------------------------------------------

    pub fn fire_effect(
        &mut self,
        config: &ConfigRef,
        translation: Vec2,
        rotation: f32,
        timestamp: Timestamp,
    ) -> Result<EffectHandle, SceneError> {
        effects::fire_effect(&mut self.world, config, translation, rotation, timestamp)
    }

    pub fn effects_fired(&self, bounds: &Rect) -> Vec<EffectSnapshot> {
        effects::effects_fired(&self.world, bounds)
    }

    // --- sensors -------------------------------------------------------

    pub fn add_sensor(&mut self, kind: SensorKind, owner: LogicRef, shape: Shape) -> SensorId {
        self.world
            .resource_mut::<SensorRegistry>()
            .add(kind, owner, shape)
    }

    pub fn remove_sensor(&mut self, id: SensorId) -> bool {
        self.world
            .resource_mut::<SensorRegistry>()
            .remove(id)
            .is_some()
    }

    pub fn trigger_sensors(
        &mut self,
        kind: SensorKind,
        timestamp: Timestamp,
        shape: &Shape,
        actor: ActorId,
    ) -> usize {
        sensors::trigger_sensors(&mut self.world, kind, timestamp, shape, actor)
    }

    // --- participants --------------------------------------------------

    pub fn add_tick_participant(
        &mut self,
        participant: impl TickParticipant + 'static,
    ) -> ParticipantId {
        self.world
            .resource_mut::<TickParticipants>()
            .add(participant)
    }

    pub fn remove_tick_participant(&mut self, id: ParticipantId) -> bool {
        self.world.resource_mut::<TickParticipants>().remove(id)
    }

    // --- scene model ---------------------------------------------------

    /// Adds entries in order. Entries that fail to resolve are skipped.
    pub fn populate(&mut self, layout: impl IntoIterator<Item = Entry>) {
        let mut added = 0;
        for entry in layout {
            if entries::entry_added(&mut self.world, entry).is_ok() {
                added += 1;
            }
        }
        info!("Populated scene with {} entries", added);
    }

    pub fn entry_added(&mut self, entry: Entry) -> Result<(), SceneError> {
        entries::entry_added(&mut self.world, entry)
    }

    pub fn entry_updated(&mut self, old: &Entry, new: Entry) -> Result<(), SceneError> {
        entries::entry_updated(&mut self.world, old, new)
    }

    pub fn entry_removed(&mut self, key: EntryKey) -> bool {
        entries::entry_removed(&mut self.world, key)
    }

    pub fn client_count(&self) -> usize {
        self.world.resource::<ClientLiaisons>().len()
    }
}

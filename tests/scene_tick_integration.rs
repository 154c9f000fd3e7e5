//! Scene tick integration tests: actor lifecycle, collision, effects,
//! participants and the work queue, driven through whole ticks.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;
use glam::Vec2;

use tickscene::Scene;
use tickscene::SceneError;
use tickscene::components::actor::{ActorId, Kinematics};
use tickscene::events::actor::{ActorDestroying, ActorRemoved};
use tickscene::resources::actorregistry::{ActorRegistry, ActorSpace};
use tickscene::resources::configregistry::{ConfigRegistry, SceneDocument};
use tickscene::resources::entryregistry::{Entry, EntryKey, StaticGeometry};
use tickscene::resources::logicmappings::{LogicMappings, LogicRef};
use tickscene::resources::logicregistry::LogicRegistry;
use tickscene::resources::participants::{ParticipantId, TickFlow, TickParticipants};
use tickscene::resources::sceneclock::Timestamp;
use tickscene::resources::sceneconfig::SceneConfig;
use tickscene::resources::sensors::SensorRegistry;
use tickscene::shapes::{Ray, Rect, Shape};
use tickscene::systems::effects::{effects_fired, fire_effect};

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

const DOC: &str = r#"{
    "actors": {
        "ball": { "logic": "mobile", "shape": { "type": "circle", "radius": 1 },
                  "collision": { "flags": 1, "mask": 2 }, "tags": ["ball"] },
        "rock": { "logic": "actor", "shape": { "type": "circle", "radius": 1 } },
        "broken": { "logic": "nope" },
        "hero": { "logic": "pawn", "shape": { "type": "circle", "radius": 1 },
                  "tags": ["player"], "speed": 20 }
    },
    "effects": { "pop": { "shape": { "type": "circle", "radius": 2 } } },
    "entries": {
        "wall": { "shape": { "type": "rectangle", "width": 10, "height": 100 },
                  "collision_flags": 2 },
        "meadow": { "logic": "region", "sensor": "intersection", "tags": ["zone"],
                    "shape": { "type": "circle", "radius": 5 } }
    }
}"#;

fn make_scene() -> Scene {
    let document = SceneDocument::from_json(DOC).unwrap();
    let registry = ConfigRegistry::from_document(&document).unwrap();
    Scene::new(&SceneConfig::new(), registry, LogicRegistry::with_builtins())
}

fn everywhere() -> Rect {
    Rect::new(Vec2::splat(-1000.0), Vec2::splat(1000.0))
}

fn set_velocity(scene: &mut Scene, id: ActorId, velocity: Vec2) {
    let entity = scene.world().resource::<ActorRegistry>().get(id).unwrap().entity;
    scene
        .world_mut()
        .get_mut::<Kinematics>(entity)
        .unwrap()
        .velocity = velocity;
}

fn in_actor_space(scene: &Scene, id: ActorId) -> bool {
    let space = &scene.world().resource::<ActorSpace>().0;
    match space.shape(id) {
        Some(shape) => space.intersecting_rect(shape.bounds()).contains(&id),
        None => false,
    }
}

#[test]
fn actor_becomes_visible_at_its_creation_tick() {
    let mut scene = make_scene();
    scene.tick_elapsed(50);
    let now = scene.timestamp();
    let id = scene
        .spawn_actor(&"rock".into(), Vec2::ZERO, 0.0, now + 50)
        .unwrap();

    assert!(!scene.actor_snapshots(&everywhere()).contains_key(&id));
    assert!(!in_actor_space(&scene, id));

    scene.tick_elapsed(50);
    assert!(scene.actor_snapshots(&everywhere()).contains_key(&id));
    assert!(in_actor_space(&scene, id));

    assert!(scene.remove_actor(id));
    scene.tick_elapsed(50);
    assert!(!scene.actor_snapshots(&everywhere()).contains_key(&id));
    assert!(!in_actor_space(&scene, id));
    assert!(scene.lookup(id).is_none());
}

#[test]
fn scheduled_destruction_notifies_then_removes() {
    let mut scene = make_scene();
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);
    scene
        .world_mut()
        .add_observer(move |trigger: On<ActorDestroying>| {
            seen.lock().unwrap().push(format!("destroying {}", trigger.event().id));
        });
    let seen = Arc::clone(&events);
    scene
        .world_mut()
        .add_observer(move |trigger: On<ActorRemoved>| {
            let event = trigger.event();
            seen.lock()
                .unwrap()
                .push(format!("removed {} {:?}", event.id, event.reason));
        });

    scene.world_mut().flush();

    let active = scene.spawn_actor(&"rock".into(), Vec2::ZERO, 0.0, 0).unwrap();
    let pending = scene
        .spawn_actor(&"rock".into(), Vec2::ZERO, 0.0, 500)
        .unwrap();
    scene.tick_elapsed(50);
    scene.destroy_actor(active, 100).unwrap();
    scene.destroy_actor(pending, 100).unwrap();
    assert_eq!(scene.lookup(active).unwrap().destroyed, Some(100));

    scene.tick_elapsed(50);
    assert_eq!(scene.actor_count(), 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "destroying 1".to_string(),
            "removed 1 Destroyed".to_string(),
            "removed 2 Removed".to_string(),
        ]
    );
    assert_eq!(
        scene.destroy_actor(active, 200),
        Err(SceneError::UnknownActor(active))
    );
}

#[test]
fn lifespan_far_in_the_future_does_not_overflow() {
    let document = SceneDocument::from_json(
        r#"{ "actors": { "forever": { "lifespan_ms": 9223372036854775807 } } }"#,
    )
    .unwrap();
    let configs = ConfigRegistry::from_document(&document).unwrap();
    let mut scene = Scene::new(&SceneConfig::new(), configs, LogicRegistry::with_builtins());
    let id = scene
        .spawn_actor(&"forever".into(), Vec2::ZERO, 0.0, 100)
        .unwrap();
    assert_eq!(scene.lookup(id).unwrap().destroyed, Some(i64::MAX));
    scene.tick_elapsed(50);
    scene.tick_elapsed(50);
    assert!(scene.lookup(id).is_some());
}

#[test]
fn failed_spawns_leave_no_trace() {
    let mut scene = make_scene();
    assert_eq!(
        scene.spawn_actor(&"ghost".into(), Vec2::ZERO, 0.0, 0),
        Err(SceneError::ConfigUnresolved {
            kind: "actor",
            name: "ghost".to_string()
        })
    );
    assert!(matches!(
        scene.spawn_actor(&"broken".into(), Vec2::ZERO, 0.0, 0),
        Err(SceneError::LogicInstantiationFailed { .. })
    ));
    assert_eq!(scene.actor_count(), 0);
    assert!(scene.world().resource::<LogicMappings>().is_empty());
    let id = scene.spawn_actor(&"rock".into(), Vec2::ZERO, 0.0, 0).unwrap();
    assert_eq!(id, ActorId(1));
}

#[test]
fn actor_add_remove_round_trip_restores_indices() {
    let mut scene = make_scene();
    let id = scene.spawn_actor(&"hero".into(), Vec2::ZERO, 0.0, 0).unwrap();
    assert_eq!(scene.tagged_with("player"), vec![LogicRef::Actor(id)]);
    assert_eq!(scene.instances_of("mobile"), vec![LogicRef::Actor(id)]);
    scene.tick_elapsed(50);
    assert_eq!(
        scene.world().resource::<ActorSpace>().0.buckets_containing(id),
        scene.world().resource::<ActorSpace>().0.expected_cells(id).len()
    );

    assert!(scene.remove_actor(id));
    assert!(!scene.remove_actor(id));
    let world = scene.world();
    assert!(world.resource::<LogicMappings>().is_empty());
    assert!(world.resource::<ActorSpace>().0.is_empty());
    assert_eq!(world.resource::<ActorSpace>().0.buckets_containing(id), 0);
    assert!(world.resource::<ActorRegistry>().is_empty());
}

#[test]
fn entry_add_remove_round_trip_restores_indices() {
    let mut scene = make_scene();
    scene
        .entry_added(Entry::new(1, "wall", Vec2::new(10.0, 0.0), 0.0))
        .unwrap();
    scene
        .entry_added(Entry::new(2, "meadow", Vec2::new(-10.0, 0.0), 0.0))
        .unwrap();
    assert_eq!(scene.tagged_with("zone"), vec![LogicRef::Entry(EntryKey(2))]);
    assert_eq!(scene.world().resource::<SensorRegistry>().len(), 1);
    assert!(scene.world().resource::<StaticGeometry>().0.contains(EntryKey(1)));
    assert!(!scene.world().resource::<StaticGeometry>().0.contains(EntryKey(2)));

    assert!(scene.entry_removed(EntryKey(1)));
    assert!(scene.entry_removed(EntryKey(2)));
    assert!(!scene.entry_removed(EntryKey(2)));
    let world = scene.world();
    assert!(world.resource::<LogicMappings>().is_empty());
    assert!(world.resource::<SensorRegistry>().is_empty());
    assert!(world.resource::<SensorRegistry>().space().is_empty());
    assert!(world.resource::<StaticGeometry>().0.is_empty());
}

#[test]
fn entry_update_moves_static_geometry() {
    let mut scene = make_scene();
    let old = Entry::new(1, "wall", Vec2::new(10.0, 0.0), 0.0);
    scene.entry_added(old.clone()).unwrap();
    let new = Entry::new(1, "wall", Vec2::new(50.0, 0.0), 0.0);
    scene.entry_updated(&old, new).unwrap();
    let geometry = &scene.world().resource::<StaticGeometry>().0;
    assert_eq!(geometry.len(), 1);
    assert!(approx_eq(
        geometry.shape(EntryKey(1)).unwrap().bounds().center().x,
        50.0
    ));
}

#[test]
fn mobile_actor_is_stopped_by_static_geometry() {
    let mut scene = make_scene();
    scene
        .entry_added(Entry::new(1, "wall", Vec2::new(10.0, 0.0), 0.0))
        .unwrap();
    let id = scene.spawn_actor(&"ball".into(), Vec2::ZERO, 0.0, 0).unwrap();
    set_velocity(&mut scene, id, Vec2::new(100.0, 0.0));

    scene.tick_elapsed(50);
    let snapshot = scene.lookup(id).unwrap();
    assert!(approx_eq(snapshot.translation.x, 4.0));
    assert!(snapshot.flags & Kinematics::COLLIDED != 0);
    assert!(snapshot.flags & Kinematics::MOVING != 0);

    scene.tick_elapsed(50);
    let snapshot = scene.lookup(id).unwrap();
    assert!(approx_eq(snapshot.translation.x, 4.0));

    let touching = Shape::circle(Vec2::new(5.5, 0.0), 1.0);
    assert!(scene.collides(id, &touching));
    assert!(!scene.collides(id, &Shape::circle(Vec2::new(-5.0, 0.0), 1.0)));
}

#[test]
fn overlapping_walls_push_back_by_the_deepest_overlap() {
    let mut scene = make_scene();
    scene
        .entry_added(Entry::new(1, "wall", Vec2::new(10.0, 0.0), 0.0))
        .unwrap();
    scene
        .entry_added(Entry::new(2, "wall", Vec2::new(10.5, 0.0), 0.0))
        .unwrap();
    let id = scene.spawn_actor(&"ball".into(), Vec2::ZERO, 0.0, 0).unwrap();
    set_velocity(&mut scene, id, Vec2::new(100.0, 0.0));

    // overlaps of 1.0 and 0.5; adding them would leave the ball at 3.5
    scene.tick_elapsed(50);
    let snapshot = scene.lookup(id).unwrap();
    assert!(approx_eq(snapshot.translation.x, 4.0));
    assert!(approx_eq(snapshot.translation.y, 0.0));
    assert!(snapshot.flags & Kinematics::COLLIDED != 0);
}

#[test]
fn actors_only_collide_with_what_their_mask_selects() {
    let mut scene = make_scene();
    let ball = scene.spawn_actor(&"ball".into(), Vec2::ZERO, 0.0, 0).unwrap();
    scene
        .spawn_actor(&"rock".into(), Vec2::new(3.0, 0.0), 0.0, 0)
        .unwrap();
    set_velocity(&mut scene, ball, Vec2::new(40.0, 0.0));
    scene.tick_elapsed(50);
    // rocks carry no collision flags, so the ball passes through
    let snapshot = scene.lookup(ball).unwrap();
    assert!(approx_eq(snapshot.translation.x, 2.0));
    assert_eq!(snapshot.flags & Kinematics::COLLIDED, 0);
}

#[test]
fn ray_hits_the_nearest_actor() {
    let mut scene = make_scene();
    let near = scene.spawn_actor(&"rock".into(), Vec2::ZERO, 0.0, 0).unwrap();
    scene
        .spawn_actor(&"rock".into(), Vec2::new(10.0, 0.0), 0.0, 0)
        .unwrap();
    scene.tick_elapsed(50);
    let (hit, at) = scene
        .ray_intersection(&Ray::new(Vec2::new(-10.0, 0.0), Vec2::X))
        .unwrap();
    assert_eq!(hit, near);
    assert!(approx_eq(at.x, -1.0));
    assert!(approx_eq(at.y, 0.0));
}

#[test]
fn effects_last_exactly_one_tick() {
    let mut scene = make_scene();
    let counts = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&counts);
    scene.add_tick_participant(move |world: &mut World, timestamp: Timestamp| {
        if timestamp == 50 {
            fire_effect(world, &"pop".into(), Vec2::ZERO, 0.0, timestamp).unwrap();
        }
        let bounds = Rect::from_center(Vec2::ZERO, Vec2::splat(10.0));
        seen.lock().unwrap().push(effects_fired(world, &bounds).len());
        TickFlow::Continue
    });
    scene.tick_elapsed(50);
    scene.tick_elapsed(50);
    assert_eq!(*counts.lock().unwrap(), vec![1, 0]);

    assert!(scene.fire_effect(&"fizzle".into(), Vec2::ZERO, 0.0, 100).is_err());
    let far = Rect::from_center(Vec2::new(100.0, 0.0), Vec2::splat(10.0));
    scene.fire_effect(&"pop".into(), Vec2::ZERO, 0.0, 100).unwrap();
    assert!(scene.effects_fired(&far).is_empty());
    assert_eq!(scene.effects_fired(&everywhere()).len(), 1);
}

#[test]
fn participants_tick_in_order_and_stop() {
    let mut scene = make_scene();
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b", "c"] {
        let log = Arc::clone(&log);
        scene.add_tick_participant(move |_: &mut World, _: Timestamp| {
            log.lock().unwrap().push(name);
            if name == "b" { TickFlow::Stop } else { TickFlow::Continue }
        });
    }
    scene.tick_elapsed(50);
    scene.tick_elapsed(50);
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "a", "c"]);
    assert_eq!(scene.world().resource::<TickParticipants>().len(), 2);
}

#[test]
fn panicking_participant_is_isolated_and_kept() {
    let mut scene = make_scene();
    let ticks = Arc::new(Mutex::new(0));
    scene.add_tick_participant(|_: &mut World, _: Timestamp| -> TickFlow {
        panic!("participant failure");
    });
    let seen = Arc::clone(&ticks);
    scene.add_tick_participant(move |_: &mut World, _: Timestamp| {
        *seen.lock().unwrap() += 1;
        TickFlow::Continue
    });
    scene.tick_elapsed(50);
    scene.tick_elapsed(50);
    assert_eq!(*ticks.lock().unwrap(), 2);
    assert_eq!(scene.world().resource::<TickParticipants>().len(), 2);
}

#[test]
fn participants_added_or_removed_mid_pass() {
    let mut scene = make_scene();
    let log = Arc::new(Mutex::new(Vec::new()));
    let victim: Arc<Mutex<Option<ParticipantId>>> = Arc::new(Mutex::new(None));

    let (l, v) = (Arc::clone(&log), Arc::clone(&victim));
    scene.add_tick_participant(move |world: &mut World, timestamp: Timestamp| {
        l.lock().unwrap().push(format!("first@{}", timestamp));
        if timestamp == 50 {
            if let Some(id) = v.lock().unwrap().take() {
                world.resource_mut::<TickParticipants>().remove(id);
            }
            let late = Arc::clone(&l);
            world
                .resource_mut::<TickParticipants>()
                .add(move |_: &mut World, ts: Timestamp| {
                    late.lock().unwrap().push(format!("late@{}", ts));
                    TickFlow::Continue
                });
        }
        TickFlow::Continue
    });
    let l = Arc::clone(&log);
    let id = scene.add_tick_participant(move |_: &mut World, ts: Timestamp| {
        l.lock().unwrap().push(format!("victim@{}", ts));
        TickFlow::Continue
    });
    *victim.lock().unwrap() = Some(id);

    scene.tick_elapsed(50);
    scene.tick_elapsed(50);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first@50", "first@100", "late@100"]
    );
    assert!(!scene.remove_tick_participant(id));
}

#[test]
fn work_posted_while_draining_waits_for_the_next_tick() {
    #[derive(Resource, Default)]
    struct Marks(Vec<&'static str>);

    let mut scene = make_scene();
    scene.world_mut().init_resource::<Marks>();
    let sender = scene.sender();
    let again = scene.sender();
    sender.post(move |world| {
        world.resource_mut::<Marks>().0.push("first");
        again.post(|world| world.resource_mut::<Marks>().0.push("second"));
    });
    sender.post(|_| panic!("work failure"));
    sender.post(|world| world.resource_mut::<Marks>().0.push("after panic"));

    scene.tick_elapsed(50);
    assert_eq!(scene.world().resource::<Marks>().0, vec!["first", "after panic"]);
    scene.tick_elapsed(50);
    assert_eq!(
        scene.world().resource::<Marks>().0,
        vec!["first", "after panic", "second"]
    );
}

#[test]
fn published_snapshot_tracks_ticks() {
    let mut scene = make_scene();
    let reader = scene.reader();
    scene.spawn_actor(&"rock".into(), Vec2::new(1.0, 2.0), 0.0, 0).unwrap();
    scene.tick_elapsed(50);
    let snapshot = reader.latest();
    assert_eq!(snapshot.timestamp, 50);
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.actors.len(), 1);
    assert_eq!(snapshot.actors[0].translation, Vec2::new(1.0, 2.0));
    scene.tick_elapsed(-10);
    assert_eq!(reader.latest().timestamp, 50);
}

#[test]
fn removal_of_unknown_actor_is_reported() {
    let mut scene = make_scene();
    assert!(!scene.remove_actor(ActorId(42)));
    assert!(scene.lookup(ActorId(42)).is_none());
    assert_eq!(scene.actor_count(), 0);
}

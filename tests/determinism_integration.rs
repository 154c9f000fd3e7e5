//! Two scenes fed the same inputs must evolve identically.

use glam::Vec2;

use tickscene::Scene;
use tickscene::resources::configregistry::{ConfigRegistry, SceneDocument};
use tickscene::resources::logicregistry::LogicRegistry;
use tickscene::resources::sceneconfig::SceneConfig;
use tickscene::resources::snapshots::SceneSnapshot;

const DOC: &str = r#"{
    "actors": {
        "critter": { "logic": "wanderer", "speed": 12,
                     "shape": { "type": "circle", "radius": 1 },
                     "collision": { "flags": 1, "mask": 3 },
                     "wander": { "interval_ms": 150, "seed": 5 } }
    },
    "entries": {
        "pen": { "shape": { "type": "compound", "shapes": [
            { "type": "segment", "start": [-20, -20], "end": [20, -20] },
            { "type": "segment", "start": [20, -20], "end": [20, 20] },
            { "type": "segment", "start": [20, 20], "end": [-20, 20] },
            { "type": "segment", "start": [-20, 20], "end": [-20, -20] }
        ] }, "collision_flags": 2 }
    },
    "scene": [ { "key": 1, "config": "pen" } ]
}"#;

fn run() -> Vec<SceneSnapshot> {
    let document = SceneDocument::from_json(DOC).unwrap();
    let configs = ConfigRegistry::from_document(&document).unwrap();
    let mut scene = Scene::new(&SceneConfig::new(), configs, LogicRegistry::with_builtins());
    scene.populate(document.layout());
    for i in 0..6 {
        let at = Vec2::new(i as f32 * 5.0 - 12.0, (i % 3) as f32 * 4.0 - 4.0);
        scene.spawn_actor(&"critter".into(), at, 0.0, 0).unwrap();
    }
    let reader = scene.reader();
    (0..80)
        .map(|_| {
            scene.tick_elapsed(50);
            (*reader.latest()).clone()
        })
        .collect()
}

#[test]
fn identical_inputs_give_identical_snapshots() {
    let (a, b) = (run(), run());
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.timestamp, y.timestamp);
        assert_eq!(x.actors.len(), y.actors.len());
        for (p, q) in x.actors.iter().zip(&y.actors) {
            assert_eq!(p.id, q.id);
            assert_eq!(p.translation.x.to_bits(), q.translation.x.to_bits());
            assert_eq!(p.translation.y.to_bits(), q.translation.y.to_bits());
            assert_eq!(p.velocity.x.to_bits(), q.velocity.x.to_bits());
            assert_eq!(p.flags, q.flags);
        }
    }
    let last = a.last().unwrap();
    assert_eq!(last.actors.len(), 6);
    let first = &a[0];
    assert!(
        first
            .actors
            .iter()
            .zip(&last.actors)
            .any(|(start, end)| start.translation != end.translation)
    );
}

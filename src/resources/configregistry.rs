//! Behavior descriptor registry.
//!
//! Actor, effect and entry configurations are described in a JSON scene
//! document and compiled into immutable descriptors when registered. Shapes
//! are validated at that point, so a descriptor that resolves is always
//! usable. Lookups go through opaque [`ConfigRef`] names.
//!
//! # Document Format
//!
//! ```json
//! {
//!   "actors": {
//!     "hero": { "logic": "pawn", "shape": { "type": "circle", "radius": 8 },
//!               "collision": { "flags": 1, "mask": 3 }, "speed": 120 }
//!   },
//!   "effects": { "spark": { "shape": { "type": "circle", "radius": 16 } } },
//!   "entries": {
//!     "gate": { "logic": "entrance", "default_entrance": true,
//!               "shape": { "type": "rectangle", "width": 32, "height": 32 } }
//!   },
//!   "scene": [ { "key": 1, "config": "gate", "translation": [0, 0] } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::resources::entryregistry::{Entry, EntryKey};
use crate::resources::sensors::SensorKind;
use crate::shapes::geometry::is_convex;
use crate::shapes::{Rect, Shape};

/// Opaque name of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigRef(pub String);

impl ConfigRef {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConfigRef {
    fn from(name: &str) -> Self {
        ConfigRef(name.to_string())
    }
}

impl From<String> for ConfigRef {
    fn from(name: String) -> Self {
        ConfigRef(name)
    }
}

impl fmt::Display for ConfigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializable shape description in local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeConfig {
    Point {
        #[serde(default)]
        at: Vec2,
    },
    Segment {
        start: Vec2,
        end: Vec2,
    },
    Circle {
        #[serde(default)]
        center: Vec2,
        radius: f32,
    },
    Capsule {
        start: Vec2,
        end: Vec2,
        radius: f32,
    },
    Polygon {
        vertices: Vec<Vec2>,
    },
    /// Axis-aligned rectangle centered on the origin.
    Rectangle {
        width: f32,
        height: f32,
    },
    Compound {
        shapes: Vec<ShapeConfig>,
    },
}

impl Default for ShapeConfig {
    fn default() -> Self {
        ShapeConfig::Point { at: Vec2::ZERO }
    }
}

fn check_radius(radius: f32) -> Result<(), String> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(format!("invalid radius {}", radius))
    }
}

impl ShapeConfig {
    /// Compiles the description, rejecting degenerate or non-convex input.
    pub fn to_shape(&self) -> Result<Shape, String> {
        match self {
            ShapeConfig::Point { at } => Ok(Shape::point(*at)),
            ShapeConfig::Segment { start, end } => Ok(Shape::segment(*start, *end)),
            ShapeConfig::Circle { center, radius } => {
                check_radius(*radius)?;
                Ok(Shape::circle(*center, *radius))
            }
            ShapeConfig::Capsule { start, end, radius } => {
                check_radius(*radius)?;
                Ok(Shape::capsule(*start, *end, *radius))
            }
            ShapeConfig::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(format!("polygon needs 3 vertices, got {}", vertices.len()));
                }
                if !is_convex(vertices) {
                    return Err("polygon is not convex".to_string());
                }
                Ok(Shape::polygon(vertices.iter().copied()))
            }
            ShapeConfig::Rectangle { width, height } => {
                if !(width.is_finite() && height.is_finite() && *width >= 0.0 && *height >= 0.0) {
                    return Err(format!("invalid rectangle {}x{}", width, height));
                }
                let half = Vec2::new(*width, *height) * 0.5;
                Ok(Shape::rectangle(&Rect::new(-half, half)))
            }
            ShapeConfig::Compound { shapes } => {
                if shapes.is_empty() {
                    return Err("compound shape is empty".to_string());
                }
                let shapes = shapes
                    .iter()
                    .map(ShapeConfig::to_shape)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Shape::compound(shapes))
            }
        }
    }
}

/// Collision category bits and the categories an actor is blocked by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFlags {
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub mask: u32,
}

impl CollisionFlags {
    pub fn new(flags: u32, mask: u32) -> Self {
        Self { flags, mask }
    }

    /// Whether an actor with these flags is blocked by `other`.
    pub fn can_collide(&self, other: &CollisionFlags) -> bool {
        self.mask & other.flags != 0
    }

    /// Whether an actor with these flags is blocked by static geometry
    /// carrying `flags`.
    pub fn blocked_by(&self, flags: u32) -> bool {
        self.mask & flags != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanderConfig {
    #[serde(default = "default_wander_interval")]
    pub interval_ms: i64,
    #[serde(default)]
    pub seed: u64,
}

fn default_wander_interval() -> i64 {
    1000
}

fn default_actor_logic() -> String {
    "actor".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    #[serde(default = "default_actor_logic")]
    pub logic: String,
    #[serde(default)]
    pub shape: ShapeConfig,
    #[serde(default)]
    pub collision: CollisionFlags,
    #[serde(default)]
    pub tags: Vec<String>,
    /// World units per second for logic that moves on its own.
    #[serde(default)]
    pub speed: f32,
    /// Sensor kind registered on the actor's shape while it is active.
    #[serde(default)]
    pub sensor: Option<SensorKind>,
    /// Destroy automatically this long after creation.
    #[serde(default)]
    pub lifespan_ms: Option<i64>,
    #[serde(default)]
    pub wander: Option<WanderConfig>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            logic: default_actor_logic(),
            shape: ShapeConfig::default(),
            collision: CollisionFlags::default(),
            tags: Vec::new(),
            speed: 0.0,
            sensor: None,
            lifespan_ms: None,
            wander: None,
        }
    }
}

/// Compiled actor configuration.
#[derive(Debug, Clone)]
pub struct ActorDescriptor {
    pub name: String,
    pub logic: String,
    pub shape: Shape,
    pub collision: CollisionFlags,
    pub tags: Vec<String>,
    pub speed: f32,
    pub sensor: Option<SensorKind>,
    pub lifespan_ms: Option<i64>,
    pub wander: Option<WanderConfig>,
}

impl ActorDescriptor {
    pub fn compile(name: &str, config: &ActorConfig) -> Result<Self, String> {
        if let Some(ms) = config.lifespan_ms.filter(|ms| *ms < 0) {
            return Err(format!("negative lifespan {} ms", ms));
        }
        Ok(Self {
            name: name.to_string(),
            logic: config.logic.clone(),
            shape: config.shape.to_shape()?,
            collision: config.collision,
            tags: config.tags.clone(),
            speed: config.speed,
            sensor: config.sensor,
            lifespan_ms: config.lifespan_ms,
            wander: config.wander.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    #[serde(default)]
    pub shape: ShapeConfig,
}

/// Compiled effect configuration.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    pub name: String,
    pub shape: Shape,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Logic kind bound to the entry, if any.
    #[serde(default)]
    pub logic: Option<String>,
    #[serde(default)]
    pub shape: ShapeConfig,
    /// Collision categories of the entry as static geometry; zero for none.
    #[serde(default)]
    pub collision_flags: u32,
    #[serde(default)]
    pub sensor: Option<SensorKind>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub default_entrance: bool,
    /// Effect fired by logic that reacts to triggers.
    #[serde(default)]
    pub effect: Option<String>,
}

/// Compiled entry configuration.
#[derive(Debug, Clone)]
pub struct EntryDescriptor {
    pub name: String,
    pub logic: Option<String>,
    pub shape: Shape,
    pub collision_flags: u32,
    pub sensor: Option<SensorKind>,
    pub tags: Vec<String>,
    pub default_entrance: bool,
    pub effect: Option<ConfigRef>,
}

/// One placed entry in the scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySpec {
    pub key: u64,
    pub config: String,
    #[serde(default)]
    pub translation: Vec2,
    #[serde(default)]
    pub rotation: f32,
}

/// Full scene document: configurations plus the initial entry layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub actors: BTreeMap<String, ActorConfig>,
    #[serde(default)]
    pub effects: BTreeMap<String, EffectConfig>,
    #[serde(default)]
    pub entries: BTreeMap<String, EntryConfig>,
    #[serde(default)]
    pub scene: Vec<EntrySpec>,
}

impl SceneDocument {
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Failed to parse scene document: {}", e))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scene document {:?}: {}", path, e))?;
        Self::from_json(&text)
    }

    /// Initial scene entries in document order.
    pub fn layout(&self) -> Vec<Entry> {
        self.scene
            .iter()
            .map(|spec| Entry {
                key: EntryKey(spec.key),
                config: ConfigRef(spec.config.clone()),
                translation: spec.translation,
                rotation: spec.rotation,
            })
            .collect()
    }
}

/// Registry of compiled descriptors, keyed by configuration name.
#[derive(Resource, Debug, Default)]
pub struct ConfigRegistry {
    actors: FxHashMap<String, Arc<ActorDescriptor>>,
    effects: FxHashMap<String, Arc<EffectDescriptor>>,
    entries: FxHashMap<String, Arc<EntryDescriptor>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every configuration in the document. Fails on the first
    /// invalid one.
    pub fn from_document(doc: &SceneDocument) -> Result<Self, String> {
        let mut registry = Self::new();
        for (name, config) in &doc.actors {
            registry.register_actor(name, config)?;
        }
        for (name, config) in &doc.effects {
            registry.register_effect(name, config)?;
        }
        for (name, config) in &doc.entries {
            registry.register_entry(name, config)?;
        }
        info!(
            "Registered {} actor, {} effect and {} entry configs",
            registry.actors.len(),
            registry.effects.len(),
            registry.entries.len()
        );
        Ok(registry)
    }

    pub fn register_actor(&mut self, name: &str, config: &ActorConfig) -> Result<(), String> {
        let descriptor = ActorDescriptor::compile(name, config)
            .map_err(|e| format!("actor config '{}': {}", name, e))?;
        self.actors.insert(name.to_string(), Arc::new(descriptor));
        Ok(())
    }

    pub fn register_effect(&mut self, name: &str, config: &EffectConfig) -> Result<(), String> {
        let shape = config
            .shape
            .to_shape()
            .map_err(|e| format!("effect config '{}': {}", name, e))?;
        self.effects.insert(
            name.to_string(),
            Arc::new(EffectDescriptor {
                name: name.to_string(),
                shape,
            }),
        );
        Ok(())
    }

    pub fn register_entry(&mut self, name: &str, config: &EntryConfig) -> Result<(), String> {
        let shape = config
            .shape
            .to_shape()
            .map_err(|e| format!("entry config '{}': {}", name, e))?;
        self.entries.insert(
            name.to_string(),
            Arc::new(EntryDescriptor {
                name: name.to_string(),
                logic: config.logic.clone(),
                shape,
                collision_flags: config.collision_flags,
                sensor: config.sensor,
                tags: config.tags.clone(),
                default_entrance: config.default_entrance,
                effect: config.effect.clone().map(ConfigRef),
            }),
        );
        Ok(())
    }

    pub fn actor(&self, config: &ConfigRef) -> Result<Arc<ActorDescriptor>, SceneError> {
        resolve(&self.actors, "actor", config)
    }

    pub fn effect(&self, config: &ConfigRef) -> Result<Arc<EffectDescriptor>, SceneError> {
        resolve(&self.effects, "effect", config)
    }

    pub fn entry(&self, config: &ConfigRef) -> Result<Arc<EntryDescriptor>, SceneError> {
        resolve(&self.entries, "entry", config)
    }
}

fn resolve<T>(
    map: &FxHashMap<String, Arc<T>>,
    kind: &'static str,
    config: &ConfigRef,
) -> Result<Arc<T>, SceneError> {
    map.get(config.name()).cloned().ok_or_else(|| {
        warn!("Failed to resolve {} config '{}'", kind, config);
        SceneError::ConfigUnresolved {
            kind,
            name: config.name().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "actors": {
            "ball": { "logic": "mobile", "shape": { "type": "circle", "radius": 0.5 },
                      "collision": { "flags": 1, "mask": 1 }, "tags": ["ball"], "speed": 3 }
        },
        "effects": { "pop": { "shape": { "type": "circle", "radius": 2 } } },
        "entries": {
            "pad": { "logic": "switch", "sensor": "interaction",
                     "shape": { "type": "rectangle", "width": 1, "height": 1 } }
        },
        "scene": [ { "key": 9, "config": "pad", "translation": [4, 5] } ]
    }"#;

    #[test]
    fn document_compiles_into_descriptors() {
        let doc = SceneDocument::from_json(DOC).unwrap();
        let registry = ConfigRegistry::from_document(&doc).unwrap();
        let ball = registry.actor(&"ball".into()).unwrap();
        assert_eq!(ball.logic, "mobile");
        assert_eq!(ball.tags, vec!["ball".to_string()]);
        assert!(matches!(ball.shape, Shape::Circle(_)));
        let pad = registry.entry(&"pad".into()).unwrap();
        assert_eq!(pad.sensor, Some(SensorKind::Interaction));
        assert_eq!(pad.shape.bounds().width(), 1.0);

        let layout = doc.layout();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].key, EntryKey(9));
        assert_eq!(layout[0].translation, Vec2::new(4.0, 5.0));
    }

    #[test]
    fn unknown_reference_is_unresolved() {
        let registry = ConfigRegistry::new();
        let err = registry.actor(&"nobody".into()).unwrap_err();
        assert_eq!(
            err,
            SceneError::ConfigUnresolved {
                kind: "actor",
                name: "nobody".into()
            }
        );
        assert!(registry.effect(&"nobody".into()).is_err());
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        let concave = ShapeConfig::Polygon {
            vertices: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(1.0, 0.5),
                Vec2::new(2.0, 2.0),
                Vec2::new(0.0, 2.0),
            ],
        };
        assert!(concave.to_shape().is_err());
        assert!(ShapeConfig::Circle { center: Vec2::ZERO, radius: -1.0 }.to_shape().is_err());
        assert!(ShapeConfig::Compound { shapes: vec![] }.to_shape().is_err());

        let mut registry = ConfigRegistry::new();
        let config = ActorConfig {
            shape: concave,
            ..ActorConfig::default()
        };
        assert!(registry.register_actor("bad", &config).is_err());
        assert!(registry.actor(&"bad".into()).is_err());
    }

    #[test]
    fn negative_lifespan_is_rejected() {
        let mut registry = ConfigRegistry::new();
        let config = ActorConfig {
            lifespan_ms: Some(-5),
            ..ActorConfig::default()
        };
        assert!(registry.register_actor("spent", &config).is_err());
        let config = ActorConfig {
            lifespan_ms: Some(i64::MAX),
            ..ActorConfig::default()
        };
        assert!(registry.register_actor("forever", &config).is_ok());
    }

    #[test]
    fn collision_mask_checks_other_flags() {
        let wall = CollisionFlags::new(2, 0);
        let walker = CollisionFlags::new(1, 2);
        assert!(walker.can_collide(&wall));
        assert!(!wall.can_collide(&walker));
        assert!(walker.blocked_by(2));
        assert!(!walker.blocked_by(4));
    }
}

//! Tickscene library.
//!
//! Authoritative, tick-driven scene simulation. This module exposes the
//! scene's shapes, spatial index, ECS components, resources, systems and
//! events for use by hosts and integration tests.

pub mod components;
pub mod error;
pub mod events;
pub mod logic;
pub mod resources;
pub mod scene;
pub mod shapes;
pub mod spatial;
pub mod systems;

pub use error::SceneError;
pub use scene::Scene;

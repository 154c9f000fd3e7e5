//! ECS resources owned by the scene world.
//!
//! Every registry, index, queue and buffer of the scene is a resource of a
//! single `World`; there is no global state.
//!
//! Overview
//! - `actorregistry` – actor records in spawn order and the actor space
//! - `clients` – connected clients, their pawns and pending input
//! - `configregistry` – compiled actor, effect and entry descriptors
//! - `effects` – effects fired during the current tick
//! - `entryregistry` – scene entries and their static geometry
//! - `logicmappings` – logic indexed by tag, kind and default entrance
//! - `logicregistry` – logic factories keyed by kind
//! - `participants` – ordered per-tick participants
//! - `sceneclock` – authoritative timestamp and tick timing
//! - `sceneconfig` – INI scene settings
//! - `sensors` – sensors and their spatial index
//! - `snapshots` – immutable actor, delta and scene snapshots
//! - `workqueue` – closures posted from other threads
pub mod actorregistry;
pub mod clients;
pub mod configregistry;
pub mod effects;
pub mod entryregistry;
pub mod logicmappings;
pub mod logicregistry;
pub mod participants;
pub mod sceneclock;
pub mod sceneconfig;
pub mod sensors;
pub mod snapshots;
pub mod workqueue;

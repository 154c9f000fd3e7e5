//! ECS components for actor entities.
//!
//! Submodules overview:
//! - [`actor`] – identity, kinematics, collision shape and logic slot

pub mod actor;

//! Scene events and their observers.
//!
//! Submodules:
//! - [`actor`] – actor added, destroying and removed notifications
//! - [`sensor`] – sensor trigger notifications
//!
//! Events are raised with `world.trigger`, so observers run synchronously
//! inside the operation that raised them.
pub mod actor;
pub mod sensor;

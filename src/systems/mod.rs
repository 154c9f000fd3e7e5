//! Scene systems.
//!
//! Phases of the tick, in order. The clock update runs first, outside the
//! schedule, exactly like the rest of the phases see it:
//! - [`time`] – advance the scene timestamp by the elapsed time
//! - [`workqueue`] – run closures posted from other threads
//! - [`movement`] – activate, destroy, tick and advance actors
//! - [`participants`] – tick registered participants
//! - [`delta`] – send per-client deltas and publish the scene snapshot
//! - [`effects`] – clear the effects fired this tick
//!
//! Operations shared by the phases and the scene facade:
//! - [`actors`] – actor lifecycle and logic calls
//! - [`advancer`] – motion integration and collision resolution
//! - [`clients`] – client lifecycle and input
//! - [`entries`] – scene model updates
//! - [`sensors`] – sensor triggering

pub mod actors;
pub mod advancer;
pub mod clients;
pub mod delta;
pub mod effects;
pub mod entries;
pub mod movement;
pub mod participants;
pub mod sensors;
pub mod time;
pub mod workqueue;

use std::any::Any;

use bevy_ecs::prelude::*;

/// Builds the schedule run once per tick, after
/// [`update_scene_clock`](time::update_scene_clock).
pub fn build_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            workqueue::drain_work_queue,
            movement::advance_actors,
            participants::tick_participants,
            delta::dispatch_deltas,
            effects::clear_effects,
        )
            .chain(),
    );
    schedule
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

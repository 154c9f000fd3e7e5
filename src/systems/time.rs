//! Scene clock update.
//!
//! Runs before the tick schedule. The timestamp it produces is what every
//! phase of the tick sees as "now".
use std::time::Instant;

use bevy_ecs::prelude::*;
use log::warn;

use crate::resources::sceneclock::{SceneClock, Timestamp};

/// Advance the scene timestamp by `elapsed_ms` and start a new tick.
///
/// Negative elapsed time, from a clock that went backwards, is treated as
/// zero so the timestamp never decreases.
pub fn update_scene_clock(world: &mut World, elapsed_ms: Timestamp) {
    let elapsed = if elapsed_ms < 0 {
        warn!("Negative tick elapsed time {}ms, using 0", elapsed_ms);
        0
    } else {
        elapsed_ms
    };
    let mut clock = world.resource_mut::<SceneClock>();
    clock.timestamp += elapsed;
    clock.delta = elapsed;
    clock.tick_count += 1;
    clock.last_tick = Some(Instant::now());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_never_decreases() {
        let mut world = World::new();
        world.insert_resource(SceneClock::new(50));
        update_scene_clock(&mut world, 50);
        update_scene_clock(&mut world, -20);
        let clock = world.resource::<SceneClock>();
        assert_eq!(clock.timestamp, 50);
        assert_eq!(clock.delta, 0);
        assert_eq!(clock.tick_count, 2);
        assert!(clock.last_tick.is_some());
    }
}

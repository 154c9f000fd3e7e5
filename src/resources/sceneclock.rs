//! Authoritative scene clock.
//!
//! The timestamp is simulation time in milliseconds. It only moves forward,
//! and only from [`update_scene_clock`](crate::systems::time::update_scene_clock)
//! at the start of a tick.

use std::time::Instant;

use bevy_ecs::prelude::Resource;

/// Simulation time in milliseconds.
pub type Timestamp = i64;

pub const DEFAULT_TICK_INTERVAL_MS: u32 = 50;

#[derive(Resource, Debug, Clone)]
pub struct SceneClock {
    /// Timestamp of the current tick.
    pub timestamp: Timestamp,
    /// Milliseconds added by the last tick.
    pub delta: Timestamp,
    /// Target spacing between ticks.
    pub tick_interval: u32,
    /// Number of ticks run so far.
    pub tick_count: u64,
    /// Wall time at which the current tick started.
    pub last_tick: Option<Instant>,
}

impl Default for SceneClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_MS)
    }
}

impl SceneClock {
    pub fn new(tick_interval: u32) -> Self {
        Self {
            timestamp: 0,
            delta: 0,
            tick_interval: tick_interval.max(1),
            tick_count: 0,
            last_tick: None,
        }
    }

    pub fn ticks_per_second(&self) -> u32 {
        1000 / self.tick_interval
    }

    /// Timestamp the next tick is expected to carry.
    pub fn next_timestamp(&self) -> Timestamp {
        self.timestamp + self.tick_interval as Timestamp
    }

    /// Best estimate of the simulation time right now, between ticks.
    pub fn now_timestamp(&self) -> Timestamp {
        match self.last_tick {
            Some(at) => self.timestamp + at.elapsed().as_millis() as Timestamp,
            None => self.timestamp,
        }
    }

    /// Elapsed time of the last tick in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta as f32 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_timing_follows_interval() {
        let clock = SceneClock::new(50);
        assert_eq!(clock.ticks_per_second(), 20);
        assert_eq!(clock.next_timestamp(), 50);
        assert_eq!(clock.now_timestamp(), 0);
        assert_eq!(SceneClock::new(0).tick_interval, 1);
    }
}

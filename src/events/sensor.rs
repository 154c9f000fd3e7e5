//! Sensor trigger notifications.
//!
//! [`SensorTriggered`] is raised once per sensor and per trigger, after the
//! owning logic's callback has run. Observers see the same ordering as the
//! sensor query: by bucket level, then row, then column.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::actor::ActorId;
use crate::resources::logicmappings::LogicRef;
use crate::resources::sceneclock::Timestamp;
use crate::resources::sensors::{SensorId, SensorKind};

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorTriggered {
    pub sensor: SensorId,
    pub owner: LogicRef,
    pub kind: SensorKind,
    pub timestamp: Timestamp,
    /// Actor whose shape or interaction set the sensor off.
    pub actor: ActorId,
}

pub fn log_sensor_triggered(trigger: On<SensorTriggered>) {
    let event = trigger.event();
    debug!(
        "Sensor {:?} ({:?}) owned by {:?} triggered by actor {} at {}",
        event.sensor, event.kind, event.owner, event.actor, event.timestamp
    );
}

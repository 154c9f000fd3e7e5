//! Participant phase of the tick.
use std::panic::{self, AssertUnwindSafe};

use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::resources::participants::{TickFlow, TickParticipants};
use crate::resources::sceneclock::SceneClock;
use crate::systems::panic_message;

/// Ticks every registered participant once, in registration order.
///
/// Only slots present when the pass starts are visited. A participant
/// returning [`TickFlow::Stop`] is unregistered; one that panics is logged
/// and kept.
pub fn tick_participants(world: &mut World) {
    let timestamp = world.resource::<SceneClock>().timestamp;
    let count = world.resource::<TickParticipants>().slot_count();
    for index in 0..count {
        let Some((id, mut participant)) = world.resource_mut::<TickParticipants>().take(index)
        else {
            continue;
        };
        let flow = panic::catch_unwind(AssertUnwindSafe(|| participant.tick(world, timestamp)));
        let mut participants = world.resource_mut::<TickParticipants>();
        participants.restore(index, participant);
        match flow {
            Ok(TickFlow::Continue) => {}
            Ok(TickFlow::Stop) => {
                debug!("Participant {:?} stopped", id);
                participants.remove(id);
            }
            Err(payload) => {
                error!("Participant {:?} panicked: {}", id, panic_message(&*payload));
            }
        }
    }
    world.resource_mut::<TickParticipants>().compact();
}

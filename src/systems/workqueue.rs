//! Work queue phase of the tick.
use std::panic::{self, AssertUnwindSafe};

use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::resources::workqueue::WorkQueue;
use crate::systems::panic_message;

/// Runs the closures queued before this tick started.
///
/// The count is taken on entry; closures posted while draining, including
/// by drained closures themselves, wait for the next tick.
pub fn drain_work_queue(world: &mut World) {
    let receiver = world.resource::<WorkQueue>().receiver();
    let pending = receiver.len();
    if pending > 0 {
        debug!("Draining {} queued work items", pending);
    }
    for _ in 0..pending {
        let Ok(work) = receiver.try_recv() else {
            break;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| work(world))) {
            error!("Queued work panicked: {}", panic_message(&*payload));
        }
    }
}

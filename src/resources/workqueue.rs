//! Cross-thread work queue.
//!
//! Other threads never touch the world. They post closures through a
//! [`WorkSender`]; the tick thread drains them at the start of the next tick
//! (see [`drain_work_queue`](crate::systems::workqueue::drain_work_queue)).

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;

use crate::components::actor::ActorId;
use crate::resources::clients::{ClientId, InputFrame};
use crate::resources::entryregistry::EntryKey;
use crate::resources::snapshots::SceneDelta;
use crate::systems::clients;

/// A unit of work run on the tick thread with exclusive world access.
pub type Work = Box<dyn FnOnce(&mut World) + Send>;

#[derive(Resource)]
pub struct WorkQueue {
    tx: Sender<Work>,
    rx: Receiver<Work>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }
}

impl WorkQueue {
    pub fn sender(&self) -> WorkSender {
        WorkSender {
            tx: self.tx.clone(),
        }
    }

    pub fn receiver(&self) -> Receiver<Work> {
        self.rx.clone()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Cloneable producer handle. Every method returns `false` once the scene
/// has been dropped.
#[derive(Clone)]
pub struct WorkSender {
    tx: Sender<Work>,
}

impl WorkSender {
    pub fn post(&self, work: impl FnOnce(&mut World) + Send + 'static) -> bool {
        if self.tx.send(Box::new(work)).is_err() {
            warn!("Work queue disconnected, dropping work");
            return false;
        }
        true
    }

    /// Queues input frames for the client's pawn. `ack` is echoed back in the
    /// client's deltas; `smoothed_time` feeds the ping estimate.
    pub fn enqueue_input(
        &self,
        client: ClientId,
        ack: u32,
        smoothed_time: i64,
        frames: Vec<InputFrame>,
    ) -> bool {
        self.post(move |world| {
            let _ = clients::enqueue_input(world, client, ack, smoothed_time, frames);
        })
    }

    /// Records the portal a client will arrive by.
    pub fn body_entering(&self, client: ClientId, portal: EntryKey) -> bool {
        self.post(move |world| clients::body_entering(world, client, portal))
    }

    pub fn body_entered(&self, client: ClientId, sink: Sender<SceneDelta>) -> bool {
        self.post(move |world| {
            clients::body_entered(world, client, sink);
        })
    }

    pub fn body_left(&self, client: ClientId) -> bool {
        self.post(move |world| {
            let _ = clients::body_left(world, client);
        })
    }

    pub fn set_target(&self, client: ClientId, actor: ActorId) -> bool {
        self.post(move |world| {
            let _ = clients::set_target(world, client, actor);
        })
    }
}

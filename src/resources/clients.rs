//! Connected clients and their liaison state.
//!
//! The session layer never touches this resource directly; it posts closures
//! through the [`WorkSender`](crate::resources::workqueue::WorkSender) and the
//! tick thread applies them here.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use bevy_ecs::prelude::Resource;
use crossbeam_channel::Sender;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::actor::ActorId;
use crate::resources::configregistry::ConfigRef;
use crate::resources::entryregistry::EntryKey;
use crate::resources::sceneclock::Timestamp;
use crate::resources::snapshots::{ActorSnapshot, SceneDelta};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One frame of client input, stamped with the simulation time it targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub timestamp: Timestamp,
    /// Facing, radians.
    pub rotation: f32,
    /// Movement heading, radians. Only used while [`InputFrame::MOVE`] is set.
    pub direction: f32,
    pub flags: u32,
}

impl InputFrame {
    pub const MOVE: u32 = 1 << 0;
    pub const INTERACT: u32 = 1 << 1;

    pub fn new(timestamp: Timestamp, rotation: f32, direction: f32, flags: u32) -> Self {
        Self {
            timestamp,
            rotation,
            direction,
            flags,
        }
    }

    pub fn is_set(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Per-client state kept by the scene.
///
/// A liaison exists from `body_entered` until `body_left`. Each tick the
/// delta phase compares what the client can see against `sent` and pushes
/// the difference into `sink`. A disconnected sink is not an error; the
/// client is dropped when the session layer reports it left.
pub struct ClientLiaison {
    pub id: ClientId,
    /// Actor controlled by the client.
    pub pawn: Option<ActorId>,
    /// Pawn followed by a client without one of its own.
    pub target: Option<ActorId>,
    /// Last input sequence acknowledged back to the client.
    pub last_ack: u32,
    /// Estimated round trip in milliseconds.
    pub ping: Timestamp,
    /// Input frames not yet applied, in arrival order.
    pub pending: VecDeque<InputFrame>,
    pub sink: Sender<SceneDelta>,
    /// Snapshots the client last received, for delta computation.
    pub sent: FxHashMap<ActorId, ActorSnapshot>,
    pub interest_radius: f32,
}

impl ClientLiaison {
    pub fn new(id: ClientId, sink: Sender<SceneDelta>, interest_radius: f32) -> Self {
        Self {
            id,
            pawn: None,
            target: None,
            last_ack: 0,
            ping: 0,
            pending: VecDeque::new(),
            sink,
            sent: FxHashMap::default(),
            interest_radius,
        }
    }

    /// Removes and returns the pending frames stamped at or before `now`.
    pub fn take_due_frames(&mut self, now: Timestamp) -> Vec<InputFrame> {
        let mut due = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for frame in self.pending.drain(..) {
            if frame.timestamp <= now {
                due.push(frame);
            } else {
                kept.push_back(frame);
            }
        }
        self.pending = kept;
        due
    }
}

/// All connected clients, plus the portals clients are about to enter by.
#[derive(Resource)]
pub struct ClientLiaisons {
    pub clients: BTreeMap<ClientId, ClientLiaison>,
    pub entering: FxHashMap<ClientId, EntryKey>,
    /// Actor config spawned as a pawn for every entering client.
    pub pawn_config: Option<ConfigRef>,
    pub interest_radius: f32,
    /// Picks default entrances.
    pub rng: fastrand::Rng,
}

impl ClientLiaisons {
    pub fn new(pawn_config: Option<ConfigRef>, interest_radius: f32, seed: u64) -> Self {
        Self {
            clients: BTreeMap::new(),
            entering: FxHashMap::default(),
            pawn_config,
            interest_radius,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn get(&self, id: ClientId) -> Option<&ClientLiaison> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut ClientLiaison> {
        self.clients.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Forgets every reference to `actor` held as a pawn or a target.
    pub fn forget_actor(&mut self, actor: ActorId) {
        for client in self.clients.values_mut() {
            if client.pawn == Some(actor) {
                client.pawn = None;
                client.pending.clear();
            }
            if client.target == Some(actor) {
                client.target = None;
            }
        }
    }
}

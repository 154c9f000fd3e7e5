//! Scene error type.
//!
//! Every fallible scene operation returns [`SceneError`]. None of these are
//! fatal: the caller logs (usually already done at the failure site) and
//! carries on with the tick.

use std::fmt;

use crate::components::actor::ActorId;
use crate::resources::clients::ClientId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A configuration reference could not be resolved to a descriptor.
    ConfigUnresolved { kind: &'static str, name: String },
    /// The descriptor names a logic kind that could not be constructed.
    LogicInstantiationFailed { kind: String, reason: String },
    /// A request named a client that is not connected.
    UnknownClient(ClientId),
    /// A request named an actor that does not exist.
    UnknownActor(ActorId),
    /// A target request named an actor that is not a pawn.
    NotAPawn(ActorId),
    /// A client controlling its own pawn asked to follow a target.
    ClientHasPawn(ClientId),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::ConfigUnresolved { kind, name } => {
                write!(f, "failed to resolve {} config '{}'", kind, name)
            }
            SceneError::LogicInstantiationFailed { kind, reason } => {
                write!(f, "failed to create logic '{}': {}", kind, reason)
            }
            SceneError::UnknownClient(id) => write!(f, "unknown client {}", id),
            SceneError::UnknownActor(id) => write!(f, "unknown actor {}", id),
            SceneError::NotAPawn(id) => write!(f, "actor {} is not a pawn", id),
            SceneError::ClientHasPawn(id) => write!(f, "client {} controls a pawn", id),
        }
    }
}

impl std::error::Error for SceneError {}

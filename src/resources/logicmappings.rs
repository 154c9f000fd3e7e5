//! Secondary indices over actor and entry logic.
//!
//! Logic is indexed by tag, by every kind in its lineage, and, for entries
//! that act as default entrances, in a separate list. Lists keep insertion
//! order and are dropped once empty, so removing everything that was added
//! leaves the mappings exactly as they started.

use bevy_ecs::prelude::Resource;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::actor::ActorId;
use crate::resources::entryregistry::EntryKey;

/// Handle to a logic instance owned by an actor or an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicRef {
    Actor(ActorId),
    Entry(EntryKey),
}

#[derive(Resource, Debug, Default)]
pub struct LogicMappings {
    tagged: FxHashMap<String, Vec<LogicRef>>,
    instances: FxHashMap<&'static str, Vec<LogicRef>>,
    default_entrances: Vec<LogicRef>,
}

impl LogicMappings {
    pub fn add(
        &mut self,
        logic: LogicRef,
        tags: &[String],
        lineage: &[&'static str],
        default_entrance: bool,
    ) {
        for tag in tags {
            self.tagged.entry(tag.clone()).or_default().push(logic);
        }
        for kind in lineage {
            self.instances.entry(kind).or_default().push(logic);
        }
        if default_entrance {
            self.default_entrances.push(logic);
        }
    }

    /// Reverses [`add`](Self::add). Missing mappings are logged and skipped.
    pub fn remove(
        &mut self,
        logic: LogicRef,
        tags: &[String],
        lineage: &[&'static str],
        default_entrance: bool,
    ) {
        for tag in tags {
            if !remove_from(&mut self.tagged, tag.as_str(), logic) {
                warn!("Missing tag mapping for logic: tag={}, logic={:?}", tag, logic);
            }
        }
        for kind in lineage {
            if !remove_from(&mut self.instances, kind, logic) {
                warn!("Missing kind mapping for logic: kind={}, logic={:?}", kind, logic);
            }
        }
        if default_entrance {
            match self.default_entrances.iter().position(|l| *l == logic) {
                Some(pos) => {
                    self.default_entrances.remove(pos);
                }
                None => warn!("Missing default entrance mapping for logic: {:?}", logic),
            }
        }
    }

    pub fn tagged(&self, tag: &str) -> &[LogicRef] {
        self.tagged.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn instances_of(&self, kind: &str) -> &[LogicRef] {
        self.instances.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_instance_of(&self, logic: LogicRef, kind: &str) -> bool {
        self.instances_of(kind).contains(&logic)
    }

    pub fn default_entrances(&self) -> &[LogicRef] {
        &self.default_entrances
    }

    pub fn is_empty(&self) -> bool {
        self.tagged.is_empty() && self.instances.is_empty() && self.default_entrances.is_empty()
    }
}

fn remove_from<K>(map: &mut FxHashMap<K, Vec<LogicRef>>, key: &str, logic: LogicRef) -> bool
where
    K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
{
    let Some(list) = map.get_mut(key) else {
        return false;
    };
    let Some(pos) = list.iter().position(|l| *l == logic) else {
        return false;
    };
    list.remove(pos);
    if list.is_empty() {
        map.remove(key);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAWN: &[&str] = &["pawn", "mobile", "actor"];

    #[test]
    fn add_then_remove_restores_empty_state() {
        let mut mappings = LogicMappings::default();
        let logic = LogicRef::Actor(ActorId(1));
        let tags = vec!["hero".to_string(), "player".to_string()];
        mappings.add(logic, &tags, PAWN, false);
        assert_eq!(mappings.tagged("hero"), &[logic]);
        assert_eq!(mappings.instances_of("mobile"), &[logic]);
        assert!(mappings.is_instance_of(logic, "actor"));
        mappings.remove(logic, &tags, PAWN, false);
        assert!(mappings.is_empty());
    }

    #[test]
    fn lists_keep_insertion_order() {
        let mut mappings = LogicMappings::default();
        let tags = vec!["gate".to_string()];
        for key in [3, 1, 2] {
            mappings.add(LogicRef::Entry(EntryKey(key)), &tags, &["entrance"], true);
        }
        mappings.remove(LogicRef::Entry(EntryKey(1)), &tags, &["entrance"], true);
        assert_eq!(
            mappings.default_entrances(),
            &[LogicRef::Entry(EntryKey(3)), LogicRef::Entry(EntryKey(2))]
        );
        assert_eq!(mappings.tagged("gate").len(), 2);
    }

    #[test]
    fn removing_unknown_logic_is_tolerated() {
        let mut mappings = LogicMappings::default();
        mappings.remove(LogicRef::Actor(ActorId(9)), &["x".to_string()], PAWN, true);
        assert!(mappings.is_empty());
    }
}

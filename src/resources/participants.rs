//! Ordered registry of per-tick participants.
//!
//! Participants tick in registration order after the actors have advanced.
//! Removal only marks a slot; slots are compacted once the pass is over, so
//! a participant may remove itself or any other participant mid-pass. A
//! participant added mid-pass first ticks in the following pass.

use bevy_ecs::prelude::*;

use crate::resources::sceneclock::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    /// Unregister after this tick.
    Stop,
}

pub trait TickParticipant: Send + Sync {
    fn tick(&mut self, world: &mut World, timestamp: Timestamp) -> TickFlow;
}

impl<F> TickParticipant for F
where
    F: FnMut(&mut World, Timestamp) -> TickFlow + Send + Sync,
{
    fn tick(&mut self, world: &mut World, timestamp: Timestamp) -> TickFlow {
        self(world, timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u32);

struct Slot {
    id: ParticipantId,
    /// Empty while the participant is ticking.
    participant: Option<Box<dyn TickParticipant>>,
    removed: bool,
}

#[derive(Resource, Default)]
pub struct TickParticipants {
    last_id: u32,
    slots: Vec<Slot>,
}

impl TickParticipants {
    pub fn add(&mut self, participant: impl TickParticipant + 'static) -> ParticipantId {
        self.last_id += 1;
        let id = ParticipantId(self.last_id);
        self.slots.push(Slot {
            id,
            participant: Some(Box::new(participant)),
            removed: false,
        });
        id
    }

    /// Marks the participant for removal. Returns `false` if it is unknown.
    pub fn remove(&mut self, id: ParticipantId) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id && !s.removed) {
            Some(slot) => {
                slot.removed = true;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.slots.iter().any(|s| s.id == id && !s.removed)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| !s.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, live or marked, at the start of a pass.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Takes the participant at `index` out for ticking, unless it is marked.
    pub(crate) fn take(
        &mut self,
        index: usize,
    ) -> Option<(ParticipantId, Box<dyn TickParticipant>)> {
        let slot = self.slots.get_mut(index)?;
        if slot.removed {
            return None;
        }
        let participant = slot.participant.take()?;
        Some((slot.id, participant))
    }

    /// Returns a participant taken by [`take`](Self::take). Slots do not
    /// move during a pass, so `index` is still valid.
    pub(crate) fn restore(&mut self, index: usize, participant: Box<dyn TickParticipant>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.participant = Some(participant);
        }
    }

    pub(crate) fn compact(&mut self) {
        self.slots.retain(|s| !s.removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_marks_then_compacts() {
        let mut participants = TickParticipants::default();
        let a = participants.add(|_: &mut World, _: Timestamp| TickFlow::Continue);
        let b = participants.add(|_: &mut World, _: Timestamp| TickFlow::Continue);
        assert!(participants.remove(a));
        assert!(!participants.remove(a));
        assert_eq!(participants.len(), 1);
        assert_eq!(participants.slot_count(), 2);
        assert!(participants.take(0).is_none());
        participants.compact();
        assert_eq!(participants.slot_count(), 1);
        assert!(participants.contains(b));
    }
}

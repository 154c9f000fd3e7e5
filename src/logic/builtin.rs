//! Built-in logic kinds registered by
//! [`LogicRegistry::with_builtins`](crate::resources::logicregistry::LogicRegistry::with_builtins).
//!
//! Actors:
//! - `actor` – static, does nothing on its own
//! - `mobile` – moved by the advancer at its current velocity
//! - `pawn` – mobile, steered by client input
//! - `wanderer` – mobile, picks a new random heading at a fixed interval
//!
//! Entries:
//! - `entrance` – arrival point for clients, default entrance if configured
//! - `region` – counts sensor triggers
//! - `switch` – toggles on each trigger and fires the entry's effect

use std::f32::consts::TAU;

use glam::Vec2;
use log::debug;

use crate::components::actor::ActorId;
use crate::logic::{ActorContext, ActorLogic, EntryContext, EntryLogic};
use crate::resources::clients::InputFrame;
use crate::resources::configregistry::{ActorDescriptor, EntryDescriptor};
use crate::resources::sceneclock::Timestamp;
use crate::shapes::Shape;

#[derive(Debug, Default)]
pub struct BasicActor;

impl ActorLogic for BasicActor {
    fn lineage(&self) -> &'static [&'static str] {
        &["actor"]
    }
}

#[derive(Debug, Default)]
pub struct MobileActor;

impl ActorLogic for MobileActor {
    fn lineage(&self) -> &'static [&'static str] {
        &["mobile", "actor"]
    }

    fn is_mobile(&self) -> bool {
        true
    }
}

/// Client-controlled actor.
#[derive(Debug)]
pub struct Pawn {
    speed: f32,
    /// Distance from the center at which interactions land.
    reach: f32,
}

impl Pawn {
    pub fn new(descriptor: &ActorDescriptor) -> Self {
        Self {
            speed: descriptor.speed,
            reach: (descriptor.shape.bounds().longest_side() * 0.5).max(1.0),
        }
    }
}

impl ActorLogic for Pawn {
    fn lineage(&self) -> &'static [&'static str] {
        &["pawn", "mobile", "actor"]
    }

    fn is_mobile(&self) -> bool {
        true
    }

    fn apply_input(&mut self, ctx: &mut ActorContext, frame: &InputFrame) {
        ctx.kinematics.rotation = frame.rotation;
        ctx.kinematics.velocity = if frame.is_set(InputFrame::MOVE) {
            Vec2::from_angle(frame.direction) * self.speed
        } else {
            Vec2::ZERO
        };
        if frame.is_set(InputFrame::INTERACT) {
            let facing = Vec2::from_angle(frame.rotation);
            let at = ctx.kinematics.translation + facing * self.reach;
            ctx.interact(Shape::circle(at, self.reach));
        }
    }
}

/// Wanders at constant speed, turning every `interval` milliseconds.
#[derive(Debug)]
pub struct Wanderer {
    speed: f32,
    interval: Timestamp,
    seed: u64,
    rng: fastrand::Rng,
    next_turn: Timestamp,
}

impl Wanderer {
    pub fn new(descriptor: &ActorDescriptor) -> Self {
        let (interval, seed) = descriptor
            .wander
            .as_ref()
            .map(|w| (w.interval_ms.max(1), w.seed))
            .unwrap_or((1000, 0));
        Self {
            speed: descriptor.speed,
            interval,
            seed,
            rng: fastrand::Rng::with_seed(seed),
            next_turn: Timestamp::MIN,
        }
    }

    fn turn(&mut self, ctx: &mut ActorContext) {
        let heading = self.rng.f32() * TAU;
        ctx.kinematics.rotation = heading;
        ctx.kinematics.velocity = Vec2::from_angle(heading) * self.speed;
        self.next_turn = ctx.timestamp.saturating_add(self.interval);
    }
}

impl ActorLogic for Wanderer {
    fn lineage(&self) -> &'static [&'static str] {
        &["wanderer", "mobile", "actor"]
    }

    fn is_mobile(&self) -> bool {
        true
    }

    fn activated(&mut self, ctx: &mut ActorContext) {
        // Same config, different actors, different walks.
        self.rng.seed(self.seed.wrapping_add(ctx.id.0 as u64));
        self.turn(ctx);
    }

    fn tick(&mut self, ctx: &mut ActorContext) {
        if ctx.timestamp >= self.next_turn {
            self.turn(ctx);
        }
    }
}

#[derive(Debug)]
pub struct Entrance {
    default_entrance: bool,
}

impl Entrance {
    pub fn new(descriptor: &EntryDescriptor) -> Self {
        Self {
            default_entrance: descriptor.default_entrance,
        }
    }
}

impl EntryLogic for Entrance {
    fn lineage(&self) -> &'static [&'static str] {
        &["entrance"]
    }

    fn is_default_entrance(&self) -> bool {
        self.default_entrance
    }
}

#[derive(Debug, Default)]
pub struct Region {
    pub triggers: u64,
}

impl EntryLogic for Region {
    fn lineage(&self) -> &'static [&'static str] {
        &["region"]
    }

    fn triggered(&mut self, ctx: &mut EntryContext, actor: ActorId) {
        self.triggers += 1;
        debug!(
            "Region {} entered by actor {} ({} total)",
            ctx.key, actor, self.triggers
        );
    }
}

#[derive(Debug, Default)]
pub struct Switch {
    pub on: bool,
}

impl EntryLogic for Switch {
    fn lineage(&self) -> &'static [&'static str] {
        &["switch", "region"]
    }

    fn triggered(&mut self, ctx: &mut EntryContext, actor: ActorId) {
        self.on = !self.on;
        debug!(
            "Switch {} turned {} by actor {}",
            ctx.key,
            if self.on { "on" } else { "off" },
            actor
        );
        if let Some(effect) = ctx.descriptor.effect.clone() {
            let (translation, rotation) = (ctx.entry.translation, ctx.entry.rotation);
            ctx.fire_effect(effect, translation, rotation);
        }
    }
}

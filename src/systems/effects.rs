//! Effect firing and the end-of-tick clear.
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::error::SceneError;
use crate::resources::configregistry::{ConfigRef, ConfigRegistry};
use crate::resources::effects::{EffectHandle, EffectSnapshot, EffectsFired};
use crate::resources::sceneclock::Timestamp;
use crate::shapes::{Rect, Transform2D};

/// Records an effect for the current tick.
pub fn fire_effect(
    world: &mut World,
    config: &ConfigRef,
    translation: Vec2,
    rotation: f32,
    timestamp: Timestamp,
) -> Result<EffectHandle, SceneError> {
    let descriptor = world.resource::<ConfigRegistry>().effect(config)?;
    let shape = descriptor
        .shape
        .transform(&Transform2D::new(translation, rotation));
    let handle = world.resource_mut::<EffectsFired>().fire(
        config.clone(),
        translation,
        rotation,
        timestamp,
        shape,
    );
    debug!("Fired effect {:?} '{}' at {:?}", handle, config, translation);
    Ok(handle)
}

pub fn effects_fired(world: &World, bounds: &Rect) -> Vec<EffectSnapshot> {
    world.resource::<EffectsFired>().within(bounds)
}

/// Last phase of the tick: effects never outlive the tick they were fired in.
pub fn clear_effects(mut effects: ResMut<EffectsFired>) {
    effects.clear();
}

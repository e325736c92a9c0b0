#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower ability activation and per-tick timer advancement.
//!
//! The state machine itself lives on the ability component; this crate wires
//! it to the event stream. Activation requests arrive from the player-facing
//! collaborator, timer advancement runs once per tick, and both report their
//! externally visible transitions as events.

use std::time::Duration;

use gridspire_core::{Entity, Event};
use gridspire_world::{Activation, AbilityTransition, World};

/// Attempts to activate the ability on `tower`.
///
/// Returns `false` without mutation when the tower has no ability component
/// or the ability is not ready. A successful activation emits
/// [`Event::AbilityActivated`], and instant effects additionally emit
/// [`Event::InstantAbility`] for the world-level collaborator to execute.
pub fn activate(world: &mut World, tower: Entity, out_events: &mut Vec<Event>) -> bool {
    let Some(ability) = world.components.abilities.get_mut(tower) else {
        return false;
    };
    let Some(activation) = ability.activate() else {
        return false;
    };

    out_events.push(Event::AbilityActivated { tower });
    if let Activation::Instant(effect) = activation {
        out_events.push(Event::InstantAbility { tower, effect });
    }
    true
}

/// Advances every ability timer by the elapsed tick.
///
/// Emits [`Event::AbilityReady`] for each ability whose cooldown elapsed this
/// tick. Charged abilities hold their charge indefinitely and report nothing
/// here.
pub fn update(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    for tower in world.components.abilities.entities() {
        let Some(ability) = world.components.abilities.get_mut(tower) else {
            continue;
        };
        if ability.update(dt) == AbilityTransition::BecameReady {
            out_events.push(Event::AbilityReady { tower });
        }
    }
}

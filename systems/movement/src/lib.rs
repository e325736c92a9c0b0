#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Waypoint-following enemy movement.
//!
//! Enemies carry their full route as world-space waypoints; each tick they
//! advance along it by their effective speed, stepping across as many
//! waypoints as the travel budget covers so that high speeds and short
//! segments never stall progress. Reaching the final waypoint removes the
//! enemy and costs the player a life.

use std::time::Duration;

use gridspire_core::Event;
use gridspire_world::World;

/// Advances every enemy along its route by the elapsed tick.
///
/// Slows reduce the travel budget multiplicatively; a full slow pins the
/// enemy in place without cancelling its route. Enemies that reach their
/// final waypoint emit [`Event::EnemyExited`], deduct one life and are
/// despawned at the end of the update.
pub fn update(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let mut exited = Vec::new();

    for entity in world.components.enemies.entities() {
        let components = &mut world.components;
        let Some(enemy) = components.enemies.get_mut(entity) else {
            continue;
        };
        let Some(position) = components.positions.get_mut(entity) else {
            continue;
        };
        let slow = components
            .statuses
            .get(entity)
            .map_or(0.0, |statuses| statuses.slow_factor());

        let mut travel = enemy.speed * (1.0 - slow) * dt.as_secs_f32();
        while travel > 0.0 && enemy.next_waypoint < enemy.route.len() {
            let target = enemy.route[enemy.next_waypoint];
            let delta = target - position.at;
            let distance = delta.length();
            if distance <= travel {
                position.at = target;
                travel -= distance;
                enemy.next_waypoint += 1;
            } else {
                position.at += delta / distance * travel;
                travel = 0.0;
            }
        }

        if enemy.next_waypoint >= enemy.route.len() {
            exited.push(entity);
        }
    }

    for entity in exited {
        out_events.push(Event::EnemyExited { enemy: entity });
        world.lose_life();
        world.defer_despawn(entity);
    }
    world.flush_despawns();
}

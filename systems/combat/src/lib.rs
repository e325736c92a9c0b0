#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projectile flight, collision and damage resolution.
//!
//! Each tick runs two phases. Status effects tick first so that expiring
//! damage-over-time payloads land before any projectile resolves. Projectiles
//! then integrate, steer, collide and deal damage; splash areas and chain
//! hops fan out from the direct hit. Kills award bounty gold and deaths are
//! despawned in one batch at the end of the tick.

pub mod damage;

use std::time::Duration;

use glam::Vec2;
use gridspire_core::{DamageType, Entity, Event, WorldPoint};
use gridspire_world::{ChainState, Homing, Projectile, World};

/// Distance at which a projectile registers a hit, tuned for the 32-unit
/// cell grid.
const HIT_RADIUS: f32 = 16.0;

/// Turn rate of freshly forked chain bolts.
const CHAIN_TURN_RATE: f32 = 12.0;

/// Splash damage fraction remaining at the edge of the blast radius.
const SPLASH_EDGE_FALLOFF: f32 = 0.5;

struct ChainRequest {
    from: Vec2,
    target: Entity,
    projectile: Projectile,
}

/// Runs status ticking, projectile flight and damage resolution for one tick.
pub fn update(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    tick_statuses(world, dt, out_events);

    let mut chain_requests = Vec::new();
    for entity in world.components.projectiles.entities() {
        let Some(mut projectile) = world.components.projectiles.remove(entity) else {
            continue;
        };
        let Some(mut position) = world.components.positions.remove(entity) else {
            world.defer_despawn(entity);
            continue;
        };

        steer(world, &mut projectile, position.at, dt);

        let step = projectile.velocity * dt.as_secs_f32();
        position.at += step;
        projectile.traveled += step.length();
        out_events.push(Event::ProjectileTrail {
            projectile: entity,
            at: point(position.at),
            damage_type: projectile.damage_type,
        });

        let mut destroyed = false;
        for enemy in collisions(world, &projectile, position.at) {
            resolve_hit(
                world,
                entity,
                &mut projectile,
                position.at,
                enemy,
                out_events,
                &mut chain_requests,
            );
            if !projectile.pierce || projectile.splash_radius.is_some() {
                destroyed = true;
                break;
            }
        }
        if projectile.traveled >= projectile.max_distance {
            destroyed = true;
        }

        if destroyed {
            world.defer_despawn(entity);
        } else {
            let _ = world.components.projectiles.insert(entity, projectile);
            let _ = world.components.positions.insert(entity, position);
        }
    }

    for request in chain_requests {
        fork_chain_bolt(world, request, out_events);
    }

    world.flush_despawns();
}

/// Deals direct damage to an enemy, bypassing the projectile pipeline.
///
/// Used by world-level instant effects. Resistance, armor and amplification
/// still apply according to the damage type.
pub fn deal_damage(
    world: &mut World,
    enemy: Entity,
    base_damage: f32,
    damage_type: DamageType,
    killer: Option<Entity>,
    out_events: &mut Vec<Event>,
) {
    apply_damage(world, enemy, base_damage, damage_type, killer, out_events);
}

fn tick_statuses(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    for entity in world.components.statuses.entities() {
        let Some(statuses) = world.components.statuses.get_mut(entity) else {
            continue;
        };
        let dot_damage = statuses.tick(dt);
        if dot_damage <= 0.0 {
            continue;
        }

        // Damage-over-time is true damage; mitigation was resolved when the
        // payload landed.
        let killed = {
            let Some(health) = world.components.healths.get_mut(entity) else {
                continue;
            };
            if health.dead {
                continue;
            }
            health.current -= dot_damage;
            if health.current <= 0.0 {
                health.current = 0.0;
                health.dead = true;
                true
            } else {
                false
            }
        };
        if killed {
            report_death(world, entity, None, out_events);
        }
    }
}

fn steer(world: &World, projectile: &mut Projectile, at: Vec2, dt: Duration) {
    let Homing::Tracking { target, turn_rate } = projectile.homing else {
        return;
    };

    let target_live = world.is_alive(target)
        && world
            .components
            .healths
            .get(target)
            .is_some_and(|health| !health.dead);
    if !target_live {
        projectile.homing = Homing::Lost;
        return;
    }
    let Some(target_position) = world.components.positions.get(target) else {
        projectile.homing = Homing::Lost;
        return;
    };

    let desired = (target_position.at - at).normalize_or_zero();
    let current = projectile.velocity.normalize_or_zero();
    let blend = (turn_rate * dt.as_secs_f32()).min(1.0);
    let heading = current.lerp(desired, blend).normalize_or_zero();
    if heading != Vec2::ZERO {
        projectile.velocity = heading * projectile.speed;
    }
}

/// Every live, non-phased, not-yet-hit enemy within the hit radius, nearest
/// first. Distance ties keep ascending entity order.
fn collisions(world: &World, projectile: &Projectile, at: Vec2) -> Vec<Entity> {
    let mut struck: Vec<(Entity, f32)> = Vec::new();
    for (entity, enemy) in world.components.enemies.iter() {
        if enemy.phased || projectile.hit.contains(&entity) {
            continue;
        }
        if !world
            .components
            .healths
            .get(entity)
            .is_some_and(|health| !health.dead)
        {
            continue;
        }
        let Some(position) = world.components.positions.get(entity) else {
            continue;
        };
        let distance = position.at.distance(at);
        if distance > HIT_RADIUS {
            continue;
        }
        struck.push((entity, distance));
    }
    struck.sort_by(|a, b| a.1.total_cmp(&b.1));
    struck.into_iter().map(|(entity, _)| entity).collect()
}

fn resolve_hit(
    world: &mut World,
    projectile_entity: Entity,
    projectile: &mut Projectile,
    impact: Vec2,
    enemy: Entity,
    out_events: &mut Vec<Event>,
    chain_requests: &mut Vec<ChainRequest>,
) {
    out_events.push(Event::ProjectileImpact {
        projectile: projectile_entity,
        enemy,
        at: point(impact),
        damage_type: projectile.damage_type,
    });
    let _ = projectile.hit.insert(enemy);

    if let Some(struck) = world.components.enemies.get_mut(enemy) {
        struck.stealthed = false;
    }
    if let Some(statuses) = world.components.statuses.get_mut(enemy) {
        if let Some(slow) = projectile.slow {
            statuses.apply(
                gridspire_world::StatusKind::Slow {
                    factor: slow.factor,
                },
                slow.duration,
            );
        }
        if let Some(dot) = projectile.dot {
            statuses.apply(
                gridspire_world::StatusKind::DamageOverTime {
                    damage_per_second: dot.damage_per_second,
                },
                dot.duration,
            );
        }
    }

    apply_damage(
        world,
        enemy,
        projectile.damage,
        projectile.damage_type,
        projectile.source,
        out_events,
    );

    if let Some(radius) = projectile.splash_radius {
        resolve_splash(world, projectile, impact, radius, out_events);
    }
    queue_chain_hop(world, projectile, enemy, chain_requests);
}

fn resolve_splash(
    world: &mut World,
    projectile: &mut Projectile,
    center: Vec2,
    radius: f32,
    out_events: &mut Vec<Event>,
) {
    out_events.push(Event::Explosion {
        at: point(center),
        radius,
        damage_type: projectile.damage_type,
    });

    for entity in world.components.enemies.entities() {
        if projectile.hit.contains(&entity) {
            continue;
        }
        let Some(enemy) = world.components.enemies.get(entity) else {
            continue;
        };
        if enemy.phased {
            continue;
        }
        let Some(position) = world.components.positions.get(entity) else {
            continue;
        };
        let distance = position.at.distance(center);
        if distance > radius {
            continue;
        }

        let _ = projectile.hit.insert(entity);
        if let Some(struck) = world.components.enemies.get_mut(entity) {
            struck.stealthed = false;
        }
        let falloff = 1.0 - SPLASH_EDGE_FALLOFF * (distance / radius);
        apply_damage(
            world,
            entity,
            projectile.damage * falloff,
            projectile.damage_type,
            projectile.source,
            out_events,
        );
    }
}

fn queue_chain_hop(
    world: &World,
    projectile: &mut Projectile,
    struck: Entity,
    chain_requests: &mut Vec<ChainRequest>,
) {
    let Some(chain) = projectile.chain.as_mut() else {
        return;
    };
    let _ = chain.visited.insert(struck);
    if chain.remaining == 0 {
        return;
    }
    let Some(origin) = world.components.positions.get(struck).map(|p| p.at) else {
        return;
    };

    let mut next: Option<(Entity, f32)> = None;
    for (entity, enemy) in world.components.enemies.iter() {
        if enemy.phased || chain.visited.contains(&entity) || projectile.hit.contains(&entity) {
            continue;
        }
        if !world
            .components
            .healths
            .get(entity)
            .is_some_and(|health| !health.dead)
        {
            continue;
        }
        let Some(position) = world.components.positions.get(entity) else {
            continue;
        };
        let distance = position.at.distance(origin);
        if distance > chain.range {
            continue;
        }
        match next {
            Some((_, best)) if distance >= best => {}
            _ => next = Some((entity, distance)),
        }
    }
    let Some((target, _)) = next else {
        return;
    };

    let forked = Projectile {
        damage: projectile.damage,
        damage_type: projectile.damage_type,
        velocity: Vec2::ZERO,
        speed: projectile.speed,
        homing: Homing::Tracking {
            target,
            turn_rate: CHAIN_TURN_RATE,
        },
        traveled: 0.0,
        max_distance: chain.range * 2.0,
        pierce: false,
        hit: chain.visited.clone(),
        splash_radius: None,
        chain: Some(ChainState {
            remaining: chain.remaining - 1,
            range: chain.range,
            visited: chain.visited.clone(),
        }),
        slow: projectile.slow,
        dot: projectile.dot,
        source: projectile.source,
    };
    chain_requests.push(ChainRequest {
        from: origin,
        target,
        projectile: forked,
    });
}

fn fork_chain_bolt(world: &mut World, request: ChainRequest, out_events: &mut Vec<Event>) {
    let Some(target_at) = world
        .components
        .positions
        .get(request.target)
        .map(|p| p.at)
    else {
        return;
    };

    out_events.push(Event::ChainBeam {
        from: point(request.from),
        to: point(target_at),
    });

    let mut projectile = request.projectile;
    projectile.velocity = (target_at - request.from).normalize_or_zero() * projectile.speed;

    let bolt = world.spawn();
    let _ = world
        .components
        .positions
        .insert(bolt, gridspire_world::Position { at: request.from });
    let _ = world.components.projectiles.insert(bolt, projectile);
}

fn apply_damage(
    world: &mut World,
    enemy: Entity,
    base_damage: f32,
    damage_type: DamageType,
    killer: Option<Entity>,
    out_events: &mut Vec<Event>,
) {
    let resistance = world
        .components
        .resistances
        .get(enemy)
        .map_or(0.0, |resistances| resistances.get(damage_type));
    let (armor_reduction, amplification) = world
        .components
        .statuses
        .get(enemy)
        .map_or((0.0, 1.0), |statuses| {
            (statuses.armor_reduction(), statuses.damage_amplification())
        });

    let killed = {
        let Some(health) = world.components.healths.get_mut(enemy) else {
            return;
        };
        if health.dead {
            return;
        }
        let final_damage = damage::resolve(
            base_damage,
            damage_type,
            resistance,
            health.armor,
            armor_reduction,
            amplification,
        );
        health.current -= final_damage;
        if health.current <= 0.0 {
            health.current = 0.0;
            health.dead = true;
            true
        } else {
            false
        }
    };
    if killed {
        report_death(world, enemy, killer, out_events);
    }
}

fn report_death(
    world: &mut World,
    enemy: Entity,
    killer: Option<Entity>,
    out_events: &mut Vec<Event>,
) {
    let at = world
        .components
        .positions
        .get(enemy)
        .map_or(WorldPoint::new(0.0, 0.0), |position| point(position.at));
    let bounty = world
        .components
        .enemies
        .get(enemy)
        .map_or(0, |e| e.species.bounty());

    out_events.push(Event::EnemyDied { enemy, at, killer });
    world.add_gold(bounty);
    world.defer_despawn(enemy);
}

fn point(v: Vec2) -> WorldPoint {
    WorldPoint::new(v.x, v.y)
}

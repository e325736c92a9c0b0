#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless simulation driver for the Gridspire tower-defence core.
//!
//! Loads an ASCII layout, precomputes routes, places a tower at every
//! path-adjacent site, then runs the fixed-step simulation: spawning enemy
//! waves, firing towers at the nearest visible target, cycling abilities and
//! resolving combat. Prints a summary when the tick budget runs out or the
//! defence falls.

mod layout;

use std::{collections::BTreeMap, fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use glam::Vec2;
use gridspire_core::{
    AbilityState, CellKind, ChainSpec, Command, DamageType, DotPayload, EnemySpecies, Entity,
    Event, GridPos, InstantEffect, ProjectileSpec, SlowPayload, TowerKind, WorldPoint,
};
use gridspire_system_pathfinding::{PathManager, PathfinderConfig};
use gridspire_world::{query, AbilityMultipliers, StatusKind, World};

const CELL_SIZE: f32 = 32.0;
const TICK: Duration = Duration::from_micros(16_667);
const SPAWN_INTERVAL_TICKS: u32 = 90;
const MAX_TOWERS: usize = 5;

const SPECIES_CYCLE: [EnemySpecies; 5] = [
    EnemySpecies::Runner,
    EnemySpecies::Brute,
    EnemySpecies::Shade,
    EnemySpecies::Wraith,
    EnemySpecies::Wisp,
];
const TOWER_CYCLE: [TowerKind; 5] = [
    TowerKind::Arrow,
    TowerKind::Cannon,
    TowerKind::Tesla,
    TowerKind::Frost,
    TowerKind::Venom,
];

const BLAST_RADIUS: f32 = 120.0;
const BLAST_DAMAGE: f32 = 45.0;
const CHAIN_SURGE_DAMAGE: f32 = 20.0;
const FREEZE_DURATION: Duration = Duration::from_millis(2_500);

const DEMO_LAYOUT: &str = "\
############
S==========#
#.........=#
#.........=#
#.........=#
#E=========#
############
";

/// Headless grid tower-defence simulation.
#[derive(Debug, Parser)]
#[command(name = "gridspire")]
struct Args {
    /// Number of fixed 60 Hz ticks to simulate.
    #[arg(long, default_value_t = 3_600)]
    ticks: u32,
    /// Seed for route selection.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// ASCII layout file; the built-in demo map is used when omitted.
    #[arg(long)]
    layout: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = match &args.layout {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading layout {}", path.display()))?,
        None => DEMO_LAYOUT.to_owned(),
    };
    let grid = layout::parse(&source, CELL_SIZE).context("parsing layout")?;

    let mut manager = PathManager::new(PathfinderConfig::default(), args.seed, &grid);
    ensure!(
        !manager.routes().is_empty(),
        "no spawn cell can reach an exit"
    );

    let mut world = World::new(grid);
    let mut events = Vec::new();
    place_towers(&mut world, &mut events);
    let tower_count = world.components.towers.len();

    let mut fire_timers: BTreeMap<Entity, Duration> = BTreeMap::new();
    let mut spawned = 0u32;
    let mut kills = 0u32;
    let mut escapes = 0u32;
    let mut simulated = 0u32;

    for tick in 0..args.ticks {
        simulated = tick + 1;
        events.clear();

        if tick % SPAWN_INTERVAL_TICKS == 0 {
            let species = SPECIES_CYCLE[(spawned as usize) % SPECIES_CYCLE.len()];
            if let Some(route) = pick_route(&mut manager, species) {
                gridspire_world::apply(
                    &mut world,
                    Command::SpawnEnemy { species, route },
                    &mut events,
                );
                spawned += 1;
            }
        }

        cycle_abilities(&mut world, &mut events);
        gridspire_system_abilities::update(&mut world, TICK, &mut events);
        let instants: Vec<(Entity, InstantEffect)> = events
            .iter()
            .filter_map(|event| match event {
                Event::InstantAbility { tower, effect } => Some((*tower, *effect)),
                _ => None,
            })
            .collect();
        for (tower, effect) in instants {
            execute_instant(&mut world, tower, effect, &mut events);
        }

        fire_towers(&mut world, &mut fire_timers, &mut events);
        gridspire_system_movement::update(&mut world, TICK, &mut events);
        gridspire_system_combat::update(&mut world, TICK, &mut events);

        for event in &events {
            match event {
                Event::EnemyDied { .. } => kills += 1,
                Event::EnemyExited { .. } => escapes += 1,
                _ => {}
            }
        }
        if query::lives(&world) == 0 {
            break;
        }
    }

    let grid = query::grid(&world);
    println!(
        "simulated {simulated} ticks on a {}x{} grid with {tower_count} towers",
        grid.width(),
        grid.height()
    );
    println!("enemies spawned: {spawned}, killed: {kills}, escaped: {escapes}");
    println!(
        "gold: {}, lives remaining: {}",
        query::gold(&world),
        query::lives(&world)
    );
    Ok(())
}

/// Picks the route an enemy of the species should ride.
///
/// Flying species ignore terrain and ride the straight line between the
/// endpoints of a randomly chosen ground route.
fn pick_route(manager: &mut PathManager, species: EnemySpecies) -> Option<Vec<GridPos>> {
    let (spawn, exit, ground) = {
        let route = manager.random_route()?;
        (route.spawn, route.exit, route.path.cells().to_vec())
    };
    if species.is_flying() {
        Some(manager.flight_route(spawn, exit).path.cells().to_vec())
    } else {
        Some(ground)
    }
}

/// Places one tower on each path-adjacent empty cell, up to the cap.
fn place_towers(world: &mut World, events: &mut Vec<Event>) {
    let sites = tower_sites(world);
    let step = (sites.len() / MAX_TOWERS).max(1);
    for (index, cell) in sites.into_iter().step_by(step).take(MAX_TOWERS).enumerate() {
        let kind = TOWER_CYCLE[index % TOWER_CYCLE.len()];
        gridspire_world::apply(world, Command::PlaceTower { kind, cell }, events);
    }
}

fn tower_sites(world: &World) -> Vec<GridPos> {
    let grid = query::grid(world);
    let mut sites = Vec::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = GridPos::new(x, y);
            if grid.kind(cell) != Some(CellKind::Empty) {
                continue;
            }
            let beside_path = neighbours(cell)
                .into_iter()
                .any(|near| grid.is_walkable(near));
            if beside_path {
                sites.push(cell);
            }
        }
    }
    sites
}

fn neighbours(cell: GridPos) -> Vec<GridPos> {
    let mut cells = Vec::with_capacity(4);
    if cell.x() > 0 {
        cells.push(GridPos::new(cell.x() - 1, cell.y()));
    }
    if cell.y() > 0 {
        cells.push(GridPos::new(cell.x(), cell.y() - 1));
    }
    cells.push(GridPos::new(cell.x() + 1, cell.y()));
    cells.push(GridPos::new(cell.x(), cell.y() + 1));
    cells
}

/// Activates any ability the moment it is ready.
fn cycle_abilities(world: &mut World, events: &mut Vec<Event>) {
    for tower in world.components.abilities.entities() {
        let ready = world.components.abilities.get(tower).map(|a| a.state())
            == Some(AbilityState::Ready);
        if ready {
            let _ = gridspire_system_abilities::activate(world, tower, events);
        }
    }
}

fn fire_towers(world: &mut World, timers: &mut BTreeMap<Entity, Duration>, events: &mut Vec<Event>) {
    for tower in world.components.towers.entities() {
        let Some(kind) = world.components.towers.get(tower).map(|t| t.kind) else {
            continue;
        };
        let Some(at) = world.components.positions.get(tower).map(|p| p.at) else {
            continue;
        };
        let multipliers = world
            .components
            .abilities
            .get(tower)
            .map_or(AbilityMultipliers::NEUTRAL, |a| *a.multipliers());

        let timer = timers.entry(tower).or_insert(Duration::ZERO);
        *timer = timer.saturating_sub(TICK);
        if !timer.is_zero() {
            continue;
        }

        let range = kind.range() * multipliers.range;
        let Some(target) = select_target(world, at, range) else {
            continue;
        };
        *timers.entry(tower).or_insert(Duration::ZERO) =
            fire_period(kind).div_f32(multipliers.fire_rate.max(0.01));
        gridspire_world::apply(
            world,
            Command::FireProjectile {
                source: tower,
                target,
                spec: weapon(kind),
            },
            events,
        );
    }
}

/// Nearest live, visible, non-phased enemy within range.
fn select_target(world: &World, from: Vec2, range: f32) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for (entity, enemy) in world.components.enemies.iter() {
        if enemy.phased || enemy.stealthed {
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
        let distance = position.at.distance(from);
        if distance > range {
            continue;
        }
        match best {
            Some((_, nearest)) if distance >= nearest => {}
            _ => best = Some((entity, distance)),
        }
    }
    best.map(|(entity, _)| entity)
}

fn execute_instant(
    world: &mut World,
    tower: Entity,
    effect: InstantEffect,
    events: &mut Vec<Event>,
) {
    let Some(origin) = world.components.positions.get(tower).map(|p| p.at) else {
        return;
    };
    match effect {
        InstantEffect::MultiExplosion => {
            events.push(Event::Explosion {
                at: point(origin),
                radius: BLAST_RADIUS,
                damage_type: DamageType::Fire,
            });
            for enemy in world.components.enemies.entities() {
                if is_phased(world, enemy) {
                    continue;
                }
                let in_range = world
                    .components
                    .positions
                    .get(enemy)
                    .is_some_and(|p| p.at.distance(origin) <= BLAST_RADIUS);
                if in_range {
                    gridspire_system_combat::deal_damage(
                        world,
                        enemy,
                        BLAST_DAMAGE,
                        DamageType::Fire,
                        Some(tower),
                        events,
                    );
                }
            }
        }
        InstantEffect::GlobalChain => {
            for enemy in world.components.enemies.entities() {
                if is_phased(world, enemy) {
                    continue;
                }
                let Some(to) = world.components.positions.get(enemy).map(|p| p.at) else {
                    continue;
                };
                events.push(Event::ChainBeam {
                    from: point(origin),
                    to: point(to),
                });
                gridspire_system_combat::deal_damage(
                    world,
                    enemy,
                    CHAIN_SURGE_DAMAGE,
                    DamageType::Lightning,
                    Some(tower),
                    events,
                );
            }
        }
        InstantEffect::MassFreeze => {
            for enemy in world.components.enemies.entities() {
                if let Some(statuses) = world.components.statuses.get_mut(enemy) {
                    statuses.apply(StatusKind::Slow { factor: 1.0 }, FREEZE_DURATION);
                }
            }
        }
    }
}

fn is_phased(world: &World, enemy: Entity) -> bool {
    world
        .components
        .enemies
        .get(enemy)
        .is_some_and(|e| e.phased)
}

fn weapon(kind: TowerKind) -> ProjectileSpec {
    let blank = ProjectileSpec {
        damage: 0.0,
        damage_type: DamageType::Physical,
        speed: 240.0,
        max_distance: 600.0,
        pierce: false,
        homing_turn_rate: Some(8.0),
        splash_radius: None,
        chain: None,
        slow: None,
        dot: None,
    };
    match kind {
        TowerKind::Arrow => ProjectileSpec {
            damage: 14.0,
            speed: 320.0,
            ..blank
        },
        TowerKind::Cannon => ProjectileSpec {
            damage: 30.0,
            damage_type: DamageType::Fire,
            speed: 180.0,
            homing_turn_rate: None,
            splash_radius: Some(48.0),
            ..blank
        },
        TowerKind::Tesla => ProjectileSpec {
            damage: 12.0,
            damage_type: DamageType::Lightning,
            speed: 260.0,
            chain: Some(ChainSpec {
                hops: 2,
                range: 96.0,
            }),
            ..blank
        },
        TowerKind::Frost => ProjectileSpec {
            damage: 6.0,
            damage_type: DamageType::Frost,
            slow: Some(SlowPayload {
                factor: 0.4,
                duration: Duration::from_secs(2),
            }),
            ..blank
        },
        TowerKind::Venom => ProjectileSpec {
            damage: 8.0,
            damage_type: DamageType::Poison,
            speed: 260.0,
            dot: Some(DotPayload {
                damage_per_second: 6.0,
                duration: Duration::from_secs(3),
            }),
            ..blank
        },
    }
}

fn fire_period(kind: TowerKind) -> Duration {
    match kind {
        TowerKind::Arrow => Duration::from_millis(500),
        TowerKind::Cannon => Duration::from_millis(1_600),
        TowerKind::Tesla => Duration::from_millis(1_100),
        TowerKind::Frost => Duration::from_millis(900),
        TowerKind::Venom => Duration::from_millis(800),
    }
}

fn point(v: Vec2) -> WorldPoint {
    WorldPoint::new(v.x, v.y)
}

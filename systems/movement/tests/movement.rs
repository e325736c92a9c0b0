//! Integration coverage for waypoint-following enemy movement.

use std::time::Duration;

use glam::Vec2;
use gridspire_core::{CellKind, Command, EnemySpecies, Event, GridPos};
use gridspire_world::{query, GridMap, StatusKind, World};

const CELL_SIZE: f32 = 32.0;
const DT: Duration = Duration::from_millis(100);

fn corridor_world() -> World {
    let mut grid = GridMap::new(6, 4, CELL_SIZE);
    assert!(grid.set_kind(GridPos::new(0, 1), CellKind::Spawn));
    for x in 1..5 {
        assert!(grid.set_kind(GridPos::new(x, 1), CellKind::Path));
    }
    assert!(grid.set_kind(GridPos::new(5, 1), CellKind::Exit));
    World::new(grid)
}

fn corridor_route() -> Vec<GridPos> {
    (0..6).map(|x| GridPos::new(x, 1)).collect()
}

fn spawn_enemy(world: &mut World, species: EnemySpecies, route: Vec<GridPos>) -> gridspire_core::Entity {
    let mut events = Vec::new();
    gridspire_world::apply(world, Command::SpawnEnemy { species, route }, &mut events);
    match events.last() {
        Some(Event::EnemySpawned { enemy, .. }) => *enemy,
        other => panic!("expected spawn event, got {other:?}"),
    }
}

fn cell_center(x: u32, y: u32) -> Vec2 {
    Vec2::new((x as f32 + 0.5) * CELL_SIZE, (y as f32 + 0.5) * CELL_SIZE)
}

#[test]
fn enemies_advance_at_their_base_speed() {
    let mut world = corridor_world();
    let enemy = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    let mut events = Vec::new();

    gridspire_system_movement::update(&mut world, DT, &mut events);

    let expected = cell_center(0, 1)
        + Vec2::new(EnemySpecies::Runner.speed() * DT.as_secs_f32(), 0.0);
    let at = world.components.positions.get(enemy).unwrap().at;
    assert!((at - expected).length() < 1e-4);
    assert!(events.is_empty());
}

#[test]
fn a_single_tick_can_cross_several_waypoints() {
    let mut world = corridor_world();
    let enemy = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    let mut events = Vec::new();

    // 72 units per second for one second covers two full cells and a bit.
    gridspire_system_movement::update(&mut world, Duration::from_secs(1), &mut events);

    let at = world.components.positions.get(enemy).unwrap().at;
    assert!(at.x > cell_center(2, 1).x);
    assert_eq!(world.components.enemies.get(enemy).unwrap().next_waypoint, 3);
}

#[test]
fn slows_scale_the_travel_budget() {
    let mut world = corridor_world();
    let fast = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    let slowed = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    world
        .components
        .statuses
        .get_mut(slowed)
        .unwrap()
        .apply(StatusKind::Slow { factor: 0.5 }, Duration::from_secs(10));
    let mut events = Vec::new();

    gridspire_system_movement::update(&mut world, DT, &mut events);

    let origin = cell_center(0, 1);
    let fast_travel = (world.components.positions.get(fast).unwrap().at - origin).length();
    let slow_travel = (world.components.positions.get(slowed).unwrap().at - origin).length();
    assert!((slow_travel - fast_travel * 0.5).abs() < 1e-4);
}

#[test]
fn a_full_slow_pins_the_enemy_in_place() {
    let mut world = corridor_world();
    let enemy = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    world
        .components
        .statuses
        .get_mut(enemy)
        .unwrap()
        .apply(StatusKind::Slow { factor: 1.0 }, Duration::from_secs(10));
    let mut events = Vec::new();

    gridspire_system_movement::update(&mut world, Duration::from_secs(5), &mut events);

    let at = world.components.positions.get(enemy).unwrap().at;
    assert!((at - cell_center(0, 1)).length() < 1e-4);
    assert!(world.is_alive(enemy));
}

#[test]
fn reaching_the_exit_removes_the_enemy_and_costs_a_life() {
    let mut world = corridor_world();
    let enemy = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    let lives_before = query::lives(&world);
    let mut events = Vec::new();

    // Five cells of corridor at 72 units per second; ten seconds is plenty.
    gridspire_system_movement::update(&mut world, Duration::from_secs(10), &mut events);

    assert_eq!(events, vec![Event::EnemyExited { enemy }]);
    assert_eq!(query::lives(&world), lives_before - 1);
    assert!(!world.is_alive(enemy));
    assert!(world.components.enemies.get(enemy).is_none());
}

#[test]
fn expired_slows_stop_affecting_movement() {
    let mut world = corridor_world();
    let enemy = spawn_enemy(&mut world, EnemySpecies::Runner, corridor_route());
    {
        let statuses = world.components.statuses.get_mut(enemy).unwrap();
        statuses.apply(StatusKind::Slow { factor: 1.0 }, Duration::from_secs(1));
        let _ = statuses.tick(Duration::from_secs(2));
    }
    let mut events = Vec::new();

    gridspire_system_movement::update(&mut world, DT, &mut events);

    let travelled =
        (world.components.positions.get(enemy).unwrap().at - cell_center(0, 1)).length();
    assert!((travelled - EnemySpecies::Runner.speed() * DT.as_secs_f32()).abs() < 1e-4);
}

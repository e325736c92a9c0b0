#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Gridspire simulation.
//!
//! The world composes the recycling entity allocator, one component store per
//! component type, the grid map and the player-facing counters. External
//! collaborators mutate it exclusively through [`apply`], while the pure
//! systems receive `&mut World` once per fixed tick and report outcomes as
//! [`Event`] values.

mod components;
mod entities;
mod grid;

pub use components::{
    AbilityMultipliers, AbilityTransition, Activation, ChainState, Enemy, Health, Homing, Position,
    Projectile, Resistances, StatusEffect, StatusEffects, StatusKind, Tower, TowerAbility,
};
pub use entities::ComponentStore;
pub use grid::{Cell, GridMap};

use entities::EntityAllocator;
use glam::Vec2;
use gridspire_core::{Command, Entity, Event, GridPos, PlacementError, RemovalError, TowerKind};

const STARTING_LIVES: u32 = 20;

/// One store per component type, composed by the world.
///
/// Stores own all component data; no component depends on another component's
/// presence. Systems look components up explicitly by entity id.
#[derive(Debug, Default)]
pub struct Components {
    /// World-space locations of towers, enemies and projectiles.
    pub positions: ComponentStore<Position>,
    /// Health pools of damageable entities.
    pub healths: ComponentStore<Health>,
    /// Resistance tables of damageable entities.
    pub resistances: ComponentStore<Resistances>,
    /// Status-effect stacks of enemies.
    pub statuses: ComponentStore<StatusEffects>,
    /// In-flight projectile state.
    pub projectiles: ComponentStore<Projectile>,
    /// Enemies marching along routes.
    pub enemies: ComponentStore<Enemy>,
    /// Static tower data.
    pub towers: ComponentStore<Tower>,
    /// Tower ability state machines.
    pub abilities: ComponentStore<TowerAbility>,
}

impl Components {
    fn remove_all(&mut self, entity: Entity) {
        let _ = self.positions.remove(entity);
        let _ = self.healths.remove(entity);
        let _ = self.resistances.remove(entity);
        let _ = self.statuses.remove(entity);
        let _ = self.projectiles.remove(entity);
        let _ = self.enemies.remove(entity);
        let _ = self.towers.remove(entity);
        let _ = self.abilities.remove(entity);
    }
}

/// Authoritative Gridspire world state.
#[derive(Debug)]
pub struct World {
    entities: EntityAllocator,
    /// Component stores keyed by entity id.
    pub components: Components,
    grid: GridMap,
    pending_despawn: Vec<Entity>,
    gold: u32,
    lives: u32,
}

impl World {
    /// Creates a world around a grid supplied fully formed by the loader.
    #[must_use]
    pub fn new(grid: GridMap) -> Self {
        Self {
            entities: EntityAllocator::new(),
            components: Components::default(),
            grid,
            pending_despawn: Vec::new(),
            gold: 0,
            lives: STARTING_LIVES,
        }
    }

    /// Allocates a fresh or recycled entity identifier.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Destroys an entity immediately, detaching all of its components.
    ///
    /// Returns `false` when the entity is already dead. Systems iterating
    /// component stores must prefer [`World::defer_despawn`] instead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.release(entity) {
            return false;
        }
        self.components.remove_all(entity);
        true
    }

    /// Reports whether the entity is currently alive.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Queues an entity for destruction at the end of the current tick.
    pub fn defer_despawn(&mut self, entity: Entity) {
        if !self.pending_despawn.contains(&entity) {
            self.pending_despawn.push(entity);
        }
    }

    /// Destroys every entity queued by [`World::defer_despawn`].
    pub fn flush_despawns(&mut self) {
        while let Some(entity) = self.pending_despawn.pop() {
            let _ = self.despawn(entity);
        }
    }

    /// Number of live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Read-only access to the grid map.
    #[must_use]
    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// Mutable access to the grid map for the level-loading collaborator.
    ///
    /// Layout edits require the path manager to be told via its
    /// `on_map_changed` entry point; tower placement goes through [`apply`]
    /// and never affects routing.
    pub fn grid_mut(&mut self) -> &mut GridMap {
        &mut self.grid
    }

    /// Gold accumulated from bounties, read by the HUD collaborator.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Lives remaining, read by the HUD collaborator.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Credits bounty gold for a kill.
    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Removes one life after an enemy escapes.
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Invalid requests are rejected through events or silently ignored; no
/// command ever panics or leaves partial mutations behind.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTower { kind, cell } => place_tower(world, kind, cell, out_events),
        Command::RemoveTower { tower } => remove_tower(world, tower, out_events),
        Command::SpawnEnemy { species, route } => spawn_enemy(world, species, route, out_events),
        Command::FireProjectile {
            source,
            target,
            spec,
        } => fire_projectile(world, source, target, spec),
    }
}

fn place_tower(world: &mut World, kind: TowerKind, cell: GridPos, out_events: &mut Vec<Event>) {
    if !world.grid.in_bounds(cell) {
        out_events.push(Event::TowerPlacementRejected {
            kind,
            cell,
            reason: PlacementError::OutOfBounds,
        });
        return;
    }
    if !world.grid.can_place_tower(cell) {
        out_events.push(Event::TowerPlacementRejected {
            kind,
            cell,
            reason: PlacementError::Occupied,
        });
        return;
    }

    let tower = world.spawn();
    if !world.grid.place_tower(cell, tower) {
        let _ = world.despawn(tower);
        out_events.push(Event::TowerPlacementRejected {
            kind,
            cell,
            reason: PlacementError::Occupied,
        });
        return;
    }

    let centre = world.grid.grid_to_world(cell).unwrap_or(Vec2::ZERO);
    let _ = world
        .components
        .positions
        .insert(tower, Position { at: centre });
    let _ = world.components.towers.insert(tower, Tower { kind, cell });
    let _ = world
        .components
        .abilities
        .insert(tower, TowerAbility::new(kind.ability()));

    out_events.push(Event::TowerPlaced { tower, kind, cell });
}

fn remove_tower(world: &mut World, tower: Entity, out_events: &mut Vec<Event>) {
    let Some(data) = world.components.towers.get(tower).copied() else {
        out_events.push(Event::TowerRemovalRejected {
            tower,
            reason: RemovalError::MissingTower,
        });
        return;
    };

    let _ = world.grid.remove_tower(data.cell);
    let _ = world.despawn(tower);
    out_events.push(Event::TowerRemoved {
        tower,
        cell: data.cell,
    });
}

fn spawn_enemy(
    world: &mut World,
    species: gridspire_core::EnemySpecies,
    route: Vec<GridPos>,
    out_events: &mut Vec<Event>,
) {
    let mut waypoints = Vec::with_capacity(route.len());
    for cell in &route {
        let Some(point) = world.grid.grid_to_world(*cell) else {
            return;
        };
        waypoints.push(point);
    }
    let Some(first_cell) = route.first().copied() else {
        return;
    };
    let Some(start) = waypoints.first().copied() else {
        return;
    };

    let enemy = world.spawn();
    let _ = world
        .components
        .positions
        .insert(enemy, Position { at: start });
    let _ = world
        .components
        .enemies
        .insert(enemy, Enemy::spawn(species, waypoints));
    let _ = world
        .components
        .healths
        .insert(enemy, Health::new(species.max_health(), species.armor()));
    let _ = world
        .components
        .resistances
        .insert(enemy, Resistances::for_species(species));
    let _ = world
        .components
        .statuses
        .insert(enemy, StatusEffects::new());

    out_events.push(Event::EnemySpawned {
        enemy,
        species,
        cell: first_cell,
    });
}

fn fire_projectile(
    world: &mut World,
    source: Entity,
    target: Entity,
    spec: gridspire_core::ProjectileSpec,
) {
    if !world.is_alive(target) {
        return;
    }
    let Some(origin) = world.components.positions.get(source).map(|p| p.at) else {
        return;
    };
    let Some(aim) = world.components.positions.get(target).map(|p| p.at) else {
        return;
    };

    let mut spec = spec;
    if let Some(ability) = world.components.abilities.get_mut(source) {
        spec.damage *= ability.multipliers().damage;
        if let Some(chain) = spec.chain.as_mut() {
            chain.hops = chain.hops.saturating_add(ability.multipliers().chain_bonus);
        }
        if let Some(multiplier) = ability.consume_charge() {
            spec.damage *= multiplier;
        }
    }

    let projectile = world.spawn();
    let _ = world
        .components
        .positions
        .insert(projectile, Position { at: origin });
    let _ = world.components.projectiles.insert(
        projectile,
        Projectile::from_spec(&spec, aim - origin, target, Some(source)),
    );
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{GridMap, World};

    /// Read-only access to the grid map.
    #[must_use]
    pub fn grid(world: &World) -> &GridMap {
        world.grid()
    }

    /// Gold accumulated from bounties.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.gold()
    }

    /// Lives remaining before the run is lost.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives()
    }
}

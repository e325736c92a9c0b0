#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridspire simulation.
//!
//! This crate defines the message surface that connects external
//! collaborators, the authoritative world, and the pure systems. Collaborators
//! submit [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and systems report outcomes
//! through [`Event`] values that collaborators may consume or ignore. The
//! simulation core never panics on collaborator input: invalid requests are
//! rejected through boolean returns or rejection events.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Opaque handle identifying one simulated object.
///
/// Entities carry no data themselves; components are associated with an
/// entity through per-type stores owned by the world. Identifiers are
/// recycled after destruction, so holders must treat a stored entity as a
/// weak reference and validate it against the live set before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u32);

impl Entity {
    /// Creates an entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    x: u32,
    y: u32,
}

impl GridPos {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Continuous position measured in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal world coordinate.
    pub x: f32,
    /// Vertical world coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two world points.
    #[must_use]
    pub fn distance_to(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Closed set of damage flavours resolved by the combat pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageType {
    /// Mundane kinetic damage, fully subject to armor.
    Physical,
    /// Burning damage carried by cannon shells.
    Fire,
    /// Chilling damage carried by frost shards.
    Frost,
    /// Electrical damage carried by chain bolts.
    Lightning,
    /// Toxic damage carried by venom darts.
    Poison,
    /// Armor-ignoring damage that bypasses mitigation entirely.
    True,
}

impl DamageType {
    /// Reports whether the damage type skips armor mitigation.
    #[must_use]
    pub const fn ignores_armor(self) -> bool {
        matches!(self, Self::True)
    }

    /// Enumerates every damage type in declaration order.
    #[must_use]
    pub const fn all() -> [DamageType; 6] {
        [
            Self::Physical,
            Self::Fire,
            Self::Frost,
            Self::Lightning,
            Self::Poison,
            Self::True,
        ]
    }
}

/// Types of towers that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Rapid single-target tower firing physical bolts.
    Arrow,
    /// Slow splash-damage tower firing explosive shells.
    Cannon,
    /// Chain-lightning tower arcing between nearby enemies.
    Tesla,
    /// Chilling tower that slows everything it touches.
    Frost,
    /// Toxin tower applying damage-over-time payloads.
    Venom,
}

impl TowerKind {
    /// Targeting range of the tower measured in world units.
    #[must_use]
    pub const fn range(self) -> f32 {
        match self {
            Self::Arrow => 140.0,
            Self::Cannon => 110.0,
            Self::Tesla => 120.0,
            Self::Frost => 100.0,
            Self::Venom => 120.0,
        }
    }

    /// Ability wired to the tower kind.
    #[must_use]
    pub const fn ability(self) -> AbilitySpec {
        match self {
            Self::Arrow => AbilitySpec {
                cooldown: Duration::from_secs(20),
                duration: Duration::from_secs(5),
                effect: AbilityEffect::StatBoost {
                    fire_rate: 2.0,
                    damage: 1.0,
                    range: 1.0,
                    chain_bonus: 0,
                },
            },
            Self::Cannon => AbilitySpec {
                cooldown: Duration::from_secs(30),
                duration: Duration::ZERO,
                effect: AbilityEffect::Instant(InstantEffect::MultiExplosion),
            },
            Self::Tesla => AbilitySpec {
                cooldown: Duration::from_secs(25),
                duration: Duration::from_secs(6),
                effect: AbilityEffect::StatBoost {
                    fire_rate: 1.0,
                    damage: 1.0,
                    range: 1.25,
                    chain_bonus: 2,
                },
            },
            Self::Frost => AbilitySpec {
                cooldown: Duration::from_secs(30),
                duration: Duration::ZERO,
                effect: AbilityEffect::Instant(InstantEffect::MassFreeze),
            },
            Self::Venom => AbilitySpec {
                cooldown: Duration::from_secs(15),
                duration: Duration::ZERO,
                effect: AbilityEffect::ChargedStrike {
                    damage_multiplier: 3.0,
                },
            },
        }
    }
}

/// Species of enemies that traverse the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemySpecies {
    /// Fast, fragile ground unit.
    Runner,
    /// Heavily armored ground unit.
    Brute,
    /// Flying unit that ignores terrain.
    Wisp,
    /// Stealthed unit revealed when struck.
    Shade,
    /// Unit capable of phasing out of targetability.
    Wraith,
}

impl EnemySpecies {
    /// Maximum health of a freshly spawned enemy.
    #[must_use]
    pub const fn max_health(self) -> f32 {
        match self {
            Self::Runner => 60.0,
            Self::Brute => 220.0,
            Self::Wisp => 80.0,
            Self::Shade => 90.0,
            Self::Wraith => 120.0,
        }
    }

    /// Armor value applied by the mitigation curve.
    #[must_use]
    pub const fn armor(self) -> f32 {
        match self {
            Self::Runner => 0.0,
            Self::Brute => 60.0,
            Self::Wisp => 0.0,
            Self::Shade => 10.0,
            Self::Wraith => 20.0,
        }
    }

    /// Base movement speed in world units per second.
    #[must_use]
    pub const fn speed(self) -> f32 {
        match self {
            Self::Runner => 72.0,
            Self::Brute => 28.0,
            Self::Wisp => 48.0,
            Self::Shade => 52.0,
            Self::Wraith => 44.0,
        }
    }

    /// Gold awarded when the enemy is killed.
    #[must_use]
    pub const fn bounty(self) -> u32 {
        match self {
            Self::Runner => 4,
            Self::Brute => 12,
            Self::Wisp => 6,
            Self::Shade => 8,
            Self::Wraith => 10,
        }
    }

    /// Reports whether the species ignores terrain when routed.
    #[must_use]
    pub const fn is_flying(self) -> bool {
        matches!(self, Self::Wisp)
    }

    /// Reports whether the species spawns stealthed.
    #[must_use]
    pub const fn spawns_stealthed(self) -> bool {
        matches!(self, Self::Shade)
    }

    /// Fractional resistance of the species against a damage type.
    #[must_use]
    pub const fn resistance(self, damage_type: DamageType) -> f32 {
        match (self, damage_type) {
            (Self::Brute, DamageType::Physical) => 0.25,
            (Self::Wisp, DamageType::Lightning) => 0.5,
            (Self::Shade, DamageType::Poison) => 0.3,
            (Self::Wraith, DamageType::Frost) => 0.5,
            _ => 0.0,
        }
    }
}

/// Blueprint describing a projectile supplied by the targeting collaborator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Base damage before the pipeline runs.
    pub damage: f32,
    /// Damage flavour resolved against resistances and armor.
    pub damage_type: DamageType,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Distance the projectile may travel before expiring.
    pub max_distance: f32,
    /// Whether the projectile survives its first hit.
    pub pierce: bool,
    /// Turn rate of the homing steer, if the projectile tracks its target.
    pub homing_turn_rate: Option<f32>,
    /// Radius of the area hit on impact, if the projectile splashes.
    pub splash_radius: Option<f32>,
    /// Chain-lightning behaviour, if the projectile forks on hit.
    pub chain: Option<ChainSpec>,
    /// Slow applied to struck enemies, if any.
    pub slow: Option<SlowPayload>,
    /// Damage-over-time applied to struck enemies, if any.
    pub dot: Option<DotPayload>,
}

/// Chain-lightning parameters carried by a projectile blueprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainSpec {
    /// Remaining hops the bolt may perform after its next hit.
    pub hops: u8,
    /// Maximum distance to the next chain target in world units.
    pub range: f32,
}

/// Slow payload applied to an enemy's status stack on hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowPayload {
    /// Fraction of movement speed removed, in `[0, 1]`.
    pub factor: f32,
    /// How long the slow persists.
    pub duration: Duration,
}

/// Damage-over-time payload applied to an enemy's status stack on hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotPayload {
    /// Damage applied per second while the effect is active.
    pub damage_per_second: f32,
    /// How long the effect persists.
    pub duration: Duration,
}

/// Definition of a tower ability selected by tower kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilitySpec {
    /// Time the ability spends on cooldown after use.
    pub cooldown: Duration,
    /// Time the ability remains active; zero for instant and charged effects.
    pub duration: Duration,
    /// Effect produced by activation.
    pub effect: AbilityEffect,
}

/// Effect variants an ability may produce on activation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilityEffect {
    /// Timed stat multipliers consumed by combat and targeting collaborators.
    StatBoost {
        /// Fire-rate multiplier while active.
        fire_rate: f32,
        /// Damage multiplier while active.
        damage: f32,
        /// Range multiplier while active.
        range: f32,
        /// Additional chain hops granted while active.
        chain_bonus: u8,
    },
    /// One-shot damage boost consumed by the tower's next attack.
    ChargedStrike {
        /// Multiplier applied to the consuming attack's damage.
        damage_multiplier: f32,
    },
    /// World-level effect executed by an external collaborator.
    Instant(InstantEffect),
}

/// Instant ability effects delegated to the world-level collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstantEffect {
    /// Detonates a volley of explosions around the tower.
    MultiExplosion,
    /// Arcs lightning through every enemy on the map.
    GlobalChain,
    /// Freezes every enemy in place for a short time.
    MassFreeze,
}

/// Lifecycle states of a tower ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityState {
    /// The ability may be activated.
    Ready,
    /// A timed effect is applying its multipliers.
    Active,
    /// The ability waits for its cooldown to elapse.
    OnCooldown,
    /// A one-shot effect is queued for the next attack.
    Charged,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: GridPos,
    },
    /// Requests removal of an existing tower.
    RemoveTower {
        /// Entity of the tower targeted for removal.
        tower: Entity,
    },
    /// Requests that an enemy enter the grid along the provided route.
    SpawnEnemy {
        /// Species to spawn.
        species: EnemySpecies,
        /// Ordered cells the enemy will traverse, spawn first.
        route: Vec<GridPos>,
    },
    /// Requests that a projectile be fired from a source entity at a target.
    FireProjectile {
        /// Entity that fired the projectile, used for attribution.
        source: Entity,
        /// Enemy the projectile is aimed at.
        target: Entity,
        /// Blueprint describing the projectile's behaviour.
        spec: ProjectileSpec,
    },
}

/// Events broadcast by the world and systems after processing a tick.
///
/// Every event is fire-and-forget: collaborators may consume the stream for
/// visual effects or bookkeeping, and ignoring it never affects simulation
/// state.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Entity allocated for the tower.
        tower: Entity,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Cell the tower occupies.
        cell: GridPos,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested.
        kind: TowerKind,
        /// Cell provided in the request.
        cell: GridPos,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed.
    TowerRemoved {
        /// Entity of the removed tower.
        tower: Entity,
        /// Cell freed by the removal.
        cell: GridPos,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Entity provided in the request.
        tower: Entity,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that an enemy entered the grid.
    EnemySpawned {
        /// Entity allocated for the enemy.
        enemy: Entity,
        /// Species that spawned.
        species: EnemySpecies,
        /// Cell the enemy entered on.
        cell: GridPos,
    },
    /// Reports that an enemy's health reached zero.
    EnemyDied {
        /// Entity of the dead enemy.
        enemy: Entity,
        /// World position where the enemy died.
        at: WorldPoint,
        /// Entity credited with the kill, if attribution survived.
        killer: Option<Entity>,
    },
    /// Reports that an enemy reached the exit.
    EnemyExited {
        /// Entity of the escaping enemy.
        enemy: Entity,
    },
    /// Marks a projectile's position for trail effects.
    ProjectileTrail {
        /// Entity of the projectile.
        projectile: Entity,
        /// Position after this tick's integration.
        at: WorldPoint,
        /// Damage flavour, used to pick trail visuals.
        damage_type: DamageType,
    },
    /// Marks a projectile striking an enemy.
    ProjectileImpact {
        /// Entity of the projectile.
        projectile: Entity,
        /// Enemy that was struck.
        enemy: Entity,
        /// World position of the impact.
        at: WorldPoint,
        /// Damage flavour, used to pick impact visuals.
        damage_type: DamageType,
    },
    /// Marks an area detonation.
    Explosion {
        /// Centre of the detonation.
        at: WorldPoint,
        /// Radius of the affected area.
        radius: f32,
        /// Damage flavour, used to pick explosion visuals.
        damage_type: DamageType,
    },
    /// Marks a chain-lightning arc between two points.
    ChainBeam {
        /// Origin of the arc.
        from: WorldPoint,
        /// Destination of the arc.
        to: WorldPoint,
    },
    /// Announces that a tower ability finished its cooldown.
    AbilityReady {
        /// Tower whose ability became ready.
        tower: Entity,
    },
    /// Announces that a tower ability was activated.
    AbilityActivated {
        /// Tower whose ability was activated.
        tower: Entity,
    },
    /// Requests world-level execution of an instant ability effect.
    InstantAbility {
        /// Tower that triggered the effect.
        tower: Entity,
        /// Effect the collaborator should perform.
        effect: InstantEffect,
    },
}

/// Reasons a tower placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies beyond the configured grid bounds.
    OutOfBounds,
    /// The requested cell is not empty.
    Occupied,
}

/// Reasons a tower removal request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No tower with the provided entity exists.
    MissingTower,
}

/// Kinds of cells composing the grid map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Buildable terrain with no occupant.
    Empty,
    /// Terrain enemies walk on.
    Path,
    /// Impassable, unbuildable terrain.
    Blocked,
    /// Cell enemies enter the grid from.
    Spawn,
    /// Cell enemies escape through.
    Exit,
    /// Empty cell currently occupied by a tower.
    TowerOccupied,
}

impl CellKind {
    /// Reports whether ground enemies may traverse the cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Path | Self::Spawn | Self::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CellKind, DamageType, Entity, EnemySpecies, GridPos, InstantEffect, PlacementError,
        RemovalError, TowerKind, WorldPoint,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = GridPos::new(1, 1);
        let destination = GridPos::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn world_point_distance_is_euclidean() {
        let a = WorldPoint::new(0.0, 0.0);
        let b = WorldPoint::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn only_true_damage_ignores_armor() {
        for damage_type in DamageType::all() {
            let expected = match damage_type {
                DamageType::True => true,
                DamageType::Physical
                | DamageType::Fire
                | DamageType::Frost
                | DamageType::Lightning
                | DamageType::Poison => false,
            };
            assert_eq!(damage_type.ignores_armor(), expected);
        }
    }

    #[test]
    fn walkable_cells_are_path_spawn_and_exit() {
        assert!(CellKind::Path.is_walkable());
        assert!(CellKind::Spawn.is_walkable());
        assert!(CellKind::Exit.is_walkable());
        assert!(!CellKind::Empty.is_walkable());
        assert!(!CellKind::Blocked.is_walkable());
        assert!(!CellKind::TowerOccupied.is_walkable());
    }

    #[test]
    fn resistances_stay_within_unit_interval() {
        for species in [
            EnemySpecies::Runner,
            EnemySpecies::Brute,
            EnemySpecies::Wisp,
            EnemySpecies::Shade,
            EnemySpecies::Wraith,
        ] {
            for damage_type in DamageType::all() {
                let resistance = species.resistance(damage_type);
                assert!((0.0..=1.0).contains(&resistance));
            }
        }
    }

    #[test]
    fn every_tower_kind_carries_a_positive_cooldown() {
        for kind in [
            TowerKind::Arrow,
            TowerKind::Cannon,
            TowerKind::Tesla,
            TowerKind::Frost,
            TowerKind::Venom,
        ] {
            assert!(!kind.ability().cooldown.is_zero());
            assert!(kind.range() > 0.0);
        }
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn entity_round_trips_through_bincode() {
        assert_round_trip(&Entity::new(42));
    }

    #[test]
    fn grid_pos_round_trips_through_bincode() {
        assert_round_trip(&GridPos::new(5, 7));
    }

    #[test]
    fn cell_kind_round_trips_through_bincode() {
        assert_round_trip(&CellKind::TowerOccupied);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Occupied);
    }

    #[test]
    fn removal_error_round_trips_through_bincode() {
        assert_round_trip(&RemovalError::MissingTower);
    }

    #[test]
    fn instant_effect_round_trips_through_bincode() {
        assert_round_trip(&InstantEffect::MassFreeze);
    }
}

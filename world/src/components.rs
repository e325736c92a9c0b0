//! Plain data components attached to entities through per-type stores.
//!
//! Components never reach into other components; every cross-component
//! lookup happens explicitly in system code.

use std::collections::BTreeSet;
use std::time::Duration;

use glam::Vec2;
use gridspire_core::{
    AbilityEffect, AbilitySpec, AbilityState, ChainSpec, DamageType, DotPayload, Entity,
    EnemySpecies, GridPos, InstantEffect, ProjectileSpec, SlowPayload, TowerKind,
};

/// World-space location of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    /// Current world-space location.
    pub at: Vec2,
}

/// Health pool and armor of a damageable entity.
///
/// Mutated only by the damage pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    /// Remaining health.
    pub current: f32,
    /// Maximum health.
    pub max: f32,
    /// Armor value fed into the mitigation curve.
    pub armor: f32,
    /// Set when health reaches zero; dead entities take no further damage.
    pub dead: bool,
}

impl Health {
    /// Creates a full health pool with the provided armor value.
    #[must_use]
    pub const fn new(max: f32, armor: f32) -> Self {
        Self {
            current: max,
            max,
            armor,
            dead: false,
        }
    }
}

/// Per-damage-type fractional resistances, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Resistances {
    values: [f32; 6],
}

impl Resistances {
    /// Creates a table with no resistance to any damage type.
    #[must_use]
    pub const fn none() -> Self {
        Self { values: [0.0; 6] }
    }

    /// Builds the resistance table for an enemy species.
    #[must_use]
    pub fn for_species(species: EnemySpecies) -> Self {
        let mut table = Self::none();
        for damage_type in DamageType::all() {
            table.set(damage_type, species.resistance(damage_type));
        }
        table
    }

    /// Fractional resistance against the damage type.
    #[must_use]
    pub fn get(&self, damage_type: DamageType) -> f32 {
        self.values[Self::slot(damage_type)]
    }

    /// Overrides the resistance for one damage type, clamped to `[0, 1]`.
    pub fn set(&mut self, damage_type: DamageType, value: f32) {
        self.values[Self::slot(damage_type)] = value.clamp(0.0, 1.0);
    }

    fn slot(damage_type: DamageType) -> usize {
        match damage_type {
            DamageType::Physical => 0,
            DamageType::Fire => 1,
            DamageType::Frost => 2,
            DamageType::Lightning => 3,
            DamageType::Poison => 4,
            DamageType::True => 5,
        }
    }
}

/// Timed modifier kinds an enemy may carry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatusKind {
    /// Removes a fraction of movement speed.
    Slow {
        /// Fraction of speed removed, in `[0, 1]`.
        factor: f32,
    },
    /// Applies damage every second while active.
    DamageOverTime {
        /// Damage applied per second.
        damage_per_second: f32,
    },
    /// Reduces effective armor by a fraction.
    ArmorReduction {
        /// Fraction of armor removed, in `[0, 1]`.
        fraction: f32,
    },
    /// Amplifies incoming damage.
    DamageAmplification {
        /// Multiplier applied to incoming damage, `>= 1`.
        factor: f32,
    },
}

/// One active timed modifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEffect {
    /// Modifier applied while the effect is active.
    pub kind: StatusKind,
    /// Time until the effect expires.
    pub remaining: Duration,
}

/// Stack of timed modifiers carried by one enemy.
///
/// When several effects of the same kind overlap, the strongest active one
/// wins; effects never add or multiply together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Creates an empty status stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Pushes a new timed modifier onto the stack.
    pub fn apply(&mut self, kind: StatusKind, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.effects.push(StatusEffect {
            kind,
            remaining: duration,
        });
    }

    /// Advances all timers, dropping expired entries.
    ///
    /// Returns the damage-over-time accrued during the elapsed interval.
    /// Effects expiring mid-tick contribute only their remaining lifetime.
    pub fn tick(&mut self, dt: Duration) -> f32 {
        let mut dot_damage = 0.0;
        for effect in &mut self.effects {
            if let StatusKind::DamageOverTime { damage_per_second } = effect.kind {
                let active = effect.remaining.min(dt);
                dot_damage += damage_per_second * active.as_secs_f32();
            }
            effect.remaining = effect.remaining.saturating_sub(dt);
        }
        self.effects.retain(|effect| !effect.remaining.is_zero());
        dot_damage
    }

    /// Strongest active slow, clamped to `[0, 1]`.
    #[must_use]
    pub fn slow_factor(&self) -> f32 {
        self.effects
            .iter()
            .filter_map(|effect| match effect.kind {
                StatusKind::Slow { factor } => Some(factor),
                _ => None,
            })
            .fold(0.0_f32, f32::max)
            .clamp(0.0, 1.0)
    }

    /// Strongest active armor reduction, clamped to `[0, 1]`.
    #[must_use]
    pub fn armor_reduction(&self) -> f32 {
        self.effects
            .iter()
            .filter_map(|effect| match effect.kind {
                StatusKind::ArmorReduction { fraction } => Some(fraction),
                _ => None,
            })
            .fold(0.0_f32, f32::max)
            .clamp(0.0, 1.0)
    }

    /// Strongest active damage amplification; `1.0` when none is active.
    #[must_use]
    pub fn damage_amplification(&self) -> f32 {
        self.effects
            .iter()
            .filter_map(|effect| match effect.kind {
                StatusKind::DamageAmplification { factor } => Some(factor),
                _ => None,
            })
            .fold(1.0_f32, f32::max)
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Reports whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Homing behaviour of a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Homing {
    /// The projectile flies straight.
    None,
    /// The projectile steers toward a live target each tick.
    Tracking {
        /// Enemy the projectile tracks, validated against the live set.
        target: Entity,
        /// Blend rate of the exponential steer.
        turn_rate: f32,
    },
    /// The tracked target died; the projectile keeps its last heading.
    Lost,
}

/// Chain-lightning state carried by a projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainState {
    /// Hops the bolt may still perform after its next hit.
    pub remaining: u8,
    /// Maximum distance to the next chain target.
    pub range: f32,
    /// Enemies already visited by this chain, never re-targeted.
    pub visited: BTreeSet<Entity>,
}

/// In-flight projectile state.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    /// Base damage fed into the pipeline on hit.
    pub damage: f32,
    /// Damage flavour resolved against resistances and armor.
    pub damage_type: DamageType,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Scalar speed preserved across homing adjustments.
    pub speed: f32,
    /// Homing behaviour.
    pub homing: Homing,
    /// Distance traveled so far.
    pub traveled: f32,
    /// Distance after which the projectile expires.
    pub max_distance: f32,
    /// Whether the projectile survives its first hit.
    pub pierce: bool,
    /// Enemies already struck, never damaged twice.
    pub hit: BTreeSet<Entity>,
    /// Splash radius applied on impact, if any.
    pub splash_radius: Option<f32>,
    /// Chain-lightning state, if the projectile forks on hit.
    pub chain: Option<ChainState>,
    /// Slow applied to struck enemies, if any.
    pub slow: Option<SlowPayload>,
    /// Damage-over-time applied to struck enemies, if any.
    pub dot: Option<DotPayload>,
    /// Entity that fired the projectile, for kill attribution.
    pub source: Option<Entity>,
}

impl Projectile {
    /// Builds an in-flight projectile from a blueprint and initial heading.
    #[must_use]
    pub fn from_spec(
        spec: &ProjectileSpec,
        direction: Vec2,
        target: Entity,
        source: Option<Entity>,
    ) -> Self {
        let heading = direction.normalize_or_zero();
        let homing = match spec.homing_turn_rate {
            Some(turn_rate) => Homing::Tracking { target, turn_rate },
            None => Homing::None,
        };

        Self {
            damage: spec.damage,
            damage_type: spec.damage_type,
            velocity: heading * spec.speed,
            speed: spec.speed,
            homing,
            traveled: 0.0,
            max_distance: spec.max_distance,
            pierce: spec.pierce,
            hit: BTreeSet::new(),
            splash_radius: spec.splash_radius,
            chain: spec.chain.map(|ChainSpec { hops, range }| ChainState {
                remaining: hops,
                range,
                visited: BTreeSet::new(),
            }),
            slow: spec.slow,
            dot: spec.dot,
            source,
        }
    }
}

/// Enemy marching along a route of world-space waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    /// Species that determines base stats.
    pub species: EnemySpecies,
    /// Base movement speed before slows.
    pub speed: f32,
    /// Flying units ride straight-line flight routes.
    pub flying: bool,
    /// Stealthed enemies are revealed when struck.
    pub stealthed: bool,
    /// Phased enemies are temporarily untargetable and never collide.
    pub phased: bool,
    /// Ordered world-space waypoints from spawn to exit.
    pub route: Vec<Vec2>,
    /// Index of the next waypoint to reach.
    pub next_waypoint: usize,
}

impl Enemy {
    /// Creates an enemy of the species at the start of the provided route.
    #[must_use]
    pub fn spawn(species: EnemySpecies, route: Vec<Vec2>) -> Self {
        Self {
            species,
            speed: species.speed(),
            flying: species.is_flying(),
            stealthed: species.spawns_stealthed(),
            phased: false,
            route,
            next_waypoint: 1,
        }
    }
}

/// Static tower data anchoring abilities and targeting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tower {
    /// Kind of tower constructed.
    pub kind: TowerKind,
    /// Cell the tower occupies.
    pub cell: GridPos,
}

/// Stat multipliers exposed by an active tower ability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityMultipliers {
    /// Fire-rate multiplier consumed by the targeting collaborator.
    pub fire_rate: f32,
    /// Damage multiplier applied when the tower fires.
    pub damage: f32,
    /// Range multiplier consumed by the targeting collaborator.
    pub range: f32,
    /// Additional chain hops granted to fired projectiles.
    pub chain_bonus: u8,
}

impl AbilityMultipliers {
    /// Multipliers that leave every stat unchanged.
    pub const NEUTRAL: Self = Self {
        fire_rate: 1.0,
        damage: 1.0,
        range: 1.0,
        chain_bonus: 0,
    };
}

/// Outcome of a successful ability activation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Activation {
    /// A timed stat boost began applying its multipliers.
    Boosted,
    /// A one-shot effect was queued for the next attack.
    Charged,
    /// A world-level effect must be executed by a collaborator.
    Instant(InstantEffect),
}

/// Transition reported by the per-tick ability update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityTransition {
    /// No externally visible change occurred.
    Idle,
    /// The cooldown elapsed and the ability became ready.
    BecameReady,
}

/// Cooldown, duration and charge state machine of one tower ability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerAbility {
    spec: AbilitySpec,
    state: AbilityState,
    cooldown_remaining: Duration,
    duration_remaining: Duration,
    multipliers: AbilityMultipliers,
}

impl TowerAbility {
    /// Creates a ready ability from its definition.
    #[must_use]
    pub const fn new(spec: AbilitySpec) -> Self {
        Self {
            spec,
            state: AbilityState::Ready,
            cooldown_remaining: Duration::ZERO,
            duration_remaining: Duration::ZERO,
            multipliers: AbilityMultipliers::NEUTRAL,
        }
    }

    /// Definition the ability was created from.
    #[must_use]
    pub const fn spec(&self) -> &AbilitySpec {
        &self.spec
    }

    /// Current state of the ability.
    #[must_use]
    pub const fn state(&self) -> AbilityState {
        self.state
    }

    /// Time until the ability leaves cooldown.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> Duration {
        self.cooldown_remaining
    }

    /// Time until an active effect expires.
    #[must_use]
    pub const fn duration_remaining(&self) -> Duration {
        self.duration_remaining
    }

    /// Multipliers currently applied by the ability.
    #[must_use]
    pub const fn multipliers(&self) -> &AbilityMultipliers {
        &self.multipliers
    }

    /// Attempts to activate the ability.
    ///
    /// Returns `None` without mutation unless the ability is ready. Instant
    /// effects transition straight to cooldown; the effect itself is a
    /// world-level operation performed by a collaborator.
    pub fn activate(&mut self) -> Option<Activation> {
        if self.state != AbilityState::Ready {
            return None;
        }

        match self.spec.effect {
            AbilityEffect::ChargedStrike { .. } => {
                self.state = AbilityState::Charged;
                Some(Activation::Charged)
            }
            AbilityEffect::Instant(effect) => {
                self.begin_cooldown();
                Some(Activation::Instant(effect))
            }
            AbilityEffect::StatBoost {
                fire_rate,
                damage,
                range,
                chain_bonus,
            } => {
                if self.spec.duration.is_zero() {
                    self.begin_cooldown();
                } else {
                    self.state = AbilityState::Active;
                    self.duration_remaining = self.spec.duration;
                    self.multipliers = AbilityMultipliers {
                        fire_rate,
                        damage,
                        range,
                        chain_bonus,
                    };
                }
                Some(Activation::Boosted)
            }
        }
    }

    /// Consumes a queued charge, returning its damage multiplier.
    ///
    /// Returns `None` unless the ability is charged.
    pub fn consume_charge(&mut self) -> Option<f32> {
        if self.state != AbilityState::Charged {
            return None;
        }

        let AbilityEffect::ChargedStrike { damage_multiplier } = self.spec.effect else {
            return None;
        };
        self.begin_cooldown();
        Some(damage_multiplier)
    }

    /// Advances the ability timers by the elapsed tick.
    pub fn update(&mut self, dt: Duration) -> AbilityTransition {
        match self.state {
            AbilityState::Active => {
                self.duration_remaining = self.duration_remaining.saturating_sub(dt);
                if self.duration_remaining.is_zero() {
                    self.multipliers = AbilityMultipliers::NEUTRAL;
                    self.begin_cooldown();
                }
                AbilityTransition::Idle
            }
            AbilityState::OnCooldown => {
                self.cooldown_remaining = self.cooldown_remaining.saturating_sub(dt);
                if self.cooldown_remaining.is_zero() {
                    self.state = AbilityState::Ready;
                    AbilityTransition::BecameReady
                } else {
                    AbilityTransition::Idle
                }
            }
            AbilityState::Ready | AbilityState::Charged => AbilityTransition::Idle,
        }
    }

    fn begin_cooldown(&mut self) {
        self.state = AbilityState::OnCooldown;
        self.cooldown_remaining = self.spec.cooldown;
        self.duration_remaining = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strongest_slow_wins() {
        let mut status = StatusEffects::new();
        status.apply(StatusKind::Slow { factor: 0.3 }, Duration::from_secs(4));
        status.apply(StatusKind::Slow { factor: 0.5 }, Duration::from_secs(1));
        status.apply(StatusKind::Slow { factor: 0.2 }, Duration::from_secs(9));
        assert!((status.slow_factor() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn expired_effects_are_dropped() {
        let mut status = StatusEffects::new();
        status.apply(StatusKind::Slow { factor: 0.5 }, Duration::from_secs(1));
        status.apply(
            StatusKind::ArmorReduction { fraction: 0.4 },
            Duration::from_secs(3),
        );

        let _ = status.tick(Duration::from_secs(2));
        assert_eq!(status.len(), 1);
        assert!((status.slow_factor() - 0.0).abs() < f32::EPSILON);
        assert!((status.armor_reduction() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn dot_accrues_only_for_remaining_lifetime() {
        let mut status = StatusEffects::new();
        status.apply(
            StatusKind::DamageOverTime {
                damage_per_second: 10.0,
            },
            Duration::from_millis(500),
        );

        let damage = status.tick(Duration::from_secs(1));
        assert!((damage - 5.0).abs() < 1e-4);
        assert!(status.is_empty());
    }

    #[test]
    fn amplification_defaults_to_neutral() {
        let status = StatusEffects::new();
        assert!((status.damage_amplification() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_duration_effects_are_ignored() {
        let mut status = StatusEffects::new();
        status.apply(StatusKind::Slow { factor: 0.9 }, Duration::ZERO);
        assert!(status.is_empty());
    }

    #[test]
    fn resistances_clamp_to_unit_interval() {
        let mut resistances = Resistances::none();
        resistances.set(DamageType::Fire, 1.7);
        resistances.set(DamageType::Frost, -0.3);
        assert!((resistances.get(DamageType::Fire) - 1.0).abs() < f32::EPSILON);
        assert!((resistances.get(DamageType::Frost) - 0.0).abs() < f32::EPSILON);
    }

    fn boost_spec() -> AbilitySpec {
        AbilitySpec {
            cooldown: Duration::from_secs(10),
            duration: Duration::from_secs(4),
            effect: AbilityEffect::StatBoost {
                fire_rate: 2.0,
                damage: 1.5,
                range: 1.0,
                chain_bonus: 1,
            },
        }
    }

    #[test]
    fn timed_boost_applies_and_expires() {
        let mut ability = TowerAbility::new(boost_spec());
        assert_eq!(ability.activate(), Some(Activation::Boosted));
        assert_eq!(ability.state(), AbilityState::Active);
        assert!((ability.multipliers().fire_rate - 2.0).abs() < f32::EPSILON);

        assert_eq!(ability.update(Duration::from_secs(4)), AbilityTransition::Idle);
        assert_eq!(ability.state(), AbilityState::OnCooldown);
        assert_eq!(ability.cooldown_remaining(), Duration::from_secs(10));
        assert_eq!(*ability.multipliers(), AbilityMultipliers::NEUTRAL);

        assert_eq!(
            ability.update(Duration::from_secs(10)),
            AbilityTransition::BecameReady
        );
        assert_eq!(ability.state(), AbilityState::Ready);
    }

    #[test]
    fn instant_ability_goes_straight_to_cooldown() {
        let mut ability = TowerAbility::new(AbilitySpec {
            cooldown: Duration::from_secs(30),
            duration: Duration::ZERO,
            effect: AbilityEffect::Instant(InstantEffect::MultiExplosion),
        });

        assert_eq!(
            ability.activate(),
            Some(Activation::Instant(InstantEffect::MultiExplosion))
        );
        assert_eq!(ability.state(), AbilityState::OnCooldown);
        assert_eq!(ability.cooldown_remaining(), Duration::from_secs(30));
    }

    #[test]
    fn activation_fails_outside_ready_state() {
        let mut ability = TowerAbility::new(boost_spec());
        assert!(ability.activate().is_some());
        let before = ability;
        assert!(ability.activate().is_none());
        assert_eq!(ability, before);
    }

    #[test]
    fn charge_waits_for_consumption() {
        let mut ability = TowerAbility::new(AbilitySpec {
            cooldown: Duration::from_secs(15),
            duration: Duration::ZERO,
            effect: AbilityEffect::ChargedStrike {
                damage_multiplier: 3.0,
            },
        });

        assert_eq!(ability.activate(), Some(Activation::Charged));
        assert_eq!(ability.state(), AbilityState::Charged);

        // A charge never decays on its own.
        assert_eq!(ability.update(Duration::from_secs(60)), AbilityTransition::Idle);
        assert_eq!(ability.state(), AbilityState::Charged);

        assert_eq!(ability.consume_charge(), Some(3.0));
        assert_eq!(ability.state(), AbilityState::OnCooldown);
        assert!(ability.consume_charge().is_none());
    }
}

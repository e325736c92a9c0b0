//! Damage mitigation pipeline.
//!
//! Resolution order is fixed: resistance scales the base damage, armor
//! reduction weakens the armor value, amplification scales the result, and
//! the armor curve applies last unless the damage type bypasses it.

use gridspire_core::DamageType;

/// Resolves the final damage dealt to a target.
///
/// `resistance` and `armor_reduction` are fractions in `[0, 1]`;
/// `amplification` is a multiplier with `1.0` meaning unmodified. The armor
/// curve is `100 / (100 + armor)`, so 100 armor halves incoming damage.
#[must_use]
pub fn resolve(
    base_damage: f32,
    damage_type: DamageType,
    resistance: f32,
    armor: f32,
    armor_reduction: f32,
    amplification: f32,
) -> f32 {
    let mut damage = base_damage * (1.0 - resistance.clamp(0.0, 1.0));
    damage *= amplification;

    if !damage_type.ignores_armor() {
        let effective_armor = (armor * (1.0 - armor_reduction.clamp(0.0, 1.0))).max(0.0);
        damage *= 100.0 / (100.0 + effective_armor);
    }

    damage.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmitigated_damage_passes_through() {
        let damage = resolve(50.0, DamageType::Physical, 0.0, 0.0, 0.0, 1.0);
        assert!((damage - 50.0).abs() < 1e-6);
    }

    #[test]
    fn resistance_scales_the_base() {
        let damage = resolve(100.0, DamageType::Fire, 0.5, 0.0, 0.0, 1.0);
        assert!((damage - 50.0).abs() < 1e-6);
    }

    #[test]
    fn one_hundred_armor_halves_damage() {
        let damage = resolve(100.0, DamageType::Physical, 0.0, 100.0, 0.0, 1.0);
        assert!((damage - 50.0).abs() < 1e-6);
    }

    #[test]
    fn true_damage_ignores_armor() {
        let damage = resolve(100.0, DamageType::True, 0.0, 300.0, 0.0, 1.0);
        assert!((damage - 100.0).abs() < 1e-6);
    }

    #[test]
    fn true_damage_still_respects_resistance() {
        let damage = resolve(100.0, DamageType::True, 0.25, 300.0, 0.0, 1.0);
        assert!((damage - 75.0).abs() < 1e-6);
    }

    #[test]
    fn armor_reduction_weakens_the_curve() {
        let full = resolve(100.0, DamageType::Physical, 0.0, 100.0, 0.0, 1.0);
        let shredded = resolve(100.0, DamageType::Physical, 0.0, 100.0, 1.0, 1.0);
        assert!(shredded > full);
        assert!((shredded - 100.0).abs() < 1e-6);
    }

    #[test]
    fn amplification_applies_before_the_armor_curve() {
        let damage = resolve(100.0, DamageType::Physical, 0.0, 100.0, 0.0, 1.5);
        assert!((damage - 75.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let damage = resolve(100.0, DamageType::Physical, 1.5, 0.0, 0.0, 1.0);
        assert!(damage.abs() < 1e-6);
    }
}

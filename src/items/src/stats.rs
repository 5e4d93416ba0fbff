//src/items/src/stats.rs
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Fixed-point scale of fractional stats: one bonus point is `1 / FRACTIONAL_SCALE`.
pub const FRACTIONAL_SCALE: f64 = 1000.0;

/// Round to six decimals so repeated fractional arithmetic stays comparable.
pub fn round_stat(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// One stat field of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum StatKind {
    Attack,
    Defense,
    DefensePenetration,
    AdditionalAttackChance,
    CreditPerSecondBonus,
    CriticalChance,
    CriticalDamageMultiplier,
}

impl StatKind {
    /// Fractional stats are probabilities or multipliers rather than flat points.
    pub const fn is_fractional(self) -> bool {
        matches!(
            self,
            StatKind::AdditionalAttackChance
                | StatKind::CriticalChance
                | StatKind::CriticalDamageMultiplier
        )
    }

    /// Convert bonus points into this stat's unit.
    pub fn from_points(self, points: f64) -> f64 {
        if self.is_fractional() {
            round_stat(points / FRACTIONAL_SCALE)
        } else {
            points
        }
    }

    /// Convert a value of this stat into bonus points.
    pub fn to_points(self, value: f64) -> f64 {
        if self.is_fractional() {
            (value * FRACTIONAL_SCALE * 1000.0).round() / 1000.0
        } else {
            value
        }
    }
}

/// Stat block of an item. Only the fields the item's type supports are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStats {
    pub attack: f64,
    pub defense: f64,
    pub defense_penetration: f64,
    pub additional_attack_chance: f64,
    pub credit_per_second_bonus: f64,
    pub critical_chance: f64,
    pub critical_damage_multiplier: f64,
}

impl ItemStats {
    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::DefensePenetration => self.defense_penetration,
            StatKind::AdditionalAttackChance => self.additional_attack_chance,
            StatKind::CreditPerSecondBonus => self.credit_per_second_bonus,
            StatKind::CriticalChance => self.critical_chance,
            StatKind::CriticalDamageMultiplier => self.critical_damage_multiplier,
        }
    }

    pub fn set(&mut self, kind: StatKind, value: f64) {
        let field = match kind {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::DefensePenetration => &mut self.defense_penetration,
            StatKind::AdditionalAttackChance => &mut self.additional_attack_chance,
            StatKind::CreditPerSecondBonus => &mut self.credit_per_second_bonus,
            StatKind::CriticalChance => &mut self.critical_chance,
            StatKind::CriticalDamageMultiplier => &mut self.critical_damage_multiplier,
        };
        *field = round_stat(value);
    }

    /// Block holding `value` in `kind` and zero everywhere else
    pub fn only(kind: StatKind, value: f64) -> Self {
        let mut stats = Self::default();
        stats.set(kind, value);
        stats
    }

    /// Fields that hold a non-zero value
    pub fn non_zero(&self) -> impl Iterator<Item = StatKind> + '_ {
        StatKind::iter().filter(move |kind| self.get(*kind) != 0.0)
    }

    /// Component-wise `self >= other`
    pub fn dominates(&self, other: &ItemStats) -> bool {
        StatKind::iter().all(|kind| self.get(kind) >= other.get(kind))
    }

    /// Component-wise sum
    pub fn plus(&self, other: &ItemStats) -> ItemStats {
        let mut sum = *self;
        for kind in StatKind::iter() {
            sum.set(kind, self.get(kind) + other.get(kind));
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sets_a_single_field() {
        let stats = ItemStats::only(StatKind::CriticalChance, 0.012);
        assert_eq!(stats.non_zero().collect::<Vec<_>>(), vec![StatKind::CriticalChance]);
        assert_eq!(stats.get(StatKind::Attack), 0.0);
    }

    #[test]
    fn fractional_points_round_trip() {
        let kind = StatKind::AdditionalAttackChance;
        assert_eq!(kind.from_points(5.0), 0.005);
        assert_eq!(kind.to_points(0.005), 5.0);
        assert_eq!(StatKind::Attack.from_points(5.0), 5.0);
    }

    #[test]
    fn dominates_is_component_wise() {
        let base = ItemStats::only(StatKind::Defense, 10.0);
        let better = ItemStats::only(StatKind::Defense, 12.0);
        assert!(better.dominates(&base));
        assert!(!base.dominates(&better));
        assert_eq!(base.plus(&better).defense, 22.0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ItemStats::only(StatKind::DefensePenetration, 3.0)).unwrap();
        assert_eq!(json["defensePenetration"], 3.0);
        assert_eq!(json["criticalDamageMultiplier"], 0.0);
    }
}

//src/items/src/table.rs
//! Static stat tables: per-grade base magnitudes, type templates, enhancement
//! level bands and the per-level growth formula.

use crate::grade::Grade;
use crate::item_type::ItemType;
use crate::stats::{ItemStats, StatKind};

/// Highest enhancement level any item can reach
pub const MAX_ENHANCEMENT_LEVEL: u32 = 25;

/// Base magnitude of every stat at a grade
pub fn grade_base_stats(grade: Grade) -> ItemStats {
    let (attack, defense, penetration, extra_attack, credits, crit, crit_damage) = match grade {
        Grade::Common => (10.0, 8.0, 3.0, 0.010, 2.0, 0.010, 0.05),
        Grade::Rare => (25.0, 20.0, 8.0, 0.020, 5.0, 0.020, 0.10),
        Grade::Epic => (60.0, 48.0, 18.0, 0.040, 12.0, 0.035, 0.20),
        Grade::Legendary => (150.0, 120.0, 40.0, 0.070, 30.0, 0.060, 0.35),
        Grade::Mythic => (400.0, 320.0, 100.0, 0.120, 80.0, 0.100, 0.60),
        Grade::Divine => (1200.0, 960.0, 300.0, 0.200, 240.0, 0.150, 1.00),
    };
    ItemStats {
        attack,
        defense,
        defense_penetration: penetration,
        additional_attack_chance: extra_attack,
        credit_per_second_bonus: credits,
        critical_chance: crit,
        critical_damage_multiplier: crit_damage,
    }
}

/// Stat shape of a type: 1.0 on the primary stat, zero elsewhere.
pub fn template(item_type: ItemType) -> ItemStats {
    ItemStats::only(item_type.primary_stat(), 1.0)
}

/// Enhancement level bands, keyed by the level an attempt starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LevelBand {
    /// 0–5
    Basic,
    /// 6–10
    Advanced,
    /// 11–15
    Expert,
    /// 16–19
    Master,
    /// 20 and above
    Transcendent,
}

impl LevelBand {
    pub const fn of(level: u32) -> LevelBand {
        match level {
            0..=5 => LevelBand::Basic,
            6..=10 => LevelBand::Advanced,
            11..=15 => LevelBand::Expert,
            16..=19 => LevelBand::Master,
            _ => LevelBand::Transcendent,
        }
    }

    /// First level of the band
    pub const fn start(self) -> u32 {
        match self {
            LevelBand::Basic => 0,
            LevelBand::Advanced => 6,
            LevelBand::Expert => 11,
            LevelBand::Master => 16,
            LevelBand::Transcendent => 20,
        }
    }

    /// Growth points per level gained inside this band
    pub const fn stat_step(self) -> u32 {
        match self {
            LevelBand::Basic => 1,
            LevelBand::Advanced => 2,
            LevelBand::Expert => 3,
            LevelBand::Master => 5,
            LevelBand::Transcendent => 8,
        }
    }
}

/// Growth points a grade earns per band step
pub const fn growth_points(grade: Grade) -> u32 {
    match grade {
        Grade::Common => 2,
        Grade::Rare => 4,
        Grade::Epic => 8,
        Grade::Legendary => 16,
        Grade::Mythic => 32,
        // never enhanced
        Grade::Divine => 0,
    }
}

/// Total growth points accumulated from level 0 up to `level`
pub fn enhancement_points(grade: Grade, level: u32) -> u32 {
    (0..level.min(MAX_ENHANCEMENT_LEVEL))
        .map(|from| LevelBand::of(from).stat_step() * growth_points(grade))
        .sum()
}

/// Primary-stat bonus for an item of `item_type` and `grade` at `level`
pub fn enhancement_bonus(item_type: ItemType, grade: Grade, level: u32) -> f64 {
    item_type
        .primary_stat()
        .from_points(enhancement_points(grade, level) as f64)
}

/// Enhanced stats recomputed from the level number alone.
pub fn enhanced_stats(item_type: ItemType, grade: Grade, base: &ItemStats, level: u32) -> ItemStats {
    let primary = item_type.primary_stat();
    let mut stats = *base;
    stats.set(
        primary,
        base.get(primary) + enhancement_bonus(item_type, grade, level),
    );
    stats
}

pub fn primary_is_fractional(item_type: ItemType) -> bool {
    StatKind::is_fractional(item_type.primary_stat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_their_ranges() {
        assert_eq!(LevelBand::of(0), LevelBand::Basic);
        assert_eq!(LevelBand::of(5), LevelBand::Basic);
        assert_eq!(LevelBand::of(6), LevelBand::Advanced);
        assert_eq!(LevelBand::of(15), LevelBand::Expert);
        assert_eq!(LevelBand::of(19), LevelBand::Master);
        assert_eq!(LevelBand::of(24), LevelBand::Transcendent);
        assert_eq!(LevelBand::Master.start(), 16);
    }

    #[test]
    fn points_accumulate_per_band() {
        assert_eq!(enhancement_points(Grade::Common, 0), 0);
        // six levels in the basic band at one step, two points each
        assert_eq!(enhancement_points(Grade::Common, 6), 12);
        // the seventh level is gained from level 6, an advanced-band step
        assert_eq!(enhancement_points(Grade::Common, 7), 16);
        assert_eq!(enhancement_points(Grade::Divine, 10), 0);
    }

    #[test]
    fn growth_is_strictly_increasing_for_standard_grades() {
        for grade in Grade::STANDARD {
            for level in 0..MAX_ENHANCEMENT_LEVEL {
                assert!(enhancement_points(grade, level + 1) > enhancement_points(grade, level));
            }
        }
    }

    #[test]
    fn recompute_touches_only_the_primary_stat() {
        let base = ItemStats::only(StatKind::CriticalChance, 0.012);
        let stats = enhanced_stats(ItemType::Ring, Grade::Rare, &base, 3);
        // three basic levels at four points each
        assert_eq!(stats.critical_chance, 0.024);
        assert_eq!(stats.attack, 0.0);
        assert!(primary_is_fractional(ItemType::Ring));
        assert!(!primary_is_fractional(ItemType::Helmet));
    }

    #[test]
    fn templates_have_one_field() {
        assert_eq!(template(ItemType::Earring).non_zero().count(), 1);
        assert_eq!(grade_base_stats(Grade::Mythic).attack, 400.0);
    }
}

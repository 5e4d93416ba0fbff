// src/player/src/stats.rs
use items::{ItemStats, StatKind};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::equipment::EquippedItems;

/// Ceiling on the aggregate additional-attack chance
pub const ADDITIONAL_ATTACK_CHANCE_CAP: f64 = 0.5;

/// Derived player stats: the sum of every equipped item's enhanced stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerStats {
    totals: ItemStats,
}

impl PlayerStats {
    pub fn from_equipped(equipped: &EquippedItems) -> Self {
        let mut totals = equipped
            .items()
            .fold(ItemStats::default(), |sum, item| sum.plus(&item.enhanced_stats));
        totals.set(
            StatKind::AdditionalAttackChance,
            totals.additional_attack_chance.min(ADDITIONAL_ATTACK_CHANCE_CAP),
        );
        Self { totals }
    }

    pub fn totals(&self) -> &ItemStats {
        &self.totals
    }
}

impl Deref for PlayerStats {
    type Target = ItemStats;

    fn deref(&self) -> &ItemStats {
        &self.totals
    }
}

//src/items/src/lib.rs
//! Equipment items: grades, types, stat blocks, the static stat table, the
//! item factory and the random source every engine draws from.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use crate::factory::{create_item, random_enhanceable_type};
pub use crate::grade::Grade;
pub use crate::item_type::{ItemCategory, ItemType};
pub use crate::rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use crate::stats::{FRACTIONAL_SCALE, ItemStats, StatKind};
pub use crate::table::MAX_ENHANCEMENT_LEVEL;

pub mod factory;
pub mod grade;
pub mod item_type;
pub mod rng;
pub mod stats;
pub mod table;

/// Item construction and consistency errors
#[derive(Debug, Error, PartialEq)]
pub enum ItemError {
    #[error("{item_type} cannot exist at grade {grade}")]
    GradeNotAllowed { item_type: ItemType, grade: Grade },
    #[error("{item_type} carries {stat}, but only {primary} is allowed")]
    ForeignStat {
        item_type: ItemType,
        stat: StatKind,
        primary: StatKind,
    },
    #[error("enhanced {stat} is below its base value")]
    EnhancedBelowBase { stat: StatKind },
    #[error("enhancement level {level} is out of range")]
    LevelOutOfRange { level: u32 },
}

/// Opaque unique item token.
///
/// New ids are UUID text; older saves may hold any string, which is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id built from 128 random bits of `rng`
    pub fn generate<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&rng.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&rng.next_u64().to_le_bytes());
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub grade: Grade,
    pub base_stats: ItemStats,
    pub enhanced_stats: ItemStats,
    /// Cosmetic level shown next to the name, at least 1
    pub level: u32,
    pub enhancement_level: u32,
    pub image_path: String,
}

impl Item {
    pub fn primary_stat(&self) -> StatKind {
        self.item_type.primary_stat()
    }

    /// Current (enhanced) value of the primary stat
    pub fn primary_value(&self) -> f64 {
        self.enhanced_stats.get(self.primary_stat())
    }

    pub fn is_enhanceable(&self) -> bool {
        self.item_type.is_enhanceable()
    }

    /// Copy of this item at `level`, stats recomputed from the stat table.
    pub fn at_enhancement_level(&self, level: u32) -> Item {
        let level = level.min(MAX_ENHANCEMENT_LEVEL);
        Item {
            enhanced_stats: table::enhanced_stats(self.item_type, self.grade, &self.base_stats, level),
            enhancement_level: level,
            ..self.clone()
        }
    }

    /// Check the per-item invariants: allowed grade, primary stat only,
    /// enhanced not below base, level in range.
    pub fn validate(&self) -> Result<(), ItemError> {
        if !self.item_type.allows_grade(self.grade) {
            return Err(ItemError::GradeNotAllowed {
                item_type: self.item_type,
                grade: self.grade,
            });
        }
        let primary = self.primary_stat();
        for stats in [&self.base_stats, &self.enhanced_stats] {
            if let Some(stat) = stats.non_zero().find(|kind| *kind != primary) {
                return Err(ItemError::ForeignStat {
                    item_type: self.item_type,
                    stat,
                    primary,
                });
            }
        }
        if !self.enhanced_stats.dominates(&self.base_stats) {
            return Err(ItemError::EnhancedBelowBase { stat: primary });
        }
        let max_level = if self.is_enhanceable() { MAX_ENHANCEMENT_LEVEL } else { 0 };
        if self.enhancement_level > max_level {
            return Err(ItemError::LevelOutOfRange {
                level: self.enhancement_level,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.grade, self.item_type, self.id)?;
        if self.enhancement_level > 0 {
            write!(f, " +{}", self.enhancement_level)?;
        }
        write!(f, " ({} {})", self.primary_stat(), self.primary_value())
    }
}

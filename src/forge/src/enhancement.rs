//src/forge/src/enhancement.rs
use items::table::LevelBand;
use items::{Grade, Item, ItemType, MAX_ENHANCEMENT_LEVEL, RandomSource};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{debug, info};

/// Lowest starting level at which an unprotected failure can destroy the item
pub const DESTRUCTION_START_LEVEL: u32 = 16;

/// Width of the near-miss window above the success rate. A near miss in a
/// destruction band spares the item.
pub const NEAR_MISS_MARGIN: f64 = 0.05;

#[derive(Debug, Error, PartialEq)]
pub enum EnhanceError {
    #[error("item is already at +{level}, the maximum is +{max}")]
    MaxLevel { level: u32, max: u32 },
    #[error("{0} cannot be enhanced")]
    NotEnhanceable(ItemType),
    #[error("not enough credits: {required} required, {available} available")]
    InsufficientCredits { required: u64, available: u64 },
}

/// Result of one enhancement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnhanceOutcome {
    /// Level raised by one
    Success,
    /// Failed within the near-miss window of a destruction band; item kept as is
    PartialSuccess,
    /// Failed; item unchanged
    Failure,
    /// Failed without protection in a destruction band; item is gone
    Destruction,
}

/// Pure record of an attempt. The caller debits `cost_paid` and swaps or
/// removes the item according to `outcome`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceAttempt {
    pub outcome: EnhanceOutcome,
    pub cost_paid: u64,
    pub level_before: u32,
    pub level_after: u32,
    /// Item after the attempt, `None` once destroyed
    pub item: Option<Item>,
}

impl EnhanceAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome == EnhanceOutcome::Success
    }

    pub fn destroyed(&self) -> bool {
        self.outcome == EnhanceOutcome::Destruction
    }
}

/// Per-level cost at the cheapest band, by grade
pub const fn base_cost(grade: Grade) -> u64 {
    match grade {
        Grade::Common => 100,
        Grade::Rare => 250,
        Grade::Epic => 600,
        Grade::Legendary => 1500,
        Grade::Mythic => 4000,
        Grade::Divine => 10_000,
    }
}

/// Cost multiplier for an attempt starting at `level`
pub fn cost_multiplier(level: u32) -> f64 {
    let band = LevelBand::of(level);
    let into_band = f64::from(level - band.start());
    match band {
        LevelBand::Basic => 1.2,
        LevelBand::Advanced => 1.5 + 0.15 * into_band,
        LevelBand::Expert => 2.5 + 0.25 * into_band,
        LevelBand::Master => 4.0 + 0.4 * into_band,
        LevelBand::Transcendent => 6.5 + 1.5 * into_band,
    }
}

/// Credits charged for an attempt starting at `level`
pub fn enhancement_cost(grade: Grade, level: u32) -> u64 {
    (base_cost(grade) as f64 * f64::from(level + 1) * cost_multiplier(level)).round() as u64
}

/// Chance that an attempt starting at `level` succeeds
pub const fn success_rate(level: u32) -> f64 {
    match LevelBand::of(level) {
        LevelBand::Basic => 0.90,
        LevelBand::Advanced => 0.70,
        LevelBand::Expert => 0.50,
        LevelBand::Master => 0.30,
        LevelBand::Transcendent => 0.15,
    }
}

pub const fn destruction_enabled(level: u32) -> bool {
    level >= DESTRUCTION_START_LEVEL
}

/// Attempt to raise `item` by one enhancement level.
///
/// Maxed or non-enhanceable items are contract violations and come back as
/// errors before any cost is computed. Every resolved attempt charges its full
/// cost, whatever the outcome.
pub fn enhance<R: RandomSource + ?Sized>(
    item: &Item,
    credits: u64,
    destruction_prevention: bool,
    rng: &mut R,
) -> Result<EnhanceAttempt, EnhanceError> {
    if !item.is_enhanceable() {
        return Err(EnhanceError::NotEnhanceable(item.item_type));
    }
    let level = item.enhancement_level;
    if level >= MAX_ENHANCEMENT_LEVEL {
        return Err(EnhanceError::MaxLevel {
            level,
            max: MAX_ENHANCEMENT_LEVEL,
        });
    }

    let cost = enhancement_cost(item.grade, level);
    if credits < cost {
        return Err(EnhanceError::InsufficientCredits {
            required: cost,
            available: credits,
        });
    }

    let rate = success_rate(level);
    let roll = rng.next_f64();
    debug!(item = %item.id, level, rate, roll, "enhancement roll");

    let outcome = if roll < rate {
        EnhanceOutcome::Success
    } else if destruction_enabled(level) && !destruction_prevention {
        if roll < rate + NEAR_MISS_MARGIN {
            EnhanceOutcome::PartialSuccess
        } else {
            EnhanceOutcome::Destruction
        }
    } else {
        EnhanceOutcome::Failure
    };

    let (level_after, resulting) = match outcome {
        EnhanceOutcome::Success => (level + 1, Some(item.at_enhancement_level(level + 1))),
        EnhanceOutcome::PartialSuccess | EnhanceOutcome::Failure => (level, Some(item.clone())),
        EnhanceOutcome::Destruction => (level, None),
    };

    info!(item = %item.id, %outcome, level_before = level, level_after, cost, "enhancement attempt");
    Ok(EnhanceAttempt {
        outcome,
        cost_paid: cost,
        level_before: level,
        level_after,
        item: resulting,
    })
}

//src/items/src/grade.rs
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Rarity tier. Ordering follows rarity, so `Common < Rare < ... < Divine`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Grade {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
    /// Only the unique weapon carries this tier
    Divine,
}

impl Grade {
    /// The five tiers regular equipment can have
    pub const STANDARD: [Grade; 5] = [
        Grade::Common,
        Grade::Rare,
        Grade::Epic,
        Grade::Legendary,
        Grade::Mythic,
    ];

    pub const fn ordinal(self) -> u8 {
        match self {
            Grade::Common => 0,
            Grade::Rare => 1,
            Grade::Epic => 2,
            Grade::Legendary => 3,
            Grade::Mythic => 4,
            Grade::Divine => 5,
        }
    }

    /// Grade produced by synthesizing ten items of this grade.
    pub const fn next(self) -> Option<Grade> {
        match self {
            Grade::Common => Some(Grade::Rare),
            Grade::Rare => Some(Grade::Epic),
            Grade::Epic => Some(Grade::Legendary),
            Grade::Legendary => Some(Grade::Mythic),
            Grade::Mythic | Grade::Divine => None,
        }
    }

    /// `target.ordinal() - self.ordinal()`, negative when `target` is lower.
    pub const fn gap_to(self, target: Grade) -> i32 {
        target.ordinal() as i32 - self.ordinal() as i32
    }

    pub const fn is_standard(self) -> bool {
        !matches!(self, Grade::Divine)
    }
}

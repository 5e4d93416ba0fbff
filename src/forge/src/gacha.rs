//src/forge/src/gacha.rs
use items::{Grade, Item, ItemError, ItemType, RandomSource, create_item};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::{debug, info};

/// Most draws a single multi-draw may bundle
pub const MAX_MULTI_DRAW: u32 = 100;

/// Spend category of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum DrawCategory {
    Armor,
    Accessory,
    WeaponPet,
    Potion,
}

impl DrawCategory {
    /// Credits charged per draw
    pub const fn cost(self) -> u64 {
        match self {
            DrawCategory::Armor => 1600,
            DrawCategory::Accessory => 2400,
            DrawCategory::WeaponPet => 3200,
            DrawCategory::Potion => 800,
        }
    }

    /// Types a draw in this category can produce
    pub const fn item_types(self) -> &'static [ItemType] {
        match self {
            DrawCategory::Armor => &[
                ItemType::Helmet,
                ItemType::Armor,
                ItemType::Gloves,
                ItemType::Boots,
            ],
            DrawCategory::Accessory => &[
                ItemType::Necklace,
                ItemType::Ring,
                ItemType::Earring,
                ItemType::Bracelet,
            ],
            DrawCategory::WeaponPet => &[ItemType::Weapon, ItemType::Pet],
            DrawCategory::Potion => &[ItemType::WrathPotion, ItemType::FortunePotion],
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GachaError {
    #[error("not enough credits: {required} required, {available} available")]
    InsufficientCredits { required: u64, available: u64 },
    #[error("draw count must be between 1 and 100, got {0}")]
    InvalidDrawCount(u32),
    #[error("invalid rate table: {0}")]
    InvalidRates(String),
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// Per-grade draw probabilities, listed from most to least common.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRates {
    entries: Vec<(Grade, f64)>,
}

impl Default for GradeRates {
    fn default() -> Self {
        Self {
            entries: vec![
                (Grade::Common, 0.72),
                (Grade::Rare, 0.25),
                (Grade::Epic, 0.0245),
                (Grade::Legendary, 0.005),
                (Grade::Mythic, 0.00049),
                (Grade::Divine, 0.00001),
            ],
        }
    }
}

impl GradeRates {
    /// Custom table; entries are sorted into ascending rarity and must sum to 1.
    pub fn new(mut entries: Vec<(Grade, f64)>) -> Result<Self, GachaError> {
        if entries.is_empty() {
            return Err(GachaError::InvalidRates("no grades".to_string()));
        }
        if let Some((grade, rate)) = entries.iter().find(|(_, rate)| !(0.0..=1.0).contains(rate)) {
            return Err(GachaError::InvalidRates(format!("{grade} has rate {rate}")));
        }
        let total: f64 = entries.iter().map(|(_, rate)| rate).sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(GachaError::InvalidRates(format!("rates sum to {total}")));
        }
        entries.sort_by_key(|(grade, _)| *grade);
        Ok(Self { entries })
    }

    pub fn rate(&self, grade: Grade) -> f64 {
        self.entries
            .iter()
            .find(|(g, _)| *g == grade)
            .map_or(0.0, |(_, rate)| *rate)
    }

    /// Map a uniform value onto a grade.
    ///
    /// Walks cumulative thresholds from the most common grade and returns the
    /// first whose threshold is `>= value`. A value past every threshold falls
    /// back to the most common grade.
    pub fn roll(&self, value: f64) -> Grade {
        let mut cumulative = 0.0;
        for (grade, rate) in &self.entries {
            cumulative += rate;
            if value <= cumulative {
                return *grade;
            }
        }
        self.entries[0].0
    }
}

/// Outcome of one paid draw. The caller debits `cost` and stores `item`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawResult {
    pub item: Item,
    pub cost: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiDrawResult {
    pub items: Vec<Item>,
    pub cost: u64,
}

/// Gacha machine. Holds only its rate table; never touches player state.
#[derive(Debug, Clone, Default)]
pub struct Gacha {
    rates: GradeRates,
}

impl Gacha {
    pub fn new(rates: GradeRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &GradeRates {
        &self.rates
    }

    /// One draw in `category`, paid from `credits`.
    pub fn draw<R: RandomSource + ?Sized>(
        &self,
        category: DrawCategory,
        credits: u64,
        rng: &mut R,
    ) -> Result<DrawResult, GachaError> {
        let cost = category.cost();
        if credits < cost {
            return Err(GachaError::InsufficientCredits {
                required: cost,
                available: credits,
            });
        }

        let item = self.roll_item(category, rng)?;
        info!(%category, grade = %item.grade, item_type = %item.item_type, cost, "gacha draw");
        Ok(DrawResult { item, cost })
    }

    /// `count` draws charged together; funds are checked once for the total.
    pub fn draw_many<R: RandomSource + ?Sized>(
        &self,
        category: DrawCategory,
        count: u32,
        credits: u64,
        rng: &mut R,
    ) -> Result<MultiDrawResult, GachaError> {
        if count == 0 || count > MAX_MULTI_DRAW {
            return Err(GachaError::InvalidDrawCount(count));
        }
        let cost = category.cost() * u64::from(count);
        if credits < cost {
            return Err(GachaError::InsufficientCredits {
                required: cost,
                available: credits,
            });
        }

        let mut items = Vec::with_capacity(count as usize);
        let mut remaining = credits;
        for _ in 0..count {
            let DrawResult { item, cost } = self.draw(category, remaining, rng)?;
            remaining -= cost;
            items.push(item);
        }
        Ok(MultiDrawResult { items, cost })
    }

    fn roll_item<R: RandomSource + ?Sized>(
        &self,
        category: DrawCategory,
        rng: &mut R,
    ) -> Result<Item, GachaError> {
        let roll = rng.next_f64();
        let grade = self.rates.roll(roll);
        debug!(roll, %grade, "grade roll");

        let item_type = if grade == Grade::Divine {
            ItemType::DivineSword
        } else {
            let types = category.item_types();
            types[rng.next_index(types.len())]
        };
        Ok(create_item(item_type, grade, rng)?)
    }
}

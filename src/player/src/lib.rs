//src/player/src/lib.rs
//! Player state: credits, stage, equipped items, inventory and derived stats.
//!
//! Engine results from `forge` are applied here. Every `apply_*` method checks
//! all of its preconditions first and only then mutates, so a rejected result
//! leaves the save untouched.

pub mod equipment;
pub mod inventory;
pub mod stage;
pub mod stats;

pub use crate::equipment::{EquipError, EquipSlot, EquippedItems};
pub use crate::inventory::Inventory;
pub use crate::stage::{StageRequirement, clamp_stage};
pub use crate::stats::{ADDITIONAL_ATTACK_CHANCE_CAP, PlayerStats};

use forge::{DrawResult, EnhanceAttempt, EnhanceOutcome, InheritOutcome, MultiDrawResult, SynthesisOutcome};
use items::{Item, ItemError, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Largest credit balance that survives a round trip through an IEEE double
pub const MAX_CREDITS: u64 = 9_007_199_254_740_991;
pub const STARTING_CREDITS: u64 = 1000;
pub const STARTING_CREDITS_PER_SECOND: f64 = 1.0;

#[derive(Debug, Error, PartialEq)]
pub enum PlayerError {
    #[error("not enough credits: {required} required, {available} available")]
    InsufficientCredits { required: u64, available: u64 },
    #[error("no item with id {0}")]
    ItemNotFound(ItemId),
    #[error("item {0} is not in the inventory")]
    NotInInventory(ItemId),
    #[error("item id {0} appears more than once")]
    DuplicateItem(ItemId),
    #[error(transparent)]
    Equip(#[from] EquipError),
    #[error("item {id} is inconsistent: {source}")]
    InvalidItem { id: ItemId, source: ItemError },
    #[error("stage {0} does not exist")]
    InvalidStage(u32),
    #[error("result no longer matches the current state of item {0}")]
    StaleResult(ItemId),
}

/// Everything the game persists about one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSave {
    pub credits: u64,
    pub credits_per_second: f64,
    pub current_stage: u32,
    #[serde(default)]
    pub equipped_items: EquippedItems,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub player_stats: PlayerStats,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_save_time: u64,
}

impl PlayerSave {
    /// First-run state
    pub fn new(now_ms: u64) -> Self {
        Self {
            credits: STARTING_CREDITS,
            credits_per_second: STARTING_CREDITS_PER_SECOND,
            current_stage: 1,
            equipped_items: EquippedItems::new(),
            inventory: Inventory::new(),
            player_stats: PlayerStats::default(),
            last_save_time: now_ms,
        }
    }

    pub fn reset(&mut self, now_ms: u64) {
        info!("player state reset");
        *self = Self::new(now_ms);
    }

    /// Equipped items first, then the inventory
    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.equipped_items.items().chain(self.inventory.iter())
    }

    pub fn find_item(&self, id: &ItemId) -> Option<&Item> {
        self.equipped_items
            .find(id)
            .map(|(_, item)| item)
            .or_else(|| self.inventory.get(id))
    }

    pub fn owns(&self, id: &ItemId) -> bool {
        self.find_item(id).is_some()
    }

    /// Drop `id` wherever it is held.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        self.equipped_items.remove(id).or_else(|| self.inventory.remove(id))
    }

    /// Swap in `item` wherever an item with its id is held.
    pub fn replace_item(&mut self, item: Item) -> bool {
        if self.equipped_items.contains(&item.id) {
            self.equipped_items.replace(item)
        } else {
            self.inventory.replace(item)
        }
    }

    pub fn refresh_stats(&mut self) {
        self.player_stats = PlayerStats::from_equipped(&self.equipped_items);
    }

    /// Credit accrual rate including equipment bonuses
    pub fn income_per_second(&self) -> f64 {
        self.credits_per_second + self.player_stats.credit_per_second_bonus
    }

    pub fn add_credits(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount).min(MAX_CREDITS);
    }

    fn ensure_credits(&self, required: u64) -> Result<(), PlayerError> {
        if self.credits < required {
            return Err(PlayerError::InsufficientCredits {
                required,
                available: self.credits,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: u64) -> Result<(), PlayerError> {
        self.ensure_credits(amount)?;
        self.credits -= amount;
        Ok(())
    }

    fn ensure_new(&self, items: &[&Item]) -> Result<(), PlayerError> {
        let mut seen = HashSet::new();
        for item in items {
            if self.owns(&item.id) || !seen.insert(&item.id) {
                return Err(PlayerError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(())
    }

    pub fn apply_draw(&mut self, result: DrawResult) -> Result<(), PlayerError> {
        self.ensure_credits(result.cost)?;
        self.ensure_new(&[&result.item])?;
        self.credits -= result.cost;
        debug!(item = %result.item.id, cost = result.cost, "draw applied");
        self.inventory.add(result.item);
        Ok(())
    }

    pub fn apply_multi_draw(&mut self, result: MultiDrawResult) -> Result<(), PlayerError> {
        self.ensure_credits(result.cost)?;
        self.ensure_new(&result.items.iter().collect::<Vec<_>>())?;
        self.credits -= result.cost;
        debug!(count = result.items.len(), cost = result.cost, "multi-draw applied");
        for item in result.items {
            self.inventory.add(item);
        }
        Ok(())
    }

    /// Charge the attempt, then swap or drop the item by outcome.
    pub fn apply_enhancement(&mut self, id: &ItemId, attempt: EnhanceAttempt) -> Result<(), PlayerError> {
        let current = self.find_item(id).ok_or_else(|| PlayerError::ItemNotFound(id.clone()))?;
        if current.enhancement_level != attempt.level_before {
            return Err(PlayerError::StaleResult(id.clone()));
        }
        if let Some(item) = &attempt.item
            && item.id != *id
        {
            return Err(PlayerError::StaleResult(id.clone()));
        }
        self.ensure_credits(attempt.cost_paid)?;

        self.credits -= attempt.cost_paid;
        match (attempt.outcome, attempt.item) {
            (EnhanceOutcome::Success, Some(item)) => {
                self.replace_item(item);
            }
            (EnhanceOutcome::Destruction, _) => {
                self.remove_item(id);
                info!(item = %id, "item destroyed");
            }
            _ => {}
        }
        self.refresh_stats();
        Ok(())
    }

    /// Remove the source; on success also swap in the raised target.
    pub fn apply_inheritance(&mut self, outcome: InheritOutcome) -> Result<(), PlayerError> {
        if !self.owns(&outcome.consumed_source) {
            return Err(PlayerError::ItemNotFound(outcome.consumed_source));
        }
        if !self.owns(&outcome.target_id) {
            return Err(PlayerError::ItemNotFound(outcome.target_id));
        }
        if let Some(item) = &outcome.inherited_item
            && item.id != outcome.target_id
        {
            return Err(PlayerError::StaleResult(outcome.target_id));
        }

        self.remove_item(&outcome.consumed_source);
        if let Some(item) = outcome.inherited_item {
            self.replace_item(item);
        }
        self.refresh_stats();
        Ok(())
    }

    /// Remove the ten used inventory items and store the new one.
    pub fn apply_synthesis(&mut self, outcome: SynthesisOutcome) -> Result<(), PlayerError> {
        let mut seen = HashSet::new();
        for item in &outcome.used_items {
            if !self.inventory.contains(&item.id) {
                return Err(PlayerError::NotInInventory(item.id.clone()));
            }
            if !seen.insert(&item.id) {
                return Err(PlayerError::DuplicateItem(item.id.clone()));
            }
        }
        self.ensure_new(&[&outcome.synthesized_item])?;

        for item in &outcome.used_items {
            self.inventory.remove(&item.id);
        }
        self.inventory.add(outcome.synthesized_item);
        Ok(())
    }

    /// Move an inventory item into its slot; a displaced item goes back to
    /// the inventory.
    pub fn equip(&mut self, id: &ItemId) -> Result<EquipSlot, PlayerError> {
        let item = self
            .inventory
            .remove(id)
            .ok_or_else(|| PlayerError::NotInInventory(id.clone()))?;
        let slot = EquipSlot::for_type(item.item_type);
        if let Some(displaced) = self.equipped_items.equip(item) {
            self.inventory.add(displaced);
        }
        self.refresh_stats();
        debug!(item = %id, %slot, "equipped");
        Ok(slot)
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Result<ItemId, PlayerError> {
        let item = self.equipped_items.unequip(slot)?;
        let id = item.id.clone();
        self.inventory.add(item);
        self.refresh_stats();
        debug!(item = %id, %slot, "unequipped");
        Ok(id)
    }

    /// Credit income earned while away. Elapsed time is capped at
    /// `max_offline_secs`; returns the credits granted.
    pub fn accrue_offline_credits(&mut self, now_ms: u64, max_offline_secs: u64) -> u64 {
        let elapsed_secs = (now_ms.saturating_sub(self.last_save_time) / 1000).min(max_offline_secs);
        let earned = (self.income_per_second() * elapsed_secs as f64).floor();
        let earned = if earned.is_finite() && earned > 0.0 {
            (earned as u64).min(MAX_CREDITS)
        } else {
            0
        };
        let before = self.credits;
        self.add_credits(earned);
        self.last_save_time = self.last_save_time.max(now_ms);
        let granted = self.credits - before;
        if granted > 0 {
            info!(elapsed_secs, granted, "offline credits");
        }
        granted
    }

    pub fn stage_requirement(&self) -> StageRequirement {
        stage::requirement(self.current_stage)
    }

    /// Check the cross-item invariants of a save.
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.current_stage == 0 {
            return Err(PlayerError::InvalidStage(0));
        }
        let mut seen = HashSet::new();
        for (slot, item) in self.equipped_items.iter() {
            if !slot.accepts(item.item_type) {
                return Err(EquipError::WrongSlot {
                    slot,
                    item_type: item.item_type,
                }
                .into());
            }
        }
        for item in self.all_items() {
            if !seen.insert(&item.id) {
                return Err(PlayerError::DuplicateItem(item.id.clone()));
            }
            item.validate().map_err(|source| PlayerError::InvalidItem {
                id: item.id.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge::{Gacha, DrawCategory, enhance, inherit, synthesize};
    use items::{Grade, ItemType, ScriptedRandom, SeededRandom, create_item};
    use pretty_assertions::assert_eq;

    fn item(item_type: ItemType, grade: Grade, rng: &mut SeededRandom) -> Item {
        create_item(item_type, grade, rng).unwrap()
    }

    #[test]
    fn fresh_save_defaults() {
        let save = PlayerSave::new(42);
        assert_eq!(save.credits, 1000);
        assert_eq!(save.credits_per_second, 1.0);
        assert_eq!(save.current_stage, 1);
        assert!(save.equipped_items.is_empty());
        assert!(save.inventory.is_empty());
        assert_eq!(save.last_save_time, 42);
        assert!(save.validate().is_ok());
    }

    #[test]
    fn draw_debits_and_stores() {
        let mut save = PlayerSave::new(0);
        save.credits = 1600;
        let mut rng = SeededRandom::new(1);
        let result = Gacha::default().draw(DrawCategory::Armor, save.credits, &mut rng).unwrap();
        let id = result.item.id.clone();
        save.apply_draw(result).unwrap();
        assert_eq!(save.credits, 0);
        assert!(save.inventory.contains(&id));
    }

    #[test]
    fn rejected_draw_changes_nothing() {
        let mut save = PlayerSave::new(0);
        let mut rng = SeededRandom::new(2);
        let drawn = item(ItemType::Ring, Grade::Common, &mut rng);
        save.inventory.add(drawn.clone());
        let before = save.clone();
        let result = DrawResult { item: drawn, cost: 10 };
        assert!(matches!(save.apply_draw(result), Err(PlayerError::DuplicateItem(_))));
        let result = DrawResult {
            item: item(ItemType::Ring, Grade::Common, &mut rng),
            cost: 5000,
        };
        assert!(matches!(save.apply_draw(result), Err(PlayerError::InsufficientCredits { .. })));
        assert_eq!(save, before);
    }

    #[test]
    fn destruction_removes_an_equipped_item() {
        let mut rng = SeededRandom::new(3);
        let mut save = PlayerSave::new(0);
        save.credits = 1_000_000;
        let weapon = item(ItemType::Weapon, Grade::Epic, &mut rng).at_enhancement_level(17);
        let id = weapon.id.clone();
        save.inventory.add(weapon.clone());
        save.equip(&id).unwrap();
        assert!(save.player_stats.attack > 0.0);

        let attempt = enhance(&weapon, save.credits, false, &mut ScriptedRandom::constant(0.99)).unwrap();
        let cost = attempt.cost_paid;
        save.apply_enhancement(&id, attempt).unwrap();
        assert!(!save.owns(&id));
        assert_eq!(save.credits, 1_000_000 - cost);
        assert_eq!(save.player_stats, PlayerStats::default());
    }

    #[test]
    fn successful_enhancement_replaces_in_place() {
        let mut rng = SeededRandom::new(4);
        let mut save = PlayerSave::new(0);
        let helmet = item(ItemType::Helmet, Grade::Common, &mut rng);
        let id = helmet.id.clone();
        save.inventory.add(helmet.clone());
        let attempt = enhance(&helmet, save.credits, false, &mut ScriptedRandom::constant(0.0)).unwrap();
        save.apply_enhancement(&id, attempt.clone()).unwrap();
        assert_eq!(save.find_item(&id).unwrap().enhancement_level, 1);
        // the same result cannot be applied twice
        assert_eq!(save.apply_enhancement(&id, attempt), Err(PlayerError::StaleResult(id)));
    }

    #[test]
    fn inheritance_consumes_source_either_way() {
        let mut rng = SeededRandom::new(5);
        for roll in [0.0, 0.99] {
            let mut save = PlayerSave::new(0);
            let source = item(ItemType::Armor, Grade::Common, &mut rng).at_enhancement_level(10);
            let target = item(ItemType::Armor, Grade::Rare, &mut rng);
            save.inventory.add(source.clone());
            save.inventory.add(target.clone());
            let outcome = inherit(&source, &target, &mut ScriptedRandom::constant(roll)).unwrap();
            let success = outcome.success;
            save.apply_inheritance(outcome).unwrap();
            assert!(!save.owns(&source.id));
            let level = save.find_item(&target.id).unwrap().enhancement_level;
            assert_eq!(level, if success { 9 } else { 0 });
        }
    }

    #[test]
    fn synthesis_leaves_other_items_alone() {
        let mut rng = SeededRandom::new(6);
        let mut save = PlayerSave::new(0);
        for _ in 0..10 {
            save.inventory.add(item(ItemType::Boots, Grade::Common, &mut rng));
        }
        let keeper = item(ItemType::Ring, Grade::Epic, &mut rng);
        save.inventory.add(keeper.clone());

        let outcome = synthesize(save.inventory.items(), Grade::Common, &mut rng).unwrap();
        let new_id = outcome.synthesized_item.id.clone();
        save.apply_synthesis(outcome).unwrap();
        assert_eq!(save.inventory.len(), 2);
        assert_eq!(save.inventory.get(&keeper.id), Some(&keeper));
        assert_eq!(save.inventory.get(&new_id).unwrap().grade, Grade::Rare);
        assert_eq!(save.inventory.count_grade(Grade::Common), 0);
    }

    #[test]
    fn equip_swaps_with_inventory() {
        let mut rng = SeededRandom::new(7);
        let mut save = PlayerSave::new(0);
        let first = item(ItemType::Gloves, Grade::Common, &mut rng);
        let second = item(ItemType::Gloves, Grade::Rare, &mut rng);
        save.inventory.add(first.clone());
        save.inventory.add(second.clone());

        assert_eq!(save.equip(&first.id), Ok(EquipSlot::Gloves));
        save.equip(&second.id).unwrap();
        assert!(save.inventory.contains(&first.id));
        assert_eq!(save.player_stats.attack, second.enhanced_stats.attack);
        assert_eq!(save.equip(&second.id), Err(PlayerError::NotInInventory(second.id.clone())));

        assert_eq!(save.unequip(EquipSlot::Gloves), Ok(second.id.clone()));
        assert_eq!(save.player_stats.attack, 0.0);
        assert_eq!(
            save.unequip(EquipSlot::Gloves),
            Err(PlayerError::Equip(EquipError::EmptySlot(EquipSlot::Gloves)))
        );
    }

    #[test]
    fn offline_accrual_is_capped() {
        let mut save = PlayerSave::new(1_000);
        save.credits_per_second = 2.0;
        assert_eq!(save.accrue_offline_credits(11_000, 3600), 20);
        assert_eq!(save.last_save_time, 11_000);

        // a clock that went backwards grants nothing
        assert_eq!(save.accrue_offline_credits(5_000, 3600), 0);

        let mut away = PlayerSave::new(0);
        assert_eq!(away.accrue_offline_credits(100 * 3_600_000, 12 * 3600), 12 * 3600);

        let mut rich = PlayerSave::new(0);
        rich.credits = MAX_CREDITS - 5;
        rich.accrue_offline_credits(60_000, 3600);
        assert_eq!(rich.credits, MAX_CREDITS);
    }

    #[test]
    fn validate_catches_duplicates_and_stage_zero() {
        let mut rng = SeededRandom::new(8);
        let ring = item(ItemType::Ring, Grade::Rare, &mut rng);
        let mut save = PlayerSave::new(0);
        save.equipped_items.equip(ring.clone());
        save.inventory.add(ring.clone());
        assert_eq!(save.validate(), Err(PlayerError::DuplicateItem(ring.id)));

        let mut save = PlayerSave::new(0);
        save.current_stage = 0;
        assert_eq!(save.validate(), Err(PlayerError::InvalidStage(0)));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let save = PlayerSave::new(7);
        let json = serde_json::to_value(&save).unwrap();
        assert_eq!(json["credits"], 1000);
        assert_eq!(json["currentStage"], 1);
        assert_eq!(json["lastSaveTime"], 7);
        assert!(json["equippedItems"].is_object());
        assert!(json["inventory"].is_array());
    }
}

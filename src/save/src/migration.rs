// src/save/src/migration.rs
//! Pure upgrades between save layouts.
//!
//! `v2_to_v3` and `v3_to_v4` each handle one layout transition. `normalize`
//! then repairs a current-layout save: it re-concentrates spread enhancement
//! bonuses, stamps images, drops duplicate or broken items, recomputes the
//! derived stats and clamps the stage. Running `normalize` on its own output
//! changes nothing.

use crate::schema::{ItemV2, ItemV3, SaveV2, SaveV3, SchemaVersion, VersionedSave};
use items::{Grade, Item, ItemId, ItemStats, ItemType, MAX_ENHANCEMENT_LEVEL, StatKind, table};
use player::{EquipSlot, EquippedItems, Inventory, MAX_CREDITS, PlayerSave, PlayerStats, STARTING_CREDITS_PER_SECOND, clamp_stage};
use std::collections::HashSet;
use strum::IntoEnumIterator;
use tracing::{info, warn};

/// Gold-era bracelets stored their chance as attack points
pub const LEGACY_BRACELET_FACTOR: f64 = 0.001;

/// A save brought up to the current layout
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    pub save: PlayerSave,
    pub from: SchemaVersion,
    pub warnings: Vec<String>,
}

/// Move a bracelet's legacy attack value into its chance field. Applies only
/// while attack is set and the chance is still empty.
pub fn convert_stat_basis(item_type: ItemType, stats: &mut ItemStats) -> bool {
    if item_type != ItemType::Bracelet || stats.attack == 0.0 || stats.additional_attack_chance != 0.0 {
        return false;
    }
    stats.set(StatKind::AdditionalAttackChance, stats.attack * LEGACY_BRACELET_FACTOR);
    stats.attack = 0.0;
    true
}

fn convert_item_v2(item: ItemV2, index: usize) -> ItemV3 {
    let legacy_type = ItemType::from_legacy_name(&item.item_type);
    let mut base = item.stats;
    let mut enhanced = item.bonus_stats.map(|bonus| base.plus(&bonus));
    if let Some(item_type) = legacy_type {
        convert_stat_basis(item_type, &mut base);
        if let Some(enhanced) = enhanced.as_mut() {
            convert_stat_basis(item_type, enhanced);
        }
    }
    ItemV3 {
        id: item.id.unwrap_or_else(|| format!("legacy-{index}")),
        item_type: item.item_type,
        grade: item.grade,
        base_stats: base,
        enhanced_stats: enhanced,
        level: item.level.unwrap_or(1).max(1),
        enhancement_level: item.enhance_level,
        image_path: None,
    }
}

/// Rename gold-era fields and convert the bracelet stat basis.
pub fn v2_to_v3(save: SaveV2) -> SaveV3 {
    let mut index = 0;
    let mut next_index = || {
        index += 1;
        index
    };
    let equipped_items = save
        .equipment
        .into_iter()
        .map(|(slot, item)| (slot, item.map(|item| convert_item_v2(item, next_index()))))
        .collect();
    let inventory = save
        .inventory
        .into_iter()
        .map(|item| convert_item_v2(item, next_index()))
        .collect();

    SaveV3 {
        credits: save.gold,
        credits_per_second: save.gold_per_second,
        current_stage: save.stage,
        equipped_items,
        inventory,
        player_stats: None,
        last_save_time: save.last_save_time,
    }
}

fn convert_item_v3(item: ItemV3, warnings: &mut Vec<String>) -> Option<Item> {
    let Some(item_type) = ItemType::from_legacy_name(&item.item_type) else {
        warnings.push(format!("dropped item {}: unknown type {:?}", item.id, item.item_type));
        return None;
    };
    let Ok(grade) = item.grade.parse::<Grade>() else {
        warnings.push(format!("dropped item {}: unknown grade {:?}", item.id, item.grade));
        return None;
    };
    let max_level = if item_type.is_enhanceable() { MAX_ENHANCEMENT_LEVEL } else { 0 };
    let enhancement_level = item.enhancement_level.min(max_level);
    let enhanced_stats = item
        .enhanced_stats
        .unwrap_or_else(|| table::enhanced_stats(item_type, grade, &item.base_stats, enhancement_level));

    Some(Item {
        id: ItemId::new(item.id),
        item_type,
        grade,
        base_stats: item.base_stats,
        enhanced_stats,
        level: item.level.max(1),
        enhancement_level,
        image_path: item.image_path.unwrap_or_default(),
    })
}

fn whole_credits(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value.floor() as u64).min(MAX_CREDITS)
    } else {
        0
    }
}

/// Resolve type and grade names into typed items and adopt the current
/// layout. Items whose names no longer resolve are dropped with a warning.
pub fn v3_to_v4(save: SaveV3, warnings: &mut Vec<String>) -> PlayerSave {
    let mut equipped_items = EquippedItems::new();
    let mut inventory = Inventory::new();

    for item in save.equipped_items.into_values().flatten() {
        if let Some(item) = convert_item_v3(item, warnings)
            && let Some(displaced) = equipped_items.equip(item)
        {
            inventory.add(displaced);
        }
    }
    for item in save.inventory {
        if let Some(item) = convert_item_v3(item, warnings) {
            inventory.add(item);
        }
    }

    let credits_per_second = if save.credits_per_second.is_finite() && save.credits_per_second >= 0.0 {
        save.credits_per_second
    } else {
        STARTING_CREDITS_PER_SECOND
    };

    PlayerSave {
        credits: whole_credits(save.credits),
        credits_per_second,
        current_stage: save.current_stage.max(1),
        equipped_items,
        inventory,
        player_stats: PlayerStats::default(),
        last_save_time: save.last_save_time.map_or(0, epoch_millis),
    }
}

fn epoch_millis(millis: f64) -> u64 {
    if millis.is_finite() && millis > 0.0 {
        millis.floor() as u64
    } else {
        0
    }
}

/// Put the whole enhancement bonus on the primary stat and clear every other
/// field. Relies on each type having exactly one primary stat. Items that are
/// already concentrated are left untouched.
pub fn concentrate_enhancement_bonus(item: &mut Item) -> bool {
    let primary = item.primary_stat();
    let spread = StatKind::iter()
        .filter(|kind| *kind != primary)
        .any(|kind| item.base_stats.get(kind) != 0.0 || item.enhanced_stats.get(kind) != 0.0);
    if !spread && item.enhanced_stats.dominates(&item.base_stats) {
        return false;
    }

    let bonus_points = StatKind::iter()
        .map(|kind| kind.to_points(item.enhanced_stats.get(kind) - item.base_stats.get(kind)))
        .sum::<f64>()
        .max(0.0);
    let base = item.base_stats.get(primary);
    item.base_stats = ItemStats::only(primary, base);
    item.enhanced_stats = ItemStats::only(primary, base + primary.from_points(bonus_points));
    true
}

pub fn stamp_image(item: &mut Item) -> bool {
    if !item.image_path.is_empty() {
        return false;
    }
    item.image_path = item.item_type.image_path();
    true
}

/// Keep the first item per id; the order of `items` decides who wins.
pub fn dedupe(items: Vec<Item>, warnings: &mut Vec<String>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let first = seen.insert(item.id.clone());
            if !first {
                warnings.push(format!("dropped duplicate item {}", item.id));
            }
            first
        })
        .collect()
}

/// Repair a current-layout save.
pub fn normalize(save: PlayerSave, warnings: &mut Vec<String>) -> PlayerSave {
    let PlayerSave {
        credits,
        credits_per_second,
        current_stage,
        equipped_items,
        inventory,
        last_save_time,
        ..
    } = save;

    // equipped first so they win id collisions
    let equipped_ids: HashSet<ItemId> = equipped_items.items().map(|item| item.id.clone()).collect();
    let candidates: Vec<Item> = equipped_items
        .items()
        .cloned()
        .chain(inventory.iter().cloned())
        .collect();

    let mut repaired_equipped = EquippedItems::new();
    let mut repaired_inventory = Inventory::new();
    let mut overflow = Vec::new();
    for mut item in dedupe(candidates, warnings) {
        concentrate_enhancement_bonus(&mut item);
        stamp_image(&mut item);
        if let Err(err) = item.validate() {
            warnings.push(format!("dropped item {}: {err}", item.id));
            continue;
        }
        if !equipped_ids.contains(&item.id) {
            repaired_inventory.add(item);
        } else if repaired_equipped.get(EquipSlot::for_type(item.item_type)).is_some() {
            overflow.push(item);
        } else {
            repaired_equipped.equip(item);
        }
    }
    for item in overflow {
        repaired_inventory.add(item);
    }

    PlayerSave {
        credits: credits.min(MAX_CREDITS),
        credits_per_second,
        current_stage: current_stage.max(1),
        player_stats: PlayerStats::from_equipped(&repaired_equipped),
        equipped_items: repaired_equipped,
        inventory: repaired_inventory,
        last_save_time,
    }
}

/// Legacy stages were never checked against equipment; walk them down once.
fn clamp_legacy_stage(save: &mut PlayerSave) {
    let stage = clamp_stage(save.current_stage, &save.player_stats);
    if stage != save.current_stage {
        info!(from = save.current_stage, to = stage, "stage clamped to what the equipment supports");
        save.current_stage = stage;
    }
}

/// Bring any known layout up to the current one.
pub fn upgrade(versioned: VersionedSave) -> Migrated {
    let from = versioned.version();
    let mut warnings = Vec::new();
    let current = match versioned {
        VersionedSave::V2(save) => v3_to_v4(v2_to_v3(save), &mut warnings),
        VersionedSave::V3(save) => v3_to_v4(save, &mut warnings),
        VersionedSave::V4(save) => save,
    };
    let mut save = normalize(current, &mut warnings);
    if !from.is_current() {
        clamp_legacy_stage(&mut save);
        info!(%from, "save migrated");
    }
    for warning in &warnings {
        warn!("{warning}");
    }
    Migrated { save, from, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use items::{SeededRandom, create_item};
    use pretty_assertions::assert_eq;

    fn legacy_v2() -> SaveV2 {
        serde_json::from_value(serde_json::json!({
            "gold": 5000.7,
            "goldPerSecond": 3,
            "stage": 12,
            "equipment": {
                "bracelet": {"id": "b1", "type": "bracelet", "grade": "rare", "stats": {"attack": 22}, "enhanceLevel": 0},
                "weapon": {"id": "w1", "type": "sword", "grade": "common", "stats": {"attack": 12, "defense": 2},
                           "bonusStats": {"attack": 4, "defense": 4}, "enhanceLevel": 3}
            },
            "inventory": [
                {"id": "w1", "type": "weapon", "grade": "rare", "stats": {"attack": 30}},
                {"id": "x1", "type": "cape", "grade": "rare", "stats": {"defense": 1}},
                {"type": "ring", "grade": "legendary", "stats": {"criticalChance": 0.063}}
            ],
            "lastSaveTime": 1700000000000u64
        }))
        .unwrap()
    }

    #[test]
    fn bracelet_conversion_applies_once() {
        let mut stats = ItemStats {
            attack: 22.0,
            ..ItemStats::default()
        };
        assert!(convert_stat_basis(ItemType::Bracelet, &mut stats));
        assert_eq!(stats.additional_attack_chance, 0.022);
        assert_eq!(stats.attack, 0.0);
        assert!(!convert_stat_basis(ItemType::Bracelet, &mut stats));

        let mut weapon = ItemStats {
            attack: 22.0,
            ..ItemStats::default()
        };
        assert!(!convert_stat_basis(ItemType::Weapon, &mut weapon));
    }

    #[test]
    fn spread_bonus_moves_to_the_primary_stat() {
        let mut rng = SeededRandom::new(1);
        let mut item = create_item(ItemType::Weapon, Grade::Common, &mut rng).unwrap();
        item.base_stats.defense = 2.0;
        item.enhanced_stats = item.base_stats.plus(&ItemStats {
            attack: 4.0,
            defense: 4.0,
            critical_chance: 0.002,
            ..ItemStats::default()
        });
        let base_attack = item.base_stats.attack;

        assert!(concentrate_enhancement_bonus(&mut item));
        assert_eq!(item.base_stats, ItemStats::only(StatKind::Attack, base_attack));
        assert_eq!(item.enhanced_stats, ItemStats::only(StatKind::Attack, base_attack + 10.0));
        assert!(!concentrate_enhancement_bonus(&mut item));
    }

    #[test]
    fn fractional_bonus_uses_the_point_scale() {
        let mut rng = SeededRandom::new(2);
        let mut ring = create_item(ItemType::Ring, Grade::Rare, &mut rng).unwrap();
        let base = ring.base_stats.critical_chance;
        ring.enhanced_stats = ring.base_stats.plus(&ItemStats {
            attack: 5.0,
            critical_chance: 0.003,
            ..ItemStats::default()
        });
        concentrate_enhancement_bonus(&mut ring);
        // 5 flat points plus 3 fractional points
        assert_eq!(ring.enhanced_stats.critical_chance, items::stats::round_stat(base + 0.008));
        assert_eq!(ring.enhanced_stats.attack, 0.0);
    }

    #[test]
    fn v2_save_upgrades_cleanly() {
        let migrated = upgrade(VersionedSave::V2(legacy_v2()));
        let save = &migrated.save;
        assert_eq!(migrated.from, SchemaVersion::V2);
        assert_eq!(save.credits, 5000);
        assert_eq!(save.credits_per_second, 3.0);
        assert_eq!(save.last_save_time, 1_700_000_000_000);

        let bracelet = save.find_item(&ItemId::from("b1")).unwrap();
        assert_eq!(bracelet.base_stats.attack, 0.0);
        assert_eq!(bracelet.base_stats.additional_attack_chance, 0.022);

        let weapon = save.find_item(&ItemId::from("w1")).unwrap();
        assert_eq!(weapon.grade, Grade::Common, "equipped copy wins the id");
        assert_eq!(weapon.base_stats.defense, 0.0);
        assert_eq!(weapon.enhanced_stats.attack, 12.0 + 8.0);
        assert_eq!(weapon.image_path, "assets/items/weapon.png");

        // cape dropped, duplicate w1 dropped, anonymous ring kept
        assert_eq!(save.inventory.len(), 1);
        assert_eq!(save.inventory.items()[0].id, ItemId::from("legacy-5"));
        assert_eq!(migrated.warnings.len(), 2);

        // stats recomputed, stage walked down to what 20 attack supports
        assert_eq!(save.player_stats.attack, 20.0);
        assert!(save.current_stage < 12);
        assert!(player::stage::meets(save.current_stage, &save.player_stats));
        assert!(save.validate().is_ok());
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = upgrade(VersionedSave::V2(legacy_v2())).save;
        let mut warnings = Vec::new();
        let twice = normalize(once.clone(), &mut warnings);
        assert_eq!(twice, once);
        assert!(warnings.is_empty());
    }

    #[test]
    fn valid_current_save_is_untouched() {
        let mut rng = SeededRandom::new(3);
        let mut save = PlayerSave::new(10);
        for item_type in ItemType::ENHANCEABLE {
            save.inventory.add(create_item(item_type, Grade::Epic, &mut rng).unwrap().at_enhancement_level(7));
        }
        let first = save.inventory.items()[0].id.clone();
        save.equip(&first).unwrap();
        let mut warnings = Vec::new();
        assert_eq!(normalize(save.clone(), &mut warnings), save);
        assert!(warnings.is_empty());
    }

    #[test]
    fn current_layout_keeps_its_stage() {
        let mut save = PlayerSave::new(10);
        save.current_stage = 0;
        let repaired = upgrade(VersionedSave::V4(save.clone())).save;
        assert_eq!(repaired.current_stage, 1);

        save.current_stage = 10;
        let migrated = upgrade(VersionedSave::V4(save.clone()));
        assert_eq!(migrated.save, save);
        assert!(migrated.warnings.is_empty());
    }

    #[test]
    fn duplicates_keep_the_first_occurrence() {
        let mut rng = SeededRandom::new(4);
        let item = create_item(ItemType::Pet, Grade::Rare, &mut rng).unwrap();
        let mut copy = item.clone();
        copy.level = 9;
        let mut warnings = Vec::new();
        let kept = dedupe(vec![item.clone(), copy], &mut warnings);
        assert_eq!(kept, vec![item]);
        assert_eq!(warnings.len(), 1);
    }
}

//src/items/src/item_type.rs
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::grade::Grade;
use crate::stats::StatKind;

/// Equipment kind. Twelve slot kinds plus the unique divine weapon.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum ItemType {
    // armor
    Helmet,
    Armor,
    Gloves,
    Boots,
    // accessories
    Necklace,
    Ring,
    Earring,
    Bracelet,
    // weapon and pet
    Weapon,
    Pet,
    // potions
    WrathPotion,
    FortunePotion,
    /// Unique weapon; divine grade only and never enhanced
    DivineSword,
}

/// Grouping used by gacha categories and inventory sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub enum ItemCategory {
    Armor,
    Accessory,
    WeaponPet,
    Potion,
    Unique,
}

impl ItemType {
    /// Every type that can be enhanced, synthesized and drawn at standard grades
    pub const ENHANCEABLE: [ItemType; 12] = [
        ItemType::Helmet,
        ItemType::Armor,
        ItemType::Gloves,
        ItemType::Boots,
        ItemType::Necklace,
        ItemType::Ring,
        ItemType::Earring,
        ItemType::Bracelet,
        ItemType::Weapon,
        ItemType::Pet,
        ItemType::WrathPotion,
        ItemType::FortunePotion,
    ];

    /// The single stat this type may carry. Every other stat stays zero.
    pub const fn primary_stat(self) -> StatKind {
        match self {
            ItemType::Weapon | ItemType::Gloves | ItemType::WrathPotion | ItemType::DivineSword => {
                StatKind::Attack
            }
            ItemType::Helmet | ItemType::Armor | ItemType::Boots => StatKind::Defense,
            ItemType::Earring => StatKind::DefensePenetration,
            ItemType::Bracelet => StatKind::AdditionalAttackChance,
            ItemType::Ring => StatKind::CriticalChance,
            ItemType::Necklace => StatKind::CriticalDamageMultiplier,
            ItemType::Pet | ItemType::FortunePotion => StatKind::CreditPerSecondBonus,
        }
    }

    pub const fn category(self) -> ItemCategory {
        match self {
            ItemType::Helmet | ItemType::Armor | ItemType::Gloves | ItemType::Boots => {
                ItemCategory::Armor
            }
            ItemType::Necklace | ItemType::Ring | ItemType::Earring | ItemType::Bracelet => {
                ItemCategory::Accessory
            }
            ItemType::Weapon | ItemType::Pet => ItemCategory::WeaponPet,
            ItemType::WrathPotion | ItemType::FortunePotion => ItemCategory::Potion,
            ItemType::DivineSword => ItemCategory::Unique,
        }
    }

    pub const fn is_enhanceable(self) -> bool {
        !matches!(self, ItemType::DivineSword)
    }

    /// Divine grade belongs to the unique weapon and nothing else.
    pub const fn allows_grade(self, grade: Grade) -> bool {
        match self {
            ItemType::DivineSword => matches!(grade, Grade::Divine),
            _ => grade.is_standard(),
        }
    }

    /// Canonical image reference
    pub fn image_path(self) -> String {
        format!("assets/items/{self}.png")
    }

    /// Resolve a type name written by any save version, including old aliases.
    pub fn from_legacy_name(name: &str) -> Option<ItemType> {
        if let Ok(kind) = name.parse::<ItemType>() {
            return Some(kind);
        }
        match name.to_ascii_lowercase().as_str() {
            "sword" | "mainweapon" => Some(ItemType::Weapon),
            "helm" | "hat" => Some(ItemType::Helmet),
            "chest" | "bodyarmor" => Some(ItemType::Armor),
            "shoes" => Some(ItemType::Boots),
            "amulet" => Some(ItemType::Necklace),
            "attackpotion" | "potion" => Some(ItemType::WrathPotion),
            "goldpotion" | "creditpotion" => Some(ItemType::FortunePotion),
            "excalibur" | "uniqueweapon" => Some(ItemType::DivineSword),
            _ => None,
        }
    }
}

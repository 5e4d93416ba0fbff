// src/player/src/equipment.rs
use items::{Item, ItemId, ItemType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EquipError {
    #[error("{item_type} does not fit the {slot} slot")]
    WrongSlot { slot: EquipSlot, item_type: ItemType },
    #[error("the {0} slot is empty")]
    EmptySlot(EquipSlot),
}

/// Equipment slot. One per slot kind; the weapon slot also takes the unique weapon.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum EquipSlot {
    Weapon,
    Helmet,
    Armor,
    Gloves,
    Boots,
    Necklace,
    Ring,
    Earring,
    Bracelet,
    Pet,
    WrathPotion,
    FortunePotion,
}

impl EquipSlot {
    pub const fn for_type(item_type: ItemType) -> EquipSlot {
        match item_type {
            ItemType::Weapon | ItemType::DivineSword => EquipSlot::Weapon,
            ItemType::Helmet => EquipSlot::Helmet,
            ItemType::Armor => EquipSlot::Armor,
            ItemType::Gloves => EquipSlot::Gloves,
            ItemType::Boots => EquipSlot::Boots,
            ItemType::Necklace => EquipSlot::Necklace,
            ItemType::Ring => EquipSlot::Ring,
            ItemType::Earring => EquipSlot::Earring,
            ItemType::Bracelet => EquipSlot::Bracelet,
            ItemType::Pet => EquipSlot::Pet,
            ItemType::WrathPotion => EquipSlot::WrathPotion,
            ItemType::FortunePotion => EquipSlot::FortunePotion,
        }
    }

    pub fn accepts(self, item_type: ItemType) -> bool {
        EquipSlot::for_type(item_type) == self
    }
}

/// Slot → item mapping, at most one item per slot
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquippedItems {
    slots: BTreeMap<EquipSlot, Item>,
}

impl EquippedItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EquipSlot) -> Option<&Item> {
        self.slots.get(&slot)
    }

    /// Put `item` into its slot, handing back whatever was there.
    pub fn equip(&mut self, item: Item) -> Option<Item> {
        self.slots.insert(EquipSlot::for_type(item.item_type), item)
    }

    /// Put `item` into `slot`; fails if the slot does not take its type.
    pub fn equip_into(&mut self, slot: EquipSlot, item: Item) -> Result<Option<Item>, EquipError> {
        if !slot.accepts(item.item_type) {
            return Err(EquipError::WrongSlot {
                slot,
                item_type: item.item_type,
            });
        }
        Ok(self.slots.insert(slot, item))
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Result<Item, EquipError> {
        self.slots.remove(&slot).ok_or(EquipError::EmptySlot(slot))
    }

    pub fn find(&self, id: &ItemId) -> Option<(EquipSlot, &Item)> {
        self.slots
            .iter()
            .find(|(_, item)| &item.id == id)
            .map(|(slot, item)| (*slot, item))
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.find(id).is_some()
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let (slot, _) = self.find(id)?;
        self.slots.remove(&slot)
    }

    /// Swap in `item` where an item with the same id sits. Returns false when
    /// the id is not equipped.
    pub fn replace(&mut self, item: Item) -> bool {
        match self.find(&item.id) {
            Some((slot, _)) => {
                self.slots.insert(slot, item);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &Item)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use items::{Grade, SeededRandom, create_item};
    use strum::IntoEnumIterator;

    #[test]
    fn every_type_has_a_slot() {
        let slots: std::collections::HashSet<_> = ItemType::ENHANCEABLE
            .iter()
            .map(|kind| EquipSlot::for_type(*kind))
            .collect();
        assert_eq!(slots.len(), EquipSlot::iter().count());
        assert_eq!(EquipSlot::for_type(ItemType::DivineSword), EquipSlot::Weapon);
    }

    #[test]
    fn equip_displaces_previous_item() {
        let mut rng = SeededRandom::new(1);
        let weapon = create_item(ItemType::Weapon, Grade::Rare, &mut rng).unwrap();
        let sword = create_item(ItemType::DivineSword, Grade::Divine, &mut rng).unwrap();
        let mut equipped = EquippedItems::new();
        assert!(equipped.equip(weapon.clone()).is_none());
        assert_eq!(equipped.equip(sword.clone()), Some(weapon));
        assert_eq!(equipped.get(EquipSlot::Weapon), Some(&sword));
        assert_eq!(equipped.len(), 1);
    }

    #[test]
    fn wrong_slot_is_rejected() {
        let mut rng = SeededRandom::new(2);
        let ring = create_item(ItemType::Ring, Grade::Common, &mut rng).unwrap();
        let mut equipped = EquippedItems::new();
        assert_eq!(
            equipped.equip_into(EquipSlot::Helmet, ring),
            Err(EquipError::WrongSlot {
                slot: EquipSlot::Helmet,
                item_type: ItemType::Ring
            })
        );
        assert_eq!(equipped.unequip(EquipSlot::Ring), Err(EquipError::EmptySlot(EquipSlot::Ring)));
    }

    #[test]
    fn serializes_as_slot_keyed_object() {
        let mut rng = SeededRandom::new(3);
        let mut equipped = EquippedItems::new();
        equipped.equip(create_item(ItemType::WrathPotion, Grade::Epic, &mut rng).unwrap());
        let json = serde_json::to_value(&equipped).unwrap();
        assert_eq!(json["wrathPotion"]["grade"], "epic");
        let back: EquippedItems = serde_json::from_value(json).unwrap();
        assert_eq!(back, equipped);
    }
}

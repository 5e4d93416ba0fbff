// src/player/src/inventory.rs
use items::{Grade, Item, ItemId};
use serde::{Deserialize, Serialize};

/// Unequipped items. Order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.swap_remove(index))
    }

    /// Swap in `item` where an item with the same id sits.
    pub fn replace(&mut self, item: Item) -> bool {
        match self.items.iter_mut().find(|slot| slot.id == item.id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn count_grade(&self, grade: Grade) -> usize {
        self.items.iter().filter(|item| item.grade == grade).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use items::{ItemType, SeededRandom, create_item};

    #[test]
    fn add_remove_replace() {
        let mut rng = SeededRandom::new(1);
        let helmet = create_item(ItemType::Helmet, Grade::Common, &mut rng).unwrap();
        let ring = create_item(ItemType::Ring, Grade::Rare, &mut rng).unwrap();
        let mut inventory = Inventory::new();
        inventory.add(helmet.clone());
        inventory.add(ring.clone());
        assert_eq!(inventory.count_grade(Grade::Common), 1);

        let raised = helmet.at_enhancement_level(3);
        assert!(inventory.replace(raised.clone()));
        assert_eq!(inventory.get(&helmet.id), Some(&raised));

        assert_eq!(inventory.remove(&ring.id), Some(ring.clone()));
        assert!(inventory.remove(&ring.id).is_none());
        assert!(!inventory.replace(ring));
        assert_eq!(inventory.len(), 1);
    }}

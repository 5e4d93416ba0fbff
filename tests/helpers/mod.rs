//! Builders for sessions with a prepared save and a scripted random source.
#![allow(dead_code)]

use idle_forge::{GameConfig, GameSession};
use items::{Grade, Item, ItemType, ScriptedRandom, SeededRandom, create_item};
use player::PlayerSave;
use save::{MemoryStore, RetryPolicy, SaveSystem};

/// Builds a `PlayerSave`, stores it, then opens a session over that store.
pub struct SessionBuilder {
    save: PlayerSave,
    rng: SeededRandom,
    rolls: Vec<f64>,
}

impl SessionBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            save: PlayerSave::new(0),
            rng: SeededRandom::new(seed),
            rolls: vec![0.5],
        }
    }

    pub fn credits(mut self, credits: u64) -> Self {
        self.save.credits = credits;
        self
    }

    /// Rolls replayed by the session's random source
    pub fn rolls(mut self, rolls: Vec<f64>) -> Self {
        self.rolls = rolls;
        self
    }

    /// Add an inventory item and hand it back for later assertions.
    pub fn item(&mut self, item_type: ItemType, grade: Grade, level: u32) -> Item {
        let item = create_item(item_type, grade, &mut self.rng)
            .expect("valid grade for type")
            .at_enhancement_level(level);
        self.save.inventory.add(item.clone());
        item
    }

    pub fn equipped(&mut self, item_type: ItemType, grade: Grade, level: u32) -> Item {
        let item = self.item(item_type, grade, level);
        self.save.equip(&item.id).expect("item was just added");
        item
    }

    pub fn build(self) -> (GameSession<ScriptedRandom>, MemoryStore) {
        let store = MemoryStore::new("memory");
        let mut saves = SaveSystem::new(RetryPolicy::immediate()).with_store(store.clone());
        let mut save = self.save;
        saves.save(&mut save, 0).expect("memory store accepts writes");
        let session = GameSession::open(GameConfig::default(), saves, ScriptedRandom::new(self.rolls), 0);
        (session, store)
    }
}

// src/session.rs
//! One running game: the player save, the random source and persistence.

use crate::config::GameConfig;
use anyhow::Result;
use error::GameError;
use forge::{
    DrawCategory, EnhanceAttempt, EnhanceError, Gacha, GachaError, InheritError, InheritOutcome, SynthesisError,
    SynthesisOutcome,
};
use items::{Grade, Item, ItemId, RandomSource, SeededRandom};
use player::{EquipSlot, PlayerError, PlayerSave};
use save::{AutoSave, FileStore, LoadOutcome, LoadSource, SaveReport, SaveSystem, SchemaVersion};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gacha(#[from] GachaError),
    #[error(transparent)]
    Enhance(#[from] EnhanceError),
    #[error(transparent)]
    Inherit(#[from] InheritError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Save(#[from] GameError),
    #[error("no item with id {0}")]
    ItemNotFound(ItemId),
}

/// What happened while the session was opened
#[derive(Debug, Clone, PartialEq)]
pub struct Startup {
    pub source: LoadSource,
    pub warnings: Vec<String>,
    pub migrated_from: Option<SchemaVersion>,
    pub offline_credits: u64,
}

pub struct GameSession<R: RandomSource = SeededRandom> {
    config: GameConfig,
    rng: R,
    gacha: Gacha,
    save: PlayerSave,
    autosave: AutoSave,
    startup: Startup,
}

impl GameSession<SeededRandom> {
    /// Session over the configured save directory, with a mirror directory
    /// inside it as the second location.
    pub fn from_config(config: GameConfig, now_ms: u64) -> Result<Self> {
        let primary = FileStore::new(&config.save_dir)?;
        let mirror = FileStore::new(config.save_dir.join("mirror"))?;
        let saves = SaveSystem::new(config.retry_policy())
            .with_store(primary)
            .with_store(mirror);
        let rng = match config.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_entropy(),
        };
        Ok(Self::open(config, saves, rng, now_ms))
    }
}

impl<R: RandomSource> GameSession<R> {
    /// Load the stored save (or start fresh) and credit the time away.
    pub fn open(config: GameConfig, saves: SaveSystem, rng: R, now_ms: u64) -> Self {
        let mut autosave = AutoSave::new(saves, config.autosave_interval());
        let LoadOutcome {
            mut save,
            source,
            warnings,
            migrated_from,
        } = autosave.save_system.load(now_ms);
        for warning in &warnings {
            warn!("{warning}");
        }
        let offline_credits = save.accrue_offline_credits(now_ms, config.max_offline_secs);
        autosave.last_save = Some(now_ms);

        Self {
            config,
            rng,
            gacha: Gacha::default(),
            save,
            autosave,
            startup: Startup {
                source,
                warnings,
                migrated_from,
                offline_credits,
            },
        }
    }

    pub fn player(&self) -> &PlayerSave {
        &self.save
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn startup(&self) -> &Startup {
        &self.startup
    }

    pub fn with_gacha(mut self, gacha: Gacha) -> Self {
        self.gacha = gacha;
        self
    }

    pub fn draw(&mut self, category: DrawCategory) -> Result<Item, SessionError> {
        let result = self.gacha.draw(category, self.save.credits, &mut self.rng)?;
        let item = result.item.clone();
        self.save.apply_draw(result)?;
        Ok(item)
    }

    pub fn draw_many(&mut self, category: DrawCategory, count: u32) -> Result<Vec<Item>, SessionError> {
        let result = self.gacha.draw_many(category, count, self.save.credits, &mut self.rng)?;
        let items = result.items.clone();
        self.save.apply_multi_draw(result)?;
        Ok(items)
    }

    pub fn enhance(&mut self, id: &ItemId, destruction_prevention: bool) -> Result<EnhanceAttempt, SessionError> {
        let item = self.owned(id)?;
        let attempt = forge::enhance(&item, self.save.credits, destruction_prevention, &mut self.rng)?;
        self.save.apply_enhancement(id, attempt.clone())?;
        Ok(attempt)
    }

    pub fn inherit(&mut self, source: &ItemId, target: &ItemId) -> Result<InheritOutcome, SessionError> {
        let source = self.owned(source)?;
        let target = self.owned(target)?;
        let outcome = forge::inherit(&source, &target, &mut self.rng)?;
        self.save.apply_inheritance(outcome.clone())?;
        Ok(outcome)
    }

    /// Merge ten inventory items of `grade`. Equipped items are never used.
    pub fn synthesize(&mut self, grade: Grade) -> Result<SynthesisOutcome, SessionError> {
        let outcome = forge::synthesize(self.save.inventory.items(), grade, &mut self.rng)?;
        self.save.apply_synthesis(outcome.clone())?;
        Ok(outcome)
    }

    pub fn equip(&mut self, id: &ItemId) -> Result<EquipSlot, SessionError> {
        Ok(self.save.equip(id)?)
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Result<ItemId, SessionError> {
        Ok(self.save.unequip(slot)?)
    }

    /// Autosave when due. Returns whether a save was written.
    pub fn tick(&mut self, now_ms: u64) -> Result<bool, SessionError> {
        Ok(self.autosave.check_auto_save(&mut self.save, now_ms)?)
    }

    pub fn save_now(&mut self, now_ms: u64) -> Result<SaveReport, SessionError> {
        Ok(self.autosave.force_save(&mut self.save, now_ms)?)
    }

    /// Emergency save for a closing or backgrounded game.
    pub fn visibility_lost(&mut self, now_ms: u64) -> Result<SaveReport, SessionError> {
        Ok(self.autosave.on_visibility_lost(&mut self.save, now_ms)?)
    }

    /// Start over and persist the fresh state right away.
    pub fn reset(&mut self, now_ms: u64) -> Result<SaveReport, SessionError> {
        self.save.reset(now_ms);
        info!("session reset");
        self.autosave.last_save = Some(now_ms);
        Ok(self.autosave.save_system.reset(&mut self.save, now_ms)?)
    }

    fn owned(&self, id: &ItemId) -> Result<Item, SessionError> {
        self.save
            .find_item(id)
            .cloned()
            .ok_or_else(|| SessionError::ItemNotFound(id.clone()))
    }
}

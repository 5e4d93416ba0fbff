// src/save/src/lib.rs
//! Redundant persistence for the player save.
//!
//! Every save is serialized once and written under a primary and a backup key
//! on each configured store. Loading walks the same locations in priority
//! order and migrates each candidate on its own, so one damaged blob never
//! costs the player their progress.

pub mod migration;
pub mod schema;
pub mod storage;

pub use crate::migration::{Migrated, normalize, upgrade};
pub use crate::schema::{SAVE_VERSION, SchemaVersion, VersionedSave, detect_version, encode, parse};
pub use crate::storage::{FileStore, MemoryStore, SaveStore};

use error::{GameError, StorageError, handle_error};
use player::PlayerSave;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

pub const PRIMARY_KEY: &str = "idle_forge.save";
pub const BACKUP_KEY: &str = "idle_forge.save.backup";
pub const EMERGENCY_KEY: &str = "idle_forge.save.emergency";
pub const LAST_SAVE_TIME_KEY: &str = "idle_forge.last_save_time";
pub const MIGRATION_VERSION_KEY: &str = "idle_forge.migration_version";

/// Keys a load tries on each store, most trusted first
pub const LOAD_KEYS: [&str; 3] = [PRIMARY_KEY, BACKUP_KEY, EMERGENCY_KEY];

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Decode, migrate and check one stored blob.
pub fn decode(blob: &str) -> Result<Migrated, GameError> {
    let value: serde_json::Value = serde_json::from_str(blob)?;
    let migrated = upgrade(parse(value)?);
    migrated
        .save
        .validate()
        .map_err(|e| GameError::InvalidSaveData(e.to_string()))?;
    Ok(migrated)
}

/// How often and how patiently a write is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each failure
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping
    pub fn immediate() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    fn run<T>(&self, mut op: impl FnMut() -> Result<T, StorageError>) -> Result<T, StorageError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                // retrying cannot free space
                Err(err @ StorageError::QuotaExceeded { .. }) => return Err(err),
                Err(err) if attempt >= self.max_attempts.max(1) => return Err(err),
                Err(err) => {
                    debug!(attempt, %err, "storage write failed, retrying");
                    if !backoff.is_zero() {
                        std::thread::sleep(backoff);
                    }
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

/// Where a loaded save came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Stored { store: String, key: String },
    /// Nothing usable was stored; a fresh save was created
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub save: PlayerSave,
    pub source: LoadSource,
    /// Problems met on the way, in order
    pub warnings: Vec<String>,
    /// Set when the save was stored in an older layout
    pub migrated_from: Option<SchemaVersion>,
}

/// Locations that accepted or refused a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: Vec<String>,
    pub failed: Vec<String>,
    pub bytes: usize,
}

/// Save system over an ordered list of stores
pub struct SaveSystem {
    stores: Vec<Box<dyn SaveStore>>,
    retry: RetryPolicy,
}

impl SaveSystem {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            stores: Vec::new(),
            retry,
        }
    }

    /// Append a store; earlier stores are read first.
    pub fn with_store(mut self, store: impl SaveStore + 'static) -> Self {
        self.add_store(store);
        self
    }

    pub fn add_store(&mut self, store: impl SaveStore + 'static) {
        self.stores.push(Box::new(store));
    }

    pub fn store_names(&self) -> Vec<String> {
        self.stores.iter().map(|store| store.name().to_string()).collect()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Stamp `save.last_save_time` and write it everywhere.
    pub fn save(&mut self, save: &mut PlayerSave, now_ms: u64) -> Result<SaveReport, GameError> {
        save.last_save_time = now_ms;
        self.persist(save, &[PRIMARY_KEY, BACKUP_KEY])
    }

    /// Like `save`, also filling the emergency slot. Used when the game is
    /// about to lose focus or close.
    pub fn emergency_save(&mut self, save: &mut PlayerSave, now_ms: u64) -> Result<SaveReport, GameError> {
        save.last_save_time = now_ms;
        self.persist(save, &[PRIMARY_KEY, BACKUP_KEY, EMERGENCY_KEY])
    }

    /// Replace every stored copy with `save` after a reset. The emergency
    /// copy is removed so a damaged primary cannot bring old progress back.
    pub fn reset(&mut self, save: &mut PlayerSave, now_ms: u64) -> Result<SaveReport, GameError> {
        for store in &mut self.stores {
            if let Err(err) = self.retry.run(|| store.remove(EMERGENCY_KEY)) {
                warn!(store = store.name(), %err, "emergency copy could not be removed");
            }
        }
        self.save(save, now_ms)
    }

    fn persist(&mut self, save: &PlayerSave, keys: &[&str]) -> Result<SaveReport, GameError> {
        let blob = encode(save)?;
        let timestamp = save.last_save_time.to_string();
        let marker = SAVE_VERSION.to_string();
        let mut report = SaveReport {
            bytes: blob.len(),
            ..SaveReport::default()
        };
        let mut last_error = None;

        for store in &mut self.stores {
            let mut landed = false;
            for key in keys {
                let location = format!("{}/{key}", store.name());
                match self.retry.run(|| store.write(key, &blob)) {
                    Ok(()) => {
                        landed = true;
                        report.written.push(location);
                    }
                    Err(err) => {
                        warn!(%location, %err, "save write failed");
                        report.failed.push(location);
                        last_error = Some(err);
                    }
                }
            }
            if landed {
                for (key, value) in [(LAST_SAVE_TIME_KEY, &timestamp), (MIGRATION_VERSION_KEY, &marker)] {
                    if let Err(err) = self.retry.run(|| store.write(key, value)) {
                        warn!(store = store.name(), key, %err, "auxiliary key write failed");
                    }
                }
            }
        }

        if report.written.is_empty() {
            let last = last_error.map_or_else(|| "no storage configured".to_string(), |err| err.to_string());
            return Err(GameError::AllLocationsFailed {
                attempted: report.failed.len(),
                last,
            });
        }
        info!(locations = report.written.len(), bytes = report.bytes, "game saved");
        Ok(report)
    }

    /// Load the best stored save. Never fails: with nothing usable stored the
    /// outcome carries a fresh save and the reasons in `warnings`.
    pub fn load(&mut self, now_ms: u64) -> LoadOutcome {
        let mut warnings = Vec::new();
        let mut found_any = false;

        for index in 0..self.stores.len() {
            for key in LOAD_KEYS {
                let store = &self.stores[index];
                let location = format!("{}/{key}", store.name());
                let blob = match store.read(key) {
                    Ok(Some(blob)) => blob,
                    Ok(None) => continue,
                    Err(err) => {
                        warnings.push(format!("{location}: {err}"));
                        continue;
                    }
                };
                found_any = true;

                match decode(&blob) {
                    Ok(migrated) => {
                        let marked = stored_marker(store.as_ref()) == Some(SAVE_VERSION);
                        let source = LoadSource::Stored {
                            store: store.name().to_string(),
                            key: key.to_string(),
                        };
                        return self.accept(migrated, source, marked, warnings);
                    }
                    Err(err) => {
                        warn!(%location, %err, corrupted = err.is_corruption(), "stored save rejected");
                        warnings.push(format!("{location}: {}", handle_error(&err)));
                    }
                }
            }
        }

        if !found_any {
            warnings.push(handle_error(&GameError::NoSaveFound));
        }
        info!(warnings = warnings.len(), "starting from a fresh save");
        LoadOutcome {
            save: PlayerSave::new(now_ms),
            source: LoadSource::Default,
            warnings,
            migrated_from: None,
        }
    }

    /// `marked` says whether the source store already carries the current
    /// migration marker; an unmarked store is rewritten to stamp it.
    fn accept(
        &mut self,
        migrated: Migrated,
        source: LoadSource,
        marked: bool,
        mut warnings: Vec<String>,
    ) -> LoadOutcome {
        let Migrated {
            save,
            from,
            warnings: migration_warnings,
        } = migrated;
        let migrated_from = (!from.is_current()).then_some(from);
        let rewrite =
            migrated_from.is_some() || !marked || !warnings.is_empty() || !migration_warnings.is_empty();
        warnings.extend(migration_warnings);

        if rewrite {
            // write back so the next load finds a clean, current save up front
            if let Err(err) = self.persist(&save, &[PRIMARY_KEY, BACKUP_KEY]) {
                warnings.push(handle_error(&err));
            }
        }
        debug!(?source, ?migrated_from, "save loaded");
        LoadOutcome {
            save,
            source,
            warnings,
            migrated_from,
        }
    }
}

/// Schema version recorded by the last successful save on `store`, if readable.
fn stored_marker(store: &dyn SaveStore) -> Option<u32> {
    store.read(MIGRATION_VERSION_KEY).ok().flatten()?.trim().parse().ok()
}

/// Saves on a fixed cadence, plus on demand.
pub struct AutoSave {
    pub save_system: SaveSystem,
    pub interval: Duration,
    pub last_save: Option<u64>,
}

impl AutoSave {
    pub fn new(save_system: SaveSystem, interval: Duration) -> Self {
        Self {
            save_system,
            interval,
            last_save: None,
        }
    }

    /// Save when the interval has passed since the last save.
    pub fn check_auto_save(&mut self, save: &mut PlayerSave, now_ms: u64) -> Result<bool, GameError> {
        let due = match self.last_save {
            Some(last) => now_ms.saturating_sub(last) >= millis(self.interval),
            None => true,
        };
        if !due {
            return Ok(false);
        }
        self.force_save(save, now_ms)?;
        Ok(true)
    }

    /// Save now, whatever the interval says.
    pub fn force_save(&mut self, save: &mut PlayerSave, now_ms: u64) -> Result<SaveReport, GameError> {
        // a failed save counts as an attempt so a broken store is not hammered
        self.last_save = Some(now_ms);
        self.save_system.save(save, now_ms)
    }

    /// The game is losing focus or closing.
    pub fn on_visibility_lost(&mut self, save: &mut PlayerSave, now_ms: u64) -> Result<SaveReport, GameError> {
        self.last_save = Some(now_ms);
        self.save_system.emergency_save(save, now_ms)
    }

    pub fn last_save_time(&self) -> Option<u64> {
        self.last_save
    }

    pub fn save_interval(&self) -> Duration {
        self.interval
    }

    pub fn set_save_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

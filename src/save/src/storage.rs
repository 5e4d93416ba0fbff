// src/save/src/storage.rs
//! Key/value storage locations a save can be written to.

use anyhow::{Context, Result};
use error::StorageError;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// One storage location holding string blobs under string keys
pub trait SaveStore {
    /// Label used in logs and load reports
    fn name(&self) -> &str;

    /// `Ok(None)` when nothing is stored under `key`
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Directory-backed store: one file per key, replaced atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    name: String,
    dir: PathBuf,
}

impl FileStore {
    /// Open `dir` as a store, creating it if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir).context("Failed to create save directory")?;
        }
        Ok(Self {
            name: format!("file:{}", dir.display()),
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SaveStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        let temp_path = self.dir.join(format!("{key}.tmp"));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    fail_writes: bool,
    fail_reads: bool,
    writes: usize,
}

/// In-memory store. Clones share their contents, so a test can keep a
/// handle while the save system owns another.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    /// Reject writes that would push the stored total past `bytes`.
    pub fn with_quota(self, bytes: usize) -> Self {
        self.state().quota = Some(bytes);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state().entries.get(key).cloned()
    }

    /// Store `value` directly, bypassing quota and failure switches.
    pub fn insert(&self, key: &str, value: impl Into<String>) {
        self.state().entries.insert(key.to_string(), value.into());
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SaveStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.state();
        if state.fail_reads {
            return Err(StorageError::Unavailable(format!("{} is offline", self.name)));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(StorageError::Unavailable(format!("{} is offline", self.name)));
        }
        if let Some(limit) = state.quota {
            let others: usize = state
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        state.entries.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.state().entries.remove(key);
        Ok(())
    }
}

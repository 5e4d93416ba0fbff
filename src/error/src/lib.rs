//! Persistence error handling.
//!
//! Errors raised while reading, writing, decoding or migrating a player save.
//! Domain failures of the progression engines live next to the engines; this
//! crate only covers the storage boundary, where nothing may escape as a panic.

use thiserror::Error;

/// Errors raised by an individual storage location.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached at all
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write because it would exceed its quota
    #[error("storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    /// File-system failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the save system
#[derive(Debug, Error)]
pub enum GameError {
    /// A storage backend failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// The blob parsed but matches no known save layout
    #[error("Unrecognized save layout")]
    UnknownSchema,

    /// The save was written by a newer build
    #[error("Incompatible save version: {0}")]
    VersionMismatch(u32),

    /// The save decoded but breaks a consistency rule
    #[error("Invalid save data: {0}")]
    InvalidSaveData(String),

    /// No storage location holds a save
    #[error("No save found")]
    NoSaveFound,

    /// Every storage location rejected the write
    #[error("All {attempted} storage locations failed: {last}")]
    AllLocationsFailed { attempted: usize, last: String },
}

// Serialization goes through `GameError::SerializationError` explicitly; a
// bare serde_json error always comes from reading a blob.
impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::DeserializationError(err.to_string())
    }
}

impl GameError {
    /// Whether the error comes from a damaged blob rather than the backend.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            GameError::DeserializationError(_)
                | GameError::UnknownSchema
                | GameError::InvalidSaveData(_)
        )
    }
}

/// Convert a save error into a message fit for the player
pub fn handle_error(error: &GameError) -> String {
    match error {
        GameError::UnknownSchema | GameError::DeserializationError(_) => {
            "Save data is damaged and could not be read".to_string()
        }
        GameError::VersionMismatch(v) => {
            format!("Save was written by a newer version (schema {v})")
        }
        GameError::NoSaveFound => "No save found, starting a new game".to_string(),
        GameError::AllLocationsFailed { .. } => {
            "Progress could not be saved; the game keeps running and will retry".to_string()
        }
        GameError::Storage(StorageError::QuotaExceeded { .. }) => {
            "Storage is full, progress could not be saved".to_string()
        }
        GameError::Storage(StorageError::Io(e)) => match e.kind() {
            std::io::ErrorKind::NotFound => "Save file does not exist".to_string(),
            std::io::ErrorKind::PermissionDenied => {
                "No permission to access the save file".to_string()
            }
            _ => format!("IO error: {e}"),
        },
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_count_as_corruption() {
        let err: GameError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(err.is_corruption());
        assert_eq!(handle_error(&err), "Save data is damaged and could not be read");
    }

    #[test]
    fn quota_message_is_friendly() {
        let err = GameError::Storage(StorageError::QuotaExceeded {
            needed: 10,
            limit: 5,
        });
        assert!(!err.is_corruption());
        assert!(handle_error(&err).contains("Storage is full"));
    }
}

// src/save/src/schema.rs
//! Every save layout the game has ever written, and how to tell them apart.

use error::GameError;
use items::ItemStats;
use player::PlayerSave;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Current save format version
pub const SAVE_VERSION: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    V2,
    V3,
    V4,
}

impl SchemaVersion {
    pub const fn number(self) -> u32 {
        match self {
            SchemaVersion::V2 => 2,
            SchemaVersion::V3 => 3,
            SchemaVersion::V4 => 4,
        }
    }

    pub const fn is_current(self) -> bool {
        self.number() == SAVE_VERSION
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Item as written by the gold-era builds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemV2 {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    pub grade: String,
    /// Base stats; some builds spread fields across every stat
    pub stats: ItemStats,
    /// Flat enhancement bonus, kept separately by a few builds
    pub bonus_stats: Option<ItemStats>,
    pub level: Option<u32>,
    pub enhance_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveV2 {
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub gold_per_second: f64,
    #[serde(default = "first_stage")]
    pub stage: u32,
    /// Slot name to item; empty slots may be written as null
    #[serde(default)]
    pub equipment: BTreeMap<String, Option<ItemV2>>,
    #[serde(default)]
    pub inventory: Vec<ItemV2>,
    #[serde(default)]
    pub last_save_time: Option<f64>,
}

/// Item as written by the first credits-era builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemV3 {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub grade: String,
    #[serde(default)]
    pub base_stats: ItemStats,
    #[serde(default)]
    pub enhanced_stats: Option<ItemStats>,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub enhancement_level: u32,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveV3 {
    #[serde(default)]
    pub credits: f64,
    #[serde(default)]
    pub credits_per_second: f64,
    #[serde(default = "first_stage")]
    pub current_stage: u32,
    #[serde(default)]
    pub equipped_items: BTreeMap<String, Option<ItemV3>>,
    #[serde(default)]
    pub inventory: Vec<ItemV3>,
    /// Derived; recomputed on migration
    #[serde(default)]
    pub player_stats: Option<ItemStats>,
    #[serde(default)]
    pub last_save_time: Option<f64>,
}

fn first_stage() -> u32 {
    1
}

fn first_level() -> u32 {
    1
}

/// A decoded save in whatever layout it was written
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedSave {
    V2(SaveV2),
    V3(SaveV3),
    V4(PlayerSave),
}

impl VersionedSave {
    pub fn version(&self) -> SchemaVersion {
        match self {
            VersionedSave::V2(_) => SchemaVersion::V2,
            VersionedSave::V3(_) => SchemaVersion::V3,
            VersionedSave::V4(_) => SchemaVersion::V4,
        }
    }
}

/// Work out the layout of a blob from its shape.
///
/// An explicit `version` wins. Without one, current field names mean V3 and
/// gold-era names mean V2. Anything else is rejected rather than guessed.
pub fn detect_version(value: &Value) -> Result<SchemaVersion, GameError> {
    let object = value.as_object().ok_or(GameError::UnknownSchema)?;

    if let Some(version) = object.get("version") {
        let version = version.as_u64().ok_or(GameError::UnknownSchema)?;
        return match version {
            2 => Ok(SchemaVersion::V2),
            3 => Ok(SchemaVersion::V3),
            4 => Ok(SchemaVersion::V4),
            v if v > u64::from(SAVE_VERSION) => {
                Err(GameError::VersionMismatch(u32::try_from(v).unwrap_or(u32::MAX)))
            }
            _ => Err(GameError::UnknownSchema),
        };
    }

    let has = |key: &str| object.contains_key(key);
    if has("credits") && (has("currentStage") || has("equippedItems")) {
        Ok(SchemaVersion::V3)
    } else if has("gold") {
        Ok(SchemaVersion::V2)
    } else {
        Err(GameError::UnknownSchema)
    }
}

/// Decode `value` into the layout its shape announces.
pub fn parse(value: Value) -> Result<VersionedSave, GameError> {
    Ok(match detect_version(&value)? {
        SchemaVersion::V2 => VersionedSave::V2(serde_json::from_value(value)?),
        SchemaVersion::V3 => VersionedSave::V3(serde_json::from_value(value)?),
        SchemaVersion::V4 => {
            let mut value = value;
            if let Some(object) = value.as_object_mut() {
                object.remove("version");
            }
            VersionedSave::V4(serde_json::from_value(value)?)
        }
    })
}

/// Current-layout JSON for `save`, version field included
pub fn encode(save: &PlayerSave) -> Result<String, GameError> {
    let mut value =
        serde_json::to_value(save).map_err(|e| GameError::SerializationError(e.to_string()))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| GameError::SerializationError("save is not a JSON object".to_string()))?;
    object.insert("version".to_string(), Value::from(SAVE_VERSION));
    serde_json::to_string(&value).map_err(|e| GameError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_each_layout() {
        assert_eq!(
            detect_version(&json!({"gold": 10, "stage": 2})).unwrap(),
            SchemaVersion::V2
        );
        assert_eq!(
            detect_version(&json!({"credits": 10, "currentStage": 2})).unwrap(),
            SchemaVersion::V3
        );
        assert_eq!(
            detect_version(&json!({"version": 4, "credits": 10})).unwrap(),
            SchemaVersion::V4
        );
    }

    #[test]
    fn rejects_unknown_and_future_layouts() {
        assert!(matches!(detect_version(&json!([1, 2])), Err(GameError::UnknownSchema)));
        assert!(matches!(detect_version(&json!({"hp": 3})), Err(GameError::UnknownSchema)));
        assert!(matches!(detect_version(&json!({"version": 1})), Err(GameError::UnknownSchema)));
        assert!(matches!(
            detect_version(&json!({"version": 9, "credits": 1})),
            Err(GameError::VersionMismatch(9))
        ));
    }

    #[test]
    fn encode_stamps_the_version() {
        let text = encode(&PlayerSave::new(5)).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], 4);
        match parse(value).unwrap() {
            VersionedSave::V4(save) => assert_eq!(save, PlayerSave::new(5)),
            other => panic!("expected v4, got {:?}", other.version()),
        }
    }

    #[test]
    fn legacy_items_tolerate_missing_fields() {
        let save: SaveV2 = serde_json::from_value(json!({
            "gold": 1.5,
            "equipment": {"weapon": null, "ring": {"type": "ring", "grade": "rare", "enhanceLevel": 2}},
            "inventory": [{"type": "helm", "grade": "common", "stats": {"defense": 9}}]
        }))
        .unwrap();
        assert_eq!(save.stage, 1);
        assert_eq!(save.equipment.len(), 2);
        assert_eq!(save.inventory[0].stats.defense, 9.0);
        assert_eq!(save.inventory[0].id, None);
    }
}

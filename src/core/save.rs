/// Save manager — versioned persistence with a sequential migration chain.
///
/// Saves are JSON documents mirroring `GameState` (flags and inventory
/// as arrays). Every save is stamped with `SAVE_FORMAT_VERSION`; on
/// load, older documents pass through one registered migration per
/// version step. A missing step or a newer-than-supported version is a
/// hard, distinct failure — never a best-effort load.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::core::state::{GameState, SaveMeta};
use rustc_hash::{FxHashMap, FxHashSet};

/// Current save schema version.
///
/// History: v1 predates factions; v2 stored inventory as a plain array
/// of item ids; v3 stores inventory entries as `{id, qty}`.
pub const SAVE_FORMAT_VERSION: u32 = 3;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save version {found} is newer than supported version {supported}")]
    VersionMismatch { found: u64, supported: u32 },
    #[error("no migration registered for save version {0}")]
    MissingMigration(u32),
    #[error("save data is structurally invalid: {0}")]
    Structural(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One migration step: takes the document at some version, returns it
/// at the next. Pure; operates on the loose JSON shape because old
/// versions no longer match the current typed document.
pub type Migration = fn(Value) -> Result<Value, SaveError>;

#[derive(Debug, Serialize, Deserialize)]
struct ItemEntry {
    id: String,
    qty: u32,
}

/// The persisted wire shape. BTreeMaps and sorted arrays keep the
/// serialized output stable across runs.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveDocument {
    stats: BTreeMap<String, i32>,
    flags: Vec<String>,
    inventory: Vec<ItemEntry>,
    factions: BTreeMap<String, i32>,
    current_scene: String,
    scene_history: Vec<String>,
    meta: SaveMeta,
}

/// Serializes and restores game states, applying migrations on load.
#[derive(Debug, Clone)]
pub struct SaveManager {
    migrations: BTreeMap<u32, Migration>,
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveManager {
    /// A manager with the builtin migration chain registered.
    pub fn new() -> Self {
        let mut manager = Self::without_migrations();
        manager.register_migration(1, migrate_v1_to_v2);
        manager.register_migration(2, migrate_v2_to_v3);
        manager
    }

    /// A manager with an empty registry. Loading anything older than
    /// the current version through it fails with `MissingMigration`.
    pub fn without_migrations() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Register the step that lifts documents from `from_version` to
    /// `from_version + 1`, replacing any existing step.
    pub fn register_migration(&mut self, from_version: u32, migration: Migration) {
        self.migrations.insert(from_version, migration);
    }

    /// Serialize a state, stamping the current format version and a
    /// fresh `savedAt`.
    pub fn save(&self, state: &GameState) -> Result<String, SaveError> {
        let mut flags: Vec<String> = state.flags.iter().cloned().collect();
        flags.sort();
        let mut inventory: Vec<ItemEntry> = state
            .inventory
            .iter()
            .map(|(id, qty)| ItemEntry {
                id: id.clone(),
                qty: *qty,
            })
            .collect();
        inventory.sort_by(|a, b| a.id.cmp(&b.id));

        let doc = SaveDocument {
            stats: state.stats.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            flags,
            inventory,
            factions: state
                .factions
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            current_scene: state.current_scene.clone(),
            scene_history: state.scene_history.clone(),
            meta: SaveMeta {
                version: SAVE_FORMAT_VERSION,
                saved_at: Utc::now(),
            },
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Deserialize a save blob, migrating older versions step by step.
    /// The blob is fully validated before any `GameState` exists; a
    /// failure never yields a half-initialized state.
    pub fn load(&self, blob: &str) -> Result<GameState, SaveError> {
        let mut value: Value = serde_json::from_str(blob)?;
        let found = read_version(&value)?;
        if found > u64::from(SAVE_FORMAT_VERSION) {
            return Err(SaveError::VersionMismatch {
                found,
                supported: SAVE_FORMAT_VERSION,
            });
        }
        let mut version = found as u32;
        while version < SAVE_FORMAT_VERSION {
            let migration = self
                .migrations
                .get(&version)
                .ok_or(SaveError::MissingMigration(version))?;
            value = migration(value)?;
            version += 1;
            debug!(version, "applied save migration");
        }

        let doc: SaveDocument =
            serde_json::from_value(value).map_err(|e| SaveError::Structural(e.to_string()))?;
        document_to_state(doc)
    }

    pub fn save_to_file(&self, state: &GameState, path: &Path) -> Result<(), SaveError> {
        let blob = self.save(state)?;
        std::fs::write(path, blob)?;
        Ok(())
    }

    pub fn load_from_file(&self, path: &Path) -> Result<GameState, SaveError> {
        let blob = std::fs::read_to_string(path)?;
        self.load(&blob)
    }
}

/// Reads `meta.version` as the raw JSON integer. The caller compares it
/// against `SAVE_FORMAT_VERSION` before narrowing, so a version beyond
/// `u32` is a mismatch rather than a truncated one.
fn read_version(value: &Value) -> Result<u64, SaveError> {
    value
        .get("meta")
        .and_then(|meta| meta.get("version"))
        .and_then(Value::as_u64)
        .ok_or_else(|| SaveError::Structural("missing or non-numeric meta.version".to_string()))
}

fn document_to_state(doc: SaveDocument) -> Result<GameState, SaveError> {
    if doc.current_scene.is_empty() {
        return Err(SaveError::Structural("empty currentScene".to_string()));
    }
    let mut inventory: FxHashMap<String, u32> = FxHashMap::default();
    for entry in doc.inventory {
        if entry.qty == 0 {
            return Err(SaveError::Structural(format!(
                "inventory entry '{}' has zero quantity",
                entry.id
            )));
        }
        *inventory.entry(entry.id).or_insert(0) += entry.qty;
    }
    Ok(GameState {
        stats: doc.stats.into_iter().collect(),
        flags: doc.flags.into_iter().collect::<FxHashSet<_>>(),
        inventory,
        factions: doc.factions.into_iter().collect(),
        current_scene: doc.current_scene,
        scene_history: doc.scene_history,
        meta: doc.meta,
    })
}

/// v1 → v2: factions were introduced in v2; older saves get an empty map.
fn migrate_v1_to_v2(mut value: Value) -> Result<Value, SaveError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| SaveError::Structural("save root is not an object".to_string()))?;
    obj.entry("factions")
        .or_insert_with(|| Value::Object(Default::default()));
    set_version(&mut value, 2)?;
    Ok(value)
}

/// v2 → v3: inventory moved from a plain id array to `{id, qty}` entries.
fn migrate_v2_to_v3(mut value: Value) -> Result<Value, SaveError> {
    if let Some(Value::Array(entries)) = value.get_mut("inventory") {
        let migrated = entries
            .iter()
            .map(|entry| match entry {
                Value::String(id) => json!({ "id": id, "qty": 1 }),
                other => other.clone(),
            })
            .collect();
        *entries = migrated;
    }
    set_version(&mut value, 3)?;
    Ok(value)
}

fn set_version(value: &mut Value, version: u32) -> Result<(), SaveError> {
    value
        .get_mut("meta")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| SaveError::Structural("save meta is not an object".to_string()))?
        .insert("version".to_string(), json!(version));
    Ok(())
}

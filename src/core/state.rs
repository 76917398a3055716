/// The canonical per-playthrough game state: stats, flags, inventory,
/// factions, scene position and history, save metadata.
///
/// One mutable instance per session. Content definitions stay read-only
/// and shared; all play-time mutation happens here.

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::core::save::SAVE_FORMAT_VERSION;
use crate::schema::content::ContentStore;

/// Schema version tag and audit timestamp carried in every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeta {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
}

/// Player progress for a single playthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Stat values, clamped to their declared ranges after every mutation.
    pub stats: FxHashMap<String, i32>,
    /// Accumulated narrative facts. Removal exists but is rare by design.
    pub flags: FxHashSet<String>,
    /// Item id → held quantity. Entries are removed when they reach zero.
    pub inventory: FxHashMap<String, u32>,
    /// Faction standing in [0, 10].
    pub factions: FxHashMap<String, i32>,
    pub current_scene: String,
    /// Append-only during forward play; drives revisit heuristics.
    pub scene_history: Vec<String>,
    pub meta: SaveMeta,
}

impl GameState {
    /// A new playthrough with content-declared defaults: stats at their
    /// starting values, declared factions at 0, positioned at the start
    /// scene with empty history. Entering the start scene (and running
    /// its effects) is the resolver's job.
    pub fn fresh(content: &ContentStore) -> Self {
        let mut stats = FxHashMap::default();
        for (id, def) in &content.config().stats {
            stats.insert(id.clone(), def.start.clamp(def.min, def.max));
        }
        let mut factions = FxHashMap::default();
        for id in &content.config().factions {
            factions.insert(id.clone(), 0);
        }
        Self {
            stats,
            flags: FxHashSet::default(),
            inventory: FxHashMap::default(),
            factions,
            current_scene: content.start_scene().to_string(),
            scene_history: Vec::new(),
            meta: SaveMeta {
                version: SAVE_FORMAT_VERSION,
                saved_at: Utc::now(),
            },
        }
    }

    /// Stat value, defaulting to 0 when the stat has never been set.
    pub fn stat(&self, id: &str) -> i32 {
        self.stats.get(id).copied().unwrap_or(0)
    }

    /// Faction standing, defaulting to 0 for unknown factions.
    pub fn faction(&self, id: &str) -> i32 {
        self.factions.get(id).copied().unwrap_or(0)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.item_count(item) > 0
    }

    /// How many times a scene appears in the history.
    pub fn visit_count(&self, scene_id: &str) -> usize {
        self.scene_history.iter().filter(|s| *s == scene_id).count()
    }

    /// Order-independent hash over stats, flags, inventory, and factions.
    /// Two states with identical progress hash identically regardless of
    /// map iteration order; scene position and history are excluded so
    /// that walking in circles does not count as progress.
    pub fn progress_fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();

        let mut stats: Vec<_> = self.stats.iter().collect();
        stats.sort();
        stats.hash(&mut hasher);

        let mut flags: Vec<_> = self.flags.iter().collect();
        flags.sort();
        flags.hash(&mut hasher);

        let mut inventory: Vec<_> = self.inventory.iter().collect();
        inventory.sort();
        inventory.hash(&mut hasher);

        let mut factions: Vec<_> = self.factions.iter().collect();
        factions.sort();
        factions.hash(&mut hasher);

        hasher.finish()
    }
}

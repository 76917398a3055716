/// Content store — loading, indexing, and validation of scene content.
///
/// The store is initialized once and never mutated afterwards; sessions
/// share it by reference. Validation findings correspond to content
/// configuration errors and are surfaced at load time, before play.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::condition::Condition;
use super::effect::Effect;
use super::scene::Scene;

/// Factions are always bounded to this range.
pub const FACTION_MIN: i32 = 0;
pub const FACTION_MAX: i32 = 10;

/// Fallback range for stats referenced without a declared bound, the
/// range the legacy stats (health, courage, insight) used.
pub const LEGACY_STAT_MIN: i32 = 0;
pub const LEGACY_STAT_MAX: i32 = 10;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate scene id '{0}'")]
    DuplicateScene(String),
    #[error("start scene '{0}' is not defined")]
    MissingStartScene(String),
    #[error("scene '{scene}' links to missing scene '{target}'")]
    DeadLink { scene: String, target: String },
    #[error("scene '{scene}' contains an unrecognized condition tag")]
    UnknownConditionTag { scene: String },
    #[error("scene '{scene}' contains an unrecognized effect tag")]
    UnknownEffectTag { scene: String },
    #[error("scene '{scene}' references stat '{stat}' with no declared bounds")]
    UndeclaredStat { scene: String, stat: String },
    #[error("scene '{scene}' references undeclared faction '{faction}'")]
    UndeclaredFaction { scene: String, faction: String },
}

/// Declared range and starting value for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDef {
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub start: i32,
}

/// Top-level content configuration: where play begins and which stats
/// and factions exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentConfig {
    pub start_scene: String,
    #[serde(default)]
    pub stats: FxHashMap<String, StatDef>,
    #[serde(default)]
    pub factions: Vec<String>,
}

/// A whole gamebook in one JSON document.
#[derive(Debug, Deserialize)]
struct ContentBundle {
    config: ContentConfig,
    scenes: Vec<Scene>,
}

/// A scene file may hold one scene or an array of scenes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SceneFile {
    One(Box<Scene>),
    Many(Vec<Scene>),
}

/// Read-only index of all loaded scenes plus the content configuration.
#[derive(Debug, Clone)]
pub struct ContentStore {
    config: ContentConfig,
    scenes: FxHashMap<String, Scene>,
}

impl ContentStore {
    /// Build a store from already-parsed parts. Fails on duplicate scene
    /// ids or a dangling start scene; everything else is a `validate`
    /// finding rather than a construction error.
    pub fn from_parts(config: ContentConfig, scenes: Vec<Scene>) -> Result<Self, ContentError> {
        let mut index = FxHashMap::default();
        for scene in scenes {
            let id = scene.id.clone();
            if index.insert(id.clone(), scene).is_some() {
                return Err(ContentError::DuplicateScene(id));
            }
        }
        if !index.contains_key(&config.start_scene) {
            return Err(ContentError::MissingStartScene(config.start_scene));
        }
        Ok(Self {
            config,
            scenes: index,
        })
    }

    /// Parse a single-document content bundle: `{config, scenes}`.
    pub fn from_json_str(input: &str) -> Result<Self, ContentError> {
        let bundle: ContentBundle = serde_json::from_str(input)?;
        Self::from_parts(bundle.config, bundle.scenes)
    }

    /// Load a single-document content bundle from a file.
    pub fn load_from_file(path: &Path) -> Result<Self, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load `config.json` plus every `.json` file under `scenes/` in a
    /// content directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ContentError> {
        let config_raw = std::fs::read_to_string(dir.join("config.json"))?;
        let config: ContentConfig = serde_json::from_str(&config_raw)?;

        let mut scenes = Vec::new();
        let scenes_dir = dir.join("scenes");
        let mut paths: Vec<_> = std::fs::read_dir(&scenes_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();
        for path in paths {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<SceneFile>(&raw)? {
                SceneFile::One(scene) => scenes.push(*scene),
                SceneFile::Many(many) => scenes.extend(many),
            }
        }

        Self::from_parts(config, scenes)
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    pub fn start_scene(&self) -> &str {
        &self.config.start_scene
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn stat_def(&self, stat: &str) -> Option<StatDef> {
        self.config.stats.get(stat).copied()
    }

    /// Check every scene for content configuration problems: unknown
    /// condition/effect tags, dead links, and references to stats or
    /// factions with no declaration. Returns all findings, sorted by
    /// scene id for stable reports.
    pub fn validate(&self) -> Vec<ContentError> {
        let mut findings = Vec::new();
        let mut ids: Vec<&String> = self.scenes.keys().collect();
        ids.sort();

        for id in ids {
            let scene = &self.scenes[id];
            for effect in &scene.effects_on_enter {
                self.check_effect(id, effect, &mut findings);
            }
            for choice in &scene.choices {
                if !self.scenes.contains_key(&choice.next_scene) {
                    findings.push(ContentError::DeadLink {
                        scene: id.clone(),
                        target: choice.next_scene.clone(),
                    });
                }
                if let Some(condition) = &choice.condition {
                    condition.walk(&mut |node| self.check_condition(id, node, &mut findings));
                }
                for effect in &choice.effects {
                    self.check_effect(id, effect, &mut findings);
                }
            }
        }
        findings
    }

    fn check_condition(&self, scene: &str, node: &Condition, findings: &mut Vec<ContentError>) {
        match node {
            Condition::Unknown => findings.push(ContentError::UnknownConditionTag {
                scene: scene.to_string(),
            }),
            Condition::StatCheck { stat, .. } => self.check_stat(scene, stat, findings),
            Condition::FactionCheck { faction, .. } => self.check_faction(scene, faction, findings),
            _ => {}
        }
    }

    fn check_effect(&self, scene: &str, effect: &Effect, findings: &mut Vec<ContentError>) {
        match effect {
            Effect::Unknown => findings.push(ContentError::UnknownEffectTag {
                scene: scene.to_string(),
            }),
            Effect::SetStat { stat, .. } | Effect::ModifyStat { stat, .. } => {
                self.check_stat(scene, stat, findings)
            }
            Effect::ModifyFaction { faction, .. } => self.check_faction(scene, faction, findings),
            _ => {}
        }
    }

    fn check_stat(&self, scene: &str, stat: &str, findings: &mut Vec<ContentError>) {
        if !self.config.stats.contains_key(stat) {
            findings.push(ContentError::UndeclaredStat {
                scene: scene.to_string(),
                stat: stat.to_string(),
            });
        }
    }

    fn check_faction(&self, scene: &str, faction: &str, findings: &mut Vec<ContentError>) {
        if !self.config.factions.iter().any(|f| f == faction) {
            findings.push(ContentError::UndeclaredFaction {
                scene: scene.to_string(),
                faction: faction.to_string(),
            });
        }
    }
}

//! WASM bindings for gamebook-engine — powers the interactive web demo.

use std::sync::Arc;
use wasm_bindgen::prelude::*;

use gamebook_engine::core::resolver::{SceneView, Session};
use gamebook_engine::core::save::SaveManager;
use gamebook_engine::schema::content::ContentStore;

// ---------------------------------------------------------------------------
// Embedded demo content — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const DEMO_CONTENT: &str = include_str!("../../tests/fixtures/demo_content.json");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ChoiceInfo {
    index: usize,
    label: String,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    disabled_hint: Option<String>,
}

#[derive(serde::Serialize)]
struct SceneInfo {
    scene_id: String,
    title: String,
    text: String,
    is_ending: bool,
    choices: Vec<ChoiceInfo>,
}

#[derive(serde::Serialize)]
struct StateInfo {
    stats: Vec<(String, i32)>,
    flags: Vec<String>,
    inventory: Vec<(String, u32)>,
    factions: Vec<(String, i32)>,
    current_scene: String,
    visited_scenes: usize,
}

fn scene_info(view: &SceneView) -> SceneInfo {
    SceneInfo {
        scene_id: view.scene_id.clone(),
        title: view.title.clone(),
        text: view.text.clone(),
        is_ending: view.is_ending,
        choices: view
            .choices
            .iter()
            .map(|c| ChoiceInfo {
                index: c.index,
                label: c.label.clone(),
                enabled: c.enabled,
                disabled_hint: c.disabled_hint.clone(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// GamebookDemo — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct GamebookDemo {
    content: Arc<ContentStore>,
    session: Session,
    saves: SaveManager,
}

#[wasm_bindgen]
impl GamebookDemo {
    /// Create a fresh playthrough of the embedded demo gamebook.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<GamebookDemo, JsError> {
        let content = Arc::new(
            ContentStore::from_json_str(data::DEMO_CONTENT)
                .map_err(|e| JsError::new(&format!("Content error: {e}")))?,
        );
        let session = Session::start(Arc::clone(&content))
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        Ok(GamebookDemo {
            content,
            session,
            saves: SaveManager::new(),
        })
    }

    /// The current scene as a JSON object: id, title, text, and choices
    /// with their enabled flags and hints.
    pub fn scene(&self) -> Result<String, JsError> {
        let view = self
            .session
            .current_view()
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        serde_json::to_string(&scene_info(&view))
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Take the choice at `index`. Returns the scene arrived at, as JSON.
    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        let view = self
            .session
            .choose(index)
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        serde_json::to_string(&scene_info(&view))
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// A JSON summary of the player state, sorted for stable display.
    pub fn state(&self) -> Result<String, JsError> {
        let state = self.session.state();
        let mut stats: Vec<(String, i32)> =
            state.stats.iter().map(|(k, v)| (k.clone(), *v)).collect();
        stats.sort();
        let mut flags: Vec<String> = state.flags.iter().cloned().collect();
        flags.sort();
        let mut inventory: Vec<(String, u32)> = state
            .inventory
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        inventory.sort();
        let mut factions: Vec<(String, i32)> = state
            .factions
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        factions.sort();

        let info = StateInfo {
            stats,
            flags,
            inventory,
            factions,
            current_scene: state.current_scene.clone(),
            visited_scenes: state.scene_history.len(),
        };
        serde_json::to_string(&info)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Serialize the current state to a versioned save blob.
    pub fn save(&self) -> Result<String, JsError> {
        self.saves
            .save(self.session.state())
            .map_err(|e| JsError::new(&format!("Save error: {e}")))
    }

    /// Restore a playthrough from a save blob, migrating older versions.
    pub fn load(&mut self, blob: &str) -> Result<(), JsError> {
        let state = self
            .saves
            .load(blob)
            .map_err(|e| JsError::new(&format!("Save error: {e}")))?;
        self.session = Session::resume(Arc::clone(&self.content), state);
        Ok(())
    }

    /// Abandon the current playthrough and start over.
    pub fn restart(&mut self) -> Result<(), JsError> {
        self.session = Session::start(Arc::clone(&self.content))
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        Ok(())
    }

    /// How many times the player has entered the given scene.
    pub fn visit_count(&self, scene_id: &str) -> usize {
        self.session.visit_count(scene_id)
    }
}

/// Scene resolution — the arrive → present choices → select → transition
/// cycle, built on the condition evaluator and effect applier.
///
/// A `Session` owns exactly one `GameState` and shares the read-only
/// content store by reference. Transitions are atomic: effects run on a
/// draft copy and commit only when the whole choice + destination entry
/// succeeds.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::apply::{apply_all, ApplyError};
use crate::core::eval::evaluate;
use crate::core::state::GameState;
use crate::schema::content::ContentStore;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scene '{0}' is not defined in the content store")]
    UnknownScene(String),
    #[error("choice index {index} is out of range for scene '{scene}'")]
    ChoiceOutOfRange { scene: String, index: usize },
    #[error("choice '{label}' is not enabled in the current state")]
    InvalidChoiceSelection { label: String },
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// One choice as presented to the host: label, whether it can be taken,
/// and the authored hint when it cannot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChoice {
    pub index: usize,
    pub label: String,
    pub enabled: bool,
    /// Populated only when the choice is disabled.
    pub disabled_hint: Option<String>,
    pub next_scene: String,
}

/// Everything the host needs to render the current scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    pub scene_id: String,
    pub title: String,
    pub text: String,
    pub is_ending: bool,
    pub choices: Vec<ResolvedChoice>,
}

impl SceneView {
    pub fn enabled_count(&self) -> usize {
        self.choices.iter().filter(|c| c.enabled).count()
    }
}

type StateObserver = Box<dyn FnMut(&GameState)>;

/// A single playthrough in progress.
pub struct Session {
    content: Arc<ContentStore>,
    state: GameState,
    observer: Option<StateObserver>,
}

impl Session {
    /// Begin a fresh playthrough: content-declared defaults, then enter
    /// the start scene (its enter effects run before the first view).
    pub fn start(content: Arc<ContentStore>) -> Result<Self, EngineError> {
        let state = GameState::fresh(&content);
        Self::start_from(content, state)
    }

    /// Begin a playthrough from a prepared state (e.g. a test harness
    /// seeding flags or items before play). Enters the state's current
    /// scene, running its enter effects.
    pub fn start_from(content: Arc<ContentStore>, mut state: GameState) -> Result<Self, EngineError> {
        let scene_id = state.current_scene.clone();
        enter_scene(&content, &mut state, &scene_id)?;
        let mut session = Self {
            content,
            state,
            observer: None,
        };
        session.notify();
        Ok(session)
    }

    /// Rehydrate a session from a loaded save. Enter effects are not
    /// re-run and history is untouched: play resumes exactly at the
    /// persisted point.
    pub fn resume(content: Arc<ContentStore>, state: GameState) -> Self {
        Self {
            content,
            state,
            observer: None,
        }
    }

    /// Register the batched state-changed callback. Invoked once per
    /// committed player action, never per individual effect.
    pub fn on_state_change(&mut self, observer: impl FnMut(&GameState) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn visit_count(&self, scene_id: &str) -> usize {
        self.state.visit_count(scene_id)
    }

    /// Resolve the current scene without mutating anything. A view with
    /// zero enabled choices on a non-ending scene is reported as-is;
    /// flagging it is the softlock detector's job.
    pub fn current_view(&self) -> Result<SceneView, EngineError> {
        resolve_view(&self.content, &self.state)
    }

    /// Take a choice by index. The condition is re-evaluated here even
    /// though the host should only offer enabled choices; a stale or
    /// desynced UI cannot corrupt state through this path.
    pub fn choose(&mut self, index: usize) -> Result<SceneView, EngineError> {
        let scene = self
            .content
            .scene(&self.state.current_scene)
            .ok_or_else(|| EngineError::UnknownScene(self.state.current_scene.clone()))?;
        let choice = scene
            .choices
            .get(index)
            .ok_or_else(|| EngineError::ChoiceOutOfRange {
                scene: scene.id.clone(),
                index,
            })?;
        if let Some(condition) = &choice.condition {
            if !evaluate(condition, &self.state) {
                return Err(EngineError::InvalidChoiceSelection {
                    label: choice.label.clone(),
                });
            }
        }

        let mut draft = self.state.clone();
        apply_all(&choice.effects, &mut draft, &self.content)?;
        let next = choice.next_scene.clone();
        enter_scene(&self.content, &mut draft, &next)?;

        self.state = draft;
        debug!(scene = %self.state.current_scene, "transition committed");
        self.notify();
        self.current_view()
    }

    /// Give up ownership of the state, e.g. to hand it to the save manager.
    pub fn into_state(self) -> GameState {
        self.state
    }

    fn notify(&mut self) {
        if let Some(observer) = &mut self.observer {
            observer(&self.state);
        }
    }
}

/// Enter a scene: run its enter effects in order, then record it in
/// history and make it current. Operates on whatever state it is given,
/// so callers control the commit point.
fn enter_scene(
    content: &ContentStore,
    state: &mut GameState,
    scene_id: &str,
) -> Result<(), EngineError> {
    let scene = content
        .scene(scene_id)
        .ok_or_else(|| EngineError::UnknownScene(scene_id.to_string()))?;
    apply_all(&scene.effects_on_enter, state, content)?;
    state.scene_history.push(scene.id.clone());
    state.current_scene = scene.id.clone();
    Ok(())
}

fn resolve_view(content: &ContentStore, state: &GameState) -> Result<SceneView, EngineError> {
    let scene = content
        .scene(&state.current_scene)
        .ok_or_else(|| EngineError::UnknownScene(state.current_scene.clone()))?;
    let choices = scene
        .choices
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            let enabled = choice
                .condition
                .as_ref()
                .map(|c| evaluate(c, state))
                .unwrap_or(true);
            ResolvedChoice {
                index,
                label: choice.label.clone(),
                enabled,
                disabled_hint: if enabled {
                    None
                } else {
                    choice.disabled_hint.clone()
                },
                next_scene: choice.next_scene.clone(),
            }
        })
        .collect();
    Ok(SceneView {
        scene_id: scene.id.clone(),
        title: scene.title.clone(),
        text: scene.text.clone(),
        is_ending: scene.is_ending,
        choices,
    })
}

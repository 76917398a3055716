/// Headless playthrough runner — executes authored walkthrough scripts
/// against a content store, for QA and CI.
///
/// A script is a RON document: an optional prepared starting state, an
/// ordered list of steps (choose / checkpoint / save / load), optional
/// ending criteria, and a softlock policy. The runner drives a
/// `Session` purely through the engine's public surface.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::resolver::{EngineError, Session};
use crate::core::save::{SaveError, SaveManager};
use crate::core::softlock::{ProgressMonitor, SoftlockPolicy, SoftlockWarning};
use crate::core::state::GameState;
use crate::schema::condition::CompareOp;
use crate::schema::content::ContentStore;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("script parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("checkpoint failed at step {step}: {reason}")]
    CheckpointFailed { step: usize, reason: String },
    #[error("softlock halt at step {step}: {warning}")]
    SoftlockHalt {
        step: usize,
        warning: SoftlockWarning,
    },
    #[error("no snapshot to load at step {0}")]
    NoSnapshot(usize),
    #[error("ending criteria not met: {0}")]
    EndingNotMet(String),
}

/// Seed values applied to a fresh state before play begins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartState {
    pub scene: Option<String>,
    pub flags: Vec<String>,
    pub items: Vec<String>,
    pub stats: FxHashMap<String, i32>,
}

/// One stat expectation inside a checkpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatAssertion {
    pub stat: String,
    pub op: CompareOp,
    pub value: i32,
}

/// State expectations checked mid-run. Empty lists assert nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Assertion {
    pub scene: Option<String>,
    pub flags: Vec<String>,
    pub items: Vec<String>,
    pub stats: Vec<StatAssertion>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum Step {
    /// Select the choice at this index in the current scene.
    Choose(usize),
    Checkpoint(Assertion),
    SaveSnapshot,
    LoadSnapshot,
}

/// Where the run should end up, checked after the last step.
#[derive(Debug, Clone, Deserialize)]
pub struct EndingCriteria {
    pub scene: String,
    #[serde(default)]
    pub required_flags: Vec<String>,
    #[serde(default)]
    pub required_items: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub name: String,
    pub start: Option<StartState>,
    pub steps: Vec<Step>,
    pub ending: Option<EndingCriteria>,
    pub softlock: SoftlockPolicy,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub script: String,
    pub steps_executed: usize,
    pub warnings: Vec<SoftlockWarning>,
    pub ending_reached: bool,
    pub final_scene: String,
}

pub fn parse_script(input: &str) -> Result<Script, RunnerError> {
    Ok(ron::from_str(input)?)
}

pub fn load_script(path: &Path) -> Result<Script, RunnerError> {
    let contents = std::fs::read_to_string(path)?;
    parse_script(&contents)
}

/// Execute a script start to finish. Softlock warnings are collected
/// into the report unless the policy's `halt_on_detection` is set, in
/// which case the first warning aborts the run.
pub fn run_script(content: Arc<ContentStore>, script: &Script) -> Result<RunReport, RunnerError> {
    let mut state = GameState::fresh(&content);
    if let Some(start) = &script.start {
        seed_state(&mut state, start);
    }
    let mut session = Session::start_from(Arc::clone(&content), state)?;

    let manager = SaveManager::new();
    let mut monitor = ProgressMonitor::new(script.softlock.clone());
    let mut warnings = Vec::new();
    let mut snapshot: Option<String> = None;
    let halt = script.softlock.halt_on_detection;

    let view = session.current_view()?;
    observe(&mut monitor, &session, &view, 0, halt, &mut warnings)?;

    let mut steps_executed = 0;
    for (step_index, step) in script.steps.iter().enumerate() {
        match step {
            Step::Choose(index) => {
                let view = session.choose(*index)?;
                observe(&mut monitor, &session, &view, step_index, halt, &mut warnings)?;
            }
            Step::Checkpoint(assertion) => {
                if let Err(reason) = check_assertion(assertion, session.state()) {
                    return Err(RunnerError::CheckpointFailed {
                        step: step_index,
                        reason,
                    });
                }
            }
            Step::SaveSnapshot => {
                snapshot = Some(manager.save(session.state())?);
            }
            Step::LoadSnapshot => {
                let blob = snapshot
                    .as_ref()
                    .ok_or(RunnerError::NoSnapshot(step_index))?;
                let restored = manager.load(blob)?;
                session = Session::resume(Arc::clone(&content), restored);
            }
        }
        steps_executed += 1;
    }

    let final_scene = session.state().current_scene.clone();
    let ending_reached = match &script.ending {
        Some(criteria) => {
            check_ending(criteria, session.state()).map_err(RunnerError::EndingNotMet)?;
            true
        }
        None => false,
    };

    Ok(RunReport {
        script: script.name.clone(),
        steps_executed,
        warnings,
        ending_reached,
        final_scene,
    })
}

fn seed_state(state: &mut GameState, start: &StartState) {
    for flag in &start.flags {
        state.flags.insert(flag.clone());
    }
    for item in &start.items {
        *state.inventory.entry(item.clone()).or_insert(0) += 1;
    }
    for (stat, value) in &start.stats {
        state.stats.insert(stat.clone(), *value);
    }
    if let Some(scene) = &start.scene {
        state.current_scene = scene.clone();
    }
}

fn observe(
    monitor: &mut ProgressMonitor,
    session: &Session,
    view: &crate::core::resolver::SceneView,
    step: usize,
    halt: bool,
    warnings: &mut Vec<SoftlockWarning>,
) -> Result<(), RunnerError> {
    let mut found = monitor.observe(session.state(), view);
    if halt {
        if let Some(warning) = found.into_iter().next() {
            return Err(RunnerError::SoftlockHalt { step, warning });
        }
    } else {
        warnings.append(&mut found);
    }
    Ok(())
}

fn check_assertion(assertion: &Assertion, state: &GameState) -> Result<(), String> {
    if let Some(scene) = &assertion.scene {
        if &state.current_scene != scene {
            return Err(format!(
                "expected scene '{scene}', at '{}'",
                state.current_scene
            ));
        }
    }
    for flag in &assertion.flags {
        if !state.has_flag(flag) {
            return Err(format!("expected flag '{flag}' to be set"));
        }
    }
    for item in &assertion.items {
        if !state.has_item(item) {
            return Err(format!("expected item '{item}' to be held"));
        }
    }
    for check in &assertion.stats {
        let live = state.stat(&check.stat);
        if !check.op.compare(live, check.value) {
            return Err(format!(
                "stat '{}' is {live}, expected {:?} {}",
                check.stat, check.op, check.value
            ));
        }
    }
    Ok(())
}

fn check_ending(criteria: &EndingCriteria, state: &GameState) -> Result<(), String> {
    if state.current_scene != criteria.scene {
        return Err(format!(
            "expected ending scene '{}', at '{}'",
            criteria.scene, state.current_scene
        ));
    }
    for flag in &criteria.required_flags {
        if !state.has_flag(flag) {
            return Err(format!("missing required flag '{flag}'"));
        }
    }
    for item in &criteria.required_items {
        if !state.has_item(item) {
            return Err(format!("missing required item '{item}'"));
        }
    }
    Ok(())
}

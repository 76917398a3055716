/// Softlock detection — static scene-graph analysis before play and
/// stagnation heuristics during play.
///
/// Both modes report findings; neither halts anything by itself.
/// Whether a warning stops a run is the caller's policy.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::warn;

use crate::core::resolver::SceneView;
use crate::core::state::GameState;
use crate::schema::content::ContentStore;
use crate::schema::scene::Scene;

/// A structural problem found by static graph analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Non-ending scene with zero outgoing choices.
    DeadEnd { scene: String },
    /// Non-ending scene no path from the start scene can reach.
    /// Endings are exempt: an unwired ending is unused content, not a
    /// place a player can get stuck.
    Unreachable { scene: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::DeadEnd { scene } => {
                write!(f, "scene '{scene}' has no choices and is not an ending")
            }
            Finding::Unreachable { scene } => {
                write!(f, "scene '{scene}' is unreachable from the start scene")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphReport {
    pub findings: Vec<Finding>,
    pub reachable: usize,
    pub total: usize,
}

impl GraphReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Walk the scene graph from the start scene, treating every choice
/// edge as traversable. A gated choice counts as potentially
/// satisfiable — this is reachability approximation, not condition
/// solving. Dead links are ignored here; content validation owns them.
pub fn analyze_graph(content: &ContentStore) -> GraphReport {
    let mut reached: FxHashSet<&str> = FxHashSet::default();
    let mut queue: VecDeque<&str> = VecDeque::new();

    reached.insert(content.start_scene());
    queue.push_back(content.start_scene());
    while let Some(id) = queue.pop_front() {
        let Some(scene) = content.scene(id) else {
            continue;
        };
        for choice in &scene.choices {
            if let Some(next) = content.scene(&choice.next_scene) {
                if reached.insert(&next.id) {
                    queue.push_back(&next.id);
                }
            }
        }
    }

    let mut findings = Vec::new();
    let mut ids: Vec<&Scene> = content.scenes().collect();
    ids.sort_by(|a, b| a.id.cmp(&b.id));
    for scene in ids {
        if scene.choices.is_empty() && !scene.is_ending {
            findings.push(Finding::DeadEnd {
                scene: scene.id.clone(),
            });
        }
        if !reached.contains(scene.id.as_str()) && !scene.is_ending {
            findings.push(Finding::Unreachable {
                scene: scene.id.clone(),
            });
        }
    }

    GraphReport {
        findings,
        reachable: reached.len(),
        total: content.scene_count(),
    }
}

/// Tunables for the runtime heuristic. Hub scenes that are legitimately
/// revisited belong in `exempt_scenes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftlockPolicy {
    pub max_scene_revisits: usize,
    pub max_steps_without_progress: usize,
    pub exempt_scenes: FxHashSet<String>,
    /// When set, callers such as the headless runner abort on the first
    /// warning instead of collecting them.
    pub halt_on_detection: bool,
}

impl Default for SoftlockPolicy {
    fn default() -> Self {
        Self {
            max_scene_revisits: 3,
            max_steps_without_progress: 15,
            exempt_scenes: FxHashSet::default(),
            halt_on_detection: false,
        }
    }
}

/// A probable softlock observed during a playthrough. Heuristic, not
/// proof — advisory by contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftlockWarning {
    NoEnabledChoices { scene: String },
    RevisitLoop { scene: String, visits: usize },
    Stagnation { steps: usize },
}

impl fmt::Display for SoftlockWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftlockWarning::NoEnabledChoices { scene } => {
                write!(f, "scene '{scene}' has zero enabled choices")
            }
            SoftlockWarning::RevisitLoop { scene, visits } => {
                write!(f, "scene '{scene}' revisited {visits} times without progress")
            }
            SoftlockWarning::Stagnation { steps } => {
                write!(f, "{steps} steps without any state change")
            }
        }
    }
}

/// Tracks visit counts and steps since the last net state change across
/// one playthrough. Feed it every scene arrival.
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    policy: SoftlockPolicy,
    visits_since_progress: FxHashMap<String, usize>,
    steps_since_progress: usize,
    last_fingerprint: Option<u64>,
}

impl ProgressMonitor {
    pub fn new(policy: SoftlockPolicy) -> Self {
        Self {
            policy,
            visits_since_progress: FxHashMap::default(),
            steps_since_progress: 0,
            last_fingerprint: None,
        }
    }

    pub fn policy(&self) -> &SoftlockPolicy {
        &self.policy
    }

    /// Record one scene arrival and return any warnings it triggers.
    /// Any change to stats/flags/inventory/factions counts as progress
    /// and resets both counters; moving between scenes does not.
    pub fn observe(&mut self, state: &GameState, view: &SceneView) -> Vec<SoftlockWarning> {
        let fingerprint = state.progress_fingerprint();
        if self.last_fingerprint != Some(fingerprint) {
            self.last_fingerprint = Some(fingerprint);
            self.steps_since_progress = 0;
            self.visits_since_progress.clear();
        } else {
            self.steps_since_progress += 1;
        }
        let visits = self
            .visits_since_progress
            .entry(view.scene_id.clone())
            .or_insert(0);
        *visits += 1;
        let visits = *visits;

        let mut warnings = Vec::new();
        if view.enabled_count() == 0 && !view.is_ending {
            warnings.push(SoftlockWarning::NoEnabledChoices {
                scene: view.scene_id.clone(),
            });
        }
        if visits > self.policy.max_scene_revisits
            && !self.policy.exempt_scenes.contains(&view.scene_id)
        {
            warnings.push(SoftlockWarning::RevisitLoop {
                scene: view.scene_id.clone(),
                visits,
            });
        }
        if self.steps_since_progress >= self.policy.max_steps_without_progress {
            warnings.push(SoftlockWarning::Stagnation {
                steps: self.steps_since_progress,
            });
        }

        for warning in &warnings {
            warn!(%warning, "probable softlock");
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::Session;
    use crate::schema::condition::Condition;
    use crate::schema::content::{ContentConfig, ContentStore};
    use crate::schema::scene::{Choice, Scene};
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    fn scene(id: &str, choices: Vec<Choice>, is_ending: bool) -> Scene {
        Scene {
            id: id.to_string(),
            title: id.to_string(),
            text: String::new(),
            effects_on_enter: vec![],
            choices,
            is_ending,
        }
    }

    fn choice(label: &str, next: &str) -> Choice {
        Choice {
            label: label.to_string(),
            condition: None,
            disabled_hint: None,
            effects: vec![],
            next_scene: next.to_string(),
        }
    }

    fn store(scenes: Vec<Scene>) -> ContentStore {
        let config = ContentConfig {
            start_scene: "sc_start".to_string(),
            stats: FxHashMap::default(),
            factions: vec![],
        };
        ContentStore::from_parts(config, scenes).unwrap()
    }

    #[test]
    fn graph_flags_dead_end_and_unreachable() {
        let content = store(vec![
            scene("sc_start", vec![choice("go", "sc_mid")], false),
            scene("sc_mid", vec![], false), // dead end: no choices, not an ending
            scene("sc_orphan", vec![choice("back", "sc_start")], false),
        ]);
        let report = analyze_graph(&content);
        assert_eq!(report.total, 3);
        assert_eq!(report.reachable, 2);
        assert_eq!(
            report.findings,
            vec![
                Finding::DeadEnd {
                    scene: "sc_mid".to_string()
                },
                Finding::Unreachable {
                    scene: "sc_orphan".to_string()
                },
            ]
        );
    }

    #[test]
    fn unreachable_ending_is_not_flagged() {
        let content = store(vec![
            scene("sc_start", vec![choice("go", "sc_finale")], false),
            scene("sc_finale", vec![], true),
            scene("sc_cut_ending", vec![], true), // nothing links to it
        ]);
        let report = analyze_graph(&content);
        assert_eq!(report.reachable, 2);
        assert_eq!(report.total, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn graph_treats_gated_choices_as_satisfiable() {
        let gated = Choice {
            condition: Some(Condition::HasItem {
                item: "booth_key".to_string(),
            }),
            ..choice("unlock", "sc_end")
        };
        let content = store(vec![
            scene("sc_start", vec![gated], false),
            scene("sc_end", vec![], true),
        ]);
        let report = analyze_graph(&content);
        assert!(report.is_clean());
        assert_eq!(report.reachable, 2);
    }

    fn looping_content() -> Arc<ContentStore> {
        // start ⇄ hub loop with no state change anywhere
        let content = store(vec![
            scene("sc_start", vec![choice("to hub", "sc_hub")], false),
            scene("sc_hub", vec![choice("back", "sc_start")], false),
        ]);
        Arc::new(content)
    }

    #[test]
    fn revisit_loop_detected() {
        let mut session = Session::start(looping_content()).unwrap();
        let mut monitor = ProgressMonitor::new(SoftlockPolicy::default());

        let mut warned = false;
        for i in 0..10 {
            let view = session.current_view().unwrap();
            let warnings = monitor.observe(session.state(), &view);
            if warnings
                .iter()
                .any(|w| matches!(w, SoftlockWarning::RevisitLoop { .. }))
            {
                warned = true;
                break;
            }
            session.choose(0).unwrap();
            assert!(i < 9, "expected a revisit warning before 10 steps");
        }
        assert!(warned);
    }

    #[test]
    fn exempt_hub_scene_not_flagged_for_revisits() {
        let mut session = Session::start(looping_content()).unwrap();
        let mut policy = SoftlockPolicy::default();
        policy.exempt_scenes.insert("sc_start".to_string());
        policy.exempt_scenes.insert("sc_hub".to_string());
        policy.max_steps_without_progress = 100;
        let mut monitor = ProgressMonitor::new(policy);

        for _ in 0..20 {
            let view = session.current_view().unwrap();
            assert!(monitor.observe(session.state(), &view).is_empty());
            session.choose(0).unwrap();
        }
    }

    #[test]
    fn stagnation_detected_after_policy_steps() {
        let mut session = Session::start(looping_content()).unwrap();
        let mut policy = SoftlockPolicy::default();
        policy.max_scene_revisits = 1000;
        let mut monitor = ProgressMonitor::new(policy);

        let mut stagnated_at = None;
        for step in 0..40 {
            let view = session.current_view().unwrap();
            let warnings = monitor.observe(session.state(), &view);
            if warnings
                .iter()
                .any(|w| matches!(w, SoftlockWarning::Stagnation { .. }))
            {
                stagnated_at = Some(step);
                break;
            }
            session.choose(0).unwrap();
        }
        assert_eq!(stagnated_at, Some(15));
    }

    #[test]
    fn no_enabled_choices_reported() {
        let gated = Choice {
            condition: Some(Condition::HasItem {
                item: "booth_key".to_string(),
            }),
            disabled_hint: Some("Locked.".to_string()),
            ..choice("unlock", "sc_end")
        };
        let content = Arc::new(store(vec![
            scene("sc_start", vec![gated], false),
            scene("sc_end", vec![], true),
        ]));
        let session = Session::start(content).unwrap();
        let view = session.current_view().unwrap();
        let mut monitor = ProgressMonitor::new(SoftlockPolicy::default());
        let warnings = monitor.observe(session.state(), &view);
        assert_eq!(
            warnings,
            vec![SoftlockWarning::NoEnabledChoices {
                scene: "sc_start".to_string()
            }]
        );
    }
}

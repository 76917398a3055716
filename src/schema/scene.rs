/// Scene and choice content definitions.
///
/// Scenes are immutable after load and shared by reference across
/// sessions; only `GameState` ever mutates during play.

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::effect::Effect;

/// One selectable option within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub label: String,
    /// Gate for this choice. Absent means always enabled.
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Shown to the player when the condition fails.
    #[serde(default)]
    pub disabled_hint: Option<String>,
    /// Applied in order on selection, before the destination's enter effects.
    #[serde(default)]
    pub effects: Vec<Effect>,
    pub next_scene: String,
}

/// A single node of the branching story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub title: String,
    /// Narrative prose. Opaque to the engine.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub effects_on_enter: Vec<Effect>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Endings legitimately have zero choices; anything else with zero
    /// choices is a dead end the softlock detector reports.
    #[serde(default)]
    pub is_ending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::condition::CompareOp;

    #[test]
    fn parse_scene_with_gated_choice() {
        let json = r#"{
            "id": "sc_1_0_001",
            "title": "The Stage Door",
            "text": "The alley smells of rain and greasepaint.",
            "effectsOnEnter": [
                {"type": "set_flag", "flag": "reached_stage_door"}
            ],
            "choices": [
                {
                    "label": "Slip through the wings",
                    "effects": [{"type": "add_item", "item": "wings_pass"}],
                    "nextScene": "sc_1_0_002"
                },
                {
                    "label": "Unlock the booth",
                    "condition": {"type": "has_item", "item": "booth_key"},
                    "disabledHint": "The booth door is locked.",
                    "nextScene": "sc_1_0_003"
                }
            ]
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.id, "sc_1_0_001");
        assert_eq!(scene.effects_on_enter.len(), 1);
        assert_eq!(scene.choices.len(), 2);
        assert!(scene.choices[0].condition.is_none());
        assert_eq!(
            scene.choices[1].disabled_hint.as_deref(),
            Some("The booth door is locked.")
        );
        assert!(!scene.is_ending);
    }

    #[test]
    fn parse_ending_scene() {
        let json = r#"{
            "id": "sc_end_preservation",
            "title": "Curtain",
            "isEnding": true
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert!(scene.is_ending);
        assert!(scene.choices.is_empty());
        assert!(scene.effects_on_enter.is_empty());
    }

    #[test]
    fn scene_round_trips_through_json() {
        let scene = Scene {
            id: "sc_x".to_string(),
            title: "X".to_string(),
            text: String::new(),
            effects_on_enter: vec![],
            choices: vec![Choice {
                label: "Go".to_string(),
                condition: Some(Condition::StatCheck {
                    stat: "improv".to_string(),
                    op: CompareOp::Gte,
                    value: 2,
                }),
                disabled_hint: None,
                effects: vec![],
                next_scene: "sc_y".to_string(),
            }],
            is_ending: false,
        };
        let json = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scene);
    }
}

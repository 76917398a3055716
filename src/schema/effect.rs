/// Effect expressions — state mutations applied on scene entry or
/// choice selection.

use serde::{Deserialize, Serialize};

/// A single authored state mutation. Lists of effects always run in
/// declared order, each seeing the result of the previous one.
///
/// Removal effects on absent targets are no-ops, never errors: scenes
/// can be re-entered and their enter effects re-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    SetStat {
        stat: String,
        value: i32,
    },
    ModifyStat {
        stat: String,
        delta: i32,
    },
    SetFlag {
        flag: String,
    },
    RemoveFlag {
        flag: String,
    },
    AddItem {
        item: String,
        /// Quantity for consumables; omitted means 1.
        #[serde(default)]
        qty: Option<u32>,
    },
    RemoveItem {
        item: String,
        #[serde(default)]
        qty: Option<u32>,
    },
    ModifyFaction {
        faction: String,
        delta: i32,
    },
    /// Fallback for effect tags this engine version does not know.
    /// Applying one is an error; content validation reports it first.
    #[serde(other)]
    Unknown,
}

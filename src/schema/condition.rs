/// Condition expressions — boolean gates evaluated against a game state.

use serde::{Deserialize, Serialize};

/// Integer comparison operator used by stat and faction checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gte,
    Lte,
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    pub fn compare(&self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Gte => lhs >= rhs,
            Self::Lte => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
        }
    }
}

/// Whether a flag check asserts presence or absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagMode {
    #[default]
    Has,
    NotHas,
}

/// A recursive condition expression over stats, flags, inventory, and
/// factions. Dispatched by the `type` tag in content JSON.
///
/// Ids that do not exist in the state are not an error: a missing stat
/// or faction reads as 0, a missing flag as unset, a missing item as
/// not held. The content linter reports suspect references separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    StatCheck {
        stat: String,
        op: CompareOp,
        value: i32,
    },
    FlagCheck {
        flag: String,
        #[serde(default)]
        mode: FlagMode,
    },
    HasItem {
        item: String,
    },
    FactionCheck {
        faction: String,
        op: CompareOp,
        value: i32,
    },
    And {
        conditions: Vec<Condition>,
    },
    Or {
        conditions: Vec<Condition>,
    },
    /// Fallback for condition tags this engine version does not know.
    /// Evaluates to false; flagged by content validation.
    #[serde(other)]
    Unknown,
}

impl Condition {
    /// Walk this condition tree, calling `visit` on every node.
    pub fn walk(&self, visit: &mut impl FnMut(&Condition)) {
        visit(self);
        if let Condition::And { conditions } | Condition::Or { conditions } = self {
            for child in conditions {
                child.walk(visit);
            }
        }
    }
}

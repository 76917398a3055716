/// Condition evaluation — pure, total, and side-effect free.

use crate::core::state::GameState;
use crate::schema::condition::{Condition, FlagMode};

/// Test a condition against a state snapshot.
///
/// Never fails for well-formed conditions: references to ids the state
/// has never seen fall back to "absent" (stat/faction 0, flag unset,
/// item not held), so authors can gate on content that lands later.
/// `and`/`or` short-circuit left to right. An `Unknown` tag evaluates
/// to false; content validation reports it before play.
pub fn evaluate(condition: &Condition, state: &GameState) -> bool {
    match condition {
        Condition::StatCheck { stat, op, value } => op.compare(state.stat(stat), *value),
        Condition::FlagCheck { flag, mode } => match mode {
            FlagMode::Has => state.has_flag(flag),
            FlagMode::NotHas => !state.has_flag(flag),
        },
        Condition::HasItem { item } => state.has_item(item),
        Condition::FactionCheck { faction, op, value } => op.compare(state.faction(faction), *value),
        Condition::And { conditions } => conditions.iter().all(|c| evaluate(c, state)),
        Condition::Or { conditions } => conditions.iter().any(|c| evaluate(c, state)),
        Condition::Unknown => false,
    }
}

/// Effect application — deterministic state mutation with clamping.

use thiserror::Error;
use tracing::debug;

use crate::core::state::GameState;
use crate::schema::content::{
    ContentStore, FACTION_MAX, FACTION_MIN, LEGACY_STAT_MAX, LEGACY_STAT_MIN,
};
use crate::schema::effect::Effect;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("unrecognized effect tag cannot be applied")]
    UnknownEffect,
}

/// A numeric write exceeded its declared bounds and was clamped.
/// Gameplay proceeds silently; this notice exists for authoring
/// feedback and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clamped {
    pub target: String,
    pub attempted: i32,
    pub bounded: i32,
}

/// Apply one effect in place. Returns a clamp notice when the raw
/// result fell outside the target's range.
///
/// Total for every well-formed effect: removals on absent flags/items
/// are no-ops so re-entering a scene can safely re-run its enter
/// effects. Only `Effect::Unknown` fails.
pub fn apply(
    effect: &Effect,
    state: &mut GameState,
    content: &ContentStore,
) -> Result<Option<Clamped>, ApplyError> {
    match effect {
        Effect::SetStat { stat, value } => Ok(write_stat(state, content, stat, *value)),
        Effect::ModifyStat { stat, delta } => {
            let raw = state.stat(stat).saturating_add(*delta);
            Ok(write_stat(state, content, stat, raw))
        }
        Effect::SetFlag { flag } => {
            state.flags.insert(flag.clone());
            Ok(None)
        }
        Effect::RemoveFlag { flag } => {
            state.flags.remove(flag);
            Ok(None)
        }
        Effect::AddItem { item, qty } => {
            let qty = qty.unwrap_or(1);
            let count = state.inventory.entry(item.clone()).or_insert(0);
            *count = count.saturating_add(qty);
            Ok(None)
        }
        Effect::RemoveItem { item, qty } => {
            let qty = qty.unwrap_or(1);
            if let Some(count) = state.inventory.get_mut(item) {
                *count = count.saturating_sub(qty);
                if *count == 0 {
                    state.inventory.remove(item);
                }
            }
            Ok(None)
        }
        Effect::ModifyFaction { faction, delta } => {
            let raw = state.faction(faction).saturating_add(*delta);
            let bounded = raw.clamp(FACTION_MIN, FACTION_MAX);
            state.factions.insert(faction.clone(), bounded);
            Ok(notice(faction, raw, bounded))
        }
        Effect::Unknown => Err(ApplyError::UnknownEffect),
    }
}

/// Apply a list of effects in declared order, each seeing the result of
/// the previous one. Collects every clamp notice along the way.
pub fn apply_all(
    effects: &[Effect],
    state: &mut GameState,
    content: &ContentStore,
) -> Result<Vec<Clamped>, ApplyError> {
    let mut clamps = Vec::new();
    for effect in effects {
        if let Some(clamp) = apply(effect, state, content)? {
            clamps.push(clamp);
        }
    }
    Ok(clamps)
}

fn write_stat(
    state: &mut GameState,
    content: &ContentStore,
    stat: &str,
    raw: i32,
) -> Option<Clamped> {
    let (min, max) = match content.stat_def(stat) {
        Some(def) => (def.min, def.max),
        // Undeclared stats are a validation finding; at runtime they
        // fall back to the legacy range to stay total.
        None => (LEGACY_STAT_MIN, LEGACY_STAT_MAX),
    };
    let bounded = raw.clamp(min, max);
    state.stats.insert(stat.to_string(), bounded);
    notice(stat, raw, bounded)
}

fn notice(target: &str, attempted: i32, bounded: i32) -> Option<Clamped> {
    if attempted == bounded {
        return None;
    }
    debug!(target_id = target, attempted, bounded, "value clamped");
    Some(Clamped {
        target: target.to_string(),
        attempted,
        bounded,
    })
}

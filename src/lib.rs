//! Gamebook Engine — deterministic state engine for branching gamebooks.
//!
//! Evaluates conditions against player state, applies authored effects,
//! resolves which choices a scene offers, detects softlocks both
//! statically and at runtime, and persists state across save/load with
//! versioned migrations. Content (scenes, prose) and presentation are
//! the host application's concern; this crate owns only the state
//! machine.

pub mod core;
pub mod runner;
pub mod schema;

pub mod apply;
pub mod eval;
pub mod resolver;
pub mod save;
pub mod softlock;
pub mod state;

pub mod condition;
pub mod content;
pub mod effect;
pub mod scene;

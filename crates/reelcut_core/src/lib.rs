pub mod drag;
pub mod editing;
pub mod error;
pub mod geometry;
pub mod history;
pub mod project;
pub mod query;
pub mod reflow;
pub mod snapping;
pub mod store;
pub mod timeline;
pub mod trim;
pub mod types;

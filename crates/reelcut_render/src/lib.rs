pub mod encode;
pub mod error;
pub mod graph;
pub mod probe;

//! Element tree: slotmap-backed arena with selector queries.

pub mod node;
pub mod query;
pub mod tree;

pub use node::{ElementData, NodeId};
pub use tree::Dom;

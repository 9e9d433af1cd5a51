//! Scene graph: an arena of nodes with owned children and weak parent links,
//! the transform resolver, and levels.
//!
//! # Invariants
//! - Child names are unique among siblings.
//! - After [`sync_hierarchy`], every node's world matrix equals its parent's
//!   world matrix times its local matrix (the root uses its local matrix).
//! - The visual matrix only diverges from the world matrix outside simulated
//!   execution.
//! - A duplicated tree shares nothing with its source and every copied
//!   component starts unloaded.

mod access;
mod document;
mod hierarchy;
mod level;
mod node;
mod tree;

pub use access::LevelScene;
pub use document::{LEVEL_FORMAT_VERSION, LevelDocument, NodeDocument};
pub use hierarchy::{BOUNCE_DURATION, resolve_transforms, sync_hierarchy};
pub use level::{Level, LevelKind};
pub use node::Node;
pub use tree::{SceneError, SceneTree};

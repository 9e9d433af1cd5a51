//! Developer tooling: read-only views over levels and the running engine.
//!
//! # Invariants
//! - Inspection never mutates the scene or triggers component loads.

mod inspector;

pub use inspector::{ComponentState, EngineSummary, LevelSummary, NodeInfo, SceneInspector};

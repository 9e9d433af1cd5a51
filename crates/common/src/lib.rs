//! Shared value types used by every stagehand crate.

mod types;

pub use types::{EditorCameraPose, LevelId, Mode, NodeId, Transform};

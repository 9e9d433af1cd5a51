//! Engine runtime: the [`EngineContext`] that owns every open level, the
//! per-frame scheduler, level sessions and play mode.
//!
//! # Invariants
//! - Frame phases run in a fixed order and none re-enters within a frame.
//! - On each node a loaded rigidbody runs its logic before any other
//!   component, so scripts see the post-physics pose.
//! - Physics only steps while simulating.
//! - The persisted level set aside for play mode is never mutated until it
//!   is restored, and it is restored as the same instance.
//! - Nothing a frame does can abort the frame loop.

mod camera;
mod config;
mod context;
mod editing;
mod levels;
mod lifecycle;
mod play;
mod scheduler;
mod session;
mod timing;

pub use camera::{CAMERA_NODE_NAME, camera_view, resolve_game_camera};
pub use config::{ConfigError, EngineConfig};
pub use context::EngineContext;
pub use scheduler::{FramePhase, FrameReport, SkipReason};
pub use session::{LevelRegistry, SessionError};
pub use timing::FrameTimer;

//! Rendering adapter: the backend contract the frame scheduler drives, the
//! render-relevant state collected each frame, and shadow light selection.
//!
//! # Invariants
//! - Backends never mutate scene state; they only receive submissions.
//! - Frame scratch is cleared at the start of every frame and never carried over.
//!
//! A [`RecordingBackend`] stands in for a GPU backend: it records every call so
//! the headless driver and tests can inspect what a frame submitted.

mod backend;
mod scratch;
mod settings;
mod shadow;
mod view;

pub use backend::{BlendMode, DrawCall, DrawKind, RecordingBackend, RenderBackend, RenderCommand, Uniform};
pub use scratch::{CollectedLight, FrameScratch, LightKind, LightParams, TransparentDrawCall};
pub use settings::RenderSettings;
pub use shadow::{ShadowSelection, light_space, select_shadow_light, upload_light};
pub use view::{CameraParams, CameraView, EditorCamera, Projection};

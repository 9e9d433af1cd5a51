//! Asset server: named assets (scripts, meshes, textures) resolved against a
//! project root.
//!
//! Loading happens on background threads. Results are handed back through a
//! channel and only become visible when the frame scheduler calls
//! [`AssetServer::update`], so the scene graph never observes a half-loaded
//! asset mid-frame.
//!
//! # Invariants
//! - Worker threads never touch scene state; they only send decoded assets.
//! - An asset name maps to at most one in-flight load.

mod asset;
mod server;

pub use asset::{Asset, AssetError, Mesh, ScriptSource, Texture};
pub use server::{AssetServer, AssetState};

//! Level file persistence.
//!
//! Two on-disk forms share one structural document:
//! ```text
//! Levels/<name>.level.json   - pretty JSON, the editor format
//! <name>.level.pack          - magic, version, SHA-256 hex digest, then
//!                              zstd-compressed CBOR of the same document
//! ```
//!
//! # Invariants
//! - Runtime clones are never written.
//! - A packed file whose digest does not match its payload fails to load.
//! - Files from a newer format version are rejected, not guessed at.

mod error;
mod files;
mod packed;
mod resolve;

pub use error::LevelFileError;
pub use files::{read_level, read_level_json, save_level, write_level_json};
pub use packed::{PACK_EXTENSION, read_packed, write_packed};
pub use resolve::{canonical_key, level_candidates, resolve_level_path};

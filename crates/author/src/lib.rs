//! Level authoring: structural edits with undo/redo.
//!
//! # Invariants
//! - A history is bound to exactly one level instance. Undo and redo refuse
//!   to run against any other level, including that level's play-mode clone.
//! - Every recorded edit is reversible.
//! - Edits, undo and redo mark the level dirty.

mod editor;

pub use editor::{EditCommand, EditError, EditHistory};

//! Template System
//!
//! Authoring and storage of short-video templates.
//!
//! # Modules
//!
//! - `models`: Template and element data structures
//! - `editor`: Draft state (field and element edits, commit)
//! - `store`: Template library with the current selection

pub mod editor;
pub mod models;
pub mod store;

// Re-export main types
pub use editor::{DraftDefaults, TemplateEditor, TemplateField};
pub use models::{Element, ElementKind, ElementKindTag, ElementPatch, Template};
pub use store::TemplateStore;

//! Capforge Core Library
//!
//! Editing core for short-video templates.
//! This library owns the template store, the draft editor, the timeline
//! preview model and the export documents. It has no UI of its own; a
//! front end drives it through [`core::Studio`] or the individual state
//! containers.
//!
//! ## Front-end Bindings
//!
//! Public model types derive `specta::Type` so a web front end can generate
//! matching TypeScript definitions.

pub mod core;

pub use crate::core::{CoreError, CoreResult, Studio};

//! Capforge Core Engine
//!
//! Core editing engine module.
//! Handles template authoring, the template library, timeline preview and export.

pub mod export;
pub mod fs;
pub mod settings;
pub mod template;
pub mod timeline;

mod studio;
pub use studio::Studio;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

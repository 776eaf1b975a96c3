//! Timeline Preview
//!
//! Read-side evaluation of a template over time: which elements are on
//! screen, how far playback has progressed, and the clock that moves the
//! preview forward. Nothing here mutates the store or the editor.

pub mod clock;
pub mod playback;
pub mod visibility;

pub use clock::PlaybackClock;
pub use playback::{
    Playback, PlaybackSnapshot, PlaybackState, TickOutcome, DEFAULT_TICK_INTERVAL_MS,
    TICKS_PER_SECOND,
};
pub use visibility::{is_visible, progress_ratio, visible_elements};

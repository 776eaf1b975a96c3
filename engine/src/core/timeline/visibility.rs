//! Element visibility and playback progress.
//!
//! Pure read-side computations over a template and a playback time.

use crate::core::template::{Element, Template};
use crate::core::TimeSec;

/// A zero or NaN time counts as unset.
fn is_set(time: TimeSec) -> bool {
    time != 0.0 && !time.is_nan()
}

/// Effective start of an element's visibility window
pub fn effective_start(element: &Element) -> TimeSec {
    if is_set(element.start_time) {
        element.start_time
    } else {
        0.0
    }
}

/// Effective end of an element's visibility window.
///
/// An unset end falls back to the template duration.
pub fn effective_end(element: &Element, template_duration: TimeSec) -> TimeSec {
    if is_set(element.end_time) {
        element.end_time
    } else {
        template_duration
    }
}

/// Returns whether `element` is on screen at `current_time`.
///
/// The window is closed on both ends.
pub fn is_visible(element: &Element, current_time: TimeSec, template_duration: TimeSec) -> bool {
    current_time >= effective_start(element)
        && current_time <= effective_end(element, template_duration)
}

/// Elements of `template` visible at `current_time`, in list order
pub fn visible_elements(template: &Template, current_time: TimeSec) -> Vec<&Element> {
    let duration = template.duration_sec();
    template
        .elements
        .iter()
        .filter(|e| is_visible(e, current_time, duration))
        .collect()
}

/// Playback progress in `[0, 1]` for well-formed input.
///
/// Returns 0 when the duration is zero, negative or not finite.
pub fn progress_ratio(current_time: TimeSec, duration: TimeSec) -> f64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    current_time / duration
}

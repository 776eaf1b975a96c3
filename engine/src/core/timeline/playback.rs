//! Preview Playback State Machine
//!
//! Two states, `Stopped` and `Playing`. Time is kept as a whole number of
//! ticks so that repeated 0.1 s steps do not accumulate float error.
//!
//! ```text
//! Stopped --toggle--> Playing
//! Playing --toggle--> Stopped              (time frozen)
//! Playing --tick, time <  duration--> Playing  (time += step)
//! Playing --tick, time >= duration--> Stopped  (time = 0)
//! any     --reset--> Stopped               (time = 0)
//! ```

use serde::{Deserialize, Serialize};
use specta::Type;

use super::visibility::progress_ratio;
use crate::core::TimeSec;

/// Ticks per second of preview time (one tick = 0.1 s)
pub const TICKS_PER_SECOND: u32 = 10;

/// Default wall-clock period between ticks, in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Playback state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Result of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing changed
    Idle,
    /// Time moved forward one step
    Advanced,
    /// The end was reached; playback stopped and time rewound to 0
    Finished,
}

/// Point-in-time view of a playback, for observers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub current_time: TimeSec,
    pub duration: TimeSec,
    pub progress: f64,
}

/// Preview playback over a fixed duration
#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    state: PlaybackState,
    ticks: u64,
    duration: TimeSec,
}

impl Playback {
    /// Creates a stopped playback at time 0
    pub fn new(duration: TimeSec) -> Self {
        Self {
            state: PlaybackState::Stopped,
            ticks: 0,
            duration,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn duration(&self) -> TimeSec {
        self.duration
    }

    /// Changes the duration (e.g. when another template is previewed)
    pub fn set_duration(&mut self, duration: TimeSec) {
        self.duration = duration;
    }

    /// Current preview time in seconds
    pub fn current_time(&self) -> TimeSec {
        self.ticks as TimeSec / TICKS_PER_SECOND as TimeSec
    }

    pub fn progress(&self) -> f64 {
        progress_ratio(self.current_time(), self.duration)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            current_time: self.current_time(),
            duration: self.duration,
            progress: self.progress(),
        }
    }

    /// Flips between playing and stopped. Returns the new state.
    pub fn toggle(&mut self) -> PlaybackState {
        self.state = match self.state {
            PlaybackState::Stopped => PlaybackState::Playing,
            PlaybackState::Playing => PlaybackState::Stopped,
        };
        self.state
    }

    /// Starts playing from the current time
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Stops playing and keeps the current time
    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Stops playing and rewinds to 0
    pub fn reset(&mut self) {
        self.state = PlaybackState::Stopped;
        self.ticks = 0;
    }

    /// Advances one step while playing
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::Idle;
        }

        if self.current_time() >= self.duration {
            self.reset();
            return TickOutcome::Finished;
        }

        self.ticks += 1;
        TickOutcome::Advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_playback_is_stopped_at_zero() {
        let playback = Playback::new(15.0);
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.current_time(), 0.0);
        assert_eq!(playback.progress(), 0.0);
    }

    #[test]
    fn test_toggle() {
        let mut playback = Playback::new(15.0);
        assert_eq!(playback.toggle(), PlaybackState::Playing);
        assert!(playback.is_playing());
        assert_eq!(playback.toggle(), PlaybackState::Stopped);
    }

    #[test]
    fn test_tick_when_stopped_is_idle() {
        let mut playback = Playback::new(15.0);
        assert_eq!(playback.tick(), TickOutcome::Idle);
        assert_eq!(playback.tick(), TickOutcome::Idle);
        assert_eq!(playback.current_time(), 0.0);
    }

    #[test]
    fn test_tick_advances_in_tenths() {
        let mut playback = Playback::new(15.0);
        playback.play();
        for _ in 0..75 {
            assert_eq!(playback.tick(), TickOutcome::Advanced);
        }
        assert_eq!(playback.current_time(), 7.5);
        assert_eq!(playback.progress(), 0.5);
    }

    #[test]
    fn test_playback_round_trips_after_eleven_ticks() {
        let mut playback = Playback::new(1.0);
        playback.toggle();

        for _ in 0..10 {
            assert_eq!(playback.tick(), TickOutcome::Advanced);
        }
        assert_eq!(playback.current_time(), 1.0);
        assert!(playback.is_playing());

        assert_eq!(playback.tick(), TickOutcome::Finished);
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.current_time(), 0.0);
        assert_eq!(playback, Playback::new(1.0));
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut playback = Playback::new(5.0);
        playback.play();
        playback.tick();
        playback.tick();
        playback.pause();

        assert_eq!(playback.tick(), TickOutcome::Idle);
        assert_eq!(playback.current_time(), 0.2);

        playback.play();
        playback.tick();
        assert!((playback.current_time() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_reset_from_either_state() {
        let mut playback = Playback::new(5.0);
        playback.play();
        playback.tick();
        playback.reset();
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.current_time(), 0.0);

        playback.play();
        playback.tick();
        playback.pause();
        playback.reset();
        assert_eq!(playback.current_time(), 0.0);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut playback = Playback::new(0.0);
        playback.play();
        assert_eq!(playback.tick(), TickOutcome::Finished);
        assert_eq!(playback.progress(), 0.0);
    }

    #[test]
    fn test_snapshot() {
        let mut playback = Playback::new(2.0);
        playback.play();
        playback.tick();

        let snapshot = playback.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert_eq!(snapshot.current_time, 0.1);
        assert_eq!(snapshot.duration, 2.0);
        assert!((snapshot.progress - 0.05).abs() < 1e-9);
    }
}

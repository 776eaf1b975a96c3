//! Playback Clock
//!
//! Drives a [`Playback`] on a fixed wall-clock period using a tokio task.
//!
//! Every start of playback spawns a ticker tagged with a fresh generation
//! number and keeps its cancel handle next to the `Playing` state. Leaving
//! `Playing` for any reason (pause, toggle, reset, reaching the end, drop)
//! bumps the generation and cancels the handle, so a ticker that was already
//! woken can never mutate time after it has been stopped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use super::playback::{
    Playback, PlaybackSnapshot, PlaybackState, TickOutcome, DEFAULT_TICK_INTERVAL_MS,
};
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Shared State
// =============================================================================

#[derive(Debug)]
struct Shared {
    playback: Playback,
    generation: u64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Ticker Handle
// =============================================================================

/// Handle to one running ticker task
#[derive(Debug)]
struct TickerHandle {
    generation: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        self.task.abort();
        debug!("Cancelled playback ticker (generation {})", self.generation);
    }
}

// =============================================================================
// Playback Clock
// =============================================================================

/// Real-time preview clock
#[derive(Debug)]
pub struct PlaybackClock {
    shared: Arc<Mutex<Shared>>,
    updates: Arc<watch::Sender<PlaybackSnapshot>>,
    ticker: Option<TickerHandle>,
    tick_interval: Duration,
}

impl PlaybackClock {
    /// Creates a stopped clock with the default 100 ms tick
    pub fn new(duration: TimeSec) -> Self {
        Self::with_interval(duration, Duration::from_millis(DEFAULT_TICK_INTERVAL_MS))
    }

    /// Creates a stopped clock with a custom tick period
    pub fn with_interval(duration: TimeSec, tick_interval: Duration) -> Self {
        let playback = Playback::new(duration);
        let (updates, _) = watch::channel(playback.snapshot());
        Self {
            shared: Arc::new(Mutex::new(Shared {
                playback,
                generation: 0,
            })),
            updates: Arc::new(updates),
            ticker: None,
            tick_interval,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Current state, time and progress
    pub fn snapshot(&self) -> PlaybackSnapshot {
        lock(&self.shared).playback.snapshot()
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.shared).playback.state()
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.shared).playback.is_playing()
    }

    pub fn current_time(&self) -> TimeSec {
        lock(&self.shared).playback.current_time()
    }

    /// Receives a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.updates.subscribe()
    }

    /// Changes the previewed duration without touching the current time
    pub fn set_duration(&mut self, duration: TimeSec) {
        let snapshot = {
            let mut shared = lock(&self.shared);
            shared.playback.set_duration(duration);
            shared.playback.snapshot()
        };
        self.updates.send_replace(snapshot);
    }

    /// Starts playing. No-op when already playing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn play(&mut self) -> CoreResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::Internal(format!("Playback requires a tokio runtime: {e}")))?;

        let (generation, snapshot) = {
            let mut shared = lock(&self.shared);
            if shared.playback.is_playing() {
                return Ok(());
            }
            shared.generation += 1;
            shared.playback.play();
            (shared.generation, shared.playback.snapshot())
        };

        // A ticker left over from a playback that ran to the end.
        if let Some(stale) = self.ticker.take() {
            stale.cancel();
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = runtime.spawn(run_ticker(
            Arc::clone(&self.shared),
            Arc::clone(&self.updates),
            generation,
            self.tick_interval,
            cancel_rx,
        ));
        self.ticker = Some(TickerHandle {
            generation,
            cancel_tx: Some(cancel_tx),
            task,
        });

        info!("Playback started at {:.1}s", snapshot.current_time);
        self.updates.send_replace(snapshot);
        Ok(())
    }

    /// Stops playing and keeps the current time
    pub fn pause(&mut self) {
        self.stop_with(Playback::pause);
    }

    /// Stops playing and rewinds to 0
    pub fn reset(&mut self) {
        self.stop_with(Playback::reset);
    }

    /// Flips between playing and paused. Returns the new state.
    pub fn toggle(&mut self) -> CoreResult<PlaybackState> {
        if self.is_playing() {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.state())
    }

    fn stop_with(&mut self, transition: fn(&mut Playback)) {
        let snapshot = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            transition(&mut shared.playback);
            shared.playback.snapshot()
        };

        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }

        debug!(
            "Playback stopped at {:.1}s ({:?})",
            snapshot.current_time, snapshot.state
        );
        self.updates.send_replace(snapshot);
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        lock(&self.shared).generation += 1;
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

async fn run_ticker(
    shared: Arc<Mutex<Shared>>,
    updates: Arc<watch::Sender<PlaybackSnapshot>>,
    generation: u64,
    period: Duration,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    // First tick fires one period after start, not immediately.
    let mut interval = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = &mut cancel_rx => break,
            _ = interval.tick() => {
                let (outcome, snapshot) = {
                    let mut guard = lock(&shared);
                    if guard.generation != generation {
                        break;
                    }
                    let outcome = guard.playback.tick();
                    (outcome, guard.playback.snapshot())
                };

                updates.send_replace(snapshot);

                match outcome {
                    TickOutcome::Advanced => {}
                    TickOutcome::Finished => {
                        info!("Playback reached the end, rewound to 0");
                        break;
                    }
                    TickOutcome::Idle => break,
                }
            }
        }
    }

    debug!("Playback ticker {} exited", generation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn assert_time(clock: &PlaybackClock, expected: TimeSec) {
        let actual = clock.current_time();
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}s, got {actual}s"
        );
    }

    #[test]
    fn test_play_outside_runtime_fails() {
        let mut clock = PlaybackClock::new(5.0);
        let err = clock.play().unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
        assert!(!clock.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_advance_time() {
        let mut clock = PlaybackClock::new(15.0);
        clock.play().unwrap();

        sleep(ms(350)).await;
        assert!(clock.is_playing());
        assert_time(&clock, 0.3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_play_does_not_double_speed() {
        let mut clock = PlaybackClock::new(15.0);
        clock.play().unwrap();
        clock.play().unwrap();

        sleep(ms(350)).await;
        assert_time(&clock, 0.3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticks() {
        let mut clock = PlaybackClock::new(15.0);
        clock.play().unwrap();
        sleep(ms(250)).await;

        clock.pause();
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert_time(&clock, 0.2);

        sleep(ms(1000)).await;
        assert_time(&clock, 0.2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_and_rewinds() {
        let mut clock = PlaybackClock::new(15.0);
        clock.play().unwrap();
        sleep(ms(250)).await;

        clock.reset();
        assert_time(&clock, 0.0);

        sleep(ms(500)).await;
        assert_time(&clock, 0.0);
        assert_eq!(clock.state(), PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_end_and_rewinds() {
        let mut clock = PlaybackClock::new(1.0);
        clock.play().unwrap();

        sleep(ms(1050)).await;
        assert!(clock.is_playing());
        assert_time(&clock, 1.0);

        sleep(ms(100)).await;
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert_time(&clock, 0.0);

        sleep(ms(1000)).await;
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert_time(&clock, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_resumes_from_paused_time() {
        let mut clock = PlaybackClock::new(15.0);
        assert_eq!(clock.toggle().unwrap(), PlaybackState::Playing);
        sleep(ms(150)).await;

        assert_eq!(clock.toggle().unwrap(), PlaybackState::Stopped);
        assert_time(&clock, 0.1);

        assert_eq!(clock.toggle().unwrap(), PlaybackState::Playing);
        sleep(ms(150)).await;
        assert_time(&clock, 0.2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_ticks() {
        let mut clock = PlaybackClock::new(15.0);
        let mut rx = clock.subscribe();
        clock.play().unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, PlaybackState::Playing);

        rx.changed().await.unwrap();
        let snapshot = *rx.borrow_and_update();
        assert_eq!(snapshot.current_time, 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticker() {
        let mut clock = PlaybackClock::new(15.0);
        clock.play().unwrap();
        let mut rx = clock.subscribe();

        drop(clock);
        sleep(ms(500)).await;

        assert_eq!(rx.borrow().current_time, 0.0);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_duration_keeps_time() {
        let mut clock = PlaybackClock::new(15.0);
        clock.play().unwrap();
        sleep(ms(250)).await;

        clock.set_duration(30.0);
        let snapshot = clock.snapshot();
        assert_eq!(snapshot.duration, 30.0);
        assert!((snapshot.current_time - 0.2).abs() < 1e-9);
        assert!(clock.is_playing());
    }
}

// src/flow/stopwatch.rs
//! Stopwatch for timed flow readings.
//!
//! `Stopwatch` is the plain state machine; `StopwatchHandle` drives it with a tokio
//! interval that adds one centisecond per tick and is aborted when the timer stops.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::flow::calc::{compute_flow_rate, format_elapsed};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    elapsed_centiseconds: u64,
    running: bool,
}

impl Stopwatch {
    pub fn elapsed_centiseconds(&self) -> u64 {
        self.elapsed_centiseconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        let was_stopped = !self.running;
        self.running = true;
        was_stopped
    }

    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_centiseconds += 1;
        }
    }

    /// Stops the timer. Yields the elapsed time only when a running, non-zero timer
    /// was stopped: that is the one case that should be logged.
    pub fn stop(&mut self) -> Option<u64> {
        let was_running = self.running;
        self.running = false;
        if was_running && self.elapsed_centiseconds > 0 {
            Some(self.elapsed_centiseconds)
        } else {
            None
        }
    }

    /// Zeroes elapsed time (and with it the rate) whether or not the timer runs.
    pub fn reset(&mut self) {
        self.elapsed_centiseconds = 0;
    }

    pub fn flow_rate(&self) -> f64 {
        compute_flow_rate(self.elapsed_centiseconds)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StopwatchSnapshot {
    pub running: bool,
    pub elapsed_centiseconds: u64,
    pub display: String,
    pub flow_rate: f64,
}

impl From<Stopwatch> for StopwatchSnapshot {
    fn from(sw: Stopwatch) -> Self {
        Self {
            running: sw.running,
            elapsed_centiseconds: sw.elapsed_centiseconds,
            display: format_elapsed(sw.elapsed_centiseconds),
            flow_rate: sw.flow_rate(),
        }
    }
}

// ==================== DRIVER ====================

pub struct StopwatchHandle {
    state: Arc<Mutex<Stopwatch>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StopwatchHandle {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(Stopwatch::default())),
            ticker: Mutex::new(None),
            tick_interval,
        }
    }

    pub fn snapshot(&self) -> StopwatchSnapshot {
        (*lock(&self.state)).into()
    }

    /// Starts ticking. A no-op when already running. Must be called inside a tokio runtime.
    pub fn start(&self) -> StopwatchSnapshot {
        let mut ticker = lock(&self.ticker);
        if !lock(&self.state).start() {
            return self.snapshot();
        }

        let state = Arc::clone(&self.state);
        let period = self.tick_interval;
        *ticker = Some(tokio::spawn(async move {
            let mut clock = interval(period);
            clock.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // the first tick completes immediately
            clock.tick().await;
            loop {
                clock.tick().await;
                let mut sw = lock(&state);
                if !sw.is_running() {
                    break;
                }
                sw.tick();
                tracing::trace!(elapsed = sw.elapsed_centiseconds(), "stopwatch tick");
            }
        }));

        log::debug!("Stopwatch started");
        self.snapshot()
    }

    /// Stops ticking and returns the elapsed centiseconds if a reading should be logged.
    pub fn stop(&self) -> (Option<u64>, StopwatchSnapshot) {
        let mut ticker = lock(&self.ticker);
        let elapsed = lock(&self.state).stop();
        if let Some(task) = ticker.take() {
            task.abort();
        }
        log::debug!("Stopwatch stopped at {:?} cs", elapsed);
        (elapsed, self.snapshot())
    }

    pub fn reset(&self) -> StopwatchSnapshot {
        lock(&self.state).reset();
        log::debug!("Stopwatch reset");
        self.snapshot()
    }
}

impl Drop for StopwatchHandle {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.ticker).take() {
            task.abort();
        }
    }
}

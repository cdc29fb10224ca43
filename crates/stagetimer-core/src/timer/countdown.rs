//! Countdown sources.
//!
//! A countdown source, once armed with a duration, emits one remaining-seconds
//! value per period and keeps counting below zero until it is disarmed. Ticks
//! are delivered on a channel so the host can serialize them with user commands
//! on a single event queue.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::CountdownError;

/// One update from a countdown source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Arming generation that produced this tick.
    pub generation: u64,
    /// Signed seconds remaining; negative means overtime.
    pub remaining: i64,
}

/// The ticking timer the sequencer arms and disarms.
pub trait CountdownSource: Send {
    /// Start emitting ticks for `duration_secs`.
    fn arm(&mut self, duration_secs: i64) -> Result<(), CountdownError>;

    /// Stop emitting ticks. Safe to call when not armed.
    fn disarm(&mut self);

    /// Clear any armed timer. Independent of whether it is running.
    fn reset(&mut self) {
        self.disarm();
    }

    /// Generation of the most recent arming. Ticks carrying any other value are stale.
    fn generation(&self) -> u64;
}

/// Countdown driven by a task on the current Tokio runtime.
///
/// Every arming sends the armed value at once and then one less per period.
/// Resuming after a stop therefore repeats the second that was on screen, so
/// each pause can lengthen a stage by up to one period. The repeated value
/// never re-fires a notification because the policy ignores repeats.
pub struct TokioCountdown {
    tx: mpsc::UnboundedSender<CountdownTick>,
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl TokioCountdown {
    /// Create a one-second countdown and the receiver its ticks arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CountdownTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn new(tx: mpsc::UnboundedSender<CountdownTick>) -> Self {
        Self {
            tx,
            period: Duration::from_secs(1),
            generation: 0,
            task: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl CountdownSource for TokioCountdown {
    fn arm(&mut self, duration_secs: i64) -> Result<(), CountdownError> {
        if self.is_armed() {
            return Err(CountdownError::AlreadyArmed);
        }
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| CountdownError::NoRuntime)?;

        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let period = self.period;

        self.task = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut remaining = duration_secs;
            loop {
                // First tick completes immediately.
                interval.tick().await;
                if tx.send(CountdownTick { generation, remaining }).is_err() {
                    break;
                }
                remaining = remaining.saturating_sub(1);
            }
        }));
        debug!(generation, duration_secs, "countdown armed");
        Ok(())
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Anything still queued from the aborted task is now stale.
            self.generation += 1;
            debug!(generation = self.generation, "countdown disarmed");
        }
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TokioCountdown {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Countdown whose ticks are fed by the host.
///
/// Clones share state, so a host can box one clone into the sequencer and keep
/// another to produce ticks and inspect what was armed.
#[derive(Debug, Clone, Default)]
pub struct ManualCountdown {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    armed: Option<i64>,
    generation: u64,
    arm_calls: usize,
    reset_calls: usize,
    fail_next: Option<CountdownError>,
}

impl ManualCountdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Duration of the current arming, if armed.
    pub fn armed_with(&self) -> Option<i64> {
        self.lock().armed
    }

    pub fn arm_calls(&self) -> usize {
        self.lock().arm_calls
    }

    pub fn reset_calls(&self) -> usize {
        self.lock().reset_calls
    }

    /// Make the next `arm` fail with `error`.
    pub fn fail_next_arm(&self, error: CountdownError) {
        self.lock().fail_next = Some(error);
    }

    /// A tick stamped with the current generation.
    pub fn tick(&self, remaining: i64) -> CountdownTick {
        CountdownTick {
            generation: self.lock().generation,
            remaining,
        }
    }
}

impl CountdownSource for ManualCountdown {
    fn arm(&mut self, duration_secs: i64) -> Result<(), CountdownError> {
        let mut state = self.lock();
        state.arm_calls += 1;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        if state.armed.is_some() {
            return Err(CountdownError::AlreadyArmed);
        }
        state.generation += 1;
        state.armed = Some(duration_secs);
        Ok(())
    }

    fn disarm(&mut self) {
        let mut state = self.lock();
        if state.armed.take().is_some() {
            state.generation += 1;
        }
    }

    fn reset(&mut self) {
        self.lock().reset_calls += 1;
        self.disarm();
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }
}

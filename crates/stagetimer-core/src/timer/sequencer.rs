//! Stage sequencer.
//!
//! Owns the ordered stages of a run, the current position, and the latest
//! remaining time. It arms the countdown source for the active stage, applies
//! the overtime-deduction policy when advancing, and republishes its state to
//! mirrors after every operation.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Configured(0) <-> Running(0) -> [advance] -> Running(1) -> ... -> Finished
//! ```
//!
//! `Finished` is only left through a fresh `setup`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut seq = StageSequencer::new(Box::new(countdown), SyncBroadcaster::detached());
//! seq.setup(vec![Stage::new("Presentation", 300, 60)])?;
//! seq.start(None)?;
//! // For every tick the countdown delivers:
//! if let Some(event) = seq.on_countdown_tick(tick) { notifier.dispatch(event); }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::countdown::{CountdownSource, CountdownTick};
use super::stage::{retain_timed, Stage};
use crate::error::SequenceError;
use crate::events::Event;
use crate::notify::{NotificationEvent, NotificationPolicy, PolicyOptions};
use crate::sync::{Snapshot, SyncBroadcaster, SyncMessage};

/// Coarse position in the run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Configured,
    Running,
    Finished,
}

/// The mutable aggregate of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    pub stages: Vec<Stage>,
    /// `>= stages.len()` means the sequence is finished.
    pub current_index: usize,
    pub running: bool,
    /// Signed; negative is overtime.
    pub remaining_secs: i64,
    /// Last human-readable status. Never used for control decisions.
    pub status: String,
}

impl SequenceState {
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current_index)
    }

    pub fn is_finished(&self) -> bool {
        !self.stages.is_empty() && self.current_index >= self.stages.len()
    }

    pub fn is_final_stage(&self) -> bool {
        self.current_index + 1 == self.stages.len()
    }

    pub fn phase(&self) -> Phase {
        if self.stages.is_empty() {
            Phase::Idle
        } else if self.current_index >= self.stages.len() {
            Phase::Finished
        } else if self.running {
            Phase::Running
        } else {
            Phase::Configured
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            stages: self.stages.clone(),
            index: self.current_index,
            running: self.running,
            remaining: self.remaining_secs,
            message: self.status.clone(),
        }
    }
}

/// The authoritative controller of a run.
pub struct StageSequencer {
    state: SequenceState,
    countdown: Box<dyn CountdownSource>,
    broadcaster: SyncBroadcaster,
    policy: NotificationPolicy,
    events: Vec<Event>,
}

impl StageSequencer {
    /// Create a sequencer in the `Idle` phase.
    pub fn new(countdown: Box<dyn CountdownSource>, broadcaster: SyncBroadcaster) -> Self {
        Self {
            state: SequenceState::default(),
            countdown,
            broadcaster,
            policy: NotificationPolicy::default(),
            events: Vec::new(),
        }
    }

    pub fn with_policy(mut self, options: PolicyOptions) -> Self {
        self.policy = NotificationPolicy::new(options);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn stages(&self) -> &[Stage] {
        &self.state.stages
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.state.current_stage()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn remaining_secs(&self) -> i64 {
        self.state.remaining_secs
    }

    pub fn status(&self) -> &str {
        &self.state.status
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Configure a new run.
    ///
    /// Zero-duration stages are dropped. If none remain the call fails and the
    /// current state is left untouched.
    pub fn setup(&mut self, stages: Vec<Stage>) -> Result<(), SequenceError> {
        let stages = retain_timed(stages);
        let Some(first) = stages.first() else {
            return Err(SequenceError::EmptyConfiguration);
        };
        let first_duration_secs = first.duration_secs;
        let remaining_secs = first.duration_signed();

        self.countdown.reset();
        self.policy.clear();
        self.state = SequenceState {
            stages,
            current_index: 0,
            running: false,
            remaining_secs,
            status: String::new(),
        };
        info!(stages = self.state.stages.len(), "sequence configured");
        self.record(Event::SequenceConfigured {
            stage_count: self.state.stages.len(),
            first_duration_secs,
            at: Utc::now(),
        });
        self.broadcaster.publish_full(&self.state.snapshot());
        Ok(())
    }

    /// Start counting down the current stage.
    ///
    /// No-op while running. `duration_override` replaces the remaining time as
    /// the armed duration.
    pub fn start(&mut self, duration_override: Option<i64>) -> Result<(), SequenceError> {
        if self.state.running {
            return Ok(());
        }
        let Some(stage) = self.state.current_stage() else {
            let (index, len) = (self.state.current_index, self.state.stages.len());
            self.state.status = "all stages are complete".into();
            self.publish();
            return Err(SequenceError::SequenceExhausted { index, len });
        };
        let status = format!("stage {} started", stage.name);
        let duration = duration_override.unwrap_or(self.state.remaining_secs);
        self.arm(duration, status)
    }

    /// Stop the countdown. No-op when not running.
    pub fn stop(&mut self) {
        if !self.state.running {
            return;
        }
        self.countdown.disarm();
        self.state.running = false;
        self.state.status = "timer stopped".into();
        info!(
            stage = self.state.current_index,
            remaining = self.state.remaining_secs,
            "timer stopped"
        );
        self.record(Event::TimerStopped {
            stage_index: self.state.current_index,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        });
        self.publish();
    }

    /// Put the current stage back to its full duration, stopped.
    pub fn reset_current_stage(&mut self) {
        self.countdown.reset();
        let index = self.state.current_index;
        self.state.remaining_secs = self
            .state
            .current_stage()
            .map(Stage::duration_signed)
            .unwrap_or(0);
        self.state.running = false;
        self.state.status = "current stage reset".into();
        self.policy.forget_stage(index);
        info!(stage = index, "current stage reset");
        self.record(Event::StageReset {
            stage_index: index,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        });
        self.publish();
    }

    /// Move to the next stage and start it immediately.
    ///
    /// With `deduct_overtime`, time the current stage ran over is taken off the
    /// next stage, never below zero. Returns `false` when there is no next
    /// stage; the index then rests at `stages.len()`.
    pub fn advance(&mut self, deduct_overtime: bool) -> bool {
        self.stop();

        let len = self.state.stages.len();
        let from = self.state.current_index;
        if from >= len {
            return false;
        }

        let next = from + 1;
        if next >= len {
            self.state.current_index = len;
            self.state.status = "all stages finished".into();
            info!(stages = len, "sequence finished");
            self.record(Event::SequenceFinished {
                stage_count: len,
                at: Utc::now(),
            });
            self.publish();
            return false;
        }

        let overtime = if deduct_overtime && self.state.remaining_secs < 0 {
            self.state.remaining_secs.unsigned_abs()
        } else {
            0
        };
        let stage = &self.state.stages[next];
        let duration =
            i64::try_from(stage.duration_secs.saturating_sub(overtime)).unwrap_or(i64::MAX);
        let status = if overtime > 0 {
            format!("stage {} started, {}s of overtime deducted", stage.name, overtime)
        } else {
            format!("stage {} started", stage.name)
        };

        self.state.current_index = next;
        self.state.remaining_secs = duration;
        self.policy.forget_stage(next);
        info!(from, to = next, overtime, duration, "advanced to next stage");
        self.record(Event::StageAdvanced {
            from_stage: from,
            to_stage: next,
            overtime_deducted_secs: overtime,
            duration_secs: duration,
            at: Utc::now(),
        });

        if let Err(e) = self.arm(duration, status) {
            debug!(error = %e, "next stage configured but not running");
        }
        true
    }

    /// Accept a remaining-time update from the countdown.
    ///
    /// Applied even when not running, since ticks can trail a stop.
    pub fn on_tick(&mut self, remaining: i64) -> Option<NotificationEvent> {
        self.state.remaining_secs = remaining;
        let index = self.state.current_index;
        let is_final = self.state.is_final_stage();
        let event = match self.state.stages.get(index) {
            Some(stage) => self.policy.evaluate(index, stage, remaining, is_final),
            None => None,
        };
        if let Some(event) = event {
            debug!(stage = index, remaining, ?event, "notification due");
            self.record(Event::Notification {
                stage_index: index,
                event,
                remaining_secs: remaining,
                at: Utc::now(),
            });
        }
        self.broadcaster.publish_remaining(remaining);
        event
    }

    /// Like [`Self::on_tick`], but drops ticks from a previous arming.
    pub fn on_countdown_tick(&mut self, tick: CountdownTick) -> Option<NotificationEvent> {
        if tick.generation != self.countdown.generation() {
            debug!(
                tick_generation = tick.generation,
                current = self.countdown.generation(),
                remaining = tick.remaining,
                "dropping stale tick"
            );
            return None;
        }
        self.on_tick(tick.remaining)
    }

    /// Handle a message arriving from the sync channel.
    ///
    /// Only snapshot requests are honored; the controller's state is never
    /// overwritten by what mirrors send. Returns whether a reply was published.
    pub fn handle_sync(&mut self, message: &SyncMessage) -> bool {
        match message {
            SyncMessage::SnapshotRequest => {
                debug!("answering snapshot request");
                self.broadcaster.publish_full(&self.state.snapshot());
                true
            }
            other => {
                debug!(event = other.event_name(), "controller ignores incoming state");
                false
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm(&mut self, duration: i64, status: String) -> Result<(), SequenceError> {
        let index = self.state.current_index;
        self.state.running = true;
        self.state.status = status;
        self.publish();

        match self.countdown.arm(duration) {
            Ok(()) => {
                let stage_name = self
                    .state
                    .current_stage()
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                info!(stage = index, name = %stage_name, duration, "stage started");
                self.record(Event::StageStarted {
                    stage_index: index,
                    stage_name,
                    duration_secs: duration,
                    at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(stage = index, error = %e, "countdown refused to arm");
                self.state.running = false;
                self.state.status = format!("error: {e}");
                self.record(Event::CountdownArmFailed {
                    stage_index: index,
                    reason: e.to_string(),
                    at: Utc::now(),
                });
                self.publish();
                Err(SequenceError::CountdownArmFailure(e))
            }
        }
    }

    fn publish(&mut self) {
        self.broadcaster.publish_changes(&self.state.snapshot());
    }

    fn record(&mut self, event: Event) {
        self.events.push(event);
    }
}

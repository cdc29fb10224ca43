//! Tick-by-tick notification decisions.
//!
//! The policy decides whether a tick warrants a sound, and which one. It never
//! plays anything itself; see [`super::Notifier`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::timer::{Stage, StageRole};

/// Outcome of evaluating one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Remaining time reached the stage's warning threshold.
    Warning,
    /// Remaining time reached zero.
    Expired(Expiry),
}

/// How a stage ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// A stage with more stages after it ended (two pulses).
    StageFinished,
    /// The final stage ended (three pulses).
    SequenceFinished,
}

impl NotificationEvent {
    pub fn is_expiry(&self) -> bool {
        matches!(self, NotificationEvent::Expired(_))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyOptions {
    /// Skip the warning for Q&A stages.
    #[serde(default)]
    pub suppress_qa_warning: bool,
}

/// Classify a single tick. Pure; no memory of previous ticks.
pub fn classify(
    stage: &Stage,
    remaining: i64,
    is_final: bool,
    options: &PolicyOptions,
) -> Option<NotificationEvent> {
    if remaining == 0 {
        let expiry = if is_final {
            Expiry::SequenceFinished
        } else {
            Expiry::StageFinished
        };
        return Some(NotificationEvent::Expired(expiry));
    }

    let quiet = options.suppress_qa_warning && stage.role == StageRole::QA;
    // A zero threshold never matches: remaining is positive here.
    if !quiet && remaining > 0 && remaining == stage.warning_threshold_signed() {
        return Some(NotificationEvent::Warning);
    }
    None
}

/// Stateful wrapper around [`classify`] that fires each
/// `(stage index, remaining)` pair at most once.
#[derive(Debug, Clone, Default)]
pub struct NotificationPolicy {
    options: PolicyOptions,
    last_tick: Option<(usize, i64)>,
    fired: HashSet<(usize, i64)>,
}

impl NotificationPolicy {
    pub fn new(options: PolicyOptions) -> Self {
        Self {
            options,
            last_tick: None,
            fired: HashSet::new(),
        }
    }

    pub fn options(&self) -> &PolicyOptions {
        &self.options
    }

    /// Evaluate a tick for the stage at `index`.
    pub fn evaluate(
        &mut self,
        index: usize,
        stage: &Stage,
        remaining: i64,
        is_final: bool,
    ) -> Option<NotificationEvent> {
        let key = (index, remaining);
        if self.last_tick == Some(key) {
            return None;
        }
        self.last_tick = Some(key);

        let event = classify(stage, remaining, is_final, &self.options)?;
        if !self.fired.insert(key) {
            return None;
        }
        Some(event)
    }

    /// Allow the stage at `index` to fire again, e.g. after it was reset.
    pub fn forget_stage(&mut self, index: usize) {
        self.fired.retain(|(i, _)| *i != index);
        self.last_tick = None;
    }

    /// Forget everything; used when a new run is configured.
    pub fn clear(&mut self) {
        self.fired.clear();
        self.last_tick = None;
    }
}

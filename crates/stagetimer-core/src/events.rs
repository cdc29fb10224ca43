use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::NotificationEvent;

/// Every transition of the sequencer produces an Event.
/// Hosts drain them for logging or JSON output; nothing reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SequenceConfigured {
        stage_count: usize,
        first_duration_secs: u64,
        at: DateTime<Utc>,
    },
    StageStarted {
        stage_index: usize,
        stage_name: String,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        stage_index: usize,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    StageReset {
        stage_index: usize,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    StageAdvanced {
        from_stage: usize,
        to_stage: usize,
        /// Overtime subtracted from the new stage, in seconds.
        overtime_deducted_secs: u64,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    SequenceFinished {
        stage_count: usize,
        at: DateTime<Utc>,
    },
    CountdownArmFailed {
        stage_index: usize,
        reason: String,
        at: DateTime<Utc>,
    },
    Notification {
        stage_index: usize,
        event: NotificationEvent,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SequenceConfigured { at, .. }
            | Event::StageStarted { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::StageReset { at, .. }
            | Event::StageAdvanced { at, .. }
            | Event::SequenceFinished { at, .. }
            | Event::CountdownArmFailed { at, .. }
            | Event::Notification { at, .. } => *at,
        }
    }
}

//! Render-ready view of a snapshot.
//!
//! Controller and mirror views draw the same thing, so both build a
//! [`DisplayModel`] from a [`Snapshot`] and only decide layout themselves.

use serde::Serialize;

use crate::sync::Snapshot;

/// Styling bucket for the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayTone {
    Normal,
    /// Within the warning window (0 < remaining <= threshold).
    Warning,
    /// Past zero.
    Overtime,
}

/// `MM:SS` of the absolute remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockFace {
    pub minutes: u64,
    pub seconds: u64,
}

impl ClockFace {
    pub fn from_secs(remaining: i64) -> Self {
        let abs = remaining.unsigned_abs();
        Self {
            minutes: abs / 60,
            seconds: abs % 60,
        }
    }
}

impl std::fmt::Display for ClockFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

pub const READY_LABEL: &str = "Ready";
pub const FINISHED_LABEL: &str = "Finished";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub stage_label: String,
    pub clock: ClockFace,
    pub tone: DisplayTone,
    pub running: bool,
    /// Whether start/stop/reset controls apply (a stage is current).
    pub controls_enabled: bool,
    /// Label for the advance control.
    pub advance_label: &'static str,
    pub message: String,
}

impl DisplayModel {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let stage = snapshot.stages.get(snapshot.index);
        let stage_label = match stage {
            Some(stage) => stage.name.clone(),
            None if snapshot.stages.is_empty() => READY_LABEL.to_string(),
            None => FINISHED_LABEL.to_string(),
        };

        let threshold = stage.map(|s| s.warning_threshold_signed()).unwrap_or(0);
        let tone = if snapshot.remaining < 0 {
            DisplayTone::Overtime
        } else if snapshot.remaining > 0 && snapshot.remaining <= threshold {
            DisplayTone::Warning
        } else {
            DisplayTone::Normal
        };

        let advance_label = if snapshot.index + 1 < snapshot.stages.len() {
            "Next stage"
        } else {
            "Finish"
        };

        Self {
            stage_label,
            clock: ClockFace::from_secs(snapshot.remaining),
            tone,
            running: snapshot.running,
            controls_enabled: stage.is_some(),
            advance_label,
            message: snapshot.message.clone(),
        }
    }

    pub fn is_overtime(&self) -> bool {
        self.tone == DisplayTone::Overtime
    }
}

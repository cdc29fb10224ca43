//! Messages exchanged between the controller and its mirrors.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::timer::Stage;

/// Event name carrying full or partial state.
pub const STATE_EVENT: &str = "timer-state";
/// Event name a mirror uses to ask for a full snapshot.
pub const REQUEST_EVENT: &str = "request-timer-state";

/// Complete replicated state of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stages: Vec<Stage>,
    pub index: usize,
    pub running: bool,
    pub remaining: i64,
    pub message: String,
}

/// Changed fields only. Receivers merge it onto their last known state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SnapshotPatch {
    pub fn remaining(remaining: i64) -> Self {
        Self {
            remaining: Some(remaining),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_none()
            && self.index.is_none()
            && self.running.is_none()
            && self.remaining.is_none()
            && self.message.is_none()
    }
}

impl Snapshot {
    /// Fields of `next` that differ from `self`.
    pub fn diff(&self, next: &Snapshot) -> SnapshotPatch {
        SnapshotPatch {
            stages: (self.stages != next.stages).then(|| next.stages.clone()),
            index: (self.index != next.index).then_some(next.index),
            running: (self.running != next.running).then_some(next.running),
            remaining: (self.remaining != next.remaining).then_some(next.remaining),
            message: (self.message != next.message).then(|| next.message.clone()),
        }
    }

    /// Merge a partial update onto this state.
    pub fn apply(&mut self, patch: &SnapshotPatch) {
        if let Some(stages) = &patch.stages {
            self.stages = stages.clone();
        }
        if let Some(index) = patch.index {
            self.index = index;
        }
        if let Some(running) = patch.running {
            self.running = running;
        }
        if let Some(remaining) = patch.remaining {
            self.remaining = remaining;
        }
        if let Some(message) = &patch.message {
            self.message = message.clone();
        }
    }
}

/// One message on the sync channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    FullSnapshot { snapshot: Snapshot },
    PartialUpdate { patch: SnapshotPatch },
    SnapshotRequest,
}

impl SyncMessage {
    /// Logical event this message travels under.
    pub fn event_name(&self) -> &'static str {
        match self {
            SyncMessage::FullSnapshot { .. } | SyncMessage::PartialUpdate { .. } => STATE_EVENT,
            SyncMessage::SnapshotRequest => REQUEST_EVENT,
        }
    }

    /// Encode as a single JSON line (no trailing newline).
    pub fn encode(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(line: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Snapshot {
        Snapshot {
            stages: vec![Stage::new("Presentation", 300, 60)],
            index: 0,
            running: false,
            remaining: 300,
            message: String::new(),
        }
    }

    #[test]
    fn diff_contains_only_changed_fields() {
        let before = configured();
        let mut after = before.clone();
        after.running = true;
        after.message = "stage Presentation started".into();

        let patch = before.diff(&after);
        assert_eq!(patch.running, Some(true));
        assert_eq!(patch.message.as_deref(), Some("stage Presentation started"));
        assert!(patch.stages.is_none());
        assert!(patch.index.is_none());
        assert!(patch.remaining.is_none());
        assert!(before.diff(&before).is_empty());
    }

    #[test]
    fn apply_merges_patch() {
        let mut state = configured();
        state.apply(&SnapshotPatch::remaining(-5));
        assert_eq!(state.remaining, -5);
        assert_eq!(state.stages.len(), 1);
    }

    #[test]
    fn partial_update_omits_absent_fields_on_the_wire() {
        let msg = SyncMessage::PartialUpdate {
            patch: SnapshotPatch::remaining(42),
        };
        let line = msg.encode().unwrap();
        assert_eq!(line, r#"{"type":"partial_update","patch":{"remaining":42}}"#);
        assert_eq!(SyncMessage::decode(&line).unwrap(), msg);
    }

    #[test]
    fn request_uses_its_own_event_name() {
        assert_eq!(SyncMessage::SnapshotRequest.event_name(), REQUEST_EVENT);
        let full = SyncMessage::FullSnapshot {
            snapshot: Snapshot::default(),
        };
        assert_eq!(full.event_name(), STATE_EVENT);
        assert!(SyncMessage::decode("not json").is_err());
    }
}

//! Passive mirror of a controller's state.

use super::message::{Snapshot, SyncMessage};

/// Replica held by a mirror view.
///
/// Only received messages change it; it has no control operations.
#[derive(Debug, Clone, Default)]
pub struct MirrorReplica {
    state: Snapshot,
    requested: bool,
    synced: bool,
}

impl MirrorReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// The one snapshot request a mirror sends when it attaches.
    ///
    /// Returns `None` on every later call.
    pub fn attach(&mut self) -> Option<SyncMessage> {
        if self.requested {
            return None;
        }
        self.requested = true;
        Some(SyncMessage::SnapshotRequest)
    }

    /// Apply one message from the controller. Returns whether the state changed.
    pub fn apply(&mut self, message: &SyncMessage) -> bool {
        match message {
            SyncMessage::FullSnapshot { snapshot } => {
                self.synced = true;
                if &self.state == snapshot {
                    return false;
                }
                self.state = snapshot.clone();
                true
            }
            SyncMessage::PartialUpdate { patch } => {
                let before = self.state.clone();
                self.state.apply(patch);
                before != self.state
            }
            // Requests come from other mirrors; nothing to do.
            SyncMessage::SnapshotRequest => false,
        }
    }

    pub fn state(&self) -> &Snapshot {
        &self.state
    }

    /// Whether a full snapshot has been received since attaching.
    pub fn is_synced(&self) -> bool {
        self.synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SnapshotPatch;
    use crate::timer::Stage;

    #[test]
    fn attach_requests_exactly_once() {
        let mut mirror = MirrorReplica::new();
        assert_eq!(mirror.attach(), Some(SyncMessage::SnapshotRequest));
        assert_eq!(mirror.attach(), None);
    }

    #[test]
    fn partial_updates_merge_onto_full_snapshot() {
        let mut mirror = MirrorReplica::new();
        let snapshot = Snapshot {
            stages: vec![Stage::new("Presentation", 300, 60)],
            remaining: 300,
            ..Default::default()
        };
        assert!(mirror.apply(&SyncMessage::FullSnapshot { snapshot }));
        assert!(mirror.is_synced());

        assert!(mirror.apply(&SyncMessage::PartialUpdate {
            patch: SnapshotPatch::remaining(299),
        }));
        assert_eq!(mirror.state().remaining, 299);
        assert_eq!(mirror.state().stages.len(), 1);

        assert!(!mirror.apply(&SyncMessage::SnapshotRequest));
    }

    #[test]
    fn partial_before_full_is_applied_but_not_synced() {
        let mut mirror = MirrorReplica::new();
        mirror.apply(&SyncMessage::PartialUpdate {
            patch: SnapshotPatch::remaining(12),
        });
        assert_eq!(mirror.state().remaining, 12);
        assert!(!mirror.is_synced());
    }
}

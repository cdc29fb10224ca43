//! Controller side of mirror sync.

use std::sync::Arc;

use tracing::warn;

use super::channel::{NullChannel, SyncChannel};
use super::message::{Snapshot, SnapshotPatch, SyncMessage};

/// Replicates the controller's state to every attached mirror.
///
/// Remembers what it last published so ordinary operations only send the
/// fields that changed.
pub struct SyncBroadcaster {
    channel: Arc<dyn SyncChannel>,
    published: Snapshot,
}

impl SyncBroadcaster {
    pub fn new(channel: Arc<dyn SyncChannel>) -> Self {
        Self {
            channel,
            published: Snapshot::default(),
        }
    }

    /// Broadcaster for a controller with no mirrors.
    pub fn detached() -> Self {
        Self::new(Arc::new(NullChannel))
    }

    /// Last state mirrors have been told about.
    pub fn published(&self) -> &Snapshot {
        &self.published
    }

    /// Publish every field.
    pub fn publish_full(&mut self, snapshot: &Snapshot) {
        self.published = snapshot.clone();
        self.send(SyncMessage::FullSnapshot {
            snapshot: snapshot.clone(),
        });
    }

    /// Publish the fields that changed since the last publication.
    pub fn publish_changes(&mut self, snapshot: &Snapshot) {
        let patch = self.published.diff(snapshot);
        if patch.is_empty() {
            return;
        }
        self.published.apply(&patch);
        self.send(SyncMessage::PartialUpdate { patch });
    }

    /// Lightweight per-tick update.
    pub fn publish_remaining(&mut self, remaining: i64) {
        if self.published.remaining == remaining {
            return;
        }
        self.published.remaining = remaining;
        self.send(SyncMessage::PartialUpdate {
            patch: SnapshotPatch::remaining(remaining),
        });
    }

    fn send(&self, message: SyncMessage) {
        if let Err(e) = self.channel.publish(message) {
            warn!(error = %e, "failed to publish sync message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::LocalChannel;
    use crate::timer::Stage;

    #[test]
    fn changes_are_sent_as_patches() {
        let channel = LocalChannel::default();
        let mut rx = channel.subscribe();
        let mut broadcaster = SyncBroadcaster::new(Arc::new(channel));

        let mut state = Snapshot {
            stages: vec![Stage::new("Presentation", 300, 60)],
            remaining: 300,
            ..Default::default()
        };
        broadcaster.publish_full(&state);
        assert!(matches!(rx.try_recv().unwrap(), SyncMessage::FullSnapshot { .. }));

        state.running = true;
        broadcaster.publish_changes(&state);
        match rx.try_recv().unwrap() {
            SyncMessage::PartialUpdate { patch } => {
                assert_eq!(patch.running, Some(true));
                assert!(patch.stages.is_none());
            }
            other => panic!("expected PartialUpdate, got {other:?}"),
        }

        // Nothing changed, nothing sent.
        broadcaster.publish_changes(&state);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn remaining_updates_track_published_state() {
        let channel = LocalChannel::default();
        let mut rx = channel.subscribe();
        let mut broadcaster = SyncBroadcaster::new(Arc::new(channel));

        broadcaster.publish_remaining(10);
        broadcaster.publish_remaining(10);
        assert_eq!(
            rx.try_recv().unwrap(),
            SyncMessage::PartialUpdate {
                patch: SnapshotPatch::remaining(10)
            }
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(broadcaster.published().remaining, 10);
    }
}

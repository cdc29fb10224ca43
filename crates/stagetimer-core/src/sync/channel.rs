use tokio::sync::broadcast;

use super::message::SyncMessage;
use crate::error::SyncError;

/// Publish side of a sync channel.
pub trait SyncChannel: Send + Sync {
    fn publish(&self, message: SyncMessage) -> Result<(), SyncError>;
}

/// In-process broadcast channel. Clones share the same subscribers.
#[derive(Debug, Clone)]
pub struct LocalChannel {
    tx: broadcast::Sender<SyncMessage>,
}

impl LocalChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl SyncChannel for LocalChannel {
    fn publish(&self, message: SyncMessage) -> Result<(), SyncError> {
        // No mirror attached is the normal case.
        let _ = self.tx.send(message);
        Ok(())
    }
}

/// Channel with nobody listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullChannel;

impl SyncChannel for NullChannel {
    fn publish(&self, _message: SyncMessage) -> Result<(), SyncError> {
        Ok(())
    }
}

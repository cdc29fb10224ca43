//! Controller-to-mirror state replication.
//!
//! The controller owns the only mutable sequence state. Mirrors hold a replica
//! that changes only through received [`SyncMessage`]s, and ask for a full
//! snapshot once when they attach.

mod broadcaster;
mod channel;
mod message;
mod mirror;
pub mod transport;

pub use broadcaster::SyncBroadcaster;
pub use channel::{LocalChannel, NullChannel, SyncChannel};
pub use message::{Snapshot, SnapshotPatch, SyncMessage, REQUEST_EVENT, STATE_EVENT};
pub use mirror::MirrorReplica;
pub use transport::{serve_mirrors, MirrorConnection};

//! # Stagetimer Core Library
//!
//! Core logic for Stagetimer, a presentation timer that runs a fixed sequence
//! of timed stages (typically a talk followed by Q&A), sounds warnings as time
//! runs low, carries overtime into the next stage, and keeps any number of
//! mirror displays in step with the controller.
//!
//! Hosts (the `stagetimer` CLI, or any GUI) own the clock and the speakers.
//! Everything they decide on is delegated to this crate.
//!
//! ## Architecture
//!
//! - **Timer**: [`StageSequencer`] is the single authoritative state machine,
//!   driven by a [`CountdownSource`] that emits one remaining-seconds tick per second
//! - **Notify**: [`NotificationPolicy`] turns ticks into warning/expiry events;
//!   [`Notifier`] hands them to the host's sound player
//! - **Sync**: [`SyncBroadcaster`] publishes full snapshots and partial updates;
//!   [`MirrorReplica`] rebuilds state on the display side
//! - **Storage**: SQLite-backed key-value store for presets and settings
//! - **Session**: [`Session`] serializes user intents, ticks and mirror
//!   requests on one event queue
//!
//! ## Key Components
//!
//! - [`StageSequencer`]: stage sequencing and overtime deduction
//! - [`PresetBook`]: saved presentation/Q&A configurations
//! - [`Settings`]: sound, overtime and display preferences
//! - [`DisplayModel`]: what a timer view should draw for a snapshot

pub mod display;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
pub mod sync;
pub mod timer;

pub use display::{ClockFace, DisplayModel, DisplayTone};
pub use error::{
    ConfigError, CoreError, CountdownError, SequenceError, StoreError, SyncError, ValidationError,
};
pub use events::Event;
pub use notify::{
    Expiry, NotificationEvent, NotificationPolicy, Notifier, PolicyOptions, SoundPalette,
    SoundPlayer, ToneCue,
};
pub use session::{Flow, Intent, Session, SessionInputs, Update};
pub use storage::{
    data_dir, DisplayRouting, KvStore, KvStoreExt, MemoryStore, Plan, Preset, PresetBook,
    Settings, SqliteStore,
};
pub use sync::{LocalChannel, MirrorReplica, Snapshot, SyncBroadcaster, SyncMessage};
pub use timer::{
    CountdownSource, CountdownTick, ManualCountdown, Phase, SequenceState, Stage, StageRole,
    StageSequencer, TokioCountdown,
};

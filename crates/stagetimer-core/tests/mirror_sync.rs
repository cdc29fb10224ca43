//! Controller and mirrors sharing one in-process channel.

use std::sync::Arc;

use stagetimer_core::sync::SyncChannel;
use stagetimer_core::{
    DisplayModel, LocalChannel, ManualCountdown, MirrorReplica, Stage, StageSequencer,
    SyncBroadcaster, SyncMessage,
};
use tokio::sync::broadcast;

fn drain(rx: &mut broadcast::Receiver<SyncMessage>, mirror: &mut MirrorReplica) -> usize {
    let mut applied = 0;
    while let Ok(message) = rx.try_recv() {
        mirror.apply(&message);
        applied += 1;
    }
    applied
}

#[test]
fn mirror_tracks_controller_through_a_run() {
    // Room for every per-second update without lagging.
    let channel = LocalChannel::new(512);
    let mut rx = channel.subscribe();
    let countdown = ManualCountdown::new();
    let mut seq = StageSequencer::new(
        Box::new(countdown.clone()),
        SyncBroadcaster::new(Arc::new(channel.clone())),
    );
    let mut mirror = MirrorReplica::new();

    seq.setup(vec![Stage::new("Presentation", 120, 30), Stage::new("Q&A", 60, 10)])
        .unwrap();
    seq.start(None).unwrap();
    for remaining in (-3..=120).rev() {
        seq.on_countdown_tick(countdown.tick(remaining));
    }
    seq.advance(true);
    drain(&mut rx, &mut mirror);

    assert!(mirror.is_synced());
    assert_eq!(mirror.state(), &seq.snapshot());
    assert_eq!(mirror.state().remaining, 57);
    assert_eq!(DisplayModel::from_snapshot(mirror.state()).stage_label, "Q&A");
}

#[test]
fn late_mirror_catches_up_with_one_request() {
    let channel = LocalChannel::default();
    let countdown = ManualCountdown::new();
    let mut seq = StageSequencer::new(
        Box::new(countdown.clone()),
        SyncBroadcaster::new(Arc::new(channel.clone())),
    );
    seq.setup(vec![Stage::new("Presentation", 90, 30)]).unwrap();
    seq.start(None).unwrap();
    seq.on_countdown_tick(countdown.tick(75));

    // Attaches mid-run, after everything above was broadcast.
    let mut rx = channel.subscribe();
    let mut mirror = MirrorReplica::new();
    let request = mirror.attach().unwrap();
    assert!(mirror.attach().is_none());

    assert!(seq.handle_sync(&request));
    assert_eq!(drain(&mut rx, &mut mirror), 1);
    assert_eq!(mirror.state().remaining, 75);
    assert!(mirror.state().running);
}

#[test]
fn controller_ignores_state_sent_by_mirrors() {
    let channel = LocalChannel::default();
    let mut seq = StageSequencer::new(
        Box::new(ManualCountdown::new()),
        SyncBroadcaster::new(Arc::new(channel.clone())),
    );
    seq.setup(vec![Stage::new("Presentation", 90, 30)]).unwrap();

    let mut forged = seq.snapshot();
    forged.remaining = 1;
    assert!(!seq.handle_sync(&SyncMessage::FullSnapshot { snapshot: forged }));
    assert_eq!(seq.remaining_secs(), 90);
}

#[test]
fn publishing_without_mirrors_is_fine() {
    let channel = LocalChannel::default();
    assert_eq!(channel.subscriber_count(), 0);
    channel.publish(SyncMessage::SnapshotRequest).unwrap();
}

//! Property tests for overtime deduction and countdown monotonicity.

use proptest::prelude::*;
use stagetimer_core::{ManualCountdown, Stage, StageSequencer, SyncBroadcaster};

fn running(first: u64, second: u64) -> (StageSequencer, ManualCountdown) {
    let countdown = ManualCountdown::new();
    let mut seq = StageSequencer::new(Box::new(countdown.clone()), SyncBroadcaster::detached());
    seq.setup(vec![Stage::new("Presentation", first, 0), Stage::new("Q&A", second, 0)])
        .unwrap();
    seq.start(None).unwrap();
    (seq, countdown)
}

proptest! {
    #[test]
    fn next_stage_gets_duration_minus_overtime(
        first in 1u64..3600,
        second in 1u64..3600,
        remaining in -7200i64..3600,
    ) {
        let (mut seq, countdown) = running(first, second);
        seq.on_countdown_tick(countdown.tick(remaining));

        prop_assert!(seq.advance(true));

        let overtime = if remaining < 0 { remaining.unsigned_abs() } else { 0 };
        let expected = second.saturating_sub(overtime) as i64;
        prop_assert_eq!(seq.remaining_secs(), expected);
        prop_assert!(seq.remaining_secs() >= 0);
        prop_assert_eq!(countdown.armed_with(), Some(expected));
    }

    #[test]
    fn without_deduction_next_stage_gets_full_duration(
        second in 1u64..3600,
        remaining in -7200i64..0,
    ) {
        let (mut seq, countdown) = running(60, second);
        seq.on_countdown_tick(countdown.tick(remaining));

        prop_assert!(seq.advance(false));
        prop_assert_eq!(seq.remaining_secs(), second as i64);
    }

    #[test]
    fn remaining_follows_ticks_down_through_zero(duration in 1u64..600, overrun in 0i64..120) {
        let (mut seq, countdown) = running(duration, 60);
        let mut previous = seq.remaining_secs();
        for remaining in (-overrun..=duration as i64).rev() {
            seq.on_countdown_tick(countdown.tick(remaining));
            prop_assert!(seq.remaining_secs() <= previous);
            previous = seq.remaining_secs();
        }
        prop_assert_eq!(seq.remaining_secs(), -overrun);
        prop_assert!(seq.is_running());
    }
}

mod countdown;
mod sequencer;
mod stage;

pub use countdown::{CountdownSource, CountdownTick, ManualCountdown, TokioCountdown};
pub use sequencer::{Phase, SequenceState, StageSequencer};
pub use stage::{retain_timed, Stage, StageRole};

//! Single event queue for a controller.
//!
//! User intents, countdown ticks and mirror requests all arrive on channels
//! and are handled one at a time, so a tick is never applied while a command
//! is half done.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::{NotificationEvent, Notifier};
use crate::sync::SyncMessage;
use crate::timer::{CountdownTick, Stage, StageSequencer};

/// A command from the host's controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Setup(Vec<Stage>),
    Start,
    Stop,
    /// Start when stopped, stop when running.
    Toggle,
    Reset,
    Advance,
    SetSoundEnabled(bool),
    SetDeductOvertime(bool),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// What the host gets to see after each handled input.
pub struct Update<'a> {
    pub sequencer: &'a StageSequencer,
    pub events: Vec<Event>,
    pub notification: Option<NotificationEvent>,
    pub error: Option<CoreError>,
}

/// Receivers the run loop drains.
pub struct SessionInputs {
    pub intents: mpsc::UnboundedReceiver<Intent>,
    pub ticks: mpsc::UnboundedReceiver<CountdownTick>,
    pub sync: mpsc::UnboundedReceiver<SyncMessage>,
}

pub struct Session {
    sequencer: StageSequencer,
    notifier: Notifier,
    deduct_overtime: bool,
}

impl Session {
    pub fn new(sequencer: StageSequencer, notifier: Notifier) -> Self {
        Self {
            sequencer,
            notifier,
            deduct_overtime: true,
        }
    }

    pub fn with_deduct_overtime(mut self, deduct: bool) -> Self {
        self.deduct_overtime = deduct;
        self
    }

    pub fn sequencer(&self) -> &StageSequencer {
        &self.sequencer
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn deduct_overtime(&self) -> bool {
        self.deduct_overtime
    }

    /// Apply one intent.
    ///
    /// # Errors
    /// Returns the sequencer's rejection. The session stays usable.
    pub fn handle_intent(&mut self, intent: Intent) -> Result<Flow> {
        debug!(?intent, "intent");
        match intent {
            Intent::Setup(stages) => self.sequencer.setup(stages)?,
            Intent::Start => self.sequencer.start(None)?,
            Intent::Stop => self.sequencer.stop(),
            Intent::Toggle => {
                if self.sequencer.is_running() {
                    self.sequencer.stop();
                } else {
                    self.sequencer.start(None)?;
                }
            }
            Intent::Reset => self.sequencer.reset_current_stage(),
            Intent::Advance => {
                self.sequencer.advance(self.deduct_overtime);
            }
            Intent::SetSoundEnabled(enabled) => self.notifier.set_enabled(enabled),
            Intent::SetDeductOvertime(deduct) => self.deduct_overtime = deduct,
            Intent::Shutdown => {
                self.sequencer.stop();
                return Ok(Flow::Shutdown);
            }
        }
        Ok(Flow::Continue)
    }

    /// Apply a countdown tick and play whatever it calls for.
    pub fn handle_tick(&mut self, tick: CountdownTick) -> Option<NotificationEvent> {
        let event = self.sequencer.on_countdown_tick(tick)?;
        self.notifier.dispatch(event);
        Some(event)
    }

    pub fn handle_sync(&mut self, message: &SyncMessage) -> bool {
        self.sequencer.handle_sync(message)
    }

    /// Drive the session until a `Shutdown` intent arrives or every intent
    /// sender is dropped. `observe` is called after each handled input.
    pub async fn run<F>(mut self, mut inputs: SessionInputs, mut observe: F) -> Self
    where
        F: FnMut(Update<'_>),
    {
        info!("session started");
        loop {
            let mut notification = None;
            let mut error = None;
            tokio::select! {
                biased;
                intent = inputs.intents.recv() => {
                    let Some(intent) = intent else {
                        self.sequencer.stop();
                        break;
                    };
                    match self.handle_intent(intent) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Shutdown) => {
                            self.emit(&mut observe, None, None);
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "intent rejected");
                            error = Some(e);
                        }
                    }
                }
                Some(tick) = inputs.ticks.recv() => {
                    notification = self.handle_tick(tick);
                }
                Some(message) = inputs.sync.recv() => {
                    self.handle_sync(&message);
                }
            }
            self.emit(&mut observe, notification, error);
        }
        info!("session ended");
        self
    }

    fn emit<F>(
        &mut self,
        observe: &mut F,
        notification: Option<NotificationEvent>,
        error: Option<CoreError>,
    ) where
        F: FnMut(Update<'_>),
    {
        let events = self.sequencer.drain_events();
        observe(Update {
            sequencer: &self.sequencer,
            events,
            notification,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequenceError;
    use crate::notify::{Expiry, SilentPlayer};
    use crate::sync::SyncBroadcaster;
    use crate::timer::ManualCountdown;

    fn session() -> (Session, ManualCountdown) {
        let countdown = ManualCountdown::new();
        let sequencer =
            StageSequencer::new(Box::new(countdown.clone()), SyncBroadcaster::detached());
        (Session::new(sequencer, Notifier::new(Box::new(SilentPlayer))), countdown)
    }

    fn two_stages() -> Vec<Stage> {
        vec![Stage::new("Presentation", 5, 2), Stage::new("Q&A", 3, 1)]
    }

    #[test]
    fn toggle_starts_and_stops() {
        let (mut session, countdown) = session();
        session.handle_intent(Intent::Setup(two_stages())).unwrap();
        session.handle_intent(Intent::Toggle).unwrap();
        assert!(session.sequencer().is_running());
        assert_eq!(countdown.armed_with(), Some(5));
        session.handle_intent(Intent::Toggle).unwrap();
        assert!(!session.sequencer().is_running());
        assert_eq!(countdown.armed_with(), None);
    }

    #[test]
    fn advance_uses_session_deduction_setting() {
        let (mut session, countdown) = session();
        session.handle_intent(Intent::Setup(two_stages())).unwrap();
        session.handle_intent(Intent::Start).unwrap();
        session.handle_tick(countdown.tick(-2));
        session.handle_intent(Intent::SetDeductOvertime(false)).unwrap();
        session.handle_intent(Intent::Advance).unwrap();
        assert_eq!(session.sequencer().remaining_secs(), 3);
    }

    #[test]
    fn empty_setup_is_reported() {
        let (mut session, _countdown) = session();
        let err = session.handle_intent(Intent::Setup(Vec::new())).unwrap_err();
        assert!(matches!(err, CoreError::Sequence(SequenceError::EmptyConfiguration)));
    }

    #[test]
    fn final_expiry_reaches_notifier() {
        let (mut session, countdown) = session();
        session
            .handle_intent(Intent::Setup(vec![Stage::new("Talk", 2, 0)]))
            .unwrap();
        session.handle_intent(Intent::Start).unwrap();
        assert_eq!(session.handle_tick(countdown.tick(1)), None);
        assert_eq!(
            session.handle_tick(countdown.tick(0)),
            Some(NotificationEvent::Expired(Expiry::SequenceFinished))
        );
    }

    #[tokio::test]
    async fn run_loop_processes_inputs_until_shutdown() {
        let (session, countdown) = session();
        let (intent_tx, intents) = mpsc::unbounded_channel();
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let (_sync_tx, sync) = mpsc::unbounded_channel();
        let (seen_tx, mut seen) = mpsc::unbounded_channel();

        intent_tx.send(Intent::Setup(two_stages())).unwrap();
        intent_tx.send(Intent::Start).unwrap();

        let inputs = SessionInputs {
            intents,
            ticks,
            sync,
        };
        let handle = tokio::spawn(session.run(inputs, move |update| {
            let _ = seen_tx.send((update.sequencer.remaining_secs(), update.events.len()));
        }));

        assert_eq!(seen.recv().await, Some((5, 1)));
        assert_eq!(seen.recv().await, Some((5, 1)));
        assert_eq!(countdown.armed_with(), Some(5));

        tick_tx.send(countdown.tick(4)).unwrap();
        assert_eq!(seen.recv().await, Some((4, 0)));

        intent_tx.send(Intent::Shutdown).unwrap();
        let session = handle.await.unwrap();
        assert!(!session.sequencer().is_running());
        assert_eq!(session.sequencer().remaining_secs(), 4);
    }

    #[tokio::test]
    async fn run_loop_ends_when_intents_close() {
        let (session, _countdown) = session();
        let (intent_tx, intents) = mpsc::unbounded_channel::<Intent>();
        let (_tick_tx, ticks) = mpsc::unbounded_channel();
        let (_sync_tx, sync) = mpsc::unbounded_channel();
        drop(intent_tx);

        let mut updates = 0;
        session
            .run(SessionInputs { intents, ticks, sync }, |_| updates += 1)
            .await;
        assert_eq!(updates, 0);
    }
}

//! Notification sounds: when to play them and dispatch to a player.

mod policy;
mod sound;

pub use policy::{classify, Expiry, NotificationEvent, NotificationPolicy, PolicyOptions};
pub use sound::{SilentPlayer, SoundPalette, SoundPlayer, ToneCue};

use tracing::{debug, warn};

/// Routes policy decisions to the host's sound player.
pub struct Notifier {
    enabled: bool,
    palette: SoundPalette,
    player: Box<dyn SoundPlayer>,
}

impl Notifier {
    pub fn new(player: Box<dyn SoundPlayer>) -> Self {
        Self {
            enabled: true,
            palette: SoundPalette::default(),
            player,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentPlayer))
    }

    pub fn with_palette(mut self, palette: SoundPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_palette(&mut self, palette: SoundPalette) {
        self.palette = palette;
    }

    pub fn palette(&self) -> SoundPalette {
        self.palette
    }

    /// Play the cue for `event`. Returns whether anything was sent to the player.
    ///
    /// Player failures are logged and swallowed.
    pub fn dispatch(&mut self, event: NotificationEvent) -> bool {
        if !self.enabled {
            debug!(?event, "sound disabled, notification not played");
            return false;
        }
        let cue = ToneCue::for_event(event, self.palette);
        match self.player.play(cue, self.palette) {
            Ok(()) => true,
            Err(e) => {
                warn!(?event, error = %e, "failed to play notification sound");
                false
            }
        }
    }
}

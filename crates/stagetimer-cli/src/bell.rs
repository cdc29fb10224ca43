//! Notification sounds via the terminal bell.

use std::io::Write;

use stagetimer_core::{SoundPalette, SoundPlayer, ToneCue};

/// Rings the terminal bell once per pulse. Pitch and pulse length cannot be
/// expressed through a bell, so only the pulse count carries over.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&mut self, cue: ToneCue, _palette: SoundPalette) -> Result<(), String> {
        let bells = "\x07".repeat(usize::from(cue.pulses));
        let mut err = std::io::stderr().lock();
        err.write_all(bells.as_bytes())
            .and_then(|()| err.flush())
            .map_err(|e| e.to_string())
    }
}

use serde::{Deserialize, Serialize};

use super::policy::{Expiry, NotificationEvent};

/// User-selectable family of notification tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundPalette {
    #[default]
    Standard,
    Electronic,
    Bell,
    Chime,
}

impl SoundPalette {
    pub const ALL: [SoundPalette; 4] = [
        SoundPalette::Standard,
        SoundPalette::Electronic,
        SoundPalette::Bell,
        SoundPalette::Chime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundPalette::Standard => "standard",
            SoundPalette::Electronic => "electronic",
            SoundPalette::Bell => "bell",
            SoundPalette::Chime => "chime",
        }
    }
}

impl std::str::FromStr for SoundPalette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundPalette::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sound palette: {s}"))
    }
}

impl std::fmt::Display for SoundPalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a player should sound for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneCue {
    pub pulses: u8,
    pub frequency_hz: u32,
    pub pulse_ms: u32,
}

impl ToneCue {
    /// Pick the cue for `event` in `palette`.
    pub fn for_event(event: NotificationEvent, palette: SoundPalette) -> Self {
        let pulses = match event {
            NotificationEvent::Warning => 1,
            NotificationEvent::Expired(Expiry::StageFinished) => 2,
            NotificationEvent::Expired(Expiry::SequenceFinished) => 3,
        };
        let (base_hz, pulse_ms) = match palette {
            SoundPalette::Standard => (880, 100),
            SoundPalette::Electronic => (1320, 80),
            SoundPalette::Bell => (660, 400),
            SoundPalette::Chime => (1046, 300),
        };
        // Expiry cues sit an octave above the warning.
        let frequency_hz = if event.is_expiry() { base_hz * 2 } else { base_hz };
        let pulse_ms = match event {
            NotificationEvent::Warning => pulse_ms + pulse_ms / 2,
            NotificationEvent::Expired(_) => pulse_ms,
        };
        Self {
            pulses,
            frequency_hz,
            pulse_ms,
        }
    }
}

/// Tone synthesizer owned by the host.
pub trait SoundPlayer: Send {
    fn play(&mut self, cue: ToneCue, palette: SoundPalette) -> Result<(), String>;
}

/// Player that discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&mut self, _cue: ToneCue, _palette: SoundPalette) -> Result<(), String> {
        Ok(())
    }
}

mod plan;
mod presets;
mod settings;
mod store;

pub use plan::{Plan, PlanStage};
pub use presets::{default_presets, Preset, PresetBook};
pub use settings::{DisplayRouting, Settings};
pub use store::{KvStore, KvStoreExt, MemoryStore, SqliteStore, STORE_FILE};

use std::path::PathBuf;

/// Store keys used by the core's collaborators.
pub mod keys {
    pub const PRESETS: &str = "presets";
    pub const ENABLE_SOUND: &str = "enableSound";
    pub const SOUND_TYPE: &str = "selectedSoundType";
    pub const DEDUCT_OVERTIME: &str = "deductOvertime";
    pub const DISPLAY: &str = "display";
}

/// Returns `~/.config/stagetimer[-dev]/` based on STAGETIMER_ENV.
///
/// Set STAGETIMER_ENV=dev to use the development data directory, or
/// STAGETIMER_HOME to use an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("STAGETIMER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STAGETIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("stagetimer-dev")
            } else {
                base_dir.join("stagetimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

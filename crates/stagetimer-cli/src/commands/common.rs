use stagetimer_core::{KvStore, MemoryStore, SqliteStore};
use tracing::warn;

/// Parse `MM:SS` or a bare number of minutes into seconds.
pub fn parse_clock(value: &str) -> Result<u64, String> {
    let value = value.trim();
    match value.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes
                .parse()
                .map_err(|_| format!("invalid minutes in '{value}'"))?;
            let seconds: u64 = seconds
                .parse()
                .map_err(|_| format!("invalid seconds in '{value}'"))?;
            if seconds > 59 {
                return Err(format!("seconds must be between 0 and 59, got {seconds}"));
            }
            to_seconds(value, minutes, seconds)
        }
        None => {
            let minutes: u64 = value
                .parse()
                .map_err(|_| format!("expected MM:SS or minutes, got '{value}'"))?;
            to_seconds(value, minutes, 0)
        }
    }
}

fn to_seconds(value: &str, minutes: u64, seconds: u64) -> Result<u64, String> {
    minutes
        .checked_mul(60)
        .and_then(|s| s.checked_add(seconds))
        .ok_or_else(|| format!("'{value}' is too large"))
}

/// Format seconds as `MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Open the persistent store, or fall back to an in-memory one so a run can
/// go ahead without saved presets and settings.
pub fn open_store_or_memory() -> Box<dyn KvStore> {
    match SqliteStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "settings store unavailable, using defaults");
            Box::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_forms() {
        assert_eq!(parse_clock("5:00"), Ok(300));
        assert_eq!(parse_clock("0:45"), Ok(45));
        assert_eq!(parse_clock("12"), Ok(720));
        assert!(parse_clock("1:75").is_err());
        assert!(parse_clock("abc").is_err());
        assert!(parse_clock("307445734561825861").is_err());
        assert!(parse_clock("307445734561825861:00").is_err());
    }

    #[test]
    fn formats_clock() {
        assert_eq!(format_clock(930), "15:30");
        assert_eq!(format_clock(0), "00:00");
    }
}

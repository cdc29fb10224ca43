//! User settings with dotted-key access.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::keys;
use super::store::{KvStore, KvStoreExt};
use crate::error::{ConfigError, Result, StoreError};
use crate::notify::SoundPalette;

/// Where the mirror display goes and how it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRouting {
    #[serde(default)]
    pub mirror_enabled: bool,
    /// Preferred monitor, zero-based. 1 is the second monitor.
    #[serde(default = "default_monitor_index")]
    pub monitor_index: usize,
    #[serde(default = "default_true")]
    pub fullscreen: bool,
    #[serde(default = "default_true")]
    pub always_on_top: bool,
}

fn default_monitor_index() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Default for DisplayRouting {
    fn default() -> Self {
        Self {
            mirror_enabled: false,
            monitor_index: default_monitor_index(),
            fullscreen: true,
            always_on_top: true,
        }
    }
}

impl DisplayRouting {
    /// Monitor to use given how many are attached: the preferred one if it
    /// exists, otherwise the first.
    pub fn resolve_monitor(&self, monitor_count: usize) -> Option<usize> {
        match monitor_count {
            0 => None,
            n if self.monitor_index < n => Some(self.monitor_index),
            _ => Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "enableSound", default = "default_true")]
    pub enable_sound: bool,
    #[serde(rename = "selectedSoundType", default)]
    pub sound_palette: SoundPalette,
    #[serde(rename = "deductOvertime", default = "default_true")]
    pub deduct_overtime: bool,
    #[serde(default)]
    pub display: DisplayRouting,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_sound: true,
            sound_palette: SoundPalette::default(),
            deduct_overtime: true,
            display: DisplayRouting::default(),
        }
    }
}

fn read<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get_as::<T>(key) {
        Ok(value) => Ok(value),
        Err(StoreError::Json(e)) => {
            warn!(key, error = %e, "ignoring malformed stored setting");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

impl Settings {
    const KEYS: [&'static str; 4] = [
        keys::ENABLE_SOUND,
        keys::SOUND_TYPE,
        keys::DEDUCT_OVERTIME,
        keys::DISPLAY,
    ];

    fn get_json_value_by_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if part.is_empty() {
                return Err(unknown());
            }
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                Value::Bool(_) => Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                Value::Number(_) => Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                        .into(),
                ),
                Value::Object(_) | Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Read settings from the store. Missing or unreadable keys fall back to
    /// their defaults.
    ///
    /// # Errors
    /// Returns an error only if the store itself cannot be read.
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enable_sound: read(store, keys::ENABLE_SOUND)?.unwrap_or(defaults.enable_sound),
            sound_palette: read(store, keys::SOUND_TYPE)?.unwrap_or(defaults.sound_palette),
            deduct_overtime: read(store, keys::DEDUCT_OVERTIME)?
                .unwrap_or(defaults.deduct_overtime),
            display: read(store, keys::DISPLAY)?.unwrap_or(defaults.display),
        })
    }

    /// Write every setting and flush.
    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        let json = serde_json::to_value(self).map_err(StoreError::from)?;
        for key in Self::KEYS {
            if let Some(value) = json.get(key) {
                store.set(key, value.clone())?;
            }
        }
        if let Err(e) = store.save() {
            warn!(error = %e, "failed to persist settings");
            return Err(e.into());
        }
        Ok(())
    }

    /// Get a value as a string by dot-separated key, e.g. `display.fullscreen`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Apply a change in memory without persisting it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a value by key and persist.
    ///
    /// # Errors
    /// Unknown keys and unparseable values leave the settings unchanged. A
    /// failed save is returned after the change has been applied.
    pub fn set(&mut self, key: &str, value: &str, store: &mut dyn KvStore) -> Result<()> {
        self.apply(key, value)?;
        self.save(store)
    }

    /// Every leaf setting as `(dotted key, value)`, in key order.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
            match value {
                Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;
    use serde_json::json;

    struct FailingStore(MemoryStore);

    impl KvStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.0.get(key)
        }
        fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
            self.0.set(key, value)
        }
        fn save(&mut self) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let settings = Settings::default();
        assert_eq!(settings.get("enableSound").as_deref(), Some("true"));
        assert_eq!(settings.get("selectedSoundType").as_deref(), Some("standard"));
        assert_eq!(settings.get("display.monitorIndex").as_deref(), Some("1"));
        assert!(settings.get("display.missing").is_none());
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Settings::default()).unwrap();
        let result = Settings::set_json_value_by_path(&mut json, "display.nope", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
        let result = Settings::set_json_value_by_path(&mut json, "", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_type_checks_values() {
        let mut settings = Settings::default();
        settings.apply("display.fullscreen", "false").unwrap();
        assert!(!settings.display.fullscreen);
        settings.apply("selectedSoundType", "bell").unwrap();
        assert_eq!(settings.sound_palette, SoundPalette::Bell);

        let before = settings.clone();
        assert!(settings.apply("enableSound", "loud").is_err());
        assert!(settings.apply("selectedSoundType", "kazoo").is_err());
        assert!(settings.apply("display.monitorIndex", "-1").is_err());
        assert_eq!(settings, before);
    }

    #[test]
    fn set_persists_and_load_reads_back() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::load(&store).unwrap();
        assert_eq!(settings, Settings::default());

        settings.set("deductOvertime", "false", &mut store).unwrap();
        settings.set("display.mirrorEnabled", "true", &mut store).unwrap();
        assert_eq!(store.saves(), 2);

        let loaded = Settings::load(&store).unwrap();
        assert!(!loaded.deduct_overtime);
        assert!(loaded.display.mirror_enabled);
    }

    #[test]
    fn failed_save_keeps_the_change() {
        let mut store = FailingStore(MemoryStore::new());
        let mut settings = Settings::default();
        let err = settings.set("enableSound", "false", &mut store).unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert!(!settings.enable_sound);
        assert_eq!(settings.get("enableSound").as_deref(), Some("false"));
    }

    #[test]
    fn malformed_stored_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set("enableSound", json!("sometimes")).unwrap();
        store.set("selectedSoundType", json!("chime")).unwrap();
        let loaded = Settings::load(&store).unwrap();
        assert!(loaded.enable_sound);
        assert_eq!(loaded.sound_palette, SoundPalette::Chime);
    }

    #[test]
    fn monitor_falls_back_to_first() {
        let routing = DisplayRouting::default();
        assert_eq!(routing.resolve_monitor(2), Some(1));
        assert_eq!(routing.resolve_monitor(1), Some(0));
        assert_eq!(routing.resolve_monitor(0), None);
    }

    #[test]
    fn entries_flatten_nested_keys() {
        let entries = Settings::default().entries();
        assert!(entries.contains(&("display.alwaysOnTop".to_string(), "true".to_string())));
        assert!(entries.contains(&("selectedSoundType".to_string(), "standard".to_string())));
        assert_eq!(entries.len(), 7);
    }
}

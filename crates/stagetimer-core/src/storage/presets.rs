//! Saved presentation/Q&A configurations.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::keys;
use super::store::{KvStore, KvStoreExt};
use crate::error::{CoreError, Result, ValidationError};
use crate::timer::{retain_timed, Stage, StageRole};

pub const PRESENTATION_STAGE: &str = "Presentation";
pub const QA_STAGE: &str = "Q&A";

/// A named two-stage configuration.
///
/// Field names on disk match the settings file written by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(rename = "pMin")]
    pub presentation_min: u64,
    #[serde(rename = "pSec")]
    pub presentation_sec: u64,
    #[serde(rename = "qMin")]
    pub qa_min: u64,
    #[serde(rename = "qSec")]
    pub qa_sec: u64,
    #[serde(rename = "pWarn")]
    pub presentation_warning: u64,
    #[serde(rename = "qWarn")]
    pub qa_warning: u64,
}

impl Preset {
    /// A preset with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            presentation_min: 0,
            presentation_sec: 0,
            qa_min: 0,
            qa_sec: 0,
            presentation_warning: 0,
            qa_warning: 0,
        }
    }

    pub fn with_presentation(mut self, min: u64, sec: u64, warning: u64) -> Self {
        self.presentation_min = min;
        self.presentation_sec = sec;
        self.presentation_warning = warning;
        self
    }

    pub fn with_qa(mut self, min: u64, sec: u64, warning: u64) -> Self {
        self.qa_min = min;
        self.qa_sec = sec;
        self.qa_warning = warning;
        self
    }

    pub fn presentation_secs(&self) -> u64 {
        self.presentation_min.saturating_mul(60).saturating_add(self.presentation_sec)
    }

    pub fn qa_secs(&self) -> u64 {
        self.qa_min.saturating_mul(60).saturating_add(self.qa_sec)
    }

    /// Presentation then Q&A, skipping whichever has no time.
    pub fn stages(&self) -> Vec<Stage> {
        retain_timed([
            Stage::new(PRESENTATION_STAGE, self.presentation_secs(), self.presentation_warning)
                .with_role(StageRole::Presentation),
            Stage::new(QA_STAGE, self.qa_secs(), self.qa_warning).with_role(StageRole::QA),
        ])
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(invalid("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        for (field, value) in [("pSec", self.presentation_sec), ("qSec", self.qa_sec)] {
            if value > 59 {
                return Err(invalid(field, &format!("{value} is not between 0 and 59")));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn builtin(id: &str, name: &str, p_min: u64, q_min: u64, p_warn: u64, q_warn: u64) -> Preset {
    Preset {
        id: id.to_string(),
        name: name.to_string(),
        presentation_min: p_min,
        presentation_sec: 0,
        qa_min: q_min,
        qa_sec: 0,
        presentation_warning: p_warn,
        qa_warning: q_warn,
    }
}

/// Presets seeded into an empty store.
pub fn default_presets() -> Vec<Preset> {
    vec![
        builtin("default", "Standard (5m/3m)", 5, 3, 60, 30),
        builtin("short", "Short (3m/2m)", 3, 2, 30, 30),
        builtin("long", "Long (10m/5m)", 10, 5, 120, 60),
        builtin("lt", "Lightning talk (5m/no Q&A)", 5, 0, 60, 0),
    ]
}

/// The preset collection and its persistence.
///
/// Every mutation is applied in memory first. If persisting it fails the
/// change stays in effect and the failure is returned for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetBook {
    presets: Vec<Preset>,
}

impl PresetBook {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    /// Read presets from the store, seeding the built-ins when none are saved.
    ///
    /// # Errors
    /// Returns an error if the stored value cannot be read or decoded, or if
    /// seeding fails to save.
    pub fn load(store: &mut dyn KvStore) -> Result<Self> {
        match store.get_as::<Vec<Preset>>(keys::PRESETS)? {
            Some(presets) => {
                debug!(count = presets.len(), "presets loaded");
                Ok(Self { presets })
            }
            None => {
                let book = Self::new(default_presets());
                book.persist(store)?;
                debug!("seeded built-in presets");
                Ok(book)
            }
        }
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn find(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Replace the preset with the same id, or append it.
    ///
    /// # Errors
    /// Invalid presets are rejected without change. Persistence failures are
    /// returned after the change has been applied.
    pub fn upsert(&mut self, preset: Preset, store: &mut dyn KvStore) -> Result<()> {
        preset.validate()?;
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
        self.persist(store)
    }

    /// Remove a preset by id, returning it.
    pub fn remove(&mut self, id: &str, store: &mut dyn KvStore) -> Result<Preset> {
        let position = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ValidationError::NotFound {
                collection: "preset".to_string(),
                id: id.to_string(),
            })?;
        let removed = self.presets.remove(position);
        self.persist(store)?;
        Ok(removed)
    }

    fn persist(&self, store: &mut dyn KvStore) -> Result<()> {
        let result = store
            .set_as(keys::PRESETS, &self.presets)
            .and_then(|()| store.save());
        if let Err(e) = &result {
            warn!(error = %e, "failed to persist presets");
        }
        result.map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::MemoryStore;
    use serde_json::Value;

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
    fn serializes_with_short_field_names() {
        let json = serde_json::to_value(&default_presets()[0]).unwrap();
        assert_eq!(json["pMin"], 5);
        assert_eq!(json["qWarn"], 30);
        assert_eq!(json["id"], "default");
    }

    #[test]
    fn stages_skip_empty_qa() {
        let lt = &default_presets()[3];
        let stages = lt.stages();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].duration_secs, 300);
        assert_eq!(stages[0].role, StageRole::Presentation);

        let standard = default_presets()[0].stages();
        assert_eq!(standard[1].name, QA_STAGE);
        assert_eq!(standard[1].warning_threshold_secs, 30);
    }

    #[test]
    fn validation_rejects_bad_seconds_and_names() {
        let preset = Preset::new("Talk").with_presentation(1, 60, 0);
        assert!(preset.validate().is_err());
        assert!(Preset::new("  ").validate().is_err());
        assert!(Preset::new("ok").with_qa(2, 59, 10).validate().is_ok());
    }

    #[test]
    fn load_seeds_defaults_once() {
        let mut store = MemoryStore::new();
        let book = PresetBook::load(&mut store).unwrap();
        assert_eq!(book.presets().len(), 4);
        assert_eq!(store.saves(), 1);

        let again = PresetBook::load(&mut store).unwrap();
        assert_eq!(again, book);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn upsert_replaces_by_id_and_appends_new() {
        let mut store = MemoryStore::new();
        let mut book = PresetBook::load(&mut store).unwrap();

        let mut edited = book.find("short").unwrap().clone();
        edited.qa_min = 4;
        book.upsert(edited, &mut store).unwrap();
        assert_eq!(book.find("short").unwrap().qa_min, 4);
        assert_eq!(book.presets().len(), 4);

        book.upsert(Preset::new("Keynote").with_presentation(20, 0, 300), &mut store)
            .unwrap();
        assert_eq!(book.presets().len(), 5);

        let reloaded = PresetBook::load(&mut store).unwrap();
        assert_eq!(reloaded, book);
    }

    #[test]
    fn invalid_upsert_leaves_book_untouched() {
        let mut store = MemoryStore::new();
        let mut book = PresetBook::load(&mut store).unwrap();
        let before = book.clone();
        let err = book
            .upsert(Preset::new("").with_presentation(1, 0, 0), &mut store)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(book, before);
    }

    #[test]
    fn remove_unknown_id_is_not_found() {
        let mut store = MemoryStore::new();
        let mut book = PresetBook::load(&mut store).unwrap();
        let err = book.remove("nope", &mut store).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NotFound { .. })
        ));
        assert_eq!(book.remove("lt", &mut store).unwrap().id, "lt");
        assert!(book.find("lt").is_none());
    }

    #[test]
    fn failed_save_keeps_the_change() {
        let mut store = FailingStore(MemoryStore::new());
        let mut book = PresetBook::new(default_presets());
        let err = book.remove("long", &mut store).unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert!(book.find("long").is_none());
    }
}

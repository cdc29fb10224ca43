use serde::{Deserialize, Serialize};

/// What a stage is for. Drives role-specific notification options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageRole {
    Presentation,
    #[serde(rename = "qa")]
    QA,
    #[default]
    Other,
}

impl StageRole {
    /// Guess a role from a stage name.
    ///
    /// Only for stage data written before stages carried an explicit role.
    pub fn infer(name: &str) -> Self {
        let lower = name.to_lowercase();
        if name.contains("質疑")
            || name.contains("Q&A")
            || name.split_whitespace().any(|w| w == "QA")
            || lower.contains("question")
        {
            StageRole::QA
        } else if name.contains("発表")
            || lower.contains("presentation")
            || lower.contains("talk")
        {
            StageRole::Presentation
        } else {
            StageRole::Other
        }
    }
}

/// One timed phase of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Allotted time in seconds.
    pub duration_secs: u64,
    /// Remaining-seconds value at which the warning fires. 0 disables it.
    #[serde(default)]
    pub warning_threshold_secs: u64,
    #[serde(default)]
    pub role: StageRole,
}

impl Stage {
    pub fn new(name: impl Into<String>, duration_secs: u64, warning_threshold_secs: u64) -> Self {
        let name = name.into();
        let role = StageRole::infer(&name);
        Self {
            name,
            duration_secs,
            warning_threshold_secs,
            role,
        }
    }

    pub fn with_role(mut self, role: StageRole) -> Self {
        self.role = role;
        self
    }

    /// Duration as a signed value, saturating at `i64::MAX`.
    pub fn duration_signed(&self) -> i64 {
        i64::try_from(self.duration_secs).unwrap_or(i64::MAX)
    }

    pub fn warning_threshold_signed(&self) -> i64 {
        i64::try_from(self.warning_threshold_secs).unwrap_or(i64::MAX)
    }

    pub fn warns(&self) -> bool {
        self.warning_threshold_secs > 0
    }
}

/// Keep only stages with a strictly positive duration, preserving order.
pub fn retain_timed(stages: impl IntoIterator<Item = Stage>) -> Vec<Stage> {
    stages.into_iter().filter(|s| s.duration_secs > 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_roles_from_legacy_names() {
        assert_eq!(StageRole::infer("質疑応答"), StageRole::QA);
        assert_eq!(StageRole::infer("Q&A"), StageRole::QA);
        assert_eq!(StageRole::infer("Panel QA"), StageRole::QA);
        assert_eq!(StageRole::infer("Questions"), StageRole::QA);
        assert_eq!(StageRole::infer("発表"), StageRole::Presentation);
        assert_eq!(StageRole::infer("Presentation"), StageRole::Presentation);
        assert_eq!(StageRole::infer("Setup"), StageRole::Other);
    }

    #[test]
    fn retain_timed_drops_zero_durations() {
        let stages = retain_timed(vec![
            Stage::new("Presentation", 300, 60),
            Stage::new("Q&A", 0, 30),
        ]);
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name, "Presentation");
    }

    #[test]
    fn explicit_role_overrides_inference() {
        let stage = Stage::new("Questions", 60, 0).with_role(StageRole::Other);
        assert_eq!(stage.role, StageRole::Other);
        assert!(!stage.warns());
    }

    #[test]
    fn role_defaults_when_missing_from_json() {
        let stage: Stage =
            serde_json::from_str(r#"{"name":"Intro","duration_secs":30}"#).unwrap();
        assert_eq!(stage.role, StageRole::Other);
        assert_eq!(stage.warning_threshold_secs, 0);
    }
}

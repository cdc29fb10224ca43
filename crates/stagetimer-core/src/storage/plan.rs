//! TOML plan files describing sequences of any length.
//!
//! ```toml
//! [[stage]]
//! name = "Keynote"
//! minutes = 20
//! warning = 300
//!
//! [[stage]]
//! name = "Panel"
//! minutes = 15
//! seconds = 30
//! role = "qa"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, ValidationError};
use crate::timer::{retain_timed, Stage, StageRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStage {
    pub name: String,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    /// Warning threshold in seconds.
    #[serde(default)]
    pub warning: u64,
    /// Inferred from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<StageRole>,
}

impl PlanStage {
    pub fn to_stage(&self) -> Stage {
        let duration = self.minutes.saturating_mul(60).saturating_add(self.seconds);
        let stage = Stage::new(self.name.clone(), duration, self.warning);
        match self.role {
            Some(role) => stage.with_role(role),
            None => stage,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "stage", default)]
    pub stages: Vec<PlanStage>,
}

impl Plan {
    /// Parse and validate plan text.
    pub fn parse(content: &str) -> Result<Self> {
        let plan: Plan = toml::from_str(content).map_err(ConfigError::from)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stages.is_empty() {
            return Err(ValidationError::EmptyCollection("plan has no [[stage]] entries".into()));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.name.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("stage[{i}].name"),
                    message: "must not be empty".into(),
                });
            }
            if stage.seconds > 59 {
                return Err(ValidationError::InvalidValue {
                    field: format!("stage[{i}].seconds"),
                    message: format!("{} is not between 0 and 59", stage.seconds),
                });
            }
        }
        Ok(())
    }

    /// Stages with time, in file order.
    pub fn stages(&self) -> Vec<Stage> {
        retain_timed(self.stages.iter().map(PlanStage::to_stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    const PLAN: &str = r#"
[[stage]]
name = "Opening"
minutes = 2

[[stage]]
name = "Keynote"
minutes = 20
warning = 300

[[stage]]
name = "Break"

[[stage]]
name = "Panel"
minutes = 15
seconds = 30
warning = 60
role = "qa"
"#;

    #[test]
    fn parses_stages_and_drops_untimed() {
        let plan = Plan::parse(PLAN).unwrap();
        assert_eq!(plan.stages.len(), 4);
        let stages = plan.stages();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[1].duration_secs, 1200);
        assert_eq!(stages[1].warning_threshold_secs, 300);
        assert_eq!(stages[2].duration_secs, 930);
        assert_eq!(stages[2].role, StageRole::QA);
        assert_eq!(stages[0].role, StageRole::Other);
    }

    #[test]
    fn rejects_empty_and_malformed_plans() {
        assert!(matches!(
            Plan::parse(""),
            Err(CoreError::Validation(ValidationError::EmptyCollection(_)))
        ));
        assert!(matches!(
            Plan::parse("[[stage]]\nname = \"x\"\nseconds = 75\n"),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            Plan::parse("[[stage]]\nminutes = \"ten\""),
            Err(CoreError::Config(ConfigError::ParseFailed(_)))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Plan::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::LoadFailed { .. })));
    }
}

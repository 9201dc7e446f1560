//! Pipeline stages.
//!
//! A stage is both a step of the release pipeline and the run-condition a
//! manifest or script is eligible to execute in.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One of the five ordered pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    PreBuild,
    Build,
    PreDeploy,
    Deploy,
    PostDeploy,
}

/// Error for a stage name that does not match any pipeline phase.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid command `{name}`; expected one of: pre-build, build, pre-deploy, deploy, post-deploy")]
pub struct StageError {
    pub name: String,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::PreBuild,
        Stage::Build,
        Stage::PreDeploy,
        Stage::Deploy,
        Stage::PostDeploy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreBuild => "pre-build",
            Stage::Build => "build",
            Stage::PreDeploy => "pre-deploy",
            Stage::Deploy => "deploy",
            Stage::PostDeploy => "post-deploy",
        }
    }

    /// Name of the package-local script run during this stage, if the stage
    /// runs scripts at all.
    pub fn script_name(&self) -> Option<String> {
        match self {
            Stage::PreBuild | Stage::PreDeploy | Stage::PostDeploy => {
                Some(format!("{}.sh", self.as_str()))
            }
            Stage::Build | Stage::Deploy => None,
        }
    }

    /// Stages to execute for a run: every stage, or only the requested one.
    pub fn selection(requested: Option<Stage>) -> Vec<Stage> {
        match requested {
            Some(stage) => vec![stage],
            None => Stage::ALL.to_vec(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| StageError {
                name: s.to_string(),
            })
    }
}

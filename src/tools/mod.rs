//! External tools the pipeline coordinates.
//!
//! Each collaborator sits behind a narrow synchronous trait so the
//! orchestration logic can run against fakes:
//! - [`ImageBuilder`]: build and push container images (`docker`)
//! - [`ClusterClient`]: apply manifests and wait for rollouts (`kubectl`)
//! - [`VersionControl`]: current revision and change detection (libgit2)
//! - [`ScriptRunner`]: package-local stage scripts

pub mod docker;
pub mod git;
pub mod kubectl;
pub mod script;

use std::path::Path;

use thiserror::Error;

pub use docker::DockerCli;
pub use git::GitRepository;
pub use kubectl::KubectlCli;
pub use script::ProcessScriptRunner;

/// Failure reported by an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool}: {message}")]
    Failed { tool: &'static str, message: String },

    #[error("invalid docker arguments `{args}`")]
    InvalidArgs { args: String },
}

impl ToolError {
    pub fn failed(tool: &'static str, err: impl std::fmt::Display) -> Self {
        ToolError::Failed {
            tool,
            message: err.to_string(),
        }
    }

    pub(crate) fn from_anyhow(tool: &'static str, err: anyhow::Error) -> Self {
        ToolError::Failed {
            tool,
            message: format!("{:#}", err),
        }
    }
}

/// Inputs of a single image build.
#[derive(Debug, Clone, Copy)]
pub struct BuildSpec<'a> {
    pub image: &'a str,
    pub dockerfile: &'a Path,
    pub context: &'a Path,
    /// Extra build arguments, shell-word encoded.
    pub args: &'a str,
}

/// Builds and publishes container images.
pub trait ImageBuilder {
    fn build(&self, spec: &BuildSpec<'_>) -> Result<(), ToolError>;

    fn push(&self, image: &str) -> Result<(), ToolError>;
}

/// Flags passed through to the cluster tool unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions<'a> {
    pub output: Option<&'a str>,
    pub dry_run: bool,
}

/// Applies rendered documents to a cluster.
pub trait ClusterClient {
    fn apply(&self, document: &str, opts: &ApplyOptions<'_>) -> Result<(), ToolError>;

    /// Block until the rollout of `kind/name` completes.
    fn rollout_status(&self, kind: &str, name: &str, namespace: Option<&str>) -> Result<(), ToolError>;
}

/// Read-only access to the repository history.
pub trait VersionControl {
    /// Abbreviated id of the current revision.
    fn revision(&self) -> Result<String, ToolError>;

    /// Whether anything under `path` changed between `since` and `HEAD`.
    fn has_changes(&self, since: &str, path: &Path) -> Result<bool, ToolError>;
}

/// Package-scoped values exported to stage scripts.
#[derive(Debug, Clone, Copy)]
pub struct ScriptEnv<'a> {
    pub package: &'a str,
    pub image_root: &'a str,
    pub cwd: &'a Path,
}

/// Runs package-local scripts, returning their captured stdout.
pub trait ScriptRunner {
    fn run(&self, script: &Path, env: &ScriptEnv<'_>) -> Result<String, ToolError>;
}

/// The set of collaborators a run is wired with.
pub struct Toolbox {
    pub images: Box<dyn ImageBuilder>,
    pub cluster: Box<dyn ClusterClient>,
    pub vcs: Box<dyn VersionControl>,
    pub scripts: Box<dyn ScriptRunner>,
}

impl Toolbox {
    /// Tools backed by the real binaries and the repository at `root`.
    pub fn system(root: &Path) -> Self {
        Toolbox {
            images: Box::new(DockerCli::new()),
            cluster: Box::new(KubectlCli::new()),
            vcs: Box::new(GitRepository::new(root)),
            scripts: Box::new(ProcessScriptRunner),
        }
    }
}

//! Run configuration.
//!
//! Command-line flags are folded into a single immutable [`RunConfig`] at
//! startup. Defaults for some flags may also come from the project file
//! `.monokube/config.toml` at the repository root:
//!
//! ```toml
//! [defaults]
//! image-root = "registry.example.com/team"
//! docker-args = "--build-arg VERSION={{ .Version }}"
//! docker-root = "."
//! cluster-name = "dev"
//! ```
//!
//! Flags given on the command line take precedence over the project file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::stage::Stage;

/// Project configuration file, relative to the run root.
pub const PROJECT_CONFIG: &str = ".monokube/config.toml";

/// Project-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub defaults: Defaults,
}

/// Defaults for run flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Defaults {
    pub image_root: Option<String>,
    pub docker_args: Option<String>,
    pub docker_root: Option<PathBuf>,
    pub cluster_name: Option<String>,
}

impl ProjectConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load the project configuration under `root`.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load_for_root(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_CONFIG);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Immutable configuration of a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory discovery and descriptors are resolved against.
    pub root: PathBuf,

    /// Default registry/root for image names.
    pub image_root: String,

    /// Run only this stage (None = all stages).
    pub stage: Option<Stage>,

    /// Suppress push/apply side effects.
    pub dry_run: bool,

    /// Default docker build-arg template.
    pub docker_args: String,

    /// Build context override for every package.
    pub docker_root: Option<PathBuf>,

    pub skip_packages: Vec<String>,
    pub only_packages: Vec<String>,

    /// Target cluster for cluster-scoped filtering.
    pub cluster_name: Option<String>,

    /// Explicit package root (`{path}/*`).
    pub path: Option<PathBuf>,

    /// Comparison revision for change detection.
    pub diff: Option<String>,

    /// Output format passed through to the cluster tool.
    pub output: Option<String>,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, image_root: impl Into<String>) -> Self {
        RunConfig {
            root: root.into(),
            image_root: image_root.into(),
            ..Default::default()
        }
    }

    /// Fill fields left unset on the command line from project defaults.
    pub fn with_project_defaults(mut self, defaults: &Defaults) -> Self {
        if self.image_root.is_empty() {
            if let Some(ref image_root) = defaults.image_root {
                self.image_root = image_root.clone();
            }
        }
        if self.docker_args.is_empty() {
            if let Some(ref docker_args) = defaults.docker_args {
                self.docker_args = docker_args.clone();
            }
        }
        if self.docker_root.is_none() {
            self.docker_root = defaults.docker_root.clone();
        }
        if self.cluster_name.is_none() {
            self.cluster_name = defaults.cluster_name.clone();
        }
        self
    }

    /// Reject configurations that cannot start a run.
    pub fn validate(&self) -> Result<()> {
        if self.image_root.trim().is_empty() {
            bail!("arg --image-root is required");
        }
        Ok(())
    }

    /// Stages this run executes, in pipeline order.
    pub fn stages(&self) -> Vec<Stage> {
        Stage::selection(self.stage)
    }

    /// Whether the skip/only filters exclude `name`. Skip always wins.
    pub fn excludes(&self, name: &str) -> bool {
        if self.skip_packages.iter().any(|n| n == name) {
            return true;
        }
        !self.only_packages.is_empty() && !self.only_packages.iter().any(|n| n == name)
    }

    /// Target cluster, ignoring an empty value.
    pub fn target_cluster(&self) -> Option<&str> {
        self.cluster_name.as_deref().filter(|c| !c.is_empty())
    }
}

/// Split a space-separated list of package names.
pub fn split_names(list: &str) -> Vec<String> {
    list.split_whitespace().map(str::to_string).collect()
}

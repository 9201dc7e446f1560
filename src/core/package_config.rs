//! Per-package deployment configuration.
//!
//! A package may carry two descriptors:
//! - `package.json` at the package root (generic project descriptor)
//! - `kube/monokube.yaml` (deployment-specific descriptor)
//!
//! The deployment-specific descriptor wins field by field. Empty fields
//! never override a value set by the generic descriptor.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Generic project descriptor file name.
pub const PACKAGE_DESCRIPTOR: &str = "package.json";

/// Directory holding manifest templates, scripts and the deploy descriptor.
pub const DEPLOY_DIR: &str = "kube";

/// Deployment-specific descriptor file name, inside [`DEPLOY_DIR`].
pub const DEPLOY_DESCRIPTOR: &str = "monokube.yaml";

/// Resource kind used when neither descriptor names one.
pub const DEFAULT_KIND: &str = "deployment";

/// Error loading a package descriptor that exists on disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Declarative, package-local configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageConfig {
    /// Kept as written: YAML `version: 1.10` is `"1.10"`, not a float.
    pub version: String,
    pub namespace: String,
    pub clusters: Vec<String>,
    pub watch: bool,
    pub kind: String,
    pub docker_args: String,
    pub image_root: String,
}

impl PackageConfig {
    /// Merge `other` over `self`.
    ///
    /// Precedence per field: a non-empty (or `true`) value in `other`
    /// replaces the value in `self`; an empty value in `other` leaves
    /// `self` untouched.
    pub fn merge(&mut self, other: PackageConfig) {
        if !other.version.is_empty() {
            self.version = other.version;
        }
        if !other.namespace.is_empty() {
            self.namespace = other.namespace;
        }
        if !other.clusters.is_empty() {
            self.clusters = other.clusters;
        }
        if other.watch {
            self.watch = true;
        }
        if !other.kind.is_empty() {
            self.kind = other.kind;
        }
        if !other.docker_args.is_empty() {
            self.docker_args = other.docker_args;
        }
        if !other.image_root.is_empty() {
            self.image_root = other.image_root;
        }
    }

    /// Fill in defaults for fields that must never be empty.
    pub fn with_defaults(mut self) -> Self {
        if self.kind.is_empty() {
            self.kind = DEFAULT_KIND.to_string();
        }
        self
    }

    /// Parse a generic descriptor (JSON).
    ///
    /// A numeric `version` is accepted and kept in its JSON spelling.
    pub fn from_json(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let parse_err = |e: serde_json::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut value: serde_json::Value = serde_json::from_str(contents).map_err(parse_err)?;
        if let Some(object) = value.as_object_mut() {
            match object.get("version") {
                Some(serde_json::Value::Number(n)) => {
                    let version = n.to_string();
                    object.insert("version".to_string(), serde_json::Value::String(version));
                }
                Some(serde_json::Value::Null) => {
                    object.remove("version");
                }
                _ => {}
            }
        }
        serde_json::from_value(value).map_err(parse_err)
    }

    /// Parse a deployment-specific descriptor (YAML).
    ///
    /// An empty document is an empty config.
    pub fn from_yaml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(PackageConfig::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Resolve the effective configuration of the package at `package_path`.
///
/// Missing descriptors are not an error; an existing descriptor that cannot
/// be read or parsed is.
pub fn resolve(package_path: &Path) -> Result<PackageConfig, ConfigError> {
    let mut config = PackageConfig::default();

    let generic = package_path.join(PACKAGE_DESCRIPTOR);
    if let Some(contents) = read_if_file(&generic)? {
        config.merge(PackageConfig::from_json(&generic, &contents)?);
    }

    let deploy = package_path.join(DEPLOY_DIR).join(DEPLOY_DESCRIPTOR);
    if let Some(contents) = read_if_file(&deploy)? {
        config.merge(PackageConfig::from_yaml(&deploy, &contents)?);
    }

    Ok(config.with_defaults())
}

fn read_if_file(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}

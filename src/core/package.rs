//! Package - the unit of deployment.
//!
//! A Package is assembled once per run from its directory, its resolved
//! configuration and the shared run state (revision, environment), and is
//! immutable afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::core::manifest::Manifest;
use crate::core::package_config::PackageConfig;
use crate::core::stage::Stage;

/// Build spec file whose presence marks a package as buildable.
pub const BUILD_SPEC: &str = "Dockerfile";

/// Snapshot of the process environment, shared by every package of a run.
pub type Environment = Arc<BTreeMap<String, String>>;

/// Compute `{image_root}/{name}:{version}[-{commit}]`.
pub fn image_name(image_root: &str, name: &str, version: &str, commit: &str) -> String {
    let commit = commit.trim();
    if commit.is_empty() {
        format!("{}/{}:{}", image_root, name, version)
    } else {
        format!("{}/{}:{}-{}", image_root, name, version, commit)
    }
}

/// Derive a package name from the final segment of its path.
pub fn package_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// A fully-populated deployable package.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    path: PathBuf,
    commit: String,
    config: PackageConfig,
    image_root: String,
    image: String,
    docker_args: String,
    build_required: bool,
    manifests: Vec<Manifest>,
    env: Environment,
}

impl Package {
    /// Start a package for the directory at `path`.
    ///
    /// Returns `None` when no name can be derived from the path.
    pub fn new(path: impl Into<PathBuf>, commit: impl Into<String>, env: Environment) -> Option<Self> {
        let path = path.into();
        let name = package_name(&path)?;
        let build_required = path.join(BUILD_SPEC).is_file();

        Some(Package {
            name,
            path,
            commit: commit.into().trim().to_string(),
            config: PackageConfig::default().with_defaults(),
            image_root: String::new(),
            image: String::new(),
            docker_args: String::new(),
            build_required,
            manifests: Vec::new(),
            env,
        })
    }

    /// Attach the resolved package configuration.
    pub fn with_config(mut self, config: PackageConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the rendered docker build arguments.
    pub fn with_docker_args(mut self, docker_args: impl Into<String>) -> Self {
        self.docker_args = docker_args.into();
        self
    }

    /// Set the image root and compute the image name from it.
    pub fn with_image_root(mut self, image_root: impl Into<String>) -> Self {
        self.image_root = image_root.into();
        self.image = image_name(&self.image_root, &self.name, &self.config.version, &self.commit);
        self
    }

    /// Attach the rendered manifests.
    pub fn with_manifests(mut self, manifests: Vec<Manifest>) -> Self {
        self.manifests = manifests;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Cluster allow-list; empty means unrestricted.
    pub fn clusters(&self) -> &[String] {
        &self.config.clusters
    }

    pub fn kind(&self) -> &str {
        &self.config.kind
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn image_root(&self) -> &str {
        &self.image_root
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn docker_args(&self) -> &str {
        &self.docker_args
    }

    pub fn build_required(&self) -> bool {
        self.build_required
    }

    /// Path of the build spec file.
    pub fn build_spec(&self) -> PathBuf {
        self.path.join(BUILD_SPEC)
    }

    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }

    /// Manifests eligible to run in `stage`, in discovery order.
    pub fn manifests_for(&self, stage: Stage) -> impl Iterator<Item = &Manifest> {
        self.manifests
            .iter()
            .filter(move |m| m.run_condition == stage)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Whether the package may be deployed to `cluster`.
    pub fn allows_cluster(&self, cluster: &str) -> bool {
        self.config.clusters.is_empty() || self.config.clusters.iter().any(|c| c == cluster)
    }

    /// Substitution variables available to templates.
    pub fn template_context(&self) -> Value {
        json!({
            "Name": self.name,
            "Path": self.path.display().to_string(),
            "Image": self.image,
            "ImageRoot": self.image_root,
            "Commit": self.commit,
            "Version": self.config.version,
            "Clusters": self.config.clusters,
            "Watch": self.config.watch,
            "Kind": self.config.kind,
            "Namespace": self.config.namespace,
            "DockerArgs": self.docker_args,
            "BuildDocker": self.build_required,
            "Env": self.env.as_ref(),
        })
    }
}

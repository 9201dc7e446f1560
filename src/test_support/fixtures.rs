//! Test fixtures for monorepo layouts.

use std::path::{Path, PathBuf};

use super::write_file;

/// Fixture for a single package directory.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    /// Directory name, which is also the package name.
    pub name: String,
    /// Files relative to the package directory.
    pub files: Vec<(String, String)>,
}

impl PackageFixture {
    pub fn new(name: impl Into<String>) -> Self {
        PackageFixture {
            name: name.into(),
            files: Vec::new(),
        }
    }

    /// A buildable service: descriptor, Dockerfile and a deployment template.
    pub fn service(name: impl Into<String>, version: &str) -> Self {
        let name = name.into();
        PackageFixture::new(name.clone())
            .with_file("package.json", &descriptors::package_json(&name, version))
            .with_file("Dockerfile", "FROM scratch\n")
            .with_file("kube/deployment.yaml", templates::DEPLOYMENT)
    }

    pub fn with_file(mut self, rel: &str, contents: &str) -> Self {
        self.files.push((rel.to_string(), contents.to_string()));
        self
    }

    /// Write the package under `base` and return its directory.
    pub fn write_to(&self, base: &Path) -> PathBuf {
        let dir = base.join(&self.name);
        std::fs::create_dir_all(&dir).unwrap();
        for (rel, contents) in &self.files {
            write_file(&dir, rel, contents);
        }
        dir
    }
}

/// Fixture for a whole repository using the default `packages/*` layout,
/// or a `lerna.json` with explicit patterns.
#[derive(Debug, Clone, Default)]
pub struct RepoFixture {
    pub patterns: Option<Vec<String>>,
    pub packages: Vec<(String, PackageFixture)>,
}

impl RepoFixture {
    pub fn new() -> Self {
        RepoFixture::default()
    }

    /// Declare the package patterns in `lerna.json`.
    pub fn with_patterns(mut self, patterns: &[&str]) -> Self {
        self.patterns = Some(patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Add a package under `packages/`.
    pub fn with_package(self, package: PackageFixture) -> Self {
        self.with_package_in("packages", package)
    }

    /// Add a package under `parent/`.
    pub fn with_package_in(mut self, parent: &str, package: PackageFixture) -> Self {
        self.packages.push((parent.to_string(), package));
        self
    }

    pub fn write_to(&self, root: &Path) {
        if let Some(ref patterns) = self.patterns {
            let manifest = serde_json::json!({ "packages": patterns });
            write_file(root, "lerna.json", &manifest.to_string());
        }
        for (parent, package) in &self.packages {
            package.write_to(&root.join(parent));
        }
    }
}

/// Descriptor contents.
pub mod descriptors {
    pub fn package_json(name: &str, version: &str) -> String {
        format!(
            r#"{{
  "name": "{}",
  "version": "{}",
  "private": true
}}
"#,
            name, version
        )
    }

    pub fn monokube_yaml(namespace: &str, clusters: &[&str]) -> String {
        let mut out = format!("namespace: {}\n", namespace);
        if !clusters.is_empty() {
            out.push_str("clusters:\n");
            for cluster in clusters {
                out.push_str(&format!("  - {}\n", cluster));
            }
        }
        out
    }
}

/// Manifest template contents.
pub mod templates {
    pub const DEPLOYMENT: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{ .Name }}
spec:
  template:
    spec:
      containers:
        - name: {{ .Name }}
          image: {{ .Image }}
"#;

    pub const MIGRATION_JOB: &str = r#"apiVersion: batch/v1
kind: Job
metadata:
  name: {{ .Name }}-migrate
"#;
}

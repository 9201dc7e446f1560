//! Assembly of the package set for a run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::package::{package_name, Environment};
use crate::core::package_config;
use crate::core::Package;
use crate::ops::render::render_manifests;
use crate::tools::VersionControl;
use crate::util::config::RunConfig;
use crate::util::shell::{Shell, Status};
use crate::util::template;

/// Builds fully-populated packages from discovered paths.
pub struct Assembler<'a> {
    config: &'a RunConfig,
    vcs: &'a dyn VersionControl,
    shell: &'a Shell,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a RunConfig, vcs: &'a dyn VersionControl, shell: &'a Shell) -> Self {
        Assembler { config, vcs, shell }
    }

    /// Assemble one package per path, in discovery order.
    ///
    /// Filtered packages and packages whose configuration cannot be
    /// resolved are left out. Duplicate names are kept as independent
    /// entries and reported.
    pub fn assemble(&self, paths: &[PathBuf], env: &Environment, revision: &str) -> Vec<Package> {
        let mut packages = Vec::new();

        for path in paths {
            if let Some(package) = self.assemble_one(path, env, revision) {
                packages.push(package);
            }
        }

        let mut seen = HashSet::new();
        for package in &packages {
            if !seen.insert(package.name()) {
                self.shell.warn(format!(
                    "package name `{}` is used by more than one directory; the last one applied wins",
                    package.name()
                ));
            }
        }

        packages
    }

    fn assemble_one(&self, path: &Path, env: &Environment, revision: &str) -> Option<Package> {
        let Some(name) = package_name(path) else {
            tracing::debug!("no package name for {}", path.display());
            return None;
        };

        if self.config.excludes(&name) {
            tracing::debug!("package {} filtered by --skip-packages/--only-packages", name);
            return None;
        }

        if let Some(ref since) = self.config.diff {
            match self.vcs.has_changes(since, path) {
                Ok(true) => {
                    self.shell
                        .note(format!("package {} has changed since commit {}", name, since));
                }
                Ok(false) => {
                    self.shell.status(
                        Status::Skipped,
                        format!("package {} has not changed since commit {}", name, since),
                    );
                    return None;
                }
                Err(e) => {
                    self.shell.warn(format!(
                        "unable to diff package {} against {}: {}",
                        name, since, e
                    ));
                    return None;
                }
            }
        }

        let config = match package_config::resolve(path) {
            Ok(config) => config,
            Err(e) => {
                self.shell
                    .error(format!("unable to parse {}: {}", path.display(), e));
                return None;
            }
        };

        let package = Package::new(path, revision, env.clone())?.with_config(config);

        let docker_args = self.render_docker_args(&package);
        let image_root = if package.config().image_root.is_empty() {
            self.config.image_root.clone()
        } else {
            package.config().image_root.clone()
        };
        let package = package
            .with_docker_args(docker_args)
            .with_image_root(image_root);

        let manifests = match render_manifests(&package) {
            Ok(rendered) => {
                for skipped in &rendered.skipped {
                    self.shell.error(format!(
                        "error parsing {}: {}",
                        skipped.path.display(),
                        skipped.error
                    ));
                }
                rendered.manifests
            }
            Err(e) => {
                self.shell.error(format!("{}: {}", package.name(), e));
                Vec::new()
            }
        };

        self.shell.verbose(
            Status::Discovered,
            format!(
                "{} ({}, {} manifest(s))",
                package.name(),
                package.image(),
                manifests.len()
            ),
        );

        Some(package.with_manifests(manifests))
    }

    /// Render the effective docker-args template; the package value
    /// overrides the run default.
    fn render_docker_args(&self, package: &Package) -> String {
        let raw = if package.config().docker_args.is_empty() {
            &self.config.docker_args
        } else {
            &package.config().docker_args
        };
        if raw.is_empty() {
            return String::new();
        }

        match template::render(raw, &package.template_context()) {
            Ok(args) => args,
            Err(e) => {
                self.shell.error(format!(
                    "'--docker-args' has an invalid template for {}: {}",
                    package.name(),
                    e
                ));
                String::new()
            }
        }
    }
}

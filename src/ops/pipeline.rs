//! The staged release pipeline.
//!
//! Stages run strictly in order (`pre-build`, `build`, `pre-deploy`,
//! `deploy`, `post-deploy`), or only the requested one. Within a stage,
//! packages are visited in assembly order and the first build, push, apply
//! or script failure halts the rest of that stage. Later stages still run.

use std::sync::Arc;

use thiserror::Error;

use crate::core::manifest::Manifest;
use crate::core::package_config::DEPLOY_DIR;
use crate::core::stage::Stage;
use crate::core::Package;
use crate::tools::{ApplyOptions, BuildSpec, ScriptEnv, ToolError, Toolbox};
use crate::util::config::RunConfig;
use crate::util::shell::{Shell, Status};

/// The failure that stopped a stage.
#[derive(Debug, Error)]
#[error("{package}: {source}")]
pub struct StageHalt {
    pub package: String,
    #[source]
    pub source: ToolError,
}

impl StageHalt {
    fn new(package: &Package, source: ToolError) -> Self {
        StageHalt {
            package: package.name().to_string(),
            source,
        }
    }
}

/// How a stage ended.
#[derive(Debug)]
pub enum StageOutcome {
    Completed,
    Halted(StageHalt),
}

#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Summary of every stage executed in a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
}

impl RunReport {
    /// Whether every executed stage completed.
    pub fn succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|s| matches!(s.outcome, StageOutcome::Completed))
    }

    /// Stages that were halted by a failure.
    pub fn halted(&self) -> impl Iterator<Item = (Stage, &StageHalt)> {
        self.stages.iter().filter_map(|s| match &s.outcome {
            StageOutcome::Halted(halt) => Some((s.stage, halt)),
            StageOutcome::Completed => None,
        })
    }
}

/// Drives the package set through the pipeline stages.
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    tools: &'a Toolbox,
    shell: Arc<Shell>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a RunConfig, tools: &'a Toolbox, shell: Arc<Shell>) -> Self {
        Pipeline {
            config,
            tools,
            shell,
        }
    }

    /// Run the selected stages over `packages`.
    pub fn run(&self, packages: &[Package]) -> RunReport {
        let mut report = RunReport::default();

        for stage in self.config.stages() {
            let outcome = {
                let _span = self.shell.span(stage);
                match self.run_stage(stage, packages) {
                    Ok(()) => StageOutcome::Completed,
                    Err(halt) => {
                        self.shell.error(format!("{} halted: {}", stage, halt));
                        StageOutcome::Halted(halt)
                    }
                }
            };
            report.stages.push(StageReport { stage, outcome });
        }

        report
    }

    /// Run a single stage.
    pub fn run_stage(&self, stage: Stage, packages: &[Package]) -> Result<(), StageHalt> {
        tracing::debug!("running {} for {} package(s)", stage, packages.len());
        match stage {
            Stage::Build => self.build(packages),
            _ => {
                for package in packages {
                    if !self.admits(stage, package) {
                        continue;
                    }
                    self.apply_manifests(stage, package)?;
                    self.run_script(stage, package)?;
                }
                Ok(())
            }
        }
    }

    fn build(&self, packages: &[Package]) -> Result<(), StageHalt> {
        for package in packages.iter().filter(|p| p.build_required()) {
            let context = match self.config.docker_root {
                Some(ref root) => self.config.root.join(root),
                None => package.path().to_path_buf(),
            };
            let dockerfile = package.build_spec();
            let spec = BuildSpec {
                image: package.image(),
                dockerfile: &dockerfile,
                context: &context,
                args: package.docker_args(),
            };

            self.shell.status(Status::Building, package.image());
            self.tools
                .images
                .build(&spec)
                .map_err(|e| StageHalt::new(package, e))?;

            if self.config.dry_run {
                self.shell.status(
                    Status::Skipped,
                    format!("not pushing {} as dry-run is set", package.image()),
                );
                continue;
            }

            self.shell.status(Status::Pushing, package.image());
            self.tools
                .images
                .push(package.image())
                .map_err(|e| StageHalt::new(package, e))?;
        }
        Ok(())
    }

    /// Whether the target cluster is on the package's allow-list. A package
    /// left out here has neither its manifests applied nor its script run.
    fn admits(&self, stage: Stage, package: &Package) -> bool {
        let Some(cluster) = self.config.target_cluster() else {
            return true;
        };
        if package.allows_cluster(cluster) {
            return true;
        }
        self.shell.status(
            Status::Skipped,
            format!(
                "{} for {}: cluster {} not found in its config",
                stage,
                package.name(),
                cluster
            ),
        );
        false
    }

    fn apply_manifests(&self, stage: Stage, package: &Package) -> Result<(), StageHalt> {
        let manifests: Vec<&Manifest> = package.manifests_for(stage).collect();
        if manifests.is_empty() {
            self.shell.verbose(
                Status::Skipped,
                format!("no {} manifests for {}", stage, package.name()),
            );
            return Ok(());
        }

        if !package.clusters().is_empty() && self.config.target_cluster().is_none() {
            self.shell.warn(format!(
                "package {} has clusters provided but --cluster-name not provided",
                package.name()
            ));
        }

        let opts = ApplyOptions {
            output: self.config.output.as_deref(),
            dry_run: self.config.dry_run,
        };

        for manifest in manifests {
            self.shell.status(
                Status::Applying,
                format!("{} ({})", package.name(), manifest.file_name),
            );
            self.tools
                .cluster
                .apply(&manifest.content, &opts)
                .map_err(|e| StageHalt::new(package, e))?;

            if !self.config.dry_run {
                self.wait_for_rollout(package, manifest);
            }
        }
        Ok(())
    }

    /// Poll the rollout of the object a manifest declares. Best-effort: a
    /// manifest without a name, or with a kind other than the package's,
    /// is not polled, and a polling failure is only reported.
    fn wait_for_rollout(&self, package: &Package, manifest: &Manifest) {
        let Some(ref resource) = manifest.resource else {
            tracing::debug!("no resource name in {}; not waiting for rollout", manifest.file_name);
            return;
        };
        if let Some(ref kind) = resource.kind {
            if !kind.eq_ignore_ascii_case(package.kind()) {
                tracing::debug!(
                    "{} declares {} rather than {}; not waiting for rollout",
                    manifest.file_name,
                    kind,
                    package.kind()
                );
                return;
            }
        }

        let namespace = resource
            .namespace
            .as_deref()
            .or_else(|| Some(package.namespace()).filter(|ns| !ns.is_empty()));

        self.shell.status(
            Status::Waiting,
            format!("{}/{}", package.kind(), resource.name),
        );
        if let Err(e) = self
            .tools
            .cluster
            .rollout_status(package.kind(), &resource.name, namespace)
        {
            self.shell.warn(format!(
                "rollout status for {}/{} failed: {}",
                package.kind(),
                resource.name,
                e
            ));
        }
    }

    fn run_script(&self, stage: Stage, package: &Package) -> Result<(), StageHalt> {
        let Some(script_name) = stage.script_name() else {
            return Ok(());
        };
        let script = package.path().join(DEPLOY_DIR).join(script_name);
        if !script.is_file() {
            return Ok(());
        }

        self.shell.status(Status::Running, script.display());
        let env = ScriptEnv {
            package: package.name(),
            image_root: package.image_root(),
            cwd: package.path(),
        };
        let output = self
            .tools
            .scripts
            .run(&script, &env)
            .map_err(|e| StageHalt::new(package, e))?;

        if self.config.output.is_some() {
            print!("{}", output);
        }
        Ok(())
    }
}

//! Implementation of `monokube`: discover, assemble and run the pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::package::Environment;
use crate::core::workspace::discover;
use crate::ops::assemble::Assembler;
use crate::ops::pipeline::{Pipeline, RunReport};
use crate::tools::Toolbox;
use crate::util::config::RunConfig;
use crate::util::shell::{Shell, Status};

/// Run a full release over the repository at `config.root`.
///
/// Only a failure to discover packages is an error. Everything after that
/// is reported per package or per stage in the returned [`RunReport`].
pub fn deploy(
    config: &RunConfig,
    tools: &Toolbox,
    shell: Arc<Shell>,
    env: &Environment,
) -> Result<RunReport> {
    let paths = discover(&config.root, config.path.as_deref())
        .with_context(|| format!("failed to discover packages in `{}`", config.root.display()))?;
    tracing::debug!("discovered {} package path(s)", paths.len());

    let revision = match tools.vcs.revision() {
        Ok(revision) => revision,
        Err(e) => {
            shell.error(format!("unable to determine the current commit: {}", e));
            String::new()
        }
    };

    if !config.skip_packages.is_empty() {
        shell.note(format!(
            "Skipping {} package(s): {}",
            config.skip_packages.len(),
            config.skip_packages.join(", ")
        ));
    }
    if !config.only_packages.is_empty() {
        shell.note(format!(
            "Only running {} package(s): {}",
            config.only_packages.len(),
            config.only_packages.join(", ")
        ));
    }
    if config.dry_run {
        shell.note("dry-run is set; images will not be pushed or rolled out");
    }

    let packages = Assembler::new(config, &*tools.vcs, &shell).assemble(&paths, env, &revision);
    if packages.is_empty() {
        shell.status(Status::Skipped, "no packages to deploy");
    }

    Ok(Pipeline::new(config, tools, shell).run(&packages))
}

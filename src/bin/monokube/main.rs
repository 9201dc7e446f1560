//! monokube CLI - staged monorepo releases to Kubernetes

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use monokube::core::Stage;
use monokube::ops::deploy;
use monokube::tools::Toolbox;
use monokube::util::config::{split_names, ProjectConfig, RunConfig};
use monokube::util::shell::Shell;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every executed stage completed.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "monokube=debug"
    } else {
        "monokube=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    let root = std::env::current_dir().context("failed to read the current directory")?;
    let project = ProjectConfig::load_for_root(&root)?;
    let config = run_config(cli, root)?.with_project_defaults(&project.defaults);
    config.validate()?;

    let env = Arc::new(snapshot_env());
    let tools = Toolbox::system(&config.root);

    let report = deploy(&config, &tools, Arc::clone(&shell), &env)?;
    for (stage, halt) in report.halted() {
        shell.error(format!("stage {} halted by {}", stage, halt.package));
    }
    Ok(report.succeeded())
}

fn run_config(cli: Cli, root: std::path::PathBuf) -> Result<RunConfig> {
    let stage = match cli.command.as_deref().filter(|c| !c.is_empty()) {
        Some(command) => Some(command.parse::<Stage>()?),
        None => None,
    };

    let mut config = RunConfig::new(root, cli.image_root.unwrap_or_default());
    config.stage = stage;
    config.dry_run = cli.dry_run;
    config.docker_args = cli.docker_args.unwrap_or_default();
    config.docker_root = cli.docker_root;
    config.skip_packages = cli.skip_packages.as_deref().map(split_names).unwrap_or_default();
    config.only_packages = cli.only_packages.as_deref().map(split_names).unwrap_or_default();
    config.cluster_name = cli.cluster_name;
    config.path = cli.path;
    config.diff = cli.diff.filter(|d| !d.is_empty());
    config.output = cli.output.filter(|o| !o.is_empty());
    Ok(config)
}

/// Snapshot of the process environment; non-UTF-8 entries are converted lossily.
fn snapshot_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

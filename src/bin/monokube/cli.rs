//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use monokube::util::shell::ColorChoice;

/// monokube - build, render and roll out every package of a monorepo
#[derive(Parser)]
#[command(name = "monokube")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Registry prefix for computed image names
    #[arg(long, env = "MONOKUBE_IMAGE_ROOT")]
    pub image_root: Option<String>,

    /// Run a single stage: pre-build, build, pre-deploy, deploy or post-deploy
    #[arg(long, value_name = "STAGE")]
    pub command: Option<String>,

    /// Build without pushing, apply with --dry-run=client, skip rollout polling
    #[arg(long)]
    pub dry_run: bool,

    /// Default docker build arguments (template)
    #[arg(long, env = "MONOKUBE_DOCKER_ARGS", allow_hyphen_values = true)]
    pub docker_args: Option<String>,

    /// Build context for every package, relative to the current directory
    #[arg(long)]
    pub docker_root: Option<PathBuf>,

    /// Space-separated package names to leave out
    #[arg(long, value_name = "NAMES")]
    pub skip_packages: Option<String>,

    /// Space-separated package names to run exclusively
    #[arg(long, value_name = "NAMES")]
    pub only_packages: Option<String>,

    /// Target cluster for cluster-scoped packages
    #[arg(long, env = "MONOKUBE_CLUSTER_NAME")]
    pub cluster_name: Option<String>,

    /// Directory whose children are the packages
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Only run packages changed since this revision
    #[arg(long, value_name = "REVISION")]
    pub diff: Option<String>,

    /// Output format passed to kubectl apply
    #[arg(short, long)]
    pub output: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

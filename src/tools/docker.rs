//! Container builds through the `docker` CLI.

use std::path::PathBuf;

use crate::tools::{BuildSpec, ImageBuilder, ToolError};
use crate::util::process::{resolve_program, ProcessBuilder};

pub struct DockerCli {
    program: PathBuf,
}

impl DockerCli {
    pub fn new() -> Self {
        DockerCli {
            program: resolve_program("docker"),
        }
    }

    /// `docker build {args...} -t {image} -f {dockerfile} {context}`
    pub fn build_command(&self, spec: &BuildSpec<'_>) -> Result<ProcessBuilder, ToolError> {
        let args = shlex::split(spec.args).ok_or_else(|| ToolError::InvalidArgs {
            args: spec.args.to_string(),
        })?;

        Ok(ProcessBuilder::new(&self.program)
            .arg("build")
            .args(args)
            .arg("-t")
            .arg(spec.image)
            .arg("-f")
            .arg(spec.dockerfile)
            .arg(spec.context))
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder for DockerCli {
    fn build(&self, spec: &BuildSpec<'_>) -> Result<(), ToolError> {
        let cmd = self.build_command(spec)?;
        tracing::debug!("running `{}`", cmd.display_command());
        cmd.status_and_check()
            .map_err(|e| ToolError::from_anyhow("docker", e))
    }

    fn push(&self, image: &str) -> Result<(), ToolError> {
        let cmd = ProcessBuilder::new(&self.program).args(["push", image]);
        tracing::debug!("running `{}`", cmd.display_command());
        cmd.status_and_check()
            .map_err(|e| ToolError::from_anyhow("docker", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn docker() -> DockerCli {
        DockerCli {
            program: PathBuf::from("docker"),
        }
    }

    #[test]
    fn test_build_command() {
        let spec = BuildSpec {
            image: "registry.local/api:1.0.0-abc",
            dockerfile: Path::new("packages/api/Dockerfile"),
            context: Path::new("."),
            args: "--build-arg NAME=api --build-arg 'GREETING=hello world'",
        };

        let cmd = docker().build_command(&spec).unwrap();
        assert_eq!(
            cmd.display_command(),
            "docker build --build-arg NAME=api --build-arg GREETING=hello world \
             -t registry.local/api:1.0.0-abc -f packages/api/Dockerfile ."
        );
    }

    #[test]
    fn test_build_command_without_args() {
        let spec = BuildSpec {
            image: "r/api:1",
            dockerfile: Path::new("api/Dockerfile"),
            context: Path::new("api"),
            args: "",
        };

        let cmd = docker().build_command(&spec).unwrap();
        assert_eq!(cmd.display_command(), "docker build -t r/api:1 -f api/Dockerfile api");
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        let spec = BuildSpec {
            image: "r/api:1",
            dockerfile: Path::new("api/Dockerfile"),
            context: Path::new("api"),
            args: "--build-arg 'OPEN",
        };

        let err = docker().build_command(&spec).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs { .. }));
    }
}

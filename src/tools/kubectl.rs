//! Cluster access through the `kubectl` CLI.

use std::path::PathBuf;

use crate::tools::{ApplyOptions, ClusterClient, ToolError};
use crate::util::process::{resolve_program, ProcessBuilder};

pub struct KubectlCli {
    program: PathBuf,
}

impl KubectlCli {
    pub fn new() -> Self {
        KubectlCli {
            program: resolve_program("kubectl"),
        }
    }

    /// `kubectl apply [--output fmt] [--dry-run=client] -f -`, document on stdin.
    pub fn apply_command(&self, document: &str, opts: &ApplyOptions<'_>) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program).arg("apply");
        if let Some(output) = opts.output {
            cmd = cmd.args(["--output", output]);
        }
        if opts.dry_run {
            cmd = cmd.arg("--dry-run=client");
        }
        cmd.args(["-f", "-"]).stdin(document)
    }

    /// `kubectl rollout status {kind}/{name} [-n namespace]`
    pub fn rollout_command(&self, kind: &str, name: &str, namespace: Option<&str>) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .args(["rollout", "status"])
            .arg(format!("{}/{}", kind, name));
        if let Some(namespace) = namespace {
            cmd = cmd.args(["-n", namespace]);
        }
        cmd
    }
}

impl Default for KubectlCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterClient for KubectlCli {
    fn apply(&self, document: &str, opts: &ApplyOptions<'_>) -> Result<(), ToolError> {
        let cmd = self.apply_command(document, opts);
        tracing::debug!("running `{}` ({} bytes on stdin)", cmd.display_command(), document.len());
        cmd.status_and_check()
            .map_err(|e| ToolError::from_anyhow("kubectl", e))
    }

    fn rollout_status(&self, kind: &str, name: &str, namespace: Option<&str>) -> Result<(), ToolError> {
        let cmd = self.rollout_command(kind, name, namespace);
        tracing::debug!("running `{}`", cmd.display_command());
        cmd.status_and_check()
            .map_err(|e| ToolError::from_anyhow("kubectl", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kubectl() -> KubectlCli {
        KubectlCli {
            program: PathBuf::from("kubectl"),
        }
    }

    #[test]
    fn test_apply_command() {
        let cmd = kubectl().apply_command("kind: Service", &ApplyOptions::default());
        assert_eq!(cmd.display_command(), "kubectl apply -f -");
    }

    #[test]
    fn test_apply_command_passes_flags_through() {
        let opts = ApplyOptions {
            output: Some("yaml"),
            dry_run: true,
        };
        let cmd = kubectl().apply_command("kind: Service", &opts);
        assert_eq!(
            cmd.display_command(),
            "kubectl apply --output yaml --dry-run=client -f -"
        );
    }

    #[test]
    fn test_rollout_command() {
        let cmd = kubectl().rollout_command("deployment", "api", Some("web"));
        assert_eq!(cmd.display_command(), "kubectl rollout status deployment/api -n web");

        let cmd = kubectl().rollout_command("statefulset", "db", None);
        assert_eq!(cmd.display_command(), "kubectl rollout status statefulset/db");
    }
}

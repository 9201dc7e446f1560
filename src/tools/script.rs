//! Package-local stage scripts.

use std::path::Path;

use crate::tools::{ScriptEnv, ScriptRunner, ToolError};
use crate::util::process::ProcessBuilder;

/// Executes scripts directly (honoring their shebang) with `PACKAGE` and
/// `IMAGE_ROOT` added to the inherited environment.
pub struct ProcessScriptRunner;

impl ScriptRunner for ProcessScriptRunner {
    fn run(&self, script: &Path, env: &ScriptEnv<'_>) -> Result<String, ToolError> {
        let cmd = ProcessBuilder::new(script)
            .cwd(env.cwd)
            .env("PACKAGE", env.package)
            .env("IMAGE_ROOT", env.image_root);
        tracing::debug!("running `{}` for {}", cmd.display_command(), env.package);

        let output = cmd
            .exec_and_check()
            .map_err(|e| ToolError::from_anyhow("script", e))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

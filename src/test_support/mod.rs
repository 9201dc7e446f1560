//! Test utilities and fakes for monokube unit tests.
//!
//! The fakes stand in for the external tools behind [`crate::tools`]. They
//! record every call they receive so tests can assert on ordering, and can
//! be told to fail on specific inputs.
//!
//! # Example
//!
//! ```rust,ignore
//! use monokube::test_support::{Call, FakeTools};
//!
//! let tools = FakeTools::default().fail_build("registry.local/api:1.0.0");
//! let toolbox = tools.toolbox();
//! // Run the pipeline against `toolbox`...
//! assert_eq!(tools.calls()[0], Call::Build("registry.local/api:1.0.0".into()));
//! ```

pub mod fixtures;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::package::Environment;
use crate::tools::{
    ApplyOptions, BuildSpec, ClusterClient, ImageBuilder, ScriptEnv, ScriptRunner, ToolError,
    Toolbox, VersionControl,
};

pub use fixtures::*;

/// A small, fixed process environment.
pub fn env() -> Environment {
    Arc::new(BTreeMap::from([
        ("HOME".to_string(), "/home/deploy".to_string()),
        ("STAGE".to_string(), "dev".to_string()),
    ]))
}

/// Write `contents` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Version control fake.
///
/// Paths registered with [`FakeVcs::changed`] report changes, paths
/// registered with [`FakeVcs::failing_for`] fail to diff, everything else
/// is unchanged.
#[derive(Debug, Clone, Default)]
pub struct FakeVcs {
    revision: Option<String>,
    changed: Vec<PathBuf>,
    failing: Vec<PathBuf>,
    diff_calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl FakeVcs {
    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = Some(revision.to_string());
        self
    }

    pub fn changed(mut self, path: &Path) -> Self {
        self.changed.push(path.to_path_buf());
        self
    }

    pub fn failing_for(mut self, path: &Path) -> Self {
        self.failing.push(path.to_path_buf());
        self
    }

    /// Every `(since, path)` pair diffed so far.
    pub fn diff_calls(&self) -> Vec<(String, PathBuf)> {
        self.diff_calls.lock().unwrap().clone()
    }
}

impl VersionControl for FakeVcs {
    fn revision(&self) -> Result<String, ToolError> {
        self.revision
            .clone()
            .ok_or_else(|| ToolError::failed("git", "not a git repository"))
    }

    fn has_changes(&self, since: &str, path: &Path) -> Result<bool, ToolError> {
        self.diff_calls
            .lock()
            .unwrap()
            .push((since.to_string(), path.to_path_buf()));

        if self.failing.iter().any(|p| p == path) {
            return Err(ToolError::failed("git", format!("bad revision `{}`", since)));
        }
        Ok(self.changed.iter().any(|p| p == path))
    }
}

/// A call received by one of the tool fakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build(String),
    Push(String),
    Apply {
        document: String,
        output: Option<String>,
        dry_run: bool,
    },
    Rollout {
        target: String,
        namespace: Option<String>,
    },
    Script {
        package: String,
        image_root: String,
        script: PathBuf,
    },
}

#[derive(Debug, Clone, Default)]
struct Failures {
    build: Option<String>,
    push: Option<String>,
    apply_containing: Option<String>,
    rollouts: bool,
    script_for: Option<String>,
}

#[derive(Debug, Default)]
struct Log {
    calls: Mutex<Vec<Call>>,
    contexts: Mutex<Vec<PathBuf>>,
}

/// Recording fakes for the image builder, cluster client and script runner.
#[derive(Debug, Clone, Default)]
pub struct FakeTools {
    failures: Failures,
    log: Arc<Log>,
    vcs: FakeVcs,
}

impl FakeTools {
    /// Fail the build of `image`.
    pub fn fail_build(mut self, image: &str) -> Self {
        self.failures.build = Some(image.to_string());
        self
    }

    /// Fail the push of `image`.
    pub fn fail_push(mut self, image: &str) -> Self {
        self.failures.push = Some(image.to_string());
        self
    }

    /// Fail applying any document that contains `needle`.
    pub fn fail_apply_containing(mut self, needle: &str) -> Self {
        self.failures.apply_containing = Some(needle.to_string());
        self
    }

    /// Fail every rollout status poll.
    pub fn fail_rollouts(mut self) -> Self {
        self.failures.rollouts = true;
        self
    }

    /// Fail every script run for `package`.
    pub fn fail_script_for(mut self, package: &str) -> Self {
        self.failures.script_for = Some(package.to_string());
        self
    }

    pub fn with_vcs(mut self, vcs: FakeVcs) -> Self {
        self.vcs = vcs;
        self
    }

    /// A toolbox wired to these fakes. Calls made through any toolbox
    /// created here are visible through [`FakeTools::calls`].
    pub fn toolbox(&self) -> Toolbox {
        let recorder = || Recorder {
            failures: self.failures.clone(),
            log: Arc::clone(&self.log),
        };
        Toolbox {
            images: Box::new(recorder()),
            cluster: Box::new(recorder()),
            vcs: Box::new(self.vcs.clone()),
            scripts: Box::new(recorder()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.calls.lock().unwrap().clone()
    }

    /// Documents passed to `apply`, in order.
    pub fn applied(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Apply { document, .. } => Some(document),
                _ => None,
            })
            .collect()
    }

    /// Build contexts passed to `build`, in order.
    pub fn build_contexts(&self) -> Vec<PathBuf> {
        self.log.contexts.lock().unwrap().clone()
    }
}

struct Recorder {
    failures: Failures,
    log: Arc<Log>,
}

impl Recorder {
    fn record(&self, call: Call) {
        self.log.calls.lock().unwrap().push(call);
    }
}

impl ImageBuilder for Recorder {
    fn build(&self, spec: &BuildSpec<'_>) -> Result<(), ToolError> {
        self.record(Call::Build(spec.image.to_string()));
        self.log
            .contexts
            .lock()
            .unwrap()
            .push(spec.context.to_path_buf());

        if self.failures.build.as_deref() == Some(spec.image) {
            return Err(ToolError::failed("docker", "build failed"));
        }
        Ok(())
    }

    fn push(&self, image: &str) -> Result<(), ToolError> {
        self.record(Call::Push(image.to_string()));
        if self.failures.push.as_deref() == Some(image) {
            return Err(ToolError::failed("docker", "push denied"));
        }
        Ok(())
    }
}

impl ClusterClient for Recorder {
    fn apply(&self, document: &str, opts: &ApplyOptions<'_>) -> Result<(), ToolError> {
        self.record(Call::Apply {
            document: document.to_string(),
            output: opts.output.map(str::to_string),
            dry_run: opts.dry_run,
        });
        match self.failures.apply_containing {
            Some(ref needle) if document.contains(needle.as_str()) => {
                Err(ToolError::failed("kubectl", "admission webhook denied the request"))
            }
            _ => Ok(()),
        }
    }

    fn rollout_status(&self, kind: &str, name: &str, namespace: Option<&str>) -> Result<(), ToolError> {
        self.record(Call::Rollout {
            target: format!("{}/{}", kind, name),
            namespace: namespace.map(str::to_string),
        });
        if self.failures.rollouts {
            return Err(ToolError::failed("kubectl", "timed out waiting for rollout"));
        }
        Ok(())
    }
}

impl ScriptRunner for Recorder {
    fn run(&self, script: &Path, env: &ScriptEnv<'_>) -> Result<String, ToolError> {
        self.record(Call::Script {
            package: env.package.to_string(),
            image_root: env.image_root.to_string(),
            script: script.to_path_buf(),
        });
        if self.failures.script_for.as_deref() == Some(env.package) {
            return Err(ToolError::failed("script", "exit status: 1"));
        }
        Ok(format!("ran {}\n", script.display()))
    }
}

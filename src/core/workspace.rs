//! Workspace - discovery of the packages in a monorepo.
//!
//! Package directories are found, in order of precedence, from:
//! 1. an explicit root (`{root}/*`)
//! 2. the package-manifest descriptor (`lerna.json`), one glob per entry
//! 3. the default pattern `packages/*`

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::util::fs::{glob_dirs, pattern_under};

/// Package-manifest descriptor listing package glob patterns.
pub const PACKAGE_MANIFEST: &str = "lerna.json";

/// Pattern used when neither an explicit root nor a descriptor is present.
pub const DEFAULT_PATTERN: &str = "packages/*";

/// Error reading the package-manifest descriptor.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Contents of the package-manifest descriptor.
#[derive(Debug, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub packages: Vec<String>,
}

impl PackageManifest {
    /// Load the descriptor at `path`.
    pub fn load(path: &Path) -> Result<Self, DiscoverError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DiscoverError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|e| DiscoverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Discover package directories under `root`.
///
/// `explicit` and the descriptor's patterns are resolved against `root`
/// when relative. Results keep glob order and are not deduplicated across
/// patterns.
pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Vec<PathBuf>, DiscoverError> {
    let patterns = if let Some(explicit) = explicit {
        vec![pattern_under(&root.join(explicit), "*")]
    } else {
        let descriptor = root.join(PACKAGE_MANIFEST);
        if descriptor.is_file() {
            let manifest = PackageManifest::load(&descriptor)?;
            manifest
                .packages
                .iter()
                .map(|pattern| {
                    if Path::new(pattern).is_absolute() {
                        pattern.clone()
                    } else {
                        pattern_under(root, pattern)
                    }
                })
                .collect()
        } else {
            vec![pattern_under(root, DEFAULT_PATTERN)]
        }
    };

    tracing::debug!("discovering packages with patterns {:?}", patterns);

    Ok(patterns.iter().flat_map(|p| glob_dirs(p)).collect())
}

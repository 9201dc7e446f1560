//! Filesystem utilities.

use std::path::{Path, PathBuf};

use glob::glob;

/// Expand a glob pattern, keeping only entries accepted by `keep`.
///
/// An invalid pattern expands to nothing. Entries that cannot be read while
/// iterating are skipped.
fn expand(pattern: &str, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let paths = match glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::debug!("skipping invalid glob pattern `{}`: {}", pattern, e);
            return Vec::new();
        }
    };

    paths
        .filter_map(|entry| entry.ok())
        .filter(|path| keep(path))
        .collect()
}

/// Expand a glob pattern to matching directories, in glob order.
pub fn glob_dirs(pattern: &str) -> Vec<PathBuf> {
    expand(pattern, Path::is_dir)
}

/// Expand a glob pattern to matching regular files, in glob order.
pub fn glob_files(pattern: &str) -> Vec<PathBuf> {
    expand(pattern, Path::is_file)
}

/// Build a glob pattern for `pattern` under `base`, escaping `base` so that
/// metacharacters in the directory name are matched literally.
pub fn pattern_under(base: &Path, pattern: &str) -> String {
    let base = glob::Pattern::escape(&base.to_string_lossy());
    if base.is_empty() || base == "." {
        pattern.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    }
}

//! Path resolution with a traversal guard.
//!
//! The guard is lexical: the requested path is cleaned (`.` dropped, `..`
//! folded into its parent) and rejected if it still starts with `..`.
//! Nothing touches the filesystem until the path has passed.

use std::path::{Component, Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("path cannot be empty")]
    Empty,

    #[error("path traversal not allowed: '{path}'")]
    PathTraversal { path: String },

    #[error("cannot determine working directory: {reason}")]
    NoWorkingDir { reason: String },
}

/// Lexically clean a path.
///
/// `..` after a normal component removes it; `..` directly under the root
/// stays at the root; leading `..` of a relative path are kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Resolve a requested path for a file tool.
///
/// Relative paths are rejected if their cleaned form escapes upward
/// (`../../etc/passwd`), then joined onto `working_dir` or, absent one,
/// the process's current directory. Absolute paths are cleaned and returned.
pub fn resolve_path(
    requested: &str,
    working_dir: Option<&Path>,
) -> Result<PathBuf, PathValidationError> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(PathValidationError::Empty);
    }

    let input = Path::new(requested);
    if input.is_absolute() {
        return Ok(clean_path(input));
    }

    let cleaned = clean_path(input);
    if matches!(cleaned.components().next(), Some(Component::ParentDir)) {
        tracing::warn!(path = %requested, "Rejected path traversal");
        return Err(PathValidationError::PathTraversal {
            path: requested.to_string(),
        });
    }

    let base = match working_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| PathValidationError::NoWorkingDir {
            reason: e.to_string(),
        })?,
    };

    Ok(clean_path(&base.join(cleaned)))
}

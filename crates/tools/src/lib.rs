//! Built-in tool implementations for uhh.
//!
//! Three tools give the agent its reach into the machine: `bash` runs
//! shell commands, `file_read` and `file_write` move text in and out of
//! files. File tools share one path guard (see [`uhh_security::resolve_path`]).

pub mod bash;
pub mod file_read;
pub mod file_write;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use uhh_core::error::ToolError;
use uhh_core::tool::ToolRegistry;
use uhh_security::PathValidationError;

pub use bash::BashTool;
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;

/// Create a registry holding the three built-in tools.
pub fn default_registry() -> ToolRegistry {
    registry_with_timeout(bash::DEFAULT_TIMEOUT)
}

/// Like [`default_registry`], with a custom `bash` timeout.
pub fn registry_with_timeout(bash_timeout: Duration) -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(BashTool::with_timeout(bash_timeout)));
    registry.register(Arc::new(FileReadTool));
    registry.register(Arc::new(FileWriteTool));
    registry
}

pub(crate) fn resolve_tool_path(
    requested: &str,
    working_dir: Option<&Path>,
) -> Result<PathBuf, ToolError> {
    uhh_security::resolve_path(requested, working_dir).map_err(|e| match e {
        PathValidationError::Empty => ToolError::InvalidArguments("path cannot be empty".into()),
        PathValidationError::PathTraversal { path } => ToolError::PathTraversal(path),
        PathValidationError::NoWorkingDir { reason } => ToolError::Io(reason),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtins() {
        let registry = default_registry();
        assert_eq!(registry.names(), vec!["bash", "file_read", "file_write"]);
    }

    #[test]
    fn builtin_confirmation_policy() {
        let registry = default_registry();
        assert!(registry.get("bash").unwrap().requires_confirmation());
        assert!(!registry.get("file_read").unwrap().requires_confirmation());
        assert!(registry.get("file_write").unwrap().requires_confirmation());
    }

    #[test]
    fn traversal_maps_to_tool_error() {
        let err = resolve_tool_path("../../etc/passwd", Some(Path::new("/work"))).unwrap_err();
        assert_eq!(err.to_string(), "path traversal not allowed: ../../etc/passwd");
    }
}

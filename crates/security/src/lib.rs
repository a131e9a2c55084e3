//! Security helpers for uhh tools.
//!
//! Provides:
//! - **Path resolution**: relative paths resolve against a working directory,
//!   and paths that climb out of it are rejected before any filesystem access
//! - **Command screening**: advisory warnings for shell commands that match
//!   known-destructive patterns (never blocking; the confirmation gate decides)

pub mod command;
pub mod path;

pub use command::{dangerous_command_warning, is_dangerous_command, matched_pattern};
pub use path::{PathValidationError, clean_path, resolve_path};

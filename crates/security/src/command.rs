//! Advisory screening of shell commands.
//!
//! Nothing here blocks execution. A match produces a warning string that
//! is folded into the description shown at the confirmation gate.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Known-destructive command shapes, each with a short label.
static DANGEROUS_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\brm\s+(-rf?|-fr|--recursive)\s*/", "recursive delete of root"),
        (r"(?i)\brm\s+-rf?\s+\*", "recursive delete of everything"),
        (r"(?i)\bsudo\s+rm\b", "privileged delete"),
        (r"(?i)\bmkfs\b", "filesystem format"),
        (r"(?i)\bdd\s+.*of=/dev/", "raw write to a device"),
        (r"(?i)>\s*/dev/sd[a-z]", "redirect onto a disk device"),
        (r"(?i)\bchmod\s+(-R\s+)?777\b", "world-writable permissions"),
        (r"(?i)\bcurl\s+.*\|\s*(ba|z)?sh\b", "download piped to shell"),
        (r"(?i)\bwget\s+.*\|\s*(ba|z)?sh\b", "download piped to shell"),
        (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "fork bomb"),
        (r"(?i)\bformat\s+[a-z]:", "drive format"),
    ]
    .into_iter()
    .filter_map(|(pattern, label)| match Regex::new(pattern) {
        Ok(re) => Some((re, label)),
        Err(e) => {
            tracing::error!(pattern, error = %e, "Invalid dangerous-command pattern");
            None
        }
    })
    .collect()
});

/// Label of the first dangerous pattern the command matches.
pub fn matched_pattern(command: &str) -> Option<&'static str> {
    DANGEROUS_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(command))
        .map(|(_, label)| *label)
}

/// True if the command matches any known-destructive pattern.
pub fn is_dangerous_command(command: &str) -> bool {
    matched_pattern(command).is_some()
}

/// Warning text for a command, if it looks risky.
///
/// Pattern matches come first; a few broader heuristics (recursive
/// delete, privilege escalation, redirects into system paths) produce
/// milder warnings.
pub fn dangerous_command_warning(command: &str) -> Option<String> {
    if let Some(label) = matched_pattern(command) {
        return Some(format!(
            "Warning: This command matches a dangerous pattern ({label}). Please review carefully."
        ));
    }

    let lower = command.to_lowercase();

    if lower.contains("rm ") && lower.contains(" -r") {
        return Some("Warning: Recursive delete operation detected.".into());
    }
    if lower.contains("sudo ") {
        return Some("Warning: Command requires elevated privileges.".into());
    }
    if lower.contains("> /") || lower.contains(">> /") {
        return Some("Warning: Writing to system paths detected.".into());
    }

    None
}

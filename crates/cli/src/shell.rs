//! Shell detection and prompt building.

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

pub const POWERSHELL: &str = "powershell";
pub const CMD: &str = "cmd";
pub const BASH: &str = "bash";
pub const ZSH: &str = "zsh";
pub const FISH: &str = "fish";
pub const UNKNOWN: &str = "unknown";

/// Map common spellings onto the canonical shell names. Unknown names pass through.
pub fn normalize_shell_name(shell: &str) -> String {
    let shell = shell.trim().to_ascii_lowercase();
    match shell.as_str() {
        "powershell" | "pwsh" | "ps" => POWERSHELL.into(),
        "cmd" | "command" => CMD.into(),
        _ => shell,
    }
}

/// Pick the shell: command-line flag, then configured override, then detection.
pub fn determine_shell(flag: Option<&str>, override_shell: Option<&str>) -> String {
    if let Some(shell) = flag.filter(|s| !s.trim().is_empty()) {
        return normalize_shell_name(shell);
    }
    if let Some(shell) = override_shell.filter(|s| !s.trim().is_empty()) {
        return normalize_shell_name(shell);
    }
    detect_shell(|key| std::env::var(key).ok())
}

/// Guess the interactive shell from the environment.
pub fn detect_shell<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(shell) = lookup("SHELL") {
        let name = Path::new(&shell)
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        for known in [BASH, ZSH, FISH] {
            if name.contains(known) {
                debug!(shell = known, "Detected shell from $SHELL");
                return known.into();
            }
        }
        if name.contains("pwsh") || name.contains("powershell") {
            return POWERSHELL.into();
        }
    }

    // PSModulePath is set inside PowerShell sessions only
    if lookup("PSModulePath").is_some() {
        return POWERSHELL.into();
    }
    if lookup("ComSpec").is_some() {
        return CMD.into();
    }

    UNKNOWN.into()
}

pub fn display_name(shell: &str) -> &str {
    match shell {
        POWERSHELL => "PowerShell",
        CMD => "Command Prompt",
        BASH => "Bash",
        ZSH => "Zsh",
        FISH => "Fish",
        UNKNOWN => "Unknown Shell",
        other => other,
    }
}

/// Prompt for simple mode: rewrite the request as one runnable command.
pub fn build_prompt(query: &str, shell: &str, append_context: bool, max_tokens: usize) -> String {
    let context = if append_context {
        build_file_context(query, max_tokens)
    } else {
        String::new()
    };

    format!(
        "<instruction>\n\
         You are a autocorrect system for a terminal, your environment is {shell}. \
         When presented an input you fix and/or change it into a compatible {shell} command that can be executed.\n\
         </instruction>\n\
         {context}<user_input>\n\
         {query}\n\
         </user_input>\n\
         <output>\n\
         Only output a command that can be immediately executed.\n\
         DO NOT wrap in code blocks or anything else.\n\
         </output>"
    )
}

/// System prompt for agent mode.
pub fn agent_system_prompt(shell: &str) -> String {
    format!(
        "You are an AI assistant that helps users with terminal commands and tasks.\n\
         Your environment is {shell}. You have access to tools that can execute commands and read/write files.\n\
         \n\
         When the user asks for help:\n\
         1. Analyze their request\n\
         2. Use the available tools to accomplish the task\n\
         3. Explain what you're doing and the results\n\
         \n\
         Always prefer using tools over just providing text responses when actions are needed.\n\
         Be careful with destructive operations - confirm with the user if uncertain."
    )
}

static FILE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Files with extensions
        r"[\w\-./\\]+\.[a-zA-Z0-9]+",
        // Quoted paths
        r#"["']([^"']+\.[a-zA-Z0-9]+)["']"#,
        // Well-known extensionless files
        r"\b(Dockerfile|Makefile|README\.md|\.gitignore|package\.json|Cargo\.toml)\b",
    ]
    .iter()
    .filter_map(|p| match Regex::new(p) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern = p, error = %e, "Invalid file reference pattern");
            None
        }
    })
    .collect()
});

/// Things in the request that look like file names, in order of appearance per pattern.
pub fn extract_file_references(text: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for re in FILE_PATTERNS.iter() {
        for m in re.find_iter(text) {
            let candidate = m.as_str().trim_matches(|c| c == '"' || c == '\'');
            if !candidate.is_empty() && !files.iter().any(|f| f == candidate) {
                files.push(candidate.to_string());
            }
        }
    }
    files
}

/// Whether the file exists and fits the token budget (about four bytes per token).
pub fn is_small_file(path: &Path, max_tokens: usize) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() <= (max_tokens as u64).saturating_mul(4))
        .unwrap_or(false)
}

/// `<file_contexts>` block with the small files the request mentions.
pub fn build_file_context(query: &str, max_tokens: usize) -> String {
    let mut section = String::new();

    for file in extract_file_references(query) {
        let path = Path::new(&file);
        if !is_small_file(path, max_tokens) {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());
        section.push_str(&format!("<file name='{name}'>\n{content}\n</file>\n"));
    }

    if section.is_empty() {
        return section;
    }
    format!("<file_contexts>\n{section}</file_contexts>\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_shell_name("pwsh"), "powershell");
        assert_eq!(normalize_shell_name(" PS "), "powershell");
        assert_eq!(normalize_shell_name("Command"), "cmd");
        assert_eq!(normalize_shell_name("ZSH"), "zsh");
        assert_eq!(normalize_shell_name("nu"), "nu");
    }

    #[test]
    fn flag_beats_override() {
        assert_eq!(determine_shell(Some("fish"), Some("zsh")), "fish");
        assert_eq!(determine_shell(None, Some("pwsh")), "powershell");
        assert_eq!(determine_shell(Some(""), Some("bash")), "bash");
    }

    #[test]
    fn detects_from_environment() {
        assert_eq!(detect_shell(env(&[("SHELL", "/usr/bin/zsh")])), "zsh");
        assert_eq!(detect_shell(env(&[("SHELL", "/opt/homebrew/bin/fish")])), "fish");
        assert_eq!(detect_shell(env(&[("PSModulePath", "C:\\x")])), "powershell");
        assert_eq!(detect_shell(env(&[("ComSpec", "C:\\cmd.exe")])), "cmd");
        assert_eq!(detect_shell(env(&[])), "unknown");
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("cmd"), "Command Prompt");
        assert_eq!(display_name("nu"), "nu");
    }

    #[test]
    fn prompt_embeds_shell_and_query() {
        let prompt = build_prompt("lsit fiels", "bash", false, 1000);
        assert!(prompt.starts_with("<instruction>\n"));
        assert!(prompt.contains("your environment is bash"));
        assert!(prompt.contains("compatible bash command"));
        assert!(prompt.contains("<user_input>\nlsit fiels\n</user_input>"));
        assert!(!prompt.contains("<file_contexts>"));
        assert!(prompt.ends_with("</output>"));
    }

    #[test]
    fn agent_prompt_names_shell() {
        assert!(agent_system_prompt("powershell").contains("Your environment is powershell."));
    }

    #[test]
    fn extracts_file_references() {
        let refs = extract_file_references("count lines in src/main.rs and 'my notes.txt' plus Makefile");
        assert!(refs.contains(&"src/main.rs".to_string()));
        assert!(refs.contains(&"my notes.txt".to_string()));
        assert!(refs.contains(&"Makefile".to_string()));
    }

    #[test]
    fn file_context_includes_small_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.txt");
        let big = dir.path().join("big.txt");
        std::fs::write(&small, "tiny").unwrap();
        std::fs::write(&big, "x".repeat(100)).unwrap();

        let query = format!("compare {} with {}", small.display(), big.display());
        let section = build_file_context(&query, 10);
        assert!(section.starts_with("<file_contexts>\n"));
        assert!(section.contains("<file name='small.txt'>\ntiny\n</file>\n"));
        assert!(!section.contains("big.txt"));

        assert!(build_file_context("nothing here", 10).is_empty());
    }

    #[test]
    fn prompt_with_file_context() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.md");
        std::fs::write(&file, "# hi").unwrap();
        let prompt = build_prompt(&format!("summarize {}", file.display()), "zsh", true, 1000);
        assert!(prompt.contains("</instruction>\n<file_contexts>\n<file name='notes.md'>"));
    }
}

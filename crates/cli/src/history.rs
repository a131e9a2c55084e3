//! Prompt history kept in `~/.uhh.history.txt`.
//!
//! Each entry is a block of `Time:`, `Shell:`, `Prompt:` and `Output:`
//! lines closed by `---`. Multi-line output keeps only its first line
//! readable on reload; the file is a log, not a database.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub time: Option<DateTime<Utc>>,
    pub shell: String,
    pub prompt: String,
    pub output: String,
}

pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The history file in the user's home directory.
    pub fn default_location() -> Self {
        Self::new(uhh_config::dirs_home().join(".uhh.history.txt"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current time.
    pub fn append(&self, shell: &str, prompt: &str, output: &str) -> std::io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        write!(
            file,
            "Time: {}\nShell: {shell}\nPrompt: {prompt}\nOutput: {output}\n---\n",
            Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }

    /// The most recent complete entry, if any.
    pub fn last_entry(&self) -> Option<Entry> {
        self.recent(1).pop()
    }

    /// Up to `n` most recent entries, oldest first. A missing file is empty history.
    pub fn recent(&self, n: usize) -> Vec<Entry> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        let mut entries = parse(&content);
        if entries.len() > n {
            entries.drain(..entries.len() - n);
        }
        entries
    }

    /// Truncate the history file.
    pub fn clear(&self) -> std::io::Result<()> {
        std::fs::write(&self.path, b"")
    }
}

fn parse(content: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;

    for line in content.lines() {
        if let Some(time) = line.strip_prefix("Time: ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(Entry {
                time: DateTime::parse_from_rfc3339(time)
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
                shell: String::new(),
                prompt: String::new(),
                output: String::new(),
            });
        } else if line == "---" {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
        } else if let Some(entry) = current.as_mut() {
            if let Some(shell) = line.strip_prefix("Shell: ") {
                entry.shell = shell.to_string();
            } else if let Some(prompt) = line.strip_prefix("Prompt: ") {
                entry.prompt = prompt.to_string();
            } else if let Some(output) = line.strip_prefix("Output: ") {
                entry.output = output.to_string();
            }
        }
    }

    entries
}

/// If `prompt` starts with "actually", the text that follows it.
pub fn revision_addendum(prompt: &str) -> Option<&str> {
    let head = prompt.get(..8)?;
    if head.eq_ignore_ascii_case("actually") {
        Some(prompt[8..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> (tempfile::TempDir, History) {
        let dir = tempfile::tempdir().unwrap();
        let history = History::new(dir.path().join("history.txt"));
        (dir, history)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_dir, history) = history();
        assert!(history.recent(10).is_empty());
        assert!(history.last_entry().is_none());
    }

    #[test]
    fn append_and_reload() {
        let (_dir, history) = history();
        history.append("bash", "list files", "ls -la").unwrap();
        history.append("zsh", "disk usage", "du -sh .").unwrap();

        let entries = history.recent(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].prompt, "list files");
        assert_eq!(entries[1].shell, "zsh");
        assert_eq!(entries[1].output, "du -sh .");
        assert!(entries[1].time.is_some());

        let content = std::fs::read_to_string(history.path()).unwrap();
        assert!(content.contains("Shell: bash\nPrompt: list files\nOutput: ls -la\n---\n"));
    }

    #[test]
    fn recent_keeps_newest() {
        let (_dir, history) = history();
        for i in 0..5 {
            history.append("bash", &format!("p{i}"), "x").unwrap();
        }
        let prompts: Vec<_> = history.recent(2).into_iter().map(|e| e.prompt).collect();
        assert_eq!(prompts, vec!["p3", "p4"]);
        assert_eq!(history.last_entry().unwrap().prompt, "p4");
    }

    #[test]
    fn clear_truncates() {
        let (_dir, history) = history();
        history.append("bash", "p", "o").unwrap();
        history.clear().unwrap();
        assert!(history.recent(10).is_empty());
    }

    #[test]
    fn unterminated_entry_is_dropped() {
        let entries = parse(
            "Time: 2025-01-01T00:00:00Z\nShell: bash\nPrompt: a\nOutput: b\n---\nTime: 2025-01-02T00:00:00Z\nShell: x\n",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].prompt, "a");
    }

    #[test]
    fn actually_prefix() {
        assert_eq!(revision_addendum("actually use find"), Some("use find"));
        assert_eq!(revision_addendum("Actually, only .rs files"), Some(", only .rs files"));
        assert_eq!(revision_addendum("list files"), None);
        assert_eq!(revision_addendum("act"), None);
    }
}

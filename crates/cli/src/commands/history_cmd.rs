//! `uhh history`: show or clear past prompts.

use crate::history::{Entry, History};

pub async fn show(count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let history = History::default_location();
    let entries = history.recent(count);
    if entries.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    for entry in &entries {
        print!("{}", render_entry(entry));
    }
    Ok(())
}

pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let history = History::default_location();
    history.clear()?;
    println!("History cleared: {}", history.path().display());
    Ok(())
}

pub fn render_entry(entry: &Entry) -> String {
    let time = entry
        .time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".into());
    format!(
        "[{time}] ({})\n  > {}\n  {}\n",
        entry.shell, entry.prompt, entry.output
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_entry() {
        let entry = Entry {
            time: chrono::Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).single(),
            shell: "bash".into(),
            prompt: "list files".into(),
            output: "ls -la".into(),
        };
        assert_eq!(
            render_entry(&entry),
            "[2025-03-04 05:06] (bash)\n  > list files\n  ls -la\n"
        );
    }

    #[test]
    fn renders_unknown_time() {
        let entry = Entry {
            time: None,
            shell: "zsh".into(),
            prompt: "p".into(),
            output: "o".into(),
        };
        assert!(render_entry(&entry).starts_with("[unknown time] (zsh)"));
    }
}

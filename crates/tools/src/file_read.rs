//! File read tool: read file contents with path validation and size limits.

use async_trait::async_trait;
use tracing::debug;
use uhh_core::error::ToolError;
use uhh_core::tool::{SafetyLevel, Tool, ToolInput, ToolResult};

use crate::resolve_tool_path;

/// Files larger than this are refused.
pub const MAX_FILE_SIZE: u64 = 100 * 1024;

/// Only this many lines are returned.
pub const MAX_LINES: usize = 1000;

pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

pub struct FileReadTool;

impl FileReadTool {
    /// The path from a JSON `{"path": ...}` object, or the trimmed raw text.
    fn path_from(input: &ToolInput) -> String {
        match &input.parsed {
            Some(serde_json::Value::Object(map)) => map
                .get("path")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => input.raw.trim().to_string(),
        }
    }
}

/// Cut at the last kept line's `\n`; line endings are left as they are.
fn limit_lines(mut content: String) -> String {
    let cut = content.match_indices('\n').nth(MAX_LINES - 1).map(|(i, _)| i);
    match cut {
        Some(i) if i + 1 < content.len() => {
            content.truncate(i);
            content.push_str(TRUNCATION_MARKER);
            content
        }
        _ => content,
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Input should be a JSON object with a 'path' field containing the file path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to read"
                }
            },
            "required": ["path"]
        })
    }

    fn requires_confirmation(&self) -> bool {
        false
    }

    fn safety_level(&self) -> SafetyLevel {
        SafetyLevel::Safe
    }

    fn describe(&self, raw_arguments: &str) -> String {
        format!("Read {}", Self::path_from(&ToolInput::new(raw_arguments)))
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let requested = Self::path_from(&input);
        let path = resolve_tool_path(&requested, input.working_dir.as_deref())?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::FileNotFound(requested));
            }
            Err(e) => return Err(ToolError::Io(e.to_string())),
        };

        if metadata.is_dir() {
            return Err(ToolError::IsDirectory(requested));
        }
        if metadata.len() > MAX_FILE_SIZE {
            return Err(ToolError::FileTooLarge {
                size: metadata.len(),
                max: MAX_FILE_SIZE,
            });
        }

        debug!(path = %path.display(), bytes = metadata.len(), "Reading file");
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ToolError::Io(e.to_string()))?;

        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok(ToolResult::ok(limit_lines(content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_in(dir: &std::path::Path, raw: &str) -> ToolInput {
        ToolInput::new(raw).with_working_dir(Some(dir.to_path_buf()))
    }

    #[test]
    fn tool_definition() {
        let tool = FileReadTool;
        assert_eq!(tool.name(), "file_read");
        assert!(!tool.requires_confirmation());
        assert_eq!(tool.safety_level(), SafetyLevel::Safe);
        assert_eq!(tool.parameters_schema()["required"], serde_json::json!(["path"]));
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test.txt"), "Hello from uhh!").unwrap();

        let result = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"test.txt"}"#))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Hello from uhh!");
    }

    #[tokio::test]
    async fn raw_text_is_the_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.md"), "# notes").unwrap();

        let result = FileReadTool
            .execute(input_in(dir.path(), "  notes.md \n"))
            .await
            .unwrap();
        assert_eq!(result.output, "# notes");
    }

    #[tokio::test]
    async fn absolute_path_ignores_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.txt");
        std::fs::write(&file, "absolute").unwrap();

        let raw = serde_json::json!({ "path": file.to_str().unwrap() }).to_string();
        let input = ToolInput::new(raw).with_working_dir(Some("/nonexistent".into()));
        let result = FileReadTool.execute(input).await.unwrap();
        assert_eq!(result.output, "absolute");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"nope.txt"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(ref p) if p == "nope.txt"));
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let err = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"sub"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::IsDirectory(_)));
    }

    #[tokio::test]
    async fn path_traversal_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"../../etc/passwd"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathTraversal(ref p) if p == "../../etc/passwd"));
    }

    #[tokio::test]
    async fn empty_path_rejected() {
        let err = FileReadTool
            .execute(ToolInput::new(r#"{"path":""}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn size_cap() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "a".repeat(101 * 1024)).unwrap();
        std::fs::write(dir.path().join("ok.txt"), "a".repeat(99 * 1024)).unwrap();

        let err = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"big.txt"}"#))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::FileTooLarge { size, max } if size == 101 * 1024 && max == MAX_FILE_SIZE
        ));

        let result = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"ok.txt"}"#))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output.len(), 99 * 1024);
    }

    #[tokio::test]
    async fn long_files_truncated_to_line_limit() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (0..1500).map(|i| format!("line {i}\n")).collect();
        std::fs::write(dir.path().join("long.txt"), content).unwrap();

        let result = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"long.txt"}"#))
            .await
            .unwrap();
        assert!(result.output.ends_with(TRUNCATION_MARKER));
        let body = result.output.trim_end_matches(TRUNCATION_MARKER);
        assert_eq!(body.lines().count(), MAX_LINES);
        assert_eq!(body.lines().last(), Some("line 999"));
    }

    #[tokio::test]
    async fn truncation_keeps_crlf_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (0..1200).map(|i| format!("line {i}\r\n")).collect();
        std::fs::write(dir.path().join("dos.txt"), content).unwrap();

        let result = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"dos.txt"}"#))
            .await
            .unwrap();
        assert!(result.output.starts_with("line 0\r\nline 1\r\n"));
        assert!(result.output.ends_with(&format!("line 999\r{TRUNCATION_MARKER}")));
        let body = result.output.trim_end_matches(TRUNCATION_MARKER);
        assert_eq!(body.matches("\r\n").count(), MAX_LINES - 1);
        assert!(!body.contains("line 1000"));
    }

    #[tokio::test]
    async fn exactly_limit_lines_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (0..MAX_LINES).map(|i| format!("{i}\n")).collect();
        std::fs::write(dir.path().join("exact.txt"), &content).unwrap();

        let result = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"exact.txt"}"#))
            .await
            .unwrap();
        assert_eq!(result.output, content);
    }

    #[tokio::test]
    async fn invalid_utf8_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin"), [0x66, 0x6f, 0xff, 0x6f]).unwrap();
        let result = FileReadTool
            .execute(input_in(dir.path(), r#"{"path":"bin"}"#))
            .await
            .unwrap();
        assert_eq!(result.output, "fo\u{fffd}o");
    }
}

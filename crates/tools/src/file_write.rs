//! File write tool: create, overwrite, or append to files.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uhh_core::error::ToolError;
use uhh_core::tool::{SafetyLevel, Tool, ToolInput, ToolResult};

use crate::resolve_tool_path;

#[derive(Debug, Deserialize)]
struct FileWriteArgs {
    path: String,
    content: String,
    #[serde(default)]
    append: bool,
}

pub struct FileWriteTool;

impl FileWriteTool {
    fn parse_args(raw: &str) -> Result<FileWriteArgs, ToolError> {
        serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Input should be a JSON object with 'path' and 'content' fields. Optionally set 'append' to true to append instead of overwrite."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                },
                "append": {
                    "type": "boolean",
                    "description": "If true, append to the file instead of overwriting"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn safety_level(&self) -> SafetyLevel {
        SafetyLevel::Moderate
    }

    fn describe(&self, raw_arguments: &str) -> String {
        match Self::parse_args(raw_arguments) {
            Ok(args) => {
                let action = if args.append { "Append" } else { "Write" };
                format!("{action} {} bytes to {}", args.content.len(), args.path)
            }
            Err(_) => format!("Execute {} tool", self.name()),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let args = Self::parse_args(&input.raw)?;
        let path = resolve_tool_path(&args.path, input.working_dir.as_deref())?;

        if let Some(parent) = path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Err(ToolError::Io(format!("failed to create directory: {e}")));
        }

        let existed = tokio::fs::try_exists(&path).await.unwrap_or(false);
        debug!(path = %path.display(), append = args.append, existed, "Writing file");

        if args.append {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| ToolError::Io(e.to_string()))?;
            file.write_all(args.content.as_bytes())
                .await
                .map_err(|e| ToolError::Io(e.to_string()))?;
            file.flush().await.map_err(|e| ToolError::Io(e.to_string()))?;
        } else {
            tokio::fs::write(&path, &args.content)
                .await
                .map_err(|e| ToolError::Io(e.to_string()))?;
        }

        let action = match (existed, args.append) {
            (false, _) => "created",
            (true, true) => "appended to",
            (true, false) => "overwrote",
        };

        Ok(ToolResult::ok(format!(
            "Successfully {action} file: {} ({} bytes)",
            args.path,
            args.content.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_in(dir: &std::path::Path, args: serde_json::Value) -> ToolInput {
        ToolInput::new(args.to_string()).with_working_dir(Some(dir.to_path_buf()))
    }

    #[test]
    fn tool_definition() {
        let tool = FileWriteTool;
        assert_eq!(tool.name(), "file_write");
        assert!(tool.requires_confirmation());
        assert_eq!(tool.safety_level(), SafetyLevel::Moderate);
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["path", "content"]));
        assert!(schema["properties"]["append"].is_object());
    }

    #[test]
    fn describe_write_and_append() {
        let tool = FileWriteTool;
        assert_eq!(
            tool.describe(r#"{"path":"a.txt","content":"hello"}"#),
            "Write 5 bytes to a.txt"
        );
        assert_eq!(
            tool.describe(r#"{"path":"a.txt","content":"hi","append":true}"#),
            "Append 2 bytes to a.txt"
        );
        assert_eq!(tool.describe("garbage"), "Execute file_write tool");
    }

    #[tokio::test]
    async fn create_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileWriteTool
            .execute(input_in(
                dir.path(),
                serde_json::json!({ "path": "output.txt", "content": "Hello from test!" }),
            ))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, "Successfully created file: output.txt (16 bytes)");
        let content = std::fs::read_to_string(dir.path().join("output.txt")).unwrap();
        assert_eq!(content, "Hello from test!");
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileWriteTool
            .execute(input_in(
                dir.path(),
                serde_json::json!({ "path": "nested/dir/file.txt", "content": "nested content" }),
            ))
            .await
            .unwrap();

        assert!(result.success);
        let file_path = dir.path().join("nested").join("dir").join("file.txt");
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "nested content");
    }

    #[tokio::test]
    async fn overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("overwrite.txt"), "old content").unwrap();

        let result = FileWriteTool
            .execute(input_in(
                dir.path(),
                serde_json::json!({ "path": "overwrite.txt", "content": "new content" }),
            ))
            .await
            .unwrap();

        assert!(result.output.starts_with("Successfully overwrote file:"));
        let content = std::fs::read_to_string(dir.path().join("overwrite.txt")).unwrap();
        assert_eq!(content, "new content");
    }

    #[tokio::test]
    async fn append_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log.txt"), "one\n").unwrap();

        let result = FileWriteTool
            .execute(input_in(
                dir.path(),
                serde_json::json!({ "path": "log.txt", "content": "two\n", "append": true }),
            ))
            .await
            .unwrap();

        assert_eq!(result.output, "Successfully appended to file: log.txt (4 bytes)");
        let content = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[tokio::test]
    async fn append_to_missing_file_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileWriteTool
            .execute(input_in(
                dir.path(),
                serde_json::json!({ "path": "fresh.txt", "content": "x", "append": true }),
            ))
            .await
            .unwrap();
        assert!(result.output.starts_with("Successfully created file:"));
    }

    #[tokio::test]
    async fn missing_content_argument() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileWriteTool
            .execute(input_in(dir.path(), serde_json::json!({ "path": "a.txt" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn non_json_input_rejected() {
        let err = FileWriteTool
            .execute(ToolInput::new("a.txt hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn path_traversal_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileWriteTool
            .execute(input_in(
                dir.path(),
                serde_json::json!({ "path": "../../etc/passwd", "content": "malicious" }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathTraversal(_)));
    }
}

//! Core Types - shared data model
//!
//! Types used by every layer: tool calls, categories, results, and the
//! aggregate outcome of a dispatched batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Tool Call - a single invocation produced by the model
// ============================================================================

/// A tool call to execute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool arguments (keyed map with JSON-shaped values)
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Argument keys that carry the path a call operates on.
///
/// Both camelCase (wire format) and snake_case (Rust-side tools) spellings
/// are accepted.
pub const TARGET_PATH_KEYS: [&str; 5] = ["path", "filePath", "file_path", "file", "directory"];

/// Extract the target path from a call's arguments, if any.
///
/// The first present key from [`TARGET_PATH_KEYS`] wins.
pub fn extract_target_path(arguments: &Value) -> Option<String> {
    let obj = arguments.as_object()?;
    for key in TARGET_PATH_KEYS {
        if let Some(Value::String(path)) = obj.get(key) {
            if !path.is_empty() {
                return Some(path.clone());
            }
        }
    }
    None
}

// ============================================================================
// Tool Category - closed classification used for scheduling decisions
// ============================================================================

/// Tool category, derived from the tool name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    /// Reads file content
    FileRead,
    /// Searches or lists files
    FileSearch,
    /// Creates, edits, or removes files
    FileWrite,
    /// Runs in a terminal session (implicit shared state)
    Terminal,
    /// Everything else
    Other,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolCategory::FileRead => "file-read",
            ToolCategory::FileSearch => "file-search",
            ToolCategory::FileWrite => "file-write",
            ToolCategory::Terminal => "terminal",
            ToolCategory::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// A category plus the opaque action verb a tool performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolClassification {
    pub category: ToolCategory,
    /// Opaque action string (`read`, `create`, `edit`, `delete`, `rename`, ...)
    pub action: String,
}

impl ToolClassification {
    pub fn new(category: ToolCategory, action: impl Into<String>) -> Self {
        Self {
            category,
            action: action.into(),
        }
    }
}

// ============================================================================
// Tool Result - outcome of one executed call
// ============================================================================

/// Current wall-clock time in Unix milliseconds
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// When a call started, when it finished, and how long it took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTiming {
    /// Start time (Unix milliseconds)
    pub started_at: u64,
    /// Completion time (Unix milliseconds)
    pub completed_at: u64,
    /// Measured duration in milliseconds
    pub duration_ms: u64,
}

/// Result of a tool execution
///
/// Failure is a value: a failing call produces `success == false` with the
/// error text in `output`, never a thrown control signal at the core
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name
    pub tool_name: String,
    /// Tool call ID
    pub call_id: String,
    /// Whether execution succeeded
    pub success: bool,
    /// Output content (error text when `success == false`)
    pub output: String,
    /// Execution timing, filled in by the dispatcher when the executor
    /// omitted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<ExecutionTiming>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl ToolResult {
    pub fn success(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            success: true,
            output: output.into(),
            timing: None,
            metadata: HashMap::new(),
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            success: false,
            output: message.into(),
            timing: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_timing(mut self, timing: ExecutionTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Measured duration, 0 when no timing was recorded
    pub fn duration_ms(&self) -> u64 {
        self.timing.map(|t| t.duration_ms).unwrap_or(0)
    }
}

// ============================================================================
// Parallel Execution Result - outcome of a whole batch
// ============================================================================

/// Aggregate result of dispatching a batch of tool calls
///
/// `results` is always in original batch order: entry *i* corresponds to
/// the *i*-th call of the batch, regardless of execution interleaving.
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutionResult {
    /// Per-call results, in batch order
    pub results: Vec<ToolResult>,
    /// Names of tools whose result succeeded
    pub succeeded: Vec<String>,
    /// Names of tools whose result failed
    pub failed: Vec<String>,
    /// Wall-clock duration of the whole batch
    pub total_duration_ms: u64,
    /// Estimated sequential time minus wall-clock time, never negative
    pub time_saved_ms: u64,
    /// Whether at least one parallel group of two or more calls ran
    pub was_parallel: bool,
}

impl ParallelExecutionResult {
    /// Result for an empty batch
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble the aggregate from ordered per-call results.
    ///
    /// `succeeded`/`failed` and `time_saved_ms` are derived here; the
    /// estimated sequential time is the sum of per-call durations.
    pub fn from_results(results: Vec<ToolResult>, total_duration_ms: u64, was_parallel: bool) -> Self {
        let estimated_sequential_ms: u64 = results.iter().map(|r| r.duration_ms()).sum();
        let succeeded = results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.tool_name.clone())
            .collect();
        let failed = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.tool_name.clone())
            .collect();

        Self {
            results,
            succeeded,
            failed,
            total_duration_ms,
            time_saved_ms: estimated_sequential_ms.saturating_sub(total_duration_ms),
            was_parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_target_path() {
        assert_eq!(
            extract_target_path(&json!({"path": "/tmp/a.txt"})),
            Some("/tmp/a.txt".to_string())
        );
        assert_eq!(
            extract_target_path(&json!({"filePath": "src/lib.rs"})),
            Some("src/lib.rs".to_string())
        );
        assert_eq!(
            extract_target_path(&json!({"file_path": "src/lib.rs"})),
            Some("src/lib.rs".to_string())
        );
        assert_eq!(extract_target_path(&json!({"command": "ls"})), None);
        assert_eq!(extract_target_path(&json!("not an object")), None);
        assert_eq!(extract_target_path(&json!({"path": ""})), None);
    }

    #[test]
    fn test_extract_target_path_first_key_wins() {
        let args = json!({"file": "b.txt", "path": "a.txt"});
        assert_eq!(extract_target_path(&args), Some("a.txt".to_string()));
    }

    #[test]
    fn test_tool_result_builders() {
        let ok = ToolResult::success("read", "1", "content");
        assert!(ok.success);
        assert_eq!(ok.output, "content");
        assert_eq!(ok.duration_ms(), 0);

        let err = ToolResult::failure("read", "2", "no such file");
        assert!(!err.success);
        assert_eq!(err.output, "no such file");
    }

    #[test]
    fn test_from_results_derives_outcome_lists() {
        let results = vec![
            ToolResult::success("read", "1", "a").with_timing(ExecutionTiming {
                started_at: 0,
                completed_at: 50,
                duration_ms: 50,
            }),
            ToolResult::failure("grep", "2", "boom").with_timing(ExecutionTiming {
                started_at: 0,
                completed_at: 70,
                duration_ms: 70,
            }),
        ];

        let outcome = ParallelExecutionResult::from_results(results, 80, true);
        assert_eq!(outcome.succeeded, vec!["read".to_string()]);
        assert_eq!(outcome.failed, vec!["grep".to_string()]);
        // 50 + 70 estimated sequential vs 80 wall clock
        assert_eq!(outcome.time_saved_ms, 40);
        assert!(outcome.was_parallel);
    }

    #[test]
    fn test_time_saved_never_negative() {
        let results = vec![ToolResult::success("read", "1", "a")];
        let outcome = ParallelExecutionResult::from_results(results, 500, false);
        assert_eq!(outcome.time_saved_ms, 0);
    }
}

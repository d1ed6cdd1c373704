//! Core Traits - boundary interfaces
//!
//! The execution core never owns concrete tools or a language-model client.
//! It consumes two small interfaces: an executor that turns a [`ToolCall`]
//! into a [`ToolResult`], and a categorizer that maps tool names onto the
//! closed [`ToolCategory`] set. Both are injected at the boundary; the core
//! never subclasses or inspects implementations.

use super::types::{ToolCall, ToolCategory, ToolClassification, ToolResult};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Tool Trait - a concrete tool behind the registry
// ============================================================================

/// Output of a single tool invocation, before dispatch metadata is attached
///
/// This is what a [`Tool`] returns; the registry executor combines it with
/// the call identity into a [`ToolResult`].
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Whether execution succeeded
    pub success: bool,
    /// Output content
    pub output: String,
    /// Error message if failed
    pub error: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, Value>,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message.into()),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Tool interface
///
/// Implemented by concrete tools (file I/O, terminals, search). The core
/// treats every tool as an opaque asynchronous function over JSON input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique identifier)
    fn name(&self) -> &str;

    /// JSON schema of the accepted arguments
    fn schema(&self) -> Value;

    /// Execute the tool
    ///
    /// Semantic failures come back as `Ok(ToolOutput { success: false, .. })`.
    /// An `Err` is reserved for genuinely unexpected defects; the dispatcher
    /// converts those into failure results without affecting sibling calls.
    async fn execute(&self, input: Value) -> Result<ToolOutput>;
}

// ============================================================================
// Tool Executor - the dispatch boundary
// ============================================================================

/// Executes a single tool call
///
/// Supplied by the caller; the dispatcher knows nothing about what is behind
/// it. Must return a value even on semantic failure.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

// ============================================================================
// Categorizer - tool name to category mapping
// ============================================================================

/// Maps a tool name onto its [`ToolCategory`] and action verb
///
/// Used for dependency analysis and cache invalidation. Implementations must
/// be stable for the life of the process.
pub trait Categorizer: Send + Sync {
    fn categorize(&self, tool_name: &str) -> ToolClassification;
}

/// Default categorizer over the built-in tool vocabulary
///
/// Unknown names fall through to [`ToolCategory::Other`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NameCategorizer;

impl Categorizer for NameCategorizer {
    fn categorize(&self, tool_name: &str) -> ToolClassification {
        match tool_name {
            "read" | "read_file" => ToolClassification::new(ToolCategory::FileRead, "read"),
            "ls" | "list_dir" | "glob" | "grep" | "symbols" => {
                ToolClassification::new(ToolCategory::FileSearch, "search")
            }
            "write" | "create_file" => ToolClassification::new(ToolCategory::FileWrite, "create"),
            "edit" => ToolClassification::new(ToolCategory::FileWrite, "edit"),
            "delete" => ToolClassification::new(ToolCategory::FileWrite, "delete"),
            "rename" | "move" => ToolClassification::new(ToolCategory::FileWrite, "rename"),
            "run" | "bash" | "shell" | "check_terminal" | "kill_terminal" => {
                ToolClassification::new(ToolCategory::Terminal, "run")
            }
            _ => ToolClassification::new(ToolCategory::Other, "other"),
        }
    }
}

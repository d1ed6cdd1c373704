//! Tool Registry
//!
//! Maps tool names to implementations and adapts the map into the
//! [`ToolExecutor`] boundary the dispatcher consumes. Two failure modes are
//! resolved here without ever reaching a tool: unknown names (the failure
//! enumerates what is registered) and malformed arguments (the failure
//! carries the parsed keys and a preview).

use async_trait::async_trait;
use relay_foundation::{Error, Result, Tool, ToolCall, ToolExecutor, ToolOutput, ToolResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available tools
///
/// ## Usage
/// ```ignore
/// let mut registry = ToolRegistry::new();
/// registry.register(Arc::new(ReadTool::new(workspace)));
///
/// let executor = RegistryExecutor::new(Arc::new(registry));
/// let result = executor.execute(&call).await?;
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Register several tools at once
    pub fn register_all(&mut self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Registered tool names, sorted for stable enumeration
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON schema descriptors for all tools
    pub fn schemas(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "input_schema": tool.schema(),
                })
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ToolExecutor`] backed by a [`ToolRegistry`]
pub struct RegistryExecutor {
    registry: Arc<ToolRegistry>,
}

impl RegistryExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolExecutor for RegistryExecutor {
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let Some(tool) = self.registry.get(&call.name) else {
            return Ok(ToolResult::failure(
                &call.name,
                &call.id,
                format!(
                    "Unknown tool '{}'. Available tools: {}",
                    call.name,
                    self.registry.names().join(", ")
                ),
            ));
        };

        if !call.arguments.is_object() {
            return Ok(ToolResult::failure(
                &call.name,
                &call.id,
                argument_diagnostic("arguments must be a JSON object", &call.arguments),
            ));
        }

        match tool.execute(call.arguments.clone()).await {
            Ok(output) => Ok(into_result(call, output)),
            Err(Error::InvalidInput(message)) => Ok(ToolResult::failure(
                &call.name,
                &call.id,
                argument_diagnostic(&message, &call.arguments),
            )),
            // Genuine defect; the dispatcher converts it at the call's slot
            Err(e) => Err(e),
        }
    }
}

fn into_result(call: &ToolCall, output: ToolOutput) -> ToolResult {
    let mut result = if output.success {
        ToolResult::success(&call.name, &call.id, output.output)
    } else {
        ToolResult::failure(
            &call.name,
            &call.id,
            output.error.unwrap_or_else(|| "Unknown error".to_string()),
        )
    };
    result.metadata = output.metadata;
    result
}

/// Structured diagnostic for malformed arguments: parsed keys + a bounded
/// preview of the raw value
fn argument_diagnostic(message: &str, arguments: &Value) -> String {
    let keys = match arguments.as_object() {
        Some(obj) => {
            let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys.join(", ")
        }
        None => "<none>".to_string(),
    };
    let preview: String = arguments.to_string().chars().take(120).collect();
    format!(
        "Invalid arguments: {} (keys: [{}], preview: {})",
        message, keys, preview
    )
}

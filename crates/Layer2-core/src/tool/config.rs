//! Parallel execution configuration

use relay_foundation::ToolCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Configuration for dependency analysis and parallel dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelExecutionConfig {
    /// Maximum number of concurrently running executor calls
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Master switch; when false every batch is serialized in order
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Upper bound for a single executor call (milliseconds)
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,

    /// Categories that always serialize behind everything before them
    ///
    /// Terminal tools share implicit global state (cwd, environment, running
    /// processes), so they are sequential by default.
    #[serde(default = "default_sequential_categories")]
    pub sequential_categories: HashSet<ToolCategory>,
}

// Default value functions
fn default_max_concurrency() -> usize {
    5
}
fn default_enabled() -> bool {
    true
}
fn default_tool_timeout_ms() -> u64 {
    120_000
} // 2 minutes
fn default_sequential_categories() -> HashSet<ToolCategory> {
    HashSet::from([ToolCategory::Terminal])
}

impl Default for ParallelExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            enabled: default_enabled(),
            tool_timeout_ms: default_tool_timeout_ms(),
            sequential_categories: default_sequential_categories(),
        }
    }
}

impl ParallelExecutionConfig {
    /// Per-call timeout as a Duration
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    /// A configuration that serializes every batch
    pub fn serialized() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParallelExecutionConfig::default();
        assert_eq!(config.max_concurrency, 5);
        assert!(config.enabled);
        assert_eq!(config.tool_timeout(), Duration::from_millis(120_000));
        assert!(config.sequential_categories.contains(&ToolCategory::Terminal));
        assert_eq!(config.sequential_categories.len(), 1);
    }

    #[test]
    fn test_serialized_preset() {
        assert!(!ParallelExecutionConfig::serialized().enabled);
    }
}

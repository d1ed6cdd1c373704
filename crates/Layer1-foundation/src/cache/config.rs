//! Cache configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Master switch; a disabled cache stores nothing and always misses
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of entries before eviction kicks in
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Default time-to-live for an entry (milliseconds)
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Per-tool TTL overrides (milliseconds)
    #[serde(default)]
    pub ttl_overrides: HashMap<String, u64>,

    /// Read-class tools whose successful results may be cached
    #[serde(default = "default_cacheable_tools")]
    pub cacheable_tools: Vec<String>,

    /// Write-class tools whose success purges affected entries
    #[serde(default = "default_invalidator_tools")]
    pub invalidator_tools: Vec<String>,

    /// Payloads larger than this many bytes are stored compressed
    ///
    /// The default is deliberately low for test predictability; production
    /// deployments typically raise it.
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,

    /// Whether to compress oversized payloads at all
    #[serde(default = "default_enable_compression")]
    pub enable_compression: bool,
}

// Default value functions
fn default_enabled() -> bool {
    true
}
fn default_max_entries() -> usize {
    100
}
fn default_ttl_ms() -> u64 {
    300_000
} // 5 minutes
fn default_cacheable_tools() -> Vec<String> {
    ["read", "read_file", "ls", "list_dir", "glob", "grep", "symbols"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_invalidator_tools() -> Vec<String> {
    ["edit", "write", "create_file", "run", "kill_terminal"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_compression_threshold() -> usize {
    100
}
fn default_enable_compression() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_entries: default_max_entries(),
            ttl_ms: default_ttl_ms(),
            ttl_overrides: HashMap::new(),
            cacheable_tools: default_cacheable_tools(),
            invalidator_tools: default_invalidator_tools(),
            compression_threshold: default_compression_threshold(),
            enable_compression: default_enable_compression(),
        }
    }
}

impl CacheConfig {
    /// Effective TTL for a tool, honoring per-tool overrides
    pub fn ttl_for(&self, tool: &str) -> Duration {
        let ms = self.ttl_overrides.get(tool).copied().unwrap_or(self.ttl_ms);
        Duration::from_millis(ms)
    }

    /// Disable caching entirely
    pub fn disabled() -> Self {
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
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.ttl_ms, 300_000);
        assert!(config.cacheable_tools.contains(&"read".to_string()));
        assert!(config.invalidator_tools.contains(&"write".to_string()));
    }

    #[test]
    fn test_ttl_override() {
        let mut config = CacheConfig::default();
        config.ttl_overrides.insert("ls".to_string(), 1_000);

        assert_eq!(config.ttl_for("ls"), Duration::from_millis(1_000));
        assert_eq!(config.ttl_for("read"), Duration::from_millis(300_000));
    }
}

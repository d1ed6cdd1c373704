//! Tool Result Cache
//!
//! Caches results from read-class tools (read, ls, glob, grep, ...) to avoid
//! redundant executions and repeated token spend. Write-class tools are never
//! cached; their success purges affected entries instead.
//!
//! # Entry lifecycle
//!
//! An entry is created from a successful read-class result, aged out by TTL,
//! removed by explicit invalidation (path, tool, session), or evicted when
//! the cache is full. Eviction picks the entry with the lowest value score
//! `hit_count - age/ttl`, so a frequently-hit entry survives longer than a
//! young entry nobody has read back.
//!
//! # Payload storage
//!
//! Outputs above the compression threshold are stored gzip-compressed behind
//! a tagged payload variant. Compression is invisible to callers; `get`
//! always returns the original text.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::time::Instant;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::key::{cache_key, workspace_prefix};
use crate::core::ToolResult;
use crate::truncate::estimate_tokens;

/// Stored representation of a cached output
#[derive(Debug, Clone)]
enum CachePayload {
    Inline(String),
    Compressed { bytes: Vec<u8>, original_len: usize },
}

impl CachePayload {
    /// Reconstruct the original output text
    fn materialize(&self) -> std::io::Result<String> {
        match self {
            CachePayload::Inline(text) => Ok(text.clone()),
            CachePayload::Compressed { bytes, .. } => {
                let mut decoder = GzDecoder::new(bytes.as_slice());
                let mut out = String::new();
                decoder.read_to_string(&mut out)?;
                Ok(out)
            }
        }
    }

    fn stored_bytes(&self) -> usize {
        match self {
            CachePayload::Inline(text) => text.len(),
            CachePayload::Compressed { bytes, .. } => bytes.len(),
        }
    }
}

/// One cached tool result
#[derive(Debug, Clone)]
struct CacheEntry {
    tool: String,
    /// The result minus its output, which lives in `payload`
    result: ToolResult,
    payload: CachePayload,
    stored_at: Instant,
    hit_count: u64,
    session_id: Option<String>,
}

/// Per-tool hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolHitCounts {
    pub hits: u64,
    pub misses: u64,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct ToolCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
    pub by_tool: HashMap<String, ToolHitCounts>,
    pub estimated_tokens_saved: u64,
    pub compressed_entries: usize,
    pub compression_bytes_saved: usize,
    pub sessions_with_cache: usize,
    pub memory_bytes: usize,
}

/// Outcome of clearing a session's entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionClearOutcome {
    pub entries_cleared: usize,
    pub bytes_freed: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    by_tool: HashMap<String, ToolHitCounts>,
    tokens_saved: u64,
}

/// Process-wide result cache for read-class tools
///
/// All operations take `&self`; interior state is lock-protected so the
/// dispatcher's concurrent tasks can share one instance.
#[derive(Debug)]
pub struct ToolResultCache {
    config: CacheConfig,
    cacheable: HashSet<String>,
    invalidators: HashSet<String>,
    inner: Mutex<CacheInner>,
}

impl ToolResultCache {
    /// Create a cache with default settings
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        let cacheable = config.cacheable_tools.iter().cloned().collect();
        let invalidators = config.invalidator_tools.iter().cloned().collect();

        Self {
            config,
            cacheable,
            invalidators,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Whether results of this tool may be cached
    ///
    /// Unknown tool names are not cacheable.
    pub fn is_cacheable(&self, tool: &str) -> bool {
        self.cacheable.contains(tool)
    }

    /// Whether a success of this tool should purge affected entries
    pub fn is_invalidator(&self, tool: &str) -> bool {
        self.invalidators.contains(tool)
    }

    /// Look up a cached result
    ///
    /// Returns a hit only for present, unexpired entries; expired entries
    /// are deleted on access. Never returns a failure result, since
    /// failures are never stored.
    pub fn get(&self, tool: &str, arguments: &Value, workspace: Option<&str>) -> Option<ToolResult> {
        if !self.config.enabled || !self.is_cacheable(tool) {
            return None;
        }

        let key = cache_key(workspace, tool, arguments);
        let ttl = self.config.ttl_for(tool);
        let mut inner = self.inner.lock();

        let mut hit = None;
        if let Some(entry) = inner.entries.get_mut(&key) {
            if entry.stored_at.elapsed() <= ttl {
                match entry.payload.materialize() {
                    Ok(output) => {
                        entry.hit_count += 1;
                        let mut result = entry.result.clone();
                        result.output = output;
                        hit = Some(result);
                    }
                    Err(e) => {
                        warn!(tool, error = %e, "dropping undecodable cache entry");
                    }
                }
            }
        }

        match hit {
            Some(result) => {
                inner.by_tool.entry(tool.to_string()).or_default().hits += 1;
                inner.hits += 1;
                inner.tokens_saved += estimate_tokens(&result.output) as u64;
                debug!(tool, "tool cache hit");
                Some(result)
            }
            None => {
                inner.by_tool.entry(tool.to_string()).or_default().misses += 1;
                inner.misses += 1;
                inner.entries.remove(&key);
                None
            }
        }
    }

    /// Store a successful read-class result
    ///
    /// Silently ignores failures, non-cacheable tools, and a disabled cache.
    pub fn set(
        &self,
        tool: &str,
        arguments: &Value,
        result: &ToolResult,
        workspace: Option<&str>,
        session_id: Option<&str>,
    ) {
        if !self.config.enabled || !self.is_cacheable(tool) || !result.success {
            return;
        }

        let key = cache_key(workspace, tool, arguments);
        let payload = self.encode_payload(&result.output);
        let mut stored = result.clone();
        stored.output = String::new();

        let entry = CacheEntry {
            tool: tool.to_string(),
            result: stored,
            payload,
            stored_at: Instant::now(),
            hit_count: 0,
            session_id: session_id.map(String::from),
        };

        let mut inner = self.inner.lock();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_entries {
            self.evict_lowest_score(&mut inner);
        }
        inner.entries.insert(key, entry);
    }

    /// Remove every entry whose key mentions `path`; returns the count removed
    pub fn invalidate_path(&self, path: &str) -> usize {
        if path.is_empty() {
            return 0;
        }
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.contains(path));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(path, removed, "invalidated cache entries by path");
        }
        removed
    }

    /// Remove every entry stored for `tool`; returns the count removed
    pub fn invalidate_tool(&self, tool: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.tool != tool);
        before - inner.entries.len()
    }

    /// Remove every entry under a workspace prefix; returns the count removed
    pub fn invalidate_workspace(&self, workspace: Option<&str>) -> usize {
        let prefix = workspace_prefix(workspace);
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(&prefix));
        before - inner.entries.len()
    }

    /// Remove every entry tagged with a session
    pub fn clear_session(&self, session_id: &str) -> SessionClearOutcome {
        let mut inner = self.inner.lock();
        let mut outcome = SessionClearOutcome::default();
        inner.entries.retain(|_, entry| {
            if entry.session_id.as_deref() == Some(session_id) {
                outcome.entries_cleared += 1;
                outcome.bytes_freed += entry.payload.stored_bytes();
                false
            } else {
                true
            }
        });
        outcome
    }

    /// Remove every TTL-expired entry; returns the count removed
    pub fn cleanup(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        let config = &self.config;
        inner
            .entries
            .retain(|_, entry| entry.stored_at.elapsed() <= config.ttl_for(&entry.tool));
        before - inner.entries.len()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Statistics snapshot
    pub fn stats(&self) -> ToolCacheStats {
        let inner = self.inner.lock();
        let total = inner.hits + inner.misses;
        let hit_rate = if total > 0 {
            inner.hits as f64 / total as f64
        } else {
            0.0
        };

        let mut compressed_entries = 0;
        let mut compression_bytes_saved = 0;
        let mut memory_bytes = 0;
        let mut sessions: HashSet<&str> = HashSet::new();
        for (key, entry) in &inner.entries {
            memory_bytes += key.len() + entry.payload.stored_bytes();
            if let CachePayload::Compressed { bytes, original_len } = &entry.payload {
                compressed_entries += 1;
                compression_bytes_saved += original_len.saturating_sub(bytes.len());
            }
            if let Some(session) = entry.session_id.as_deref() {
                sessions.insert(session);
            }
        }

        ToolCacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            size: inner.entries.len(),
            max_size: self.config.max_entries,
            by_tool: inner.by_tool.clone(),
            estimated_tokens_saved: inner.tokens_saved,
            compressed_entries,
            compression_bytes_saved,
            sessions_with_cache: sessions.len(),
            memory_bytes,
        }
    }

    fn encode_payload(&self, output: &str) -> CachePayload {
        if self.config.enable_compression && output.len() > self.config.compression_threshold {
            match compress(output.as_bytes()) {
                Ok(bytes) if bytes.len() < output.len() => {
                    return CachePayload::Compressed {
                        bytes,
                        original_len: output.len(),
                    };
                }
                Ok(_) => {} // incompressible payload, keep inline
                Err(e) => warn!(error = %e, "payload compression failed, storing inline"),
            }
        }
        CachePayload::Inline(output.to_string())
    }

    /// Evict the entry with the lowest value score `hit_count - age/ttl`,
    /// ties broken by oldest timestamp
    fn evict_lowest_score(&self, inner: &mut CacheInner) {
        let victim = inner
            .entries
            .iter()
            .map(|(key, entry)| {
                let ttl_ms = self.config.ttl_for(&entry.tool).as_millis().max(1) as f64;
                let age_ms = entry.stored_at.elapsed().as_millis() as f64;
                let score = entry.hit_count as f64 - age_ms / ttl_ms;
                (key.clone(), score, entry.stored_at)
            })
            .min_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.2.cmp(&b.2))
            });

        if let Some((key, score, _)) = victim {
            debug!(key = %key, score, "evicting lowest-value cache entry");
            inner.entries.remove(&key);
        }
    }
}

impl Default for ToolResultCache {
    fn default() -> Self {
        Self::new()
    }
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn read_result(output: &str) -> ToolResult {
        ToolResult::success("read", "call-1", output)
    }

    #[test]
    fn test_cacheable_gating() {
        let cache = ToolResultCache::new();

        assert!(cache.is_cacheable("read"));
        assert!(cache.is_cacheable("glob"));
        assert!(!cache.is_cacheable("write"));
        assert!(!cache.is_cacheable("run"));
        assert!(!cache.is_cacheable("some_unknown_tool"));

        assert!(cache.is_invalidator("write"));
        assert!(cache.is_invalidator("edit"));
        assert!(!cache.is_invalidator("read"));
    }

    #[test]
    fn test_hit_miss_and_hit_count() {
        let cache = ToolResultCache::new();
        let args = json!({"path": "/src/lib.rs"});

        assert!(cache.get("read", &args, None).is_none());

        cache.set("read", &args, &read_result("content"), None, None);

        let hit = cache.get("read", &args, None).expect("should hit");
        assert_eq!(hit.output, "content");
        assert!(hit.success);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.by_tool["read"].hits, 1);
        assert_eq!(stats.by_tool["read"].misses, 1);
    }

    #[test]
    fn test_failures_never_cached() {
        let cache = ToolResultCache::new();
        let args = json!({"path": "/missing"});

        cache.set(
            "read",
            &args,
            &ToolResult::failure("read", "1", "no such file"),
            None,
            None,
        );
        assert!(cache.get("read", &args, None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_non_cacheable_not_stored() {
        let cache = ToolResultCache::new();
        let args = json!({"command": "ls"});

        cache.set("run", &args, &ToolResult::success("run", "1", "out"), None, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = ToolResultCache::with_config(CacheConfig::disabled());
        let args = json!({"path": "/a"});

        cache.set("read", &args, &read_result("x"), None, None);
        assert!(cache.get("read", &args, None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_canonicalization_purity() {
        let cache = ToolResultCache::new();

        cache.set(
            "read",
            &json!({"path": "/a", "limit": 10}),
            &read_result("first"),
            None,
            None,
        );
        let hit = cache
            .get("read", &json!({"limit": 10, "path": "/a"}), None)
            .expect("key order must not matter");
        assert_eq!(hit.output, "first");
    }

    #[test]
    fn test_ttl_expiry_deletes_entry() {
        let mut config = CacheConfig::default();
        config.ttl_overrides.insert("read".to_string(), 10);
        let cache = ToolResultCache::with_config(config);
        let args = json!({"path": "/a"});

        cache.set("read", &args, &read_result("x"), None, None);
        std::thread::sleep(Duration::from_millis(30));

        assert!(cache.get("read", &args, None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_removes_expired() {
        let mut config = CacheConfig::default();
        config.ttl_overrides.insert("ls".to_string(), 10);
        let cache = ToolResultCache::with_config(config);

        cache.set(
            "ls",
            &json!({"path": "/a"}),
            &ToolResult::success("ls", "1", "a b"),
            None,
            None,
        );
        cache.set("read", &json!({"path": "/b"}), &read_result("x"), None, None);
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_path_invalidation() {
        let cache = ToolResultCache::new();

        cache.set("read", &json!({"path": "/src/a.rs"}), &read_result("a"), None, None);
        cache.set("read", &json!({"path": "/src/b.rs"}), &read_result("b"), None, None);

        assert_eq!(cache.invalidate_path("/src/a.rs"), 1);
        assert!(cache.get("read", &json!({"path": "/src/a.rs"}), None).is_none());
        assert!(cache.get("read", &json!({"path": "/src/b.rs"}), None).is_some());
    }

    #[test]
    fn test_tool_invalidation() {
        let cache = ToolResultCache::new();

        cache.set("read", &json!({"path": "/a"}), &read_result("a"), None, None);
        cache.set(
            "grep",
            &json!({"pattern": "fn", "path": "/a"}),
            &ToolResult::success("grep", "2", "matches"),
            None,
            None,
        );

        assert_eq!(cache.invalidate_tool("grep"), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("read", &json!({"path": "/a"}), None).is_some());
    }

    #[test]
    fn test_workspace_scoping_and_invalidation() {
        let cache = ToolResultCache::new();
        let args = json!({"path": "a.rs"});

        cache.set("read", &args, &read_result("repo1"), Some("/repo1"), None);
        cache.set("read", &args, &read_result("repo2"), Some("/repo2"), None);

        assert_eq!(
            cache.get("read", &args, Some("/repo1")).map(|r| r.output),
            Some("repo1".to_string())
        );

        assert_eq!(cache.invalidate_workspace(Some("/repo1")), 1);
        assert!(cache.get("read", &args, Some("/repo1")).is_none());
        assert!(cache.get("read", &args, Some("/repo2")).is_some());
    }

    #[test]
    fn test_session_clearing() {
        let cache = ToolResultCache::new();

        cache.set("read", &json!({"path": "/a"}), &read_result("a"), None, Some("s1"));
        cache.set("read", &json!({"path": "/b"}), &read_result("b"), None, Some("s2"));
        cache.set("read", &json!({"path": "/c"}), &read_result("c"), None, None);

        let outcome = cache.clear_session("s1");
        assert_eq!(outcome.entries_cleared, 1);
        assert!(outcome.bytes_freed > 0);
        assert_eq!(cache.len(), 2);

        let stats = cache.stats();
        assert_eq!(stats.sessions_with_cache, 1);
    }

    #[test]
    fn test_compression_round_trip() {
        let cache = ToolResultCache::new();
        // Well over the 100-byte threshold, and compressible
        let output = "line of repeated content\n".repeat(50);
        let args = json!({"path": "/big"});

        cache.set("read", &args, &read_result(&output), None, None);

        let stats = cache.stats();
        assert_eq!(stats.compressed_entries, 1);
        assert!(stats.compression_bytes_saved > 0);

        let hit = cache.get("read", &args, None).expect("hit");
        assert_eq!(hit.output, output);
    }

    #[test]
    fn test_small_payload_stays_inline() {
        let cache = ToolResultCache::new();
        cache.set("read", &json!({"path": "/s"}), &read_result("tiny"), None, None);
        assert_eq!(cache.stats().compressed_entries, 0);
    }

    #[test]
    fn test_eviction_prefers_unread_entries() {
        let config = CacheConfig {
            max_entries: 2,
            ..Default::default()
        };
        let cache = ToolResultCache::with_config(config);

        let a = json!({"path": "/a"});
        let b = json!({"path": "/b"});
        let c = json!({"path": "/c"});

        cache.set("read", &a, &read_result("a"), None, None);
        cache.set("read", &b, &read_result("b"), None, None);

        // Raise /a's score well above /b's
        for _ in 0..3 {
            assert!(cache.get("read", &a, None).is_some());
        }

        cache.set("read", &c, &read_result("c"), None, None);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("read", &a, None).is_some());
        assert!(cache.get("read", &b, None).is_none());
        assert!(cache.get("read", &c, None).is_some());
    }

    #[test]
    fn test_tokens_saved_accumulates_on_hits() {
        let cache = ToolResultCache::new();
        let args = json!({"path": "/a"});
        cache.set("read", &args, &read_result("abcdefgh"), None, None);

        cache.get("read", &args, None);
        cache.get("read", &args, None);

        // 8 chars ≈ 2 tokens per hit
        assert_eq!(cache.stats().estimated_tokens_saved, 4);
    }
}

//! Session Tool State
//!
//! A durable-within-process view of which tools are live for a session, what
//! failed recently, and what worked. Sessions are fully independent:
//! operations on one session never mutate another.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::ring::RingBuffer;

/// Cap on retained error records per session; newest wins on overflow
pub const RECENT_ERROR_CAPACITY: usize = 10;

/// One recorded tool failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub tool_name: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// One entry of the append-only tool request history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequestRecord {
    pub tools: Vec<String>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-field counts reported by a session cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCleanup {
    pub requested_cleared: usize,
    pub discovered_cleared: usize,
    pub successful_cleared: usize,
    pub errors_cleared: usize,
    pub history_cleared: usize,
    pub bytes_freed: usize,
}

impl SessionCleanup {
    fn merge(&mut self, other: SessionCleanup) {
        self.requested_cleared += other.requested_cleared;
        self.discovered_cleared += other.discovered_cleared;
        self.successful_cleared += other.successful_cleared;
        self.errors_cleared += other.errors_cleared;
        self.history_cleared += other.history_cleared;
        self.bytes_freed += other.bytes_freed;
    }
}

/// Tool metadata for a single session
#[derive(Debug)]
pub struct SessionToolState {
    /// Tools the agent explicitly asked to enable
    requested_tools: BTreeSet<String>,
    /// Tools surfaced via discovery/search
    discovered_tools: BTreeSet<String>,
    /// Tools that have produced at least one successful result
    successful_tools: BTreeSet<String>,
    /// Recent failures, bounded
    recent_errors: RingBuffer<ErrorRecord>,
    /// Append-only request log, never trimmed
    request_history: Vec<ToolRequestRecord>,
    last_request_at: Option<DateTime<Utc>>,
}

impl SessionToolState {
    fn new() -> Self {
        Self {
            requested_tools: BTreeSet::new(),
            discovered_tools: BTreeSet::new(),
            successful_tools: BTreeSet::new(),
            recent_errors: RingBuffer::new(RECENT_ERROR_CAPACITY),
            request_history: Vec::new(),
            last_request_at: None,
        }
    }

    /// Requested ∪ discovered, in stable sorted order
    fn agent_controlled_tools(&self) -> Vec<String> {
        self.requested_tools
            .union(&self.discovered_tools)
            .cloned()
            .collect()
    }

    /// Rough byte footprint of this session's records
    fn memory_estimate(&self) -> usize {
        let sets: usize = self
            .requested_tools
            .iter()
            .chain(&self.discovered_tools)
            .chain(&self.successful_tools)
            .map(|t| t.len())
            .sum();
        let errors: usize = self
            .recent_errors
            .iter()
            .map(|e| e.tool_name.len() + e.error.len())
            .sum();
        let history: usize = self
            .request_history
            .iter()
            .map(|r| r.reason.len() + r.tools.iter().map(|t| t.len()).sum::<usize>())
            .sum();
        sets + errors + history
    }

    /// Counts of what this state held; `bytes_freed` is filled by the caller
    fn drain(mut self) -> SessionCleanup {
        SessionCleanup {
            requested_cleared: self.requested_tools.len(),
            discovered_cleared: self.discovered_tools.len(),
            successful_cleared: self.successful_tools.len(),
            errors_cleared: self.recent_errors.clear(),
            history_cleared: self.request_history.len(),
            bytes_freed: 0,
        }
    }
}

/// Process-wide map of session id → [`SessionToolState`]
///
/// All operations take `&self`; sessions are created lazily on first touch.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionToolState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut SessionToolState) -> R) -> R {
        let mut sessions = self.sessions.write();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionToolState::new);
        f(state)
    }

    /// Record tools the agent explicitly requested, with its stated reason
    pub fn add_requested(&self, session_id: &str, tools: &[String], reason: &str) {
        let now = Utc::now();
        self.with_session(session_id, |state| {
            state.requested_tools.extend(tools.iter().cloned());
            state.request_history.push(ToolRequestRecord {
                tools: tools.to_vec(),
                reason: reason.to_string(),
                timestamp: now,
            });
            state.last_request_at = Some(now);
        });
        debug!(session_id, count = tools.len(), "recorded tool request");
    }

    /// Record a tool surfaced via discovery
    pub fn add_discovered(&self, session_id: &str, tool: &str) {
        self.with_session(session_id, |state| {
            state.discovered_tools.insert(tool.to_string());
        });
    }

    /// Record a successful tool result
    pub fn record_success(&self, session_id: &str, tool: &str) {
        self.with_session(session_id, |state| {
            state.successful_tools.insert(tool.to_string());
        });
    }

    /// Record a tool failure in the bounded error ring
    pub fn record_error(&self, session_id: &str, tool: &str, error: &str) {
        self.with_session(session_id, |state| {
            state.recent_errors.push(ErrorRecord {
                tool_name: tool.to_string(),
                error: error.to_string(),
                timestamp: Utc::now(),
            });
        });
    }

    /// Requested ∪ discovered tools, in stable sorted order
    pub fn agent_controlled_tools(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.agent_controlled_tools())
            .unwrap_or_default()
    }

    /// Tools that have succeeded at least once, sorted
    pub fn successful_tools(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.successful_tools.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Recent failures, oldest first
    pub fn recent_errors(&self, session_id: &str) -> Vec<ErrorRecord> {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.recent_errors.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The full request history, oldest first
    pub fn request_history(&self, session_id: &str) -> Vec<ToolRequestRecord> {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.request_history.clone())
            .unwrap_or_default()
    }

    pub fn last_request_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.sessions
            .read()
            .get(session_id)
            .and_then(|s| s.last_request_at)
    }

    /// Remove one session, reporting what was cleared
    pub fn cleanup_session(&self, session_id: &str) -> Option<SessionCleanup> {
        let state = self.sessions.write().remove(session_id)?;
        let bytes = state.memory_estimate();
        let mut cleanup = state.drain();
        cleanup.bytes_freed = bytes;
        debug!(session_id, bytes, "cleaned up session state");
        Some(cleanup)
    }

    /// Remove every session, reporting aggregate counts
    pub fn cleanup_all_sessions(&self) -> SessionCleanup {
        let drained: Vec<SessionToolState> = {
            let mut sessions = self.sessions.write();
            sessions.drain().map(|(_, state)| state).collect()
        };

        let mut total = SessionCleanup::default();
        for state in drained {
            let bytes = state.memory_estimate();
            let mut cleanup = state.drain();
            cleanup.bytes_freed = bytes;
            total.merge(cleanup);
        }
        total
    }

    /// Number of sessions currently holding state
    pub fn active_session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Rough byte footprint of one session's records
    pub fn session_memory_estimate(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.memory_estimate())
            .unwrap_or(0)
    }
}

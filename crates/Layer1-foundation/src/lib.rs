//! # relay-foundation
//!
//! Foundation layer for RelayCode:
//! - Core: shared types and boundary traits (ToolCall, ToolResult, ToolExecutor, Categorizer)
//! - Cache: result cache for read-class tools (TTL, scored eviction, compression)
//! - Session: per-session tool state (requested/discovered/successful tools, error ring)
//! - Truncate: token-budgeted output truncation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  relay-core (Layer2)                                    │
//! │  ├── Dependency Analyzer / Group Planner                │
//! │  └── Parallel Dispatcher / Registry / Pipeline          │
//! │                     │                                   │
//! │                     ▼ consumes                          │
//! │  relay-foundation (this crate)                          │
//! │  ├── core:     ToolCall → ToolResult contracts          │
//! │  ├── cache:    ToolResultCache                          │
//! │  ├── session:  SessionRegistry                          │
//! │  └── truncate: OutputTruncator                          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod core;
pub mod error;
pub mod session;
pub mod truncate;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (shared types and traits)
// ============================================================================
pub use core::{
    // Types - calls & classification (types.rs)
    extract_target_path,
    ToolCall,
    ToolCategory,
    ToolClassification,
    TARGET_PATH_KEYS,
    // Types - results (types.rs)
    current_time_ms,
    ExecutionTiming,
    ParallelExecutionResult,
    ToolResult,
    // Traits (traits.rs)
    Categorizer,
    NameCategorizer,
    Tool,
    ToolExecutor,
    ToolOutput,
};

// ============================================================================
// Cache (result cache)
// ============================================================================
pub use cache::{
    cache_key,
    canonical_json,
    CacheConfig,
    SessionClearOutcome,
    ToolCacheStats,
    ToolHitCounts,
    ToolResultCache,
    GLOBAL_WORKSPACE,
};

// ============================================================================
// Session (per-session tool state)
// ============================================================================
pub use session::{
    ErrorRecord, RingBuffer, SessionCleanup, SessionRegistry, ToolRequestRecord,
    RECENT_ERROR_CAPACITY,
};

// ============================================================================
// Truncate (output truncation)
// ============================================================================
pub use truncate::{
    estimate_tokens, get_section, OutputTruncator, TruncationOutcome, TruncationStrategy,
    TruncatorConfig,
};

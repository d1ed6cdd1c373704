//! Core Module - shared types and boundary interfaces
//!
//! The type layer every other module builds on.
//!
//! - `types.rs`: data types (ToolCall, ToolCategory, ToolResult, ...)
//! - `traits.rs`: interfaces (Tool, ToolExecutor, Categorizer)
//!
//! ## Boundary design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Caller (agent loop)                                        │
//! │  ├── supplies ToolExecutor (what actually runs a call)      │
//! │  └── supplies Categorizer  (tool name → category/action)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Execution core (relay-core)                                │
//! │  ├── analyzes, plans, dispatches ToolCall batches           │
//! │  └── consumes only the traits above                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod traits;
pub mod types;

// ============================================================================
// Types - data types (types.rs)
// ============================================================================

// Tool Call & classification
pub use types::{extract_target_path, ToolCall, ToolCategory, ToolClassification, TARGET_PATH_KEYS};

// Results
pub use types::{current_time_ms, ExecutionTiming, ParallelExecutionResult, ToolResult};

// ============================================================================
// Traits - interfaces (traits.rs)
// ============================================================================

pub use traits::{Categorizer, NameCategorizer, Tool, ToolExecutor, ToolOutput};

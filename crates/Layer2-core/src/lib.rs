//! relay-core: Execution Core for RelayCode
//!
//! Layer2 - the scheduling and dispatch layer
//!
//! # Modules
//!
//! - `tool`: dependency analysis, group planning, parallel dispatch, the
//!   tool registry, and the composed pipeline
//!
//! # Usage
//!
//! ```ignore
//! use relay_core::{PipelineConfig, ToolPipeline};
//! use relay_foundation::ToolCall;
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = ToolPipeline::new(PipelineConfig::default());
//!
//! let outcome = pipeline
//!     .run_batch("session-1", Some("/repo"), calls, executor, CancellationToken::new())
//!     .await;
//!
//! for result in &outcome.results {
//!     println!("{}: {}", result.tool_name, result.success);
//! }
//! ```

pub mod tool;

// Re-exports: the full tool execution surface
pub use tool::{
    AnnotatedCall, DependencyAnalyzer, ExecutionGroup, ExecutionSemaphore, GroupPlanner,
    ParallelDispatcher, ParallelExecutionConfig, PipelineConfig, RegistryExecutor, ToolPipeline,
    ToolRegistry, CANCELLED_OUTPUT,
};

// Re-exports: foundation types callers need alongside the dispatcher
pub use relay_foundation::{
    Categorizer, NameCategorizer, ParallelExecutionResult, Tool, ToolCall, ToolCategory,
    ToolExecutor, ToolResult,
};

//! Tool Execution System
//!
//! Turns a batch of model-produced tool calls into ordered results without
//! violating data-consistency rules.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  batch of ToolCalls                                         │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  DependencyAnalyzer ── category + target path ──► edges     │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  GroupPlanner ── Kahn-style leveling ──► ExecutionGroups    │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ParallelDispatcher ── semaphore + isolation ──► Results    │
//! │       │                        ▲                            │
//! │       │                        │ cache get/set/invalidate   │
//! │       ▼                        │                            │
//! │  ToolResultCache ◄─────────────┘                            │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  OutputTruncator ──► bounded Results                        │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  SessionRegistry (success/error records)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ToolPipeline`] composes the whole flow; the individual pieces are
//! public for callers that need finer control.

pub mod analyzer;
pub mod config;
pub mod dispatcher;
pub mod pipeline;
pub mod planner;
pub mod registry;
pub mod semaphore;

// Re-exports: analysis & planning
pub use analyzer::{AnnotatedCall, DependencyAnalyzer};
pub use planner::{ExecutionGroup, GroupPlanner};

// Re-exports: dispatch
pub use config::ParallelExecutionConfig;
pub use dispatcher::{ParallelDispatcher, CANCELLED_OUTPUT};
pub use semaphore::ExecutionSemaphore;

// Re-exports: registry & pipeline
pub use pipeline::{PipelineConfig, ToolPipeline};
pub use registry::{RegistryExecutor, ToolRegistry};

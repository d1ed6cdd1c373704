//! Tool Pipeline
//!
//! The composed flow: analyze → plan → dispatch, with the cache consulted
//! before the executor and populated after read-class successes, write
//! successes invalidating affected entries, oversized outputs truncated to
//! the token budget, and per-session success/error records kept as side
//! effects.
//!
//! ```text
//! batch ──► DependencyAnalyzer ──► GroupPlanner ──► ParallelDispatcher
//!                                                        │
//!                                  ToolResultCache ◄─────┘ (get/set/invalidate)
//!                                                        │
//!                                  OutputTruncator ◄─────┘
//!                                                        │
//!                                  SessionRegistry ◄─────┘ (success/error records)
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use relay_foundation::{
    extract_target_path, CacheConfig, Categorizer, NameCategorizer, OutputTruncator,
    ParallelExecutionResult, Result, SessionRegistry, ToolCall, ToolExecutor, ToolResult,
    ToolResultCache, TruncatorConfig,
};

use super::analyzer::DependencyAnalyzer;
use super::config::ParallelExecutionConfig;
use super::dispatcher::ParallelDispatcher;
use super::planner::GroupPlanner;

/// Bundled configuration for the whole pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub execution: ParallelExecutionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub truncator: TruncatorConfig,
}

/// One entry point for executing a batch of tool calls
pub struct ToolPipeline {
    execution: ParallelExecutionConfig,
    analyzer: DependencyAnalyzer,
    dispatcher: ParallelDispatcher,
    cache: Arc<ToolResultCache>,
    sessions: Arc<SessionRegistry>,
    truncator: OutputTruncator,
}

impl ToolPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_categorizer(config, Arc::new(NameCategorizer))
    }

    /// Build a pipeline around a custom categorizer
    ///
    /// The same categorizer drives dependency analysis and truncation
    /// strategy selection, so the two never disagree about a tool.
    pub fn with_categorizer(config: PipelineConfig, categorizer: Arc<dyn Categorizer>) -> Self {
        Self {
            analyzer: DependencyAnalyzer::with_categorizer(Arc::clone(&categorizer)),
            dispatcher: ParallelDispatcher::new(config.execution.clone()),
            cache: Arc::new(ToolResultCache::with_config(config.cache)),
            sessions: Arc::new(SessionRegistry::new()),
            truncator: OutputTruncator::with_categorizer(config.truncator, categorizer),
            execution: config.execution,
        }
    }

    /// The process-wide result cache
    pub fn cache(&self) -> &Arc<ToolResultCache> {
        &self.cache
    }

    /// The process-wide session registry
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Execute a batch for a session
    ///
    /// Always returns per-call statuses; failures never surface as errors
    /// from this call. Pass `CancellationToken::new()` when no cancellation
    /// is needed.
    pub async fn run_batch(
        &self,
        session_id: &str,
        workspace: Option<&str>,
        calls: Vec<ToolCall>,
        executor: Arc<dyn ToolExecutor>,
        cancel: CancellationToken,
    ) -> ParallelExecutionResult {
        let annotated = self.analyzer.analyze(&calls, &self.execution);
        let groups = GroupPlanner::plan(annotated);

        let caching = Arc::new(CachingExecutor {
            inner: executor,
            cache: Arc::clone(&self.cache),
            workspace: workspace.map(String::from),
            session_id: session_id.to_string(),
        });

        let mut outcome = self.dispatcher.execute(groups, caching, cancel).await;

        for result in &mut outcome.results {
            if result.success {
                self.sessions.record_success(session_id, &result.tool_name);
            } else {
                self.sessions
                    .record_error(session_id, &result.tool_name, &result.output);
            }

            let truncated = self.truncator.truncate(&result.output, &result.tool_name);
            if truncated.was_truncated {
                debug!(
                    tool = %result.tool_name,
                    from = truncated.original_tokens,
                    to = truncated.final_tokens,
                    "truncated tool output"
                );
                result.metadata.insert(
                    "truncation".to_string(),
                    json!({
                        "summary": truncated.summary,
                        "original_tokens": truncated.original_tokens,
                        "final_tokens": truncated.final_tokens,
                        "lines_removed": truncated.lines_removed,
                    }),
                );
                result.output = truncated.content;
            }
        }

        outcome
    }
}

/// Wraps the caller's executor with cache consult/populate/invalidate
struct CachingExecutor {
    inner: Arc<dyn ToolExecutor>,
    cache: Arc<ToolResultCache>,
    workspace: Option<String>,
    session_id: String,
}

#[async_trait]
impl ToolExecutor for CachingExecutor {
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let workspace = self.workspace.as_deref();

        if let Some(mut hit) = self.cache.get(&call.name, &call.arguments, workspace) {
            hit.call_id = call.id.clone();
            hit.metadata.insert("cached".to_string(), json!(true));
            return Ok(hit);
        }

        let result = self.inner.execute(call).await?;

        if result.success {
            if self.cache.is_invalidator(&call.name) {
                // Invalidate by the most specific path available, falling
                // back to the whole workspace
                let removed = match extract_target_path(&call.arguments) {
                    Some(path) => self.cache.invalidate_path(&path),
                    None => self.cache.invalidate_workspace(workspace),
                };
                if removed > 0 {
                    debug!(tool = %call.name, removed, "write invalidated cache entries");
                }
            } else {
                self.cache.set(
                    &call.name,
                    &call.arguments,
                    &result,
                    workspace,
                    Some(&self.session_id),
                );
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExecutor {
        invocations: AtomicUsize,
    }

    impl CountingExecutor {
        fn new() -> Self {
            Self {
                invocations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ToolExecutor for CountingExecutor {
        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if call.arguments.get("fail").and_then(Value::as_bool) == Some(true) {
                return Ok(ToolResult::failure(&call.name, &call.id, "forced failure"));
            }
            Ok(ToolResult::success(
                &call.name,
                &call.id,
                format!("content of {}", call.name),
            ))
        }
    }

    fn pipeline() -> ToolPipeline {
        ToolPipeline::new(PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_cache_short_circuits_second_read() {
        let pipeline = pipeline();
        let executor = Arc::new(CountingExecutor::new());
        let call = || vec![ToolCall::new("1", "read", serde_json::json!({"path": "/a"}))];

        pipeline
            .run_batch("s1", None, call(), executor.clone(), CancellationToken::new())
            .await;
        let second = pipeline
            .run_batch("s1", None, call(), executor.clone(), CancellationToken::new())
            .await;

        assert_eq!(executor.invocations.load(Ordering::SeqCst), 1);
        assert_eq!(second.results[0].metadata.get("cached"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_session_records_successes_and_errors() {
        let pipeline = pipeline();
        let executor = Arc::new(CountingExecutor::new());
        let calls = vec![
            ToolCall::new("1", "read", serde_json::json!({"path": "/a"})),
            ToolCall::new("2", "grep", serde_json::json!({"path": "/b", "fail": true})),
        ];

        pipeline
            .run_batch("s1", None, calls, executor, CancellationToken::new())
            .await;

        assert_eq!(pipeline.sessions().successful_tools("s1"), vec!["read".to_string()]);
        let errors = pipeline.sessions().recent_errors("s1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tool_name, "grep");
        assert_eq!(errors[0].error, "forced failure");
    }

    #[tokio::test]
    async fn test_oversized_output_truncated() {
        let config = PipelineConfig {
            truncator: TruncatorConfig { max_tokens: 50 },
            ..Default::default()
        };
        let pipeline = ToolPipeline::new(config);

        struct VerboseExecutor;
        #[async_trait]
        impl ToolExecutor for VerboseExecutor {
            async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
                Ok(ToolResult::success(&call.name, &call.id, "line\n".repeat(500)))
            }
        }

        let outcome = pipeline
            .run_batch(
                "s1",
                None,
                vec![ToolCall::new("1", "run", serde_json::json!({"command": "make"}))],
                Arc::new(VerboseExecutor),
                CancellationToken::new(),
            )
            .await;

        let result = &outcome.results[0];
        assert!(relay_foundation::estimate_tokens(&result.output) <= 50);
        assert!(result.metadata.contains_key("truncation"));
    }
}

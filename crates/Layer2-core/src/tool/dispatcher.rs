//! Parallel Dispatcher
//!
//! Executes planned groups in order, bounding concurrency with a counting
//! semaphore and isolating failures: one failing call never stops its
//! siblings, and the batch itself always completes with per-call statuses.
//!
//! Results are assembled in original batch-index order no matter how the
//! calls interleaved. Cancellation is sticky: once observed, no further
//! group starts, and every unexecuted slot receives a synthetic
//! cancellation result so the result array still matches the batch.

use futures::future::join_all;
use relay_foundation::{
    current_time_ms, ExecutionTiming, ParallelExecutionResult, ToolCall, ToolExecutor, ToolResult,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ParallelExecutionConfig;
use super::planner::ExecutionGroup;
use super::semaphore::ExecutionSemaphore;

/// Output text of a synthetic cancellation result
pub const CANCELLED_OUTPUT: &str = "Execution cancelled";

/// Executes execution groups under a concurrency budget
pub struct ParallelDispatcher {
    config: ParallelExecutionConfig,
}

impl ParallelDispatcher {
    pub fn new(config: ParallelExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParallelExecutionConfig {
        &self.config
    }

    /// Execute groups in order and assemble results in batch order
    ///
    /// The executor is opaque; an `Err` from it is converted into a failure
    /// result at the call's slot. Pass `CancellationToken::new()` when no
    /// cancellation is needed.
    pub async fn execute(
        &self,
        groups: Vec<ExecutionGroup>,
        executor: Arc<dyn ToolExecutor>,
        cancel: CancellationToken,
    ) -> ParallelExecutionResult {
        let total: usize = groups.iter().map(|g| g.calls.len()).sum();
        if total == 0 {
            return ParallelExecutionResult::empty();
        }

        // Identity per batch slot, for synthesizing results of skipped calls
        let mut identities: Vec<(String, String)> = vec![(String::new(), String::new()); total];
        for group in &groups {
            for annotated in &group.calls {
                identities[annotated.index] =
                    (annotated.call.name.clone(), annotated.call.id.clone());
            }
        }

        let serialize = !self.config.enabled || total == 1;
        let timeout = self.config.tool_timeout();
        let semaphore = ExecutionSemaphore::new(self.config.max_concurrency);
        let start = Instant::now();
        let mut slots: Vec<Option<ToolResult>> = vec![None; total];
        let mut was_parallel = false;

        info!(calls = total, groups = groups.len(), "dispatching tool batch");

        'groups: for group in groups {
            if cancel.is_cancelled() {
                break;
            }

            if group.is_parallel && group.calls.len() >= 2 && !serialize {
                was_parallel = true;
                debug!(size = group.calls.len(), "executing parallel group");

                let mut indices = Vec::with_capacity(group.calls.len());
                let mut tasks = Vec::with_capacity(group.calls.len());
                for annotated in group.calls {
                    let executor = Arc::clone(&executor);
                    let semaphore = semaphore.clone();
                    let cancel = cancel.clone();
                    let call = annotated.call;
                    indices.push(annotated.index);
                    tasks.push(tokio::spawn(async move {
                        semaphore
                            .with_permit(async {
                                if cancel.is_cancelled() {
                                    return ToolResult::failure(
                                        &call.name,
                                        &call.id,
                                        CANCELLED_OUTPUT,
                                    );
                                }
                                run_call(executor.as_ref(), &call, timeout).await
                            })
                            .await
                    }));
                }

                // Await the whole group, success or failure, before advancing
                for (index, joined) in indices.into_iter().zip(join_all(tasks).await) {
                    let result = match joined {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(index, error = %e, "tool task aborted unexpectedly");
                            let (name, id) = &identities[index];
                            ToolResult::failure(name, id, format!("Unexpected task failure: {}", e))
                        }
                    };
                    slots[index] = Some(result);
                }
            } else {
                for annotated in group.calls {
                    if cancel.is_cancelled() {
                        break 'groups;
                    }
                    let result = run_call(executor.as_ref(), &annotated.call, timeout).await;
                    slots[annotated.index] = Some(result);
                }
            }
        }

        // Slots never reached (sticky cancellation) get synthetic results so
        // the result array always matches the batch
        let results: Vec<ToolResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let (name, id) = &identities[index];
                    ToolResult::failure(name, id, CANCELLED_OUTPUT)
                })
            })
            .collect();

        let total_duration_ms = if serialize {
            results.iter().map(|r| r.duration_ms()).sum()
        } else {
            start.elapsed().as_millis() as u64
        };

        ParallelExecutionResult::from_results(results, total_duration_ms, was_parallel)
    }
}

/// Run one call under the timeout, converting every failure mode into a
/// failure result and stamping timing when the executor omitted it
async fn run_call(executor: &dyn ToolExecutor, call: &ToolCall, timeout: Duration) -> ToolResult {
    let started_at = current_time_ms();
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, executor.execute(call)).await;
    let timing = ExecutionTiming {
        started_at,
        completed_at: current_time_ms(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    let mut result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            let message = e.to_string();
            let message = if message.is_empty() {
                "Unknown error".to_string()
            } else {
                message
            };
            ToolResult::failure(&call.name, &call.id, message)
        }
        Err(_) => ToolResult::failure(
            &call.name,
            &call.id,
            format!(
                "Tool '{}' timed out after {} ms",
                call.name,
                timeout.as_millis()
            ),
        ),
    };

    if result.timing.is_none() {
        result.timing = Some(timing);
    }
    result
}

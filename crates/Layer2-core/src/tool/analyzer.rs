//! Dependency Analyzer
//!
//! Derives a correctness-preserving partial order over a batch of tool calls
//! without over-serializing. Dependencies come strictly from declared
//! argument paths, never from content inspection: downstream tools treat
//! paths as their exclusive write domain, so path-level edges are cheap,
//! deterministic, and sufficient.
//!
//! ## Rules (per call, in batch order)
//!
//! 1. Analysis disabled: no edges, nothing parallelizes
//! 2. Sequential category (terminal by default): depends on every earlier call
//! 3. Write with a target path: depends on prior writes AND prior reads of
//!    that path, then registers as its writer
//! 4. Read/search with a target path: depends on prior writes of that path,
//!    then registers as a reader
//! 5. Otherwise: no recorded dependencies
//!
//! Every edge points from a higher index to a lower index, so the resulting
//! graph is acyclic by construction.

use relay_foundation::{extract_target_path, Categorizer, NameCategorizer, ToolCall, ToolCategory};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::config::ParallelExecutionConfig;

/// A tool call enriched with scheduling information
#[derive(Debug, Clone)]
pub struct AnnotatedCall {
    /// The call itself
    pub call: ToolCall,
    /// Position in the batch; the ordering anchor for results
    pub index: usize,
    /// Category derived from the tool name
    pub category: ToolCategory,
    /// Path the call operates on, when declared in its arguments
    pub target_path: Option<String>,
    /// Indices of calls that must complete first; sorted, deduplicated
    pub dependencies: Vec<usize>,
    /// True iff `dependencies` is empty and the category is not sequential
    pub can_parallelize: bool,
}

/// Classifies calls and derives the dependency DAG over a batch
pub struct DependencyAnalyzer {
    categorizer: Arc<dyn Categorizer>,
}

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self::with_categorizer(Arc::new(NameCategorizer))
    }

    pub fn with_categorizer(categorizer: Arc<dyn Categorizer>) -> Self {
        Self { categorizer }
    }

    /// Annotate a batch; output has the same length and order as the input
    ///
    /// Deterministic: identical input yields identical output.
    pub fn analyze(
        &self,
        calls: &[ToolCall],
        config: &ParallelExecutionConfig,
    ) -> Vec<AnnotatedCall> {
        let mut prior_reads: HashMap<String, Vec<usize>> = HashMap::new();
        let mut prior_writes: HashMap<String, Vec<usize>> = HashMap::new();
        let mut annotated = Vec::with_capacity(calls.len());

        for (index, call) in calls.iter().enumerate() {
            let category = self.categorizer.categorize(&call.name).category;
            let target_path = extract_target_path(&call.arguments);
            let mut deps: BTreeSet<usize> = BTreeSet::new();

            if !config.enabled {
                // Serialized by the dispatcher; no edges needed
            } else if config.sequential_categories.contains(&category) {
                deps.extend(0..index);
            } else if category == ToolCategory::FileWrite {
                if let Some(path) = &target_path {
                    if let Some(writers) = prior_writes.get(path) {
                        deps.extend(writers.iter().copied());
                    }
                    // Read-before-write: pending reads must see the old content
                    if let Some(readers) = prior_reads.get(path) {
                        deps.extend(readers.iter().copied());
                    }
                    prior_writes.entry(path.clone()).or_default().push(index);
                }
            } else if matches!(category, ToolCategory::FileRead | ToolCategory::FileSearch) {
                if let Some(path) = &target_path {
                    if let Some(writers) = prior_writes.get(path) {
                        deps.extend(writers.iter().copied());
                    }
                    prior_reads.entry(path.clone()).or_default().push(index);
                }
            }

            let dependencies: Vec<usize> = deps.into_iter().collect();
            let can_parallelize = config.enabled
                && dependencies.is_empty()
                && !config.sequential_categories.contains(&category);

            debug!(
                index,
                tool = %call.name,
                category = %category,
                deps = dependencies.len(),
                can_parallelize,
                "annotated tool call"
            );

            annotated.push(AnnotatedCall {
                call: call.clone(),
                index,
                category,
                target_path,
                dependencies,
                can_parallelize,
            });
        }

        annotated
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

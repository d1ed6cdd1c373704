//! Group Planner
//!
//! Kahn-style leveling over the annotated batch: repeatedly take the calls
//! whose dependencies are all complete, group the parallelizable ones, and
//! emit the rest as singletons in index order. Dependency edges always point
//! backwards in the batch, so the traversal terminates; a defensive fallback
//! keeps the planner robust should a future rule change ever introduce a
//! cycle.

use std::collections::{BTreeSet, HashSet};
use tracing::warn;

use super::analyzer::AnnotatedCall;

/// A unit of scheduling: either one serialized call or a parallel set
#[derive(Debug, Clone)]
pub struct ExecutionGroup {
    /// Member calls, in ascending batch-index order
    pub calls: Vec<AnnotatedCall>,
    /// True only for groups of two or more parallelizable calls
    pub is_parallel: bool,
}

impl ExecutionGroup {
    fn singleton(call: AnnotatedCall) -> Self {
        Self {
            calls: vec![call],
            is_parallel: false,
        }
    }
}

/// Partitions an annotated batch into ordered execution groups
pub struct GroupPlanner;

impl GroupPlanner {
    /// Plan groups preserving every dependency edge
    ///
    /// Invariants: every call lands in exactly one group; the group holding
    /// a dependency precedes the group holding its dependent; singleton
    /// groups never claim `is_parallel`.
    pub fn plan(annotated: Vec<AnnotatedCall>) -> Vec<ExecutionGroup> {
        let total = annotated.len();
        let mut slots: Vec<Option<AnnotatedCall>> = annotated.into_iter().map(Some).collect();
        let mut completed: HashSet<usize> = HashSet::with_capacity(total);
        let mut remaining: BTreeSet<usize> = (0..total).collect();
        let mut groups = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| {
                    slots[i]
                        .as_ref()
                        .is_some_and(|c| c.dependencies.iter().all(|d| completed.contains(d)))
                })
                .collect();

            if ready.is_empty() {
                // Unresolvable dependencies; advance by the lowest index so
                // the traversal always terminates
                if let Some(&lowest) = remaining.iter().next() {
                    warn!(index = lowest, "unresolvable dependency set, emitting singleton");
                    if let Some(call) = slots[lowest].take() {
                        groups.push(ExecutionGroup::singleton(call));
                    }
                    completed.insert(lowest);
                    remaining.remove(&lowest);
                }
                continue;
            }

            let (parallelizable, sequential): (Vec<usize>, Vec<usize>) = ready
                .into_iter()
                .partition(|&i| slots[i].as_ref().is_some_and(|c| c.can_parallelize));

            if parallelizable.len() >= 2 {
                let calls: Vec<AnnotatedCall> = parallelizable
                    .iter()
                    .filter_map(|&i| slots[i].take())
                    .collect();
                for &i in &parallelizable {
                    completed.insert(i);
                    remaining.remove(&i);
                }
                groups.push(ExecutionGroup {
                    calls,
                    is_parallel: true,
                });
            } else if let Some(&only) = parallelizable.first() {
                if let Some(call) = slots[only].take() {
                    groups.push(ExecutionGroup::singleton(call));
                }
                completed.insert(only);
                remaining.remove(&only);
            }

            for i in sequential {
                if let Some(call) = slots[i].take() {
                    groups.push(ExecutionGroup::singleton(call));
                }
                completed.insert(i);
                remaining.remove(&i);
            }
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::analyzer::DependencyAnalyzer;
    use crate::tool::config::ParallelExecutionConfig;
    use relay_foundation::{ToolCall, ToolCategory};
    use serde_json::json;

    fn plan_batch(calls: Vec<ToolCall>) -> Vec<ExecutionGroup> {
        let annotated =
            DependencyAnalyzer::new().analyze(&calls, &ParallelExecutionConfig::default());
        GroupPlanner::plan(annotated)
    }

    fn indices(group: &ExecutionGroup) -> Vec<usize> {
        group.calls.iter().map(|c| c.index).collect()
    }

    #[test]
    fn test_independent_reads_form_one_parallel_group() {
        let groups = plan_batch(vec![
            ToolCall::new("1", "read", json!({"path": "a"})),
            ToolCall::new("2", "read", json!({"path": "b"})),
            ToolCall::new("3", "read", json!({"path": "c"})),
        ]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_parallel);
        assert_eq!(indices(&groups[0]), vec![0, 1, 2]);
    }

    #[test]
    fn test_read_then_write_two_sequential_groups() {
        let groups = plan_batch(vec![
            ToolCall::new("1", "read", json!({"path": "a"})),
            ToolCall::new("2", "write", json!({"path": "a", "content": "x"})),
        ]);

        assert_eq!(groups.len(), 2);
        assert!(!groups[0].is_parallel);
        assert!(!groups[1].is_parallel);
        assert_eq!(indices(&groups[0]), vec![0]);
        assert_eq!(indices(&groups[1]), vec![1]);
    }

    #[test]
    fn test_conflicting_write_lands_in_later_group() {
        let groups = plan_batch(vec![
            ToolCall::new("1", "write", json!({"path": "f1", "content": "a"})),
            ToolCall::new("2", "write", json!({"path": "f2", "content": "b"})),
            ToolCall::new("3", "write", json!({"path": "f1", "content": "c"})),
        ]);

        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_parallel);
        assert_eq!(indices(&groups[0]), vec![0, 1]);
        assert!(!groups[1].is_parallel);
        assert_eq!(indices(&groups[1]), vec![2]);
    }

    #[test]
    fn test_terminal_serializes_after_reads() {
        let groups = plan_batch(vec![
            ToolCall::new("1", "read", json!({"path": "a"})),
            ToolCall::new("2", "read", json!({"path": "b"})),
            ToolCall::new("3", "run", json!({"command": "ls"})),
        ]);

        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_parallel);
        assert_eq!(indices(&groups[1]), vec![2]);
    }

    #[test]
    fn test_every_call_in_exactly_one_group() {
        let groups = plan_batch(vec![
            ToolCall::new("1", "write", json!({"path": "a"})),
            ToolCall::new("2", "read", json!({"path": "a"})),
            ToolCall::new("3", "read", json!({"path": "b"})),
            ToolCall::new("4", "run", json!({"command": "x"})),
            ToolCall::new("5", "grep", json!({"path": "c", "pattern": "y"})),
        ]);

        let mut seen: Vec<usize> = groups.iter().flat_map(indices).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_dependency_groups_ordered() {
        let groups = plan_batch(vec![
            ToolCall::new("1", "write", json!({"path": "a"})),
            ToolCall::new("2", "read", json!({"path": "a"})),
            ToolCall::new("3", "read", json!({"path": "b"})),
        ]);

        // Group positions by batch index
        let position = |idx: usize| {
            groups
                .iter()
                .position(|g| g.calls.iter().any(|c| c.index == idx))
                .unwrap()
        };
        assert!(position(0) < position(1));
    }

    #[test]
    fn test_singletons_never_parallel() {
        let groups = plan_batch(vec![ToolCall::new("1", "read", json!({"path": "a"}))]);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].is_parallel);
    }

    #[test]
    fn test_cycle_fallback_terminates() {
        // Hand-built cycle (the analyzer cannot produce one): 0 → 1 → 0
        let cyclic = vec![
            AnnotatedCall {
                call: ToolCall::new("1", "read", json!({})),
                index: 0,
                category: ToolCategory::FileRead,
                target_path: None,
                dependencies: vec![1],
                can_parallelize: false,
            },
            AnnotatedCall {
                call: ToolCall::new("2", "read", json!({})),
                index: 1,
                category: ToolCategory::FileRead,
                target_path: None,
                dependencies: vec![0],
                can_parallelize: false,
            },
        ];

        let groups = GroupPlanner::plan(cyclic);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| !g.is_parallel));
        // Lowest index is released first
        assert_eq!(indices(&groups[0]), vec![0]);
    }
}

//! Output Truncator
//!
//! Bounds the token footprint of a single tool result. The entry point is
//! [`OutputTruncator::truncate`]; callers that need an omitted fragment back
//! can fetch exact line ranges with [`get_section`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::{Categorizer, NameCategorizer};

use super::estimator::{estimate_tokens, token_budget_chars};
use super::strategy::{apply, TruncationStrategy};

/// Truncator configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TruncatorConfig {
    /// Token budget for a single tool output
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_max_tokens() -> usize {
    2_000
}

impl Default for TruncatorConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

/// Result of a truncation pass
#[derive(Debug, Clone)]
pub struct TruncationOutcome {
    /// The (possibly reduced) content, estimated tokens <= max_tokens
    pub content: String,
    pub was_truncated: bool,
    pub original_lines: usize,
    pub original_tokens: usize,
    pub final_tokens: usize,
    pub lines_removed: usize,
    /// Human-readable description of what was dropped, empty when nothing was
    pub summary: String,
}

/// Strategy-based output truncation
pub struct OutputTruncator {
    config: TruncatorConfig,
    categorizer: Arc<dyn Categorizer>,
}

impl OutputTruncator {
    pub fn new(config: TruncatorConfig) -> Self {
        Self::with_categorizer(config, Arc::new(NameCategorizer))
    }

    pub fn with_categorizer(config: TruncatorConfig, categorizer: Arc<dyn Categorizer>) -> Self {
        Self { config, categorizer }
    }

    pub fn max_tokens(&self) -> usize {
        self.config.max_tokens
    }

    /// Reduce `output` to the configured token budget
    ///
    /// Output already within budget is returned unchanged. Otherwise the
    /// strategy for the tool's category decides what survives; a final
    /// clamp guarantees the bound even for degenerate inputs (for example a
    /// single line larger than the whole budget).
    pub fn truncate(&self, output: &str, tool_name: &str) -> TruncationOutcome {
        let original_tokens = estimate_tokens(output);
        let original_lines = output.lines().count();

        if original_tokens <= self.config.max_tokens {
            return TruncationOutcome {
                content: output.to_string(),
                was_truncated: false,
                original_lines,
                original_tokens,
                final_tokens: original_tokens,
                lines_removed: 0,
                summary: String::new(),
            };
        }

        let classification = self.categorizer.categorize(tool_name);
        let strategy = TruncationStrategy::for_tool(tool_name, classification.category);
        let mut outcome = apply(strategy, output, self.config.max_tokens);

        let budget = token_budget_chars(self.config.max_tokens);
        if outcome.content.chars().count() > budget {
            outcome.content = outcome.content.chars().take(budget).collect();
        }

        TruncationOutcome {
            final_tokens: estimate_tokens(&outcome.content),
            content: outcome.content,
            was_truncated: true,
            original_lines,
            original_tokens,
            lines_removed: original_lines.saturating_sub(outcome.kept_lines),
            summary: outcome.summary,
        }
    }
}

impl Default for OutputTruncator {
    fn default() -> Self {
        Self::new(TruncatorConfig::default())
    }
}

/// Return lines `start_line..=end_line` (1-based, inclusive) of `output`,
/// clamped to the available range
pub fn get_section(output: &str, start_line: usize, end_line: usize) -> String {
    let start = start_line.max(1);
    if end_line < start {
        return String::new();
    }
    output
        .lines()
        .skip(start - 1)
        .take(end_line - start + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

//! Truncation strategies
//!
//! Each tool category has a strategy that preserves the fragment most useful
//! to the downstream consumer: file reads keep head and tail, terminal
//! output keeps the tail (exit status lives there), listings collapse to
//! counts plus a sample, search output keeps the top matches.

use crate::core::ToolCategory;

use super::estimator::token_budget_chars;

/// Characters reserved for elision markers and footers
const MARKER_RESERVE: usize = 48;

/// How oversized output is reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationStrategy {
    /// First ~40% and last ~40% of the budget, elision marker in between
    HeadTail,
    /// Final lines up to the budget, leading marker notes the omission
    Tail,
    /// Totals (directories, files) plus sample entries
    CountSummary,
    /// Top matches up to the budget, footer notes the rest
    Relevance,
    /// Hard truncate with a trailing notice
    Simple,
}

impl TruncationStrategy {
    /// Pick the strategy for a tool
    ///
    /// Listing tools are distinguished by name since they share the
    /// file-search category with content search.
    pub fn for_tool(tool_name: &str, category: ToolCategory) -> Self {
        match tool_name {
            "ls" | "list_dir" => TruncationStrategy::CountSummary,
            _ => match category {
                ToolCategory::FileRead => TruncationStrategy::HeadTail,
                ToolCategory::Terminal => TruncationStrategy::Tail,
                ToolCategory::FileSearch => TruncationStrategy::Relevance,
                _ => TruncationStrategy::Simple,
            },
        }
    }
}

/// What a strategy produced: the reduced content, how many original lines
/// survived, and a human-readable summary of what was dropped
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub content: String,
    pub kept_lines: usize,
    pub summary: String,
}

/// Apply a strategy to oversized output
pub fn apply(strategy: TruncationStrategy, output: &str, max_tokens: usize) -> StrategyOutcome {
    match strategy {
        TruncationStrategy::HeadTail => head_tail(output, max_tokens),
        TruncationStrategy::Tail => tail(output, max_tokens),
        TruncationStrategy::CountSummary => count_summary(output, max_tokens),
        TruncationStrategy::Relevance => relevance(output, max_tokens),
        TruncationStrategy::Simple => simple(output, max_tokens),
    }
}

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

fn head_tail(output: &str, max_tokens: usize) -> StrategyOutcome {
    let lines: Vec<&str> = output.lines().collect();
    let total = lines.len();
    let budget = token_budget_chars(max_tokens);
    let head_budget = budget * 2 / 5;
    let tail_budget = budget * 2 / 5;

    let mut head: Vec<String> = Vec::new();
    let mut head_count = 0usize;
    let mut used = 0usize;
    for line in &lines {
        let cost = line.chars().count() + 1;
        if used + cost > head_budget {
            if head.is_empty() {
                head.push(take_chars(line, head_budget.max(8)));
                head_count = 1;
            }
            break;
        }
        head.push((*line).to_string());
        used += cost;
        head_count += 1;
    }

    let mut tail: Vec<String> = Vec::new();
    let mut tail_count = 0usize;
    let mut used = 0usize;
    for line in lines.iter().skip(head_count).rev() {
        let cost = line.chars().count() + 1;
        if used + cost > tail_budget {
            if tail.is_empty() {
                tail.push(take_chars(line, tail_budget.max(8)));
                tail_count = 1;
            }
            break;
        }
        tail.push((*line).to_string());
        used += cost;
        tail_count += 1;
    }
    tail.reverse();

    let elided = total.saturating_sub(head_count + tail_count);
    let content = if elided > 0 {
        format!(
            "{}\n... [{} lines elided] ...\n{}",
            head.join("\n"),
            elided,
            tail.join("\n")
        )
    } else {
        let mut all = head;
        all.extend(tail);
        all.join("\n")
    };

    StrategyOutcome {
        content,
        kept_lines: head_count + tail_count,
        summary: format!(
            "Kept the first {} and last {} of {} lines ({} elided)",
            head_count, tail_count, total, elided
        ),
    }
}

fn tail(output: &str, max_tokens: usize) -> StrategyOutcome {
    let lines: Vec<&str> = output.lines().collect();
    let total = lines.len();
    let line_budget = token_budget_chars(max_tokens).saturating_sub(MARKER_RESERVE);

    let mut kept: Vec<String> = Vec::new();
    let mut used = 0usize;
    for line in lines.iter().rev() {
        let cost = line.chars().count() + 1;
        if used + cost > line_budget {
            if kept.is_empty() {
                kept.push(take_chars(line, line_budget.max(8)));
            }
            break;
        }
        kept.push((*line).to_string());
        used += cost;
    }
    kept.reverse();

    let omitted = total.saturating_sub(kept.len());
    let kept_count = kept.len();
    let content = if omitted > 0 {
        format!("[... {} earlier lines omitted ...]\n{}", omitted, kept.join("\n"))
    } else {
        kept.join("\n")
    };

    StrategyOutcome {
        content,
        kept_lines: kept_count,
        summary: format!("Kept the last {} of {} lines", kept_count, total),
    }
}

fn count_summary(output: &str, max_tokens: usize) -> StrategyOutcome {
    let entries: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let total = entries.len();
    let directories = entries
        .iter()
        .filter(|e| e.trim_end().ends_with('/'))
        .count();
    let files = total - directories;

    let header = format!("{} entries: {} directories, {} files", total, directories, files);
    let sample_budget = token_budget_chars(max_tokens)
        .saturating_sub(header.chars().count() + 1)
        .saturating_sub(MARKER_RESERVE);

    let mut sample: Vec<String> = Vec::new();
    let mut used = 0usize;
    for entry in &entries {
        let cost = entry.chars().count() + 1;
        if used + cost > sample_budget {
            break;
        }
        sample.push((*entry).to_string());
        used += cost;
    }

    let remaining = total - sample.len();
    let kept = sample.len();
    let mut content = format!("{}\n{}", header, sample.join("\n"));
    if remaining > 0 {
        content.push_str(&format!("\n... and {} more entries", remaining));
    }

    StrategyOutcome {
        content,
        kept_lines: kept,
        summary: header,
    }
}

fn relevance(output: &str, max_tokens: usize) -> StrategyOutcome {
    let lines: Vec<&str> = output.lines().collect();
    let total = lines.len();
    let line_budget = token_budget_chars(max_tokens).saturating_sub(MARKER_RESERVE);

    // Search tools emit best matches first; keep from the top
    let mut kept: Vec<String> = Vec::new();
    let mut used = 0usize;
    for line in &lines {
        let cost = line.chars().count() + 1;
        if used + cost > line_budget {
            if kept.is_empty() {
                kept.push(take_chars(line, line_budget.max(8)));
            }
            break;
        }
        kept.push((*line).to_string());
        used += cost;
    }

    let remaining = total.saturating_sub(kept.len());
    let kept_count = kept.len();
    let mut content = kept.join("\n");
    if remaining > 0 {
        content.push_str(&format!("\n... {} more matches", remaining));
    }

    StrategyOutcome {
        content,
        kept_lines: kept_count,
        summary: format!("Kept the top {} of {} matches", kept_count, total),
    }
}

fn simple(output: &str, max_tokens: usize) -> StrategyOutcome {
    let notice = "\n[output truncated]";
    let keep = token_budget_chars(max_tokens).saturating_sub(notice.chars().count());
    let prefix = take_chars(output, keep);
    let kept_lines = prefix.lines().count();
    let total = output.lines().count();

    StrategyOutcome {
        content: format!("{}{}", prefix, notice),
        kept_lines,
        summary: format!("Kept the first {} of {} lines", kept_lines, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(n: usize, width: usize) -> String {
        (1..=n)
            .map(|i| format!("{:0width$}", i, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            TruncationStrategy::for_tool("read", ToolCategory::FileRead),
            TruncationStrategy::HeadTail
        );
        assert_eq!(
            TruncationStrategy::for_tool("run", ToolCategory::Terminal),
            TruncationStrategy::Tail
        );
        assert_eq!(
            TruncationStrategy::for_tool("ls", ToolCategory::FileSearch),
            TruncationStrategy::CountSummary
        );
        assert_eq!(
            TruncationStrategy::for_tool("grep", ToolCategory::FileSearch),
            TruncationStrategy::Relevance
        );
        assert_eq!(
            TruncationStrategy::for_tool("write", ToolCategory::FileWrite),
            TruncationStrategy::Simple
        );
    }

    #[test]
    fn test_head_tail_keeps_both_ends() {
        let output = numbered_lines(200, 40);
        let outcome = apply(TruncationStrategy::HeadTail, &output, 100);

        assert!(outcome.content.contains(&format!("{:040}", 1)));
        assert!(outcome.content.contains(&format!("{:040}", 200)));
        assert!(outcome.content.contains("lines elided"));
        assert!(outcome.kept_lines < 200);
    }

    #[test]
    fn test_tail_keeps_final_lines() {
        let output = numbered_lines(100, 40);
        let outcome = apply(TruncationStrategy::Tail, &output, 50);

        assert!(outcome.content.contains(&format!("{:040}", 100)));
        assert!(!outcome.content.contains(&format!("{:040}", 1)));
        assert!(outcome.content.starts_with("[..."));
    }

    #[test]
    fn test_count_summary_totals() {
        let output = "src/\ndocs/\nmain.rs\nlib.rs\nREADME.md\n";
        let outcome = apply(TruncationStrategy::CountSummary, output, 100);

        assert!(outcome.content.starts_with("5 entries: 2 directories, 3 files"));
    }

    #[test]
    fn test_count_summary_samples_and_footer() {
        let output = (0..500)
            .map(|i| format!("file_{:04}.rs", i))
            .collect::<Vec<_>>()
            .join("\n");
        let outcome = apply(TruncationStrategy::CountSummary, &output, 50);

        assert!(outcome.content.contains("500 entries: 0 directories, 500 files"));
        assert!(outcome.content.contains("more entries"));
    }

    #[test]
    fn test_relevance_keeps_top_matches() {
        let output = numbered_lines(300, 40);
        let outcome = apply(TruncationStrategy::Relevance, &output, 50);

        assert!(outcome.content.contains(&format!("{:040}", 1)));
        assert!(outcome.content.contains("more matches"));
    }

    #[test]
    fn test_simple_hard_cut() {
        let output = "x".repeat(10_000);
        let outcome = apply(TruncationStrategy::Simple, &output, 100);

        assert!(outcome.content.ends_with("[output truncated]"));
        assert!(outcome.content.chars().count() <= 400);
    }
}

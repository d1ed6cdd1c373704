//! Output Truncation
//!
//! Strategy-based truncation that bounds the token footprint of any single
//! tool result while preserving the most useful fragment per tool category.
//!
//! - [`estimator`] - the shared token estimate (`ceil(chars / 4)`)
//! - [`strategy`] - per-category reduction strategies
//! - [`truncator`] - the entry point and section retrieval

pub mod estimator;
pub mod strategy;
pub mod truncator;

pub use estimator::{estimate_tokens, token_budget_chars, APPROX_CHARS_PER_TOKEN};
pub use strategy::{StrategyOutcome, TruncationStrategy};
pub use truncator::{get_section, OutputTruncator, TruncationOutcome, TruncatorConfig};

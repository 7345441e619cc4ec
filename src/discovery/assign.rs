//! LLM batch assignment: map bookmark indices onto a known taxonomy.
//!
//! Bookmarks go to the model in chunks of 50 with a compact
//! `[[bookmark, category], …]` output contract. Truncated output is
//! expected — only complete inner pairs are applied, and everything the
//! model failed to cover is handed back for the keyword fallback.

use super::llm::{strip_fences, LlmClient};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Bookmarks per LLM call.
pub const BATCH_SIZE: usize = 50;

/// Pause between consecutive LLM calls.
const CALL_GAP: Duration = Duration::from_millis(100);

static PAIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*(\d+)\s*,\s*(\d+)\s*\]").unwrap());

/// Result of a batch-assignment run.
#[derive(Debug, Default)]
pub struct AssignmentOutcome {
    /// bookmark index → category name.
    pub assigned: HashMap<usize, String>,
    /// Indices the model did not cover, in input order.
    pub unassigned: Vec<usize>,
}

/// Assign every bookmark to a category by LLM, in batches.
///
/// `categories` is the flattened taxonomy as `(index, name)`;
/// `bookmarks` is `(index, title, host)`. The progress callback fires
/// after each batch with `(assigned_so_far, total)`. Batches whose call
/// or parse fails simply leave their indices unassigned.
pub async fn batch_assign(
    llm: &LlmClient,
    categories: &[(usize, String)],
    bookmarks: &[(usize, String, String)],
    mut on_progress: impl FnMut(usize, usize),
) -> AssignmentOutcome {
    let total = bookmarks.len();
    let by_index: HashMap<usize, &str> = categories
        .iter()
        .map(|(i, name)| (*i, name.as_str()))
        .collect();

    let mut outcome = AssignmentOutcome::default();

    for (batch_no, batch) in bookmarks.chunks(BATCH_SIZE).enumerate() {
        if batch_no > 0 {
            tokio::time::sleep(CALL_GAP).await;
        }

        let prompt = build_prompt(categories, batch);
        match llm.complete(&prompt).await {
            Ok(text) => {
                for (bookmark_idx, category_idx) in parse_index_pairs(&text) {
                    if let Some(name) = by_index.get(&category_idx) {
                        outcome.assigned.insert(bookmark_idx, (*name).to_string());
                    }
                }
            }
            Err(e) => warn!("assignment batch {batch_no} failed: {e}"),
        }

        on_progress(outcome.assigned.len(), total);
    }

    outcome.unassigned = bookmarks
        .iter()
        .map(|(i, _, _)| *i)
        .filter(|i| !outcome.assigned.contains_key(i))
        .collect();
    outcome
}

fn build_prompt(categories: &[(usize, String)], batch: &[(usize, String, String)]) -> String {
    let category_lines: String = categories
        .iter()
        .map(|(i, name)| format!("{i}: {name}\n"))
        .collect();
    let bookmark_lines: String = batch
        .iter()
        .map(|(j, title, host)| format!("{j}: \"{title}\" ({host})\n"))
        .collect();

    format!(
        r#"Assign each bookmark to the best-fitting category.

CATEGORIES:
{category_lines}
BOOKMARKS:
{bookmark_lines}
Respond ONLY with a JSON array of [bookmarkIndex, categoryIndex] pairs, nothing else.
Example: [[0,2],[1,0]]"#
    )
}

/// Extract every complete `[j, i]` pair from model output.
///
/// The regex only matches closed pairs, so a truncated tail (no final
/// `]]`) silently drops whatever came after the last complete pair.
pub fn parse_index_pairs(text: &str) -> Vec<(usize, usize)> {
    let body = strip_fences(text);
    PAIR_RE
        .captures_iter(body)
        .filter_map(|cap| {
            let j = cap[1].parse::<usize>().ok()?;
            let i = cap[2].parse::<usize>().ok()?;
            Some((j, i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_array() {
        let pairs = parse_index_pairs("[[0,2],[1,0],[2,1]]");
        assert_eq!(pairs, vec![(0, 2), (1, 0), (2, 1)]);
    }

    #[test]
    fn test_parse_truncated_array() {
        // Cut off mid-pair: only the complete pairs survive.
        let pairs = parse_index_pairs("[[0,2],[1,0],[2,");
        assert_eq!(pairs, vec![(0, 2), (1, 0)]);
    }

    #[test]
    fn test_parse_fenced_and_noisy() {
        let pairs = parse_index_pairs("```json\n[[4,1]]\n```");
        assert_eq!(pairs, vec![(4, 1)]);
        let pairs = parse_index_pairs("Here you go: [[7, 3], [8, 3]]");
        assert_eq!(pairs, vec![(7, 3), (8, 3)]);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_index_pairs("no pairs here").is_empty());
        assert!(parse_index_pairs("").is_empty());
    }

    #[test]
    fn test_prompt_shape() {
        let categories = vec![(0usize, "Dev".to_string()), (1, "News".to_string())];
        let batch = vec![(0usize, "Repo".to_string(), "github.com".to_string())];
        let prompt = build_prompt(&categories, &batch);
        assert!(prompt.contains("0: Dev"));
        assert!(prompt.contains("\"Repo\" (github.com)"));
        assert!(prompt.contains("[bookmarkIndex, categoryIndex]"));
    }
}

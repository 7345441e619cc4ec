//! LLM-driven taxonomy discovery with the clustering fallback.

use super::llm::{strip_fences, LlmClient};
use super::{cluster, hierarchy, DiscoveredCategory, DiscoveryResult, DiscoverySource};
use crate::classify::slugify;
use crate::ingest::ParsedBookmark;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Discovery never looks at more than this many bookmarks.
const SAMPLE_CAP: usize = 200;
const TOP_HOSTS: usize = 15;

/// Discover a custom taxonomy for a set of bookmarks.
///
/// Uses the LLM when a client is available and its answer parses and
/// validates; otherwise degrades to deterministic clustering. Never
/// fails: the fallback always produces something (possibly empty for
/// empty input).
pub async fn discover_taxonomy(
    bookmarks: &[ParsedBookmark],
    llm_client: Option<&LlmClient>,
) -> DiscoveryResult {
    if let Some(client) = llm_client {
        let prompt = build_prompt(bookmarks);
        match client.complete(&prompt).await {
            Ok(text) => match parse_taxonomy(&text) {
                Some(result) => return result,
                None => warn!("discovery response failed to parse; using clustering fallback"),
            },
            Err(e) => warn!("discovery LLM call failed: {e}; using clustering fallback"),
        }
    }

    let (categories, reasoning) = cluster::cluster_taxonomy(bookmarks);
    DiscoveryResult {
        categories,
        reasoning,
        source: DiscoverySource::Clustering,
    }
}

/// Build the discovery prompt: bookmark sample, aggregate statistics,
/// and the output contract.
fn build_prompt(bookmarks: &[ParsedBookmark]) -> String {
    let sample = &bookmarks[..bookmarks.len().min(SAMPLE_CAP)];

    let mut lines = String::new();
    for bm in sample {
        let host = host_of(&bm.url).unwrap_or_default();
        match &bm.source_folder {
            Some(folder) => {
                lines.push_str(&format!("- \"{}\" ({host}) [folder: {folder}]\n", bm.title))
            }
            None => lines.push_str(&format!("- \"{}\" ({host})\n", bm.title)),
        }
    }

    let mut host_counts: HashMap<String, usize> = HashMap::new();
    let mut folder_counts: HashMap<String, usize> = HashMap::new();
    for bm in bookmarks {
        if let Some(host) = host_of(&bm.url) {
            *host_counts.entry(host).or_insert(0) += 1;
        }
        if let Some(folder) = &bm.source_folder {
            *folder_counts.entry(folder.clone()).or_insert(0) += 1;
        }
    }

    let mut hosts: Vec<(String, usize)> = host_counts.into_iter().collect();
    hosts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    hosts.truncate(TOP_HOSTS);
    let host_lines: String = hosts
        .iter()
        .map(|(host, count)| format!("- {host}: {count}\n"))
        .collect();

    let mut folders: Vec<(String, usize)> = folder_counts.into_iter().collect();
    folders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let folder_lines: String = folders
        .iter()
        .map(|(folder, count)| format!("- {folder}: {count}\n"))
        .collect();

    format!(
        r#"You are organizing a personal bookmark collection into a category hierarchy.

BOOKMARKS ({total} total, showing {shown}):
{lines}
TOP DOMAINS:
{host_lines}
FOLDERS:
{folder_lines}
Design a category hierarchy for this collection:
- 6 to 10 top-level categories
- at most 4 levels deep
- every category gets 3-5 lowercase keywords
- use parentName to nest a category under another, or null for top level
- estimatedCount is your guess at how many of the bookmarks belong there

Respond ONLY with valid JSON, no markdown, in exactly this shape:
{{"categories": [{{"name": "...", "description": "...", "keywords": ["..."], "parentName": null, "estimatedCount": 0}}], "reasoning": "..."}}"#,
        total = bookmarks.len(),
        shown = sample.len(),
        lines = lines,
        host_lines = host_lines,
        folder_lines = folder_lines,
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmTaxonomy {
    categories: Vec<LlmCategory>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmCategory {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    parent_name: Option<String>,
    #[serde(default)]
    estimated_count: u32,
}

/// Parse and validate an LLM taxonomy answer. None on any defect the
/// caller should treat as "LLM gave nothing usable".
fn parse_taxonomy(text: &str) -> Option<DiscoveryResult> {
    let body = strip_fences(text);
    let parsed: LlmTaxonomy = serde_json::from_str(body).ok()?;
    if parsed.categories.is_empty() {
        return None;
    }

    let mut roots = build_tree(parsed.categories);
    hierarchy::clamp_depth(&mut roots);

    let report = hierarchy::validate(&roots);
    if !report.valid {
        warn!("discovered hierarchy invalid: {:?}", report.errors);
        return None;
    }

    Some(DiscoveryResult {
        categories: roots,
        reasoning: parsed.reasoning,
        source: DiscoverySource::Llm,
    })
}

/// Assemble the flat category list into a forest by parentName.
///
/// Unknown parents and self-references become roots; nodes caught in a
/// parent cycle are broken out as roots rather than dropped.
fn build_tree(flat: Vec<LlmCategory>) -> Vec<DiscoveredCategory> {
    let name_to_idx: HashMap<String, usize> = flat
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.trim().to_lowercase(), i))
        .collect();

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut root_indices: Vec<usize> = Vec::new();

    for (i, cat) in flat.iter().enumerate() {
        let parent_idx = cat
            .parent_name
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("null"))
            .and_then(|p| name_to_idx.get(&p.to_lowercase()).copied())
            .filter(|&p| p != i);
        match parent_idx {
            Some(p) => children_of[p].push(i),
            None => root_indices.push(i),
        }
    }

    let mut visited = vec![false; flat.len()];
    let mut roots: Vec<DiscoveredCategory> = root_indices
        .iter()
        .map(|&i| build_node(i, &flat, &children_of, &mut visited))
        .collect();

    // Anything unvisited sits in a parent cycle; surface it as a root.
    for i in 0..flat.len() {
        if !visited[i] {
            roots.push(build_node(i, &flat, &children_of, &mut visited));
        }
    }

    roots
}

fn build_node(
    idx: usize,
    flat: &[LlmCategory],
    children_of: &[Vec<usize>],
    visited: &mut Vec<bool>,
) -> DiscoveredCategory {
    visited[idx] = true;
    let cat = &flat[idx];
    let children = children_of[idx]
        .iter()
        .filter(|&&c| !visited[c])
        .copied()
        .collect::<Vec<_>>()
        .into_iter()
        .map(|c| build_node(c, flat, children_of, visited))
        .collect();

    DiscoveredCategory {
        id: format!("cat_{}", idx + 1),
        name: cat.name.trim().to_string(),
        slug: slugify(&cat.name),
        description: cat.description.clone(),
        keywords: cat.keywords.clone(),
        parent_id: None, // set by clamp_depth
        level: 0,
        estimated_count: cat.estimated_count,
        children,
    }
}

fn host_of(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url.trim()).ok()?;
    parsed.host_str().map(|h| h.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_taxonomy() {
        let json = r#"{"categories": [
            {"name": "Development", "description": "Code", "keywords": ["code","git","api"], "parentName": null, "estimatedCount": 12},
            {"name": "Rust", "keywords": ["rust","cargo","crates"], "parentName": "Development", "estimatedCount": 5},
            {"name": "Cooking", "keywords": ["recipe","baking","kitchen"], "parentName": null, "estimatedCount": 7}
        ], "reasoning": "two obvious themes"}"#;

        let result = parse_taxonomy(json).unwrap();
        assert_eq!(result.source, DiscoverySource::Llm);
        assert_eq!(result.categories.len(), 2);
        let dev = result.categories.iter().find(|c| c.name == "Development").unwrap();
        assert_eq!(dev.children.len(), 1);
        assert_eq!(dev.children[0].slug, "rust");
        assert_eq!(dev.children[0].level, 2);
        assert_eq!(dev.children[0].parent_id.as_deref(), Some(dev.id.as_str()));
        assert_eq!(result.reasoning, "two obvious themes");
    }

    #[test]
    fn test_parse_tolerates_fences() {
        let fenced = "```json\n{\"categories\": [{\"name\": \"A\", \"keywords\": [\"a\"]}], \"reasoning\": \"\"}\n```";
        assert!(parse_taxonomy(fenced).is_some());
    }

    #[test]
    fn test_parse_rejects_garbage_and_duplicates() {
        assert!(parse_taxonomy("not json at all").is_none());
        assert!(parse_taxonomy("{\"categories\": [], \"reasoning\": \"\"}").is_none());

        let dup = r#"{"categories": [
            {"name": "Same", "keywords": ["a"]},
            {"name": "Same", "keywords": ["b"]}
        ], "reasoning": ""}"#;
        assert!(parse_taxonomy(dup).is_none());
    }

    #[test]
    fn test_parent_cycle_broken_to_roots() {
        let json = r#"{"categories": [
            {"name": "A", "keywords": ["a"], "parentName": "B"},
            {"name": "B", "keywords": ["b"], "parentName": "A"}
        ], "reasoning": ""}"#;
        let result = parse_taxonomy(json).unwrap();
        assert_eq!(result.categories.len(), 1);
        let total: usize = 1 + result.categories[0].children.len();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_prompt_mentions_constraints() {
        let bookmarks = vec![ParsedBookmark {
            url: "https://github.com/a/b".into(),
            title: "Repo".into(),
            description: None,
            source_folder: Some("Dev".into()),
        }];
        let prompt = build_prompt(&bookmarks);
        assert!(prompt.contains("6 to 10"));
        assert!(prompt.contains("4 levels"));
        assert!(prompt.contains("github.com"));
        assert!(prompt.contains("[folder: Dev]"));
    }
}

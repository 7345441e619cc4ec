//! Deterministic clustering fallback for taxonomy discovery.
//!
//! Three passes, each consuming the bookmarks it claims: source-folder
//! names (clusters of ≥ 3), known-domain categories (≥ 5), then frequent
//! extracted keywords (≥ 5). Whatever is left lands in `Uncategorized`.
//! Output depends only on the input, so repeated runs agree.

use super::DiscoveredCategory;
use crate::classify::{slugify, DOMAIN_CATEGORIES};
use crate::ingest::ParsedBookmark;
use crate::text::{extract_semantic_keywords, KeywordConfig};
use std::collections::BTreeMap;

const FOLDER_MIN_SIZE: usize = 3;
const DOMAIN_MIN_SIZE: usize = 5;
const KEYWORD_MIN_SIZE: usize = 5;
const CLUSTER_KEYWORD_CAP: usize = 15;

/// Cluster bookmarks into a flat category list plus a reasoning line.
pub fn cluster_taxonomy(bookmarks: &[ParsedBookmark]) -> (Vec<DiscoveredCategory>, String) {
    let mut consumed = vec![false; bookmarks.len()];
    // label → member indices; BTreeMap keeps output order stable.
    let mut clusters: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    // Pass 1: top-level source folders.
    let mut by_folder: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, bm) in bookmarks.iter().enumerate() {
        if let Some(folder) = &bm.source_folder {
            if let Some(top) = folder.split(" / ").next() {
                let top = top.trim();
                if !top.is_empty() {
                    by_folder.entry(top.to_string()).or_default().push(i);
                }
            }
        }
    }
    for (label, members) in by_folder {
        if members.len() >= FOLDER_MIN_SIZE {
            for &i in &members {
                consumed[i] = true;
            }
            clusters.entry(label).or_default().extend(members);
        }
    }

    // Pass 2: known-domain category hits.
    let mut by_domain: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, bm) in bookmarks.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        if let Some(host) = host_of(&bm.url) {
            if let Some((_, category)) = DOMAIN_CATEGORIES.iter().find(|(d, _)| *d == host) {
                by_domain.entry((*category).to_string()).or_default().push(i);
            }
        }
    }
    for (label, members) in by_domain {
        if members.len() >= DOMAIN_MIN_SIZE {
            for &i in &members {
                consumed[i] = true;
            }
            clusters.entry(label).or_default().extend(members);
        }
    }

    // Pass 3: frequent extracted keywords across the remainder.
    let mut by_keyword: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, bm) in bookmarks.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        let text = match &bm.description {
            Some(d) => format!("{} {}", bm.title, d),
            None => bm.title.clone(),
        };
        for kw in extract_semantic_keywords(&text, &KeywordConfig::default()) {
            by_keyword.entry(kw.text).or_default().push(i);
        }
    }
    // Biggest keyword clusters claim their members first.
    let mut keyword_clusters: Vec<(String, Vec<usize>)> = by_keyword.into_iter().collect();
    keyword_clusters.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    for (keyword, members) in keyword_clusters {
        let free: Vec<usize> = members.into_iter().filter(|&i| !consumed[i]).collect();
        if free.len() >= KEYWORD_MIN_SIZE {
            for &i in &free {
                consumed[i] = true;
            }
            clusters.entry(capitalize(&keyword)).or_default().extend(free);
        }
    }

    // Residue bucket.
    let residue: Vec<usize> = (0..bookmarks.len()).filter(|&i| !consumed[i]).collect();
    if !residue.is_empty() {
        clusters.entry("Uncategorized".to_string()).or_default().extend(residue);
    }

    let cluster_count = clusters.len();
    let categories: Vec<DiscoveredCategory> = clusters
        .into_iter()
        .enumerate()
        .map(|(idx, (label, members))| build_category(idx, &label, &members, bookmarks))
        .collect();

    let reasoning = format!(
        "Clustered {} bookmarks into {} groups by source folder, known domain, and keyword frequency.",
        bookmarks.len(),
        cluster_count
    );
    (categories, reasoning)
}

fn build_category(
    idx: usize,
    label: &str,
    members: &[usize],
    bookmarks: &[ParsedBookmark],
) -> DiscoveredCategory {
    // Top keywords across the cluster by frequency.
    let joined: String = members
        .iter()
        .map(|&i| bookmarks[i].title.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let keywords: Vec<String> = extract_semantic_keywords(
        &joined,
        &KeywordConfig {
            max_keywords: CLUSTER_KEYWORD_CAP,
            ..Default::default()
        },
    )
    .into_iter()
    .map(|kw| kw.text)
    .collect();

    DiscoveredCategory {
        id: format!("cluster_{}", idx + 1),
        name: label.to_string(),
        slug: slugify(label),
        description: format!("{} bookmarks grouped under \"{label}\"", members.len()),
        keywords,
        parent_id: None,
        level: 1,
        estimated_count: members.len() as u32,
        children: Vec::new(),
    }
}

fn host_of(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(url: &str, title: &str, folder: Option<&str>) -> ParsedBookmark {
        ParsedBookmark {
            url: url.to_string(),
            title: title.to_string(),
            description: None,
            source_folder: folder.map(str::to_string),
        }
    }

    #[test]
    fn test_folder_clusters_form_first() {
        let bookmarks = vec![
            bm("https://a.com/1", "One", Some("Work")),
            bm("https://a.com/2", "Two", Some("Work / Sub")),
            bm("https://a.com/3", "Three", Some("Work")),
            bm("https://b.com/", "Stray", None),
        ];
        let (categories, _) = cluster_taxonomy(&bookmarks);
        let work = categories.iter().find(|c| c.name == "Work").unwrap();
        assert_eq!(work.estimated_count, 3);
        assert!(categories.iter().any(|c| c.name == "Uncategorized"));
    }

    #[test]
    fn test_domain_pass_claims_known_hosts() {
        let bookmarks: Vec<ParsedBookmark> = (0..5)
            .map(|i| bm(&format!("https://github.com/r/{i}"), &format!("Repo {i}"), None))
            .collect();
        let (categories, _) = cluster_taxonomy(&bookmarks);
        let dev = categories.iter().find(|c| c.name == "Web Development").unwrap();
        assert_eq!(dev.estimated_count, 5);
        assert!(!categories.iter().any(|c| c.name == "Uncategorized"));
    }

    #[test]
    fn test_keyword_pass_and_determinism() {
        let bookmarks: Vec<ParsedBookmark> = (0..6)
            .map(|i| bm(&format!("https://site{i}.example/"), "Sourdough baking notes", None))
            .collect();
        let (first, _) = cluster_taxonomy(&bookmarks);
        let (second, _) = cluster_taxonomy(&bookmarks);
        assert!(first.iter().any(|c| c.estimated_count == 6));
        let names_a: Vec<&str> = first.iter().map(|c| c.name.as_str()).collect();
        let names_b: Vec<&str> = second.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_empty_input_is_empty() {
        let (categories, _) = cluster_taxonomy(&[]);
        assert!(categories.is_empty());
    }
}

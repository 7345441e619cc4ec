//! Hierarchy post-processing: depth clamping, validation, and stats.

use super::DiscoveredCategory;
use serde::Serialize;
use std::collections::HashSet;

/// Maximum allowed depth of the category forest (roots are level 1).
pub const MAX_DEPTH: u32 = 4;

/// Soft bounds on the number of roots the discoverer should produce.
pub const ROOT_RANGE: (usize, usize) = (6, 10);

/// Validation outcome for a discovered forest.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Aggregate shape statistics for a discovered forest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub total_categories: usize,
    pub max_depth: u32,
    /// Category counts indexed by level - 1.
    pub categories_per_level: Vec<usize>,
    pub total_keywords: usize,
    pub total_estimated_bookmarks: u32,
}

/// Renumber levels from the roots down and flatten anything deeper than
/// [`MAX_DEPTH`]: grandchildren of a maxed-out node are promoted to be
/// its siblings and the intermediate keeps no children.
pub fn clamp_depth(roots: &mut Vec<DiscoveredCategory>) {
    clamp_level(roots, 1, None);
}

fn clamp_level(nodes: &mut Vec<DiscoveredCategory>, level: u32, parent_id: Option<&str>) {
    let mut promoted: Vec<DiscoveredCategory> = Vec::new();

    for node in nodes.iter_mut() {
        node.level = level;
        node.parent_id = parent_id.map(str::to_string);
        if level == MAX_DEPTH && !node.children.is_empty() {
            let children = std::mem::take(&mut node.children);
            collect_flattened(children, &mut promoted);
        }
    }

    for mut extra in promoted {
        extra.level = level;
        extra.parent_id = parent_id.map(str::to_string);
        nodes.push(extra);
    }

    for node in nodes.iter_mut() {
        let id = node.id.clone();
        clamp_level(&mut node.children, level + 1, Some(&id));
    }
}

fn collect_flattened(nodes: Vec<DiscoveredCategory>, out: &mut Vec<DiscoveredCategory>) {
    for mut node in nodes {
        let children = std::mem::take(&mut node.children);
        out.push(node);
        collect_flattened(children, out);
    }
}

/// Validate a discovered forest: global slug uniqueness, depth, and the
/// soft root-count constraint.
pub fn validate(roots: &[DiscoveredCategory]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if roots.is_empty() {
        errors.push("no categories discovered".to_string());
    }

    let (min_roots, max_roots) = ROOT_RANGE;
    if !roots.is_empty() && (roots.len() < min_roots || roots.len() > max_roots) {
        warnings.push(format!(
            "expected {min_roots}-{max_roots} root categories, got {}",
            roots.len()
        ));
    }

    let mut slugs: HashSet<String> = HashSet::new();
    let mut stack: Vec<(&DiscoveredCategory, u32)> = roots.iter().map(|r| (r, 1)).collect();
    while let Some((node, level)) = stack.pop() {
        if node.name.trim().is_empty() {
            errors.push("category with empty name".to_string());
        }
        if !slugs.insert(node.slug.clone()) {
            errors.push(format!("duplicate slug: {}", node.slug));
        }
        if level > MAX_DEPTH {
            errors.push(format!(
                "category '{}' exceeds max depth {MAX_DEPTH}",
                node.name
            ));
        }
        if node.keywords.is_empty() {
            warnings.push(format!("category '{}' has no keywords", node.name));
        }
        for child in &node.children {
            stack.push((child, level + 1));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Compute shape statistics for a discovered forest.
pub fn stats(roots: &[DiscoveredCategory]) -> TreeStats {
    let mut per_level: Vec<usize> = Vec::new();
    let mut total = 0usize;
    let mut keywords = 0usize;
    let mut estimated = 0u32;
    let mut max_depth = 0u32;

    let mut stack: Vec<(&DiscoveredCategory, u32)> = roots.iter().map(|r| (r, 1)).collect();
    while let Some((node, level)) = stack.pop() {
        total += 1;
        keywords += node.keywords.len();
        estimated += node.estimated_count;
        max_depth = max_depth.max(level);
        let idx = (level - 1) as usize;
        if per_level.len() <= idx {
            per_level.resize(idx + 1, 0);
        }
        per_level[idx] += 1;
        for child in &node.children {
            stack.push((child, level + 1));
        }
    }

    TreeStats {
        total_categories: total,
        max_depth,
        categories_per_level: per_level,
        total_keywords: keywords,
        total_estimated_bookmarks: estimated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, children: Vec<DiscoveredCategory>) -> DiscoveredCategory {
        DiscoveredCategory {
            id: id.to_string(),
            name: name.to_string(),
            slug: crate::classify::slugify(name),
            keywords: vec!["k".to_string()],
            children,
            ..Default::default()
        }
    }

    fn chain(depth: usize) -> DiscoveredCategory {
        // a > b > c > … nested to the requested depth.
        let mut current = node(&format!("n{depth}"), &format!("Level{depth}"), vec![]);
        for i in (1..depth).rev() {
            current = node(&format!("n{i}"), &format!("Level{i}"), vec![current]);
        }
        current
    }

    #[test]
    fn test_clamp_promotes_overdeep_nodes() {
        let mut roots = vec![chain(6)];
        clamp_depth(&mut roots);

        let report = validate(&roots);
        assert!(report.valid, "errors: {:?}", report.errors);
        let s = stats(&roots);
        assert_eq!(s.max_depth, 4);
        assert_eq!(s.total_categories, 6);
        // Levels 5 and 6 were promoted next to the level-4 node.
        assert_eq!(s.categories_per_level, vec![1, 1, 1, 3]);
    }

    #[test]
    fn test_validate_flags_duplicate_slugs() {
        let roots = vec![node("a", "Same Name", vec![]), node("b", "Same Name", vec![])];
        let report = validate(&roots);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("duplicate slug")));
    }

    #[test]
    fn test_validate_warns_on_root_count() {
        let roots = vec![node("a", "Only One", vec![])];
        let report = validate(&roots);
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("root categories")));
    }

    #[test]
    fn test_stats_counts_levels() {
        let roots = vec![
            node("a", "A", vec![node("b", "B", vec![]), node("c", "C", vec![])]),
            node("d", "D", vec![]),
        ];
        let s = stats(&roots);
        assert_eq!(s.total_categories, 4);
        assert_eq!(s.max_depth, 2);
        assert_eq!(s.categories_per_level, vec![2, 2]);
        assert_eq!(s.total_keywords, 4);
    }
}

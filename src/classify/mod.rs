//! Deterministic rule-based categorization.
//!
//! A bookmark is scored against every taxonomy entry; the best score
//! above the threshold names the category, otherwise the sentinel
//! [`OTHER_LABEL`] is returned and the caller maps it to its fallback
//! category.

pub mod taxonomy;

use crate::text::Keyword;
use once_cell::sync::Lazy;
use regex::Regex;

pub use taxonomy::{slugify, CategoryRule, DEFAULT_TAXONOMY, DOMAIN_CATEGORIES};

/// Minimum winning score; anything below resolves to [`OTHER_LABEL`].
pub const MIN_SCORE: u32 = 4;

/// Sentinel returned when no category clears the threshold.
pub const OTHER_LABEL: &str = "Other";

/// The classifier's view of one bookmark.
#[derive(Debug, Clone, Default)]
pub struct BookmarkSignals<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub keywords: &'a [Keyword],
}

/// Result of scoring a bookmark.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: String,
    pub score: u32,
    /// Advisory 0–100 confidence derived from the winning score.
    pub confidence: u8,
}

struct CompiledRule {
    name: &'static str,
    weight: u32,
    keywords: &'static [&'static str],
    keyword_res: Option<Vec<Regex>>,
    patterns: Vec<Regex>,
    indicators: &'static [&'static str],
    exclusions: &'static [&'static str],
}

/// The default taxonomy with its regexes compiled once.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

static DEFAULT_RULESET: Lazy<RuleSet> = Lazy::new(|| RuleSet::compile(DEFAULT_TAXONOMY));

impl RuleSet {
    pub fn default_taxonomy() -> &'static RuleSet {
        &DEFAULT_RULESET
    }

    fn compile(rules: &'static [CategoryRule]) -> Self {
        let compiled = rules
            .iter()
            .map(|rule| CompiledRule {
                name: rule.name,
                weight: rule.weight,
                keywords: rule.keywords,
                keyword_res: rule.whole_word.then(|| {
                    rule.keywords
                        .iter()
                        .map(|kw| {
                            Regex::new(&format!(r"\b{}\b", regex::escape(kw)))
                                .expect("static keyword regex")
                        })
                        .collect()
                }),
                patterns: rule
                    .url_patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("static url regex"))
                    .collect(),
                indicators: rule.indicators,
                exclusions: rule.exclusions,
            })
            .collect();
        Self { rules: compiled }
    }

    /// Score a bookmark against every entry and pick the winner.
    pub fn classify(&self, signals: &BookmarkSignals) -> Classification {
        let combined = combined_text(signals);
        let url = signals.url.to_lowercase();
        let host = host_of(&url);

        let mut best: Option<(&'static str, u32)> = None;

        for rule in &self.rules {
            let score = self.score_rule(rule, &combined, &url, host.as_deref(), signals.keywords);
            // Strictly-greater keeps declaration order as the tie-break.
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((rule.name, score));
            }
        }

        match best {
            Some((name, score)) if score >= MIN_SCORE => Classification {
                category: name.to_string(),
                confidence: confidence_of(score),
                score,
            },
            _ => Classification {
                category: OTHER_LABEL.to_string(),
                score: best.map(|(_, s)| s).unwrap_or(0),
                confidence: 0,
            },
        }
    }

    fn score_rule(
        &self,
        rule: &CompiledRule,
        combined: &str,
        url: &str,
        host: Option<&str>,
        keywords: &[Keyword],
    ) -> u32 {
        // Hard exclusion: one matching phrase vetoes the category.
        if rule.exclusions.iter().any(|ex| combined.contains(ex)) {
            return 0;
        }

        let mut score = 0u32;

        if rule.patterns.iter().any(|re| re.is_match(url)) {
            score += 10 * rule.weight;
        }

        if let Some(host) = host {
            let hit = DOMAIN_CATEGORIES
                .iter()
                .any(|(domain, category)| *domain == host && *category == rule.name);
            if hit {
                score += 15;
            }
        }

        match &rule.keyword_res {
            Some(regexes) => {
                for re in regexes {
                    if re.is_match(combined) {
                        score += rule.weight;
                    }
                }
            }
            None => {
                for kw in rule.keywords {
                    if combined.contains(kw) {
                        score += rule.weight;
                    }
                }
            }
        }

        for phrase in rule.indicators {
            if combined.contains(phrase) {
                score += 2 * rule.weight;
            }
        }

        for kw in keywords {
            let text = kw.text.as_str();
            if rule.keywords.iter().any(|rk| overlaps(text, rk)) {
                score += 3 * rule.weight;
            }
            if rule.indicators.iter().any(|ind| overlaps(text, ind)) {
                score += 2 * rule.weight;
            }
        }

        score
    }
}

/// Keyword-only matching against arbitrary (name, keywords) categories.
///
/// Used on the custom-taxonomy path when the LLM left a bookmark
/// unassigned: the category with the most keyword hits wins, or None
/// when nothing matches at all.
pub fn keyword_fallback(signals: &BookmarkSignals, categories: &[(String, Vec<String>)]) -> Option<String> {
    let combined = combined_text(signals);

    let mut best: Option<(&str, usize)> = None;
    for (name, keywords) in categories {
        let hits = keywords
            .iter()
            .filter(|kw| !kw.is_empty() && combined.contains(&kw.to_lowercase()))
            .count();
        if hits > 0 && best.map_or(true, |(_, h)| hits > h) {
            best = Some((name, hits));
        }
    }
    best.map(|(name, _)| name.to_string())
}

/// Two terms overlap when either contains the other; both sides are
/// already lowercased.
fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn combined_text(signals: &BookmarkSignals) -> String {
    let mut combined = String::with_capacity(
        signals.url.len() + signals.title.len() + signals.description.len() + 64,
    );
    combined.push_str(signals.url);
    combined.push(' ');
    combined.push_str(signals.title);
    combined.push(' ');
    combined.push_str(signals.description);
    for kw in signals.keywords {
        combined.push(' ');
        combined.push_str(&kw.text);
    }
    combined.to_lowercase()
}

fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn confidence_of(score: u32) -> u8 {
    (score.saturating_mul(4)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(text: &str, score: u32) -> Keyword {
        Keyword {
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn test_github_scores_web_development() {
        let signals = BookmarkSignals {
            url: "https://github.com/a/b",
            title: "Repo",
            description: "",
            keywords: &[],
        };
        let result = RuleSet::default_taxonomy().classify(&signals);
        assert_eq!(result.category, "Web Development");
        // URL pattern (30) + domain table (15) + "github" keyword (3).
        assert!(result.score >= 45, "score was {}", result.score);
        assert!(result.confidence > 0);
    }

    #[test]
    fn test_exclusion_keeps_pharma_out_of_home_garden() {
        let hints = [kw("pharmaceutical", 100), kw("health", 80)];
        let signals = BookmarkSignals {
            url: "https://www.novartis.com/",
            title: "Novartis | Home",
            description: "",
            keywords: &hints,
        };
        let result = RuleSet::default_taxonomy().classify(&signals);
        assert_eq!(result.category, "Pharmaceutical Companies");
    }

    #[test]
    fn test_below_threshold_is_other() {
        let signals = BookmarkSignals {
            url: "https://example.org/zzz",
            title: "qqq",
            description: "",
            keywords: &[],
        };
        let result = RuleSet::default_taxonomy().classify(&signals);
        assert_eq!(result.category, OTHER_LABEL);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn test_whole_word_boundary() {
        // "tax" must not fire inside "taxonomy" for the whole-word
        // Finance entry.
        let signals = BookmarkSignals {
            url: "https://example.org/",
            title: "A taxonomy of butterflies",
            description: "",
            keywords: &[],
        };
        let result = RuleSet::default_taxonomy().classify(&signals);
        assert_ne!(result.category, "Finance");
    }

    #[test]
    fn test_keyword_fallback_counts_hits() {
        let signals = BookmarkSignals {
            url: "https://example.com/sourdough",
            title: "Sourdough starter guide",
            description: "flour water patience",
            keywords: &[],
        };
        let categories = vec![
            ("Baking".to_string(), vec!["sourdough".to_string(), "flour".to_string()]),
            ("Fitness".to_string(), vec!["workout".to_string()]),
        ];
        assert_eq!(
            keyword_fallback(&signals, &categories).as_deref(),
            Some("Baking")
        );
        assert_eq!(keyword_fallback(&signals, &[]), None);
    }
}

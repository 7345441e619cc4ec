//! Text processing for classification: cleaning, tokenization, semantic
//! keyword extraction, and domain-hint tagging.

pub mod stopwords;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub use stopwords::is_stop_word;

/// Two-word phrases kept whole during extraction.
pub static COMPOUND_TERMS: &[&str] = &[
    "machine learning", "artificial intelligence", "deep learning", "data science",
    "web development", "open source", "software engineering", "computer science",
    "version control", "operating system", "cloud computing", "big data",
    "neural network", "natural language", "search engine", "code review",
    "unit testing", "data structure", "design pattern", "functional programming",
    "game engine", "mobile app", "user experience", "user interface",
    "graphic design", "web design", "digital marketing", "content marketing",
    "supply chain", "small business", "real estate", "social media",
    "stock market", "mutual fund", "credit card", "personal finance",
    "interior design", "home improvement", "home decor", "mental health",
    "weight loss", "healthy eating", "meal prep", "video game",
    "board game", "science fiction", "climate change", "remote work",
    "project management", "road trip", "travel guide", "national park",
    "theme park", "video editing", "photo editing", "music production",
    "language learning", "online course", "prompt engineering", "knowledge base",
];

/// Words whose frequency score is doubled: they carry strong topical signal.
static DOMAIN_TERMS: &[&str] = &[
    "api", "sdk", "cli", "database", "server", "framework", "library", "compiler",
    "frontend", "backend", "devops", "kubernetes", "docker", "linux", "python",
    "javascript", "typescript", "rust", "java", "golang", "react", "github",
    "programming", "developer", "software", "algorithm", "terminal", "repository",
    "recipe", "recipes", "ingredient", "ingredients", "baking", "cooking", "cuisine",
    "workout", "fitness", "yoga", "nutrition", "vitamin", "symptom", "diagnosis",
    "therapy", "medical", "pharmaceutical", "clinical", "vaccine", "wellness",
    "invest", "investing", "investment", "portfolio", "dividend", "crypto",
    "bitcoin", "mortgage", "budget", "banking", "trading", "finance",
    "tutorial", "course", "lecture", "curriculum", "university", "research",
    "itinerary", "flight", "flights", "hotel", "hotels", "destination", "travel",
    "streaming", "podcast", "playlist", "album", "cinema", "movie", "movies",
    "garden", "gardening", "furniture", "renovation", "diy", "decor",
    "news", "headline", "politics", "election", "journalism",
    "sale", "discount", "coupon", "shipping", "shopping", "marketplace",
];

/// Regex → tag table for host/path hints.
static DOMAIN_HINTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"github\.com|gitlab\.com|bitbucket\.org", "development"),
        (r"stackoverflow\.com|stackexchange\.com", "development"),
        (r"news\.ycombinator\.com|lobste\.rs", "technology"),
        (r"recipe\.|allrecipes\.|epicurious\.|foodnetwork\.|seriouseats\.", "food"),
        (r"youtube\.com|vimeo\.com|twitch\.tv", "video"),
        (r"netflix\.|hulu\.|disneyplus\.|primevideo\.", "streaming"),
        (r"amazon\.|ebay\.|etsy\.|aliexpress\.", "shopping"),
        (
            r"twitter\.com|x\.com|facebook\.com|instagram\.com|reddit\.com|linkedin\.com",
            "social",
        ),
        (
            r"novartis\.|pfizer\.|roche\.|merck\.|astrazeneca\.|gsk\.|sanofi\.|bayer\.",
            "pharmaceutical",
        ),
        (r"webmd\.|mayoclinic\.|nih\.gov|healthline\.", "health"),
        (r"bloomberg\.|marketwatch\.|investopedia\.|nasdaq\.|fidelity\.", "finance"),
        (r"booking\.|tripadvisor\.|expedia\.|airbnb\.|lonelyplanet\.", "travel"),
        (r"coursera\.|udemy\.|edx\.|khanacademy\.|brilliant\.", "education"),
        (r"nytimes\.|bbc\.|cnn\.|theguardian\.|reuters\.|apnews\.", "news"),
        (r"spotify\.|soundcloud\.|bandcamp\.|last\.fm", "music"),
        (r"arxiv\.org|doi\.org|nature\.com|sciencedirect\.", "research"),
        (r"/docs/|/documentation/|readthedocs\.", "documentation"),
    ]
    .into_iter()
    .map(|(pat, tag)| (Regex::new(pat).expect("static hint regex"), tag))
    .collect()
});

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[a-zA-Z]+;|&#\d+;").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").unwrap());
static RE_CAMEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9' ]").unwrap());

/// Extraction tuning knobs.
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    pub min_word_length: usize,
    pub max_keywords: usize,
    pub keep_compounds: bool,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_word_length: 2,
            max_keywords: 15,
            keep_compounds: true,
        }
    }
}

/// A scored keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    pub score: u32,
}

/// Normalize free text down to lowercased space-separated tokens.
///
/// Strips HTML entities, URLs, and email-shaped runs; splits CamelCase,
/// `snake_case`, and `kebab-case`; collapses whitespace.
pub fn clean(text: &str) -> String {
    // Fold typographic punctuation before anything else.
    let text = text
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{a0}', " ");

    let text = RE_ENTITY.replace_all(&text, " ");
    let text = RE_URL.replace_all(&text, " ");
    let text = RE_EMAIL.replace_all(&text, " ");
    let text = RE_CAMEL.replace_all(&text, "$1 $2");
    let text = text.replace(['_', '-'], " ").to_lowercase();
    let text = RE_NON_WORD.replace_all(&text, " ");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenize a URL's host and path into candidate keywords.
pub fn extract_url_tokens(raw_url: &str) -> Vec<String> {
    let parsed = match url::Url::parse(raw_url.trim()) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let mut tokens = Vec::new();

    if let Some(host) = parsed.host_str() {
        let labels: Vec<&str> = host.split('.').collect();
        // Skip the leading "www" and the trailing TLD label.
        let end = labels.len().saturating_sub(1);
        for label in &labels[..end] {
            if label.eq_ignore_ascii_case("www") {
                continue;
            }
            for piece in label.split(['-', '_']) {
                tokens.push(piece.to_string());
            }
        }
    }

    for segment in parsed.path().split('/') {
        for piece in segment.split(['-', '_']) {
            tokens.push(piece.to_string());
        }
    }

    tokens
        .into_iter()
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() >= 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Tags for a URL from the fixed host/path hint table.
pub fn domain_hints(raw_url: &str) -> Vec<String> {
    let lowered = raw_url.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for (re, tag) in DOMAIN_HINTS.iter() {
        if re.is_match(&lowered) && !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags
}

/// Extract the top-scoring keywords from free text.
///
/// Compound terms from [`COMPOUND_TERMS`] are kept whole at score 100
/// (bigrams formed only after cleaning still match at 50); remaining
/// words score by frequency, doubled for domain terms. Stop words,
/// numerics, and short tokens are dropped.
pub fn extract_semantic_keywords(text: &str, config: &KeywordConfig) -> Vec<Keyword> {
    let cleaned = clean(text);
    let words: Vec<&str> = cleaned.split(' ').filter(|w| !w.is_empty()).collect();

    let mut scores: HashMap<String, u32> = HashMap::new();
    let mut consumed = vec![false; words.len()];

    if config.keep_compounds {
        // Whole-phrase pass over the cleaned text.
        for phrase in COMPOUND_TERMS {
            if contains_phrase(&cleaned, phrase) {
                scores.insert((*phrase).to_string(), 100);
            }
        }
        // Adjacent-token pass catches pairs produced by case splitting.
        for (i, pair) in words.windows(2).enumerate() {
            let bigram = format!("{} {}", pair[0], pair[1]);
            if COMPOUND_TERMS.contains(&bigram.as_str()) {
                scores.entry(bigram).or_insert(50);
                consumed[i] = true;
                consumed[i + 1] = true;
            }
        }
    }

    let mut freq: HashMap<&str, u32> = HashMap::new();
    for (i, word) in words.iter().enumerate() {
        if consumed[i]
            || word.len() < config.min_word_length
            || word.chars().all(|c| c.is_ascii_digit())
            || is_stop_word(word)
        {
            continue;
        }
        *freq.entry(word).or_insert(0) += 1;
    }

    for (word, count) in freq {
        let score = if DOMAIN_TERMS.contains(&word) {
            count * 2
        } else {
            count
        };
        scores.insert(word.to_string(), score);
    }

    let mut keywords: Vec<Keyword> = scores
        .into_iter()
        .map(|(text, score)| Keyword { text, score })
        .collect();
    keywords.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.text.cmp(&b.text)));
    keywords.truncate(config.max_keywords);
    keywords
}

/// Whole-word phrase containment check.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(idx, _)| {
        let before_ok = idx == 0 || haystack.as_bytes()[idx - 1] == b' ';
        let end = idx + phrase.len();
        let after_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_noise() {
        let cleaned = clean("Check https://example.com &amp; mail me@example.com for the CamelCaseTitle snake_case kebab-case");
        assert!(!cleaned.contains("http"));
        assert!(!cleaned.contains('@'));
        assert!(!cleaned.contains("&amp;"));
        assert!(cleaned.contains("camel case title"));
        assert!(cleaned.contains("snake case"));
        assert!(cleaned.contains("kebab case"));
    }

    #[test]
    fn test_keywords_score_compounds_high() {
        let kws = extract_semantic_keywords(
            "An introduction to machine learning and machine learning pipelines",
            &KeywordConfig::default(),
        );
        let top = &kws[0];
        assert_eq!(top.text, "machine learning");
        assert_eq!(top.score, 100);
    }

    #[test]
    fn test_keywords_drop_stop_words_and_numbers() {
        let kws = extract_semantic_keywords(
            "the 2024 guide is about 100 things",
            &KeywordConfig::default(),
        );
        assert!(kws.iter().all(|k| k.text != "the" && k.text != "2024" && k.text != "100"));
        assert!(kws.iter().any(|k| k.text == "guide"));
    }

    #[test]
    fn test_domain_terms_doubled() {
        let kws = extract_semantic_keywords(
            "rust compiler rust notes notes",
            &KeywordConfig::default(),
        );
        let rust = kws.iter().find(|k| k.text == "rust").unwrap();
        let notes = kws.iter().find(|k| k.text == "notes").unwrap();
        assert_eq!(rust.score, 4); // 2 occurrences, doubled
        assert_eq!(notes.score, 2);
    }

    #[test]
    fn test_domain_hints_table() {
        assert_eq!(domain_hints("https://github.com/a/b"), vec!["development"]);
        assert!(domain_hints("https://www.novartis.com/")
            .contains(&"pharmaceutical".to_string()));
        assert!(domain_hints("https://example.org/plain").is_empty());
    }

    #[test]
    fn test_url_tokens() {
        let tokens = extract_url_tokens("https://www.rust-recipes.dev/spicy-noodles/2024");
        assert!(tokens.contains(&"rust".to_string()));
        assert!(tokens.contains(&"recipes".to_string()));
        assert!(tokens.contains(&"spicy".to_string()));
        assert!(tokens.contains(&"noodles".to_string()));
        assert!(!tokens.contains(&"2024".to_string()));
        assert!(!tokens.contains(&"www".to_string()));
    }

    #[test]
    fn test_max_keywords_respected() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi rho sigma tau";
        let kws = extract_semantic_keywords(
            text,
            &KeywordConfig {
                max_keywords: 5,
                ..Default::default()
            },
        );
        assert_eq!(kws.len(), 5);
    }
}

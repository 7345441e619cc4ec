//! The built-in weighted taxonomy: 9 roots plus a handful of preset
//! subcategories. Each entry carries the signals the rule classifier
//! scores against; order matters because ties resolve to the earlier
//! entry.

/// One taxonomy entry.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: &'static str,
    /// Preset parent category name; None for roots.
    pub parent: Option<&'static str>,
    pub weight: u32,
    pub keywords: &'static [&'static str],
    pub url_patterns: &'static [&'static str],
    /// Phrases that indicate on-topic page content.
    pub indicators: &'static [&'static str],
    /// Phrases that force this category's score to zero.
    pub exclusions: &'static [&'static str],
    /// Match keywords on word boundaries instead of substrings.
    pub whole_word: bool,
}

pub static DEFAULT_TAXONOMY: &[CategoryRule] = &[
    CategoryRule {
        name: "Web Development",
        parent: Some("Technology"),
        weight: 3,
        keywords: &[
            "github", "gitlab", "code", "coding", "programming", "developer", "javascript",
            "typescript", "python", "rust", "api", "sdk", "framework", "frontend", "backend",
            "repository", "devops", "database", "compiler", "debugging",
        ],
        url_patterns: &[
            r"github\.com", r"gitlab\.com", r"bitbucket\.org", r"stackoverflow\.com",
            r"readthedocs", r"/docs?/",
        ],
        indicators: &[
            "pull request", "open source", "command line", "source code", "web development",
            "package manager",
        ],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Technology",
        parent: None,
        weight: 2,
        keywords: &[
            "tech", "technology", "software", "hardware", "gadget", "computer", "laptop",
            "smartphone", "startup", "innovation", "cloud", "security", "encryption", "robot",
        ],
        url_patterns: &[r"news\.ycombinator\.com", r"arstechnica\.", r"theverge\.", r"wired\."],
        indicators: &["artificial intelligence", "machine learning", "product launch"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Pharmaceutical Companies",
        parent: Some("Health"),
        weight: 3,
        keywords: &[
            "pharmaceutical", "pharma", "biotech", "clinical", "vaccine", "therapeutics",
            "medicines", "fda", "oncology", "biopharmaceutical",
        ],
        url_patterns: &[
            r"novartis\.", r"pfizer\.", r"roche\.", r"merck\.", r"astrazeneca\.", r"gsk\.",
            r"sanofi\.", r"bayer\.", r"johnson\s?&\s?johnson",
        ],
        indicators: &["clinical trial", "drug development", "pipeline of medicines"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Health",
        parent: None,
        weight: 2,
        keywords: &[
            "health", "medical", "doctor", "symptom", "symptoms", "diagnosis", "treatment",
            "therapy", "fitness", "workout", "nutrition", "diet", "wellness", "medicine",
            "clinic", "exercise",
        ],
        url_patterns: &[r"webmd\.", r"mayoclinic\.", r"healthline\.", r"nih\.gov"],
        indicators: &["mental health", "weight loss", "healthy eating"],
        exclusions: &[],
        whole_word: true,
    },
    CategoryRule {
        name: "Finance",
        parent: None,
        weight: 2,
        keywords: &[
            "finance", "invest", "investing", "investment", "stock", "stocks", "portfolio",
            "dividend", "etf", "crypto", "bitcoin", "bank", "banking", "mortgage", "loan",
            "budget", "trading", "retirement", "tax",
        ],
        url_patterns: &[r"bloomberg\.", r"investopedia\.", r"nasdaq\.", r"fool\.", r"fidelity\."],
        indicators: &["stock market", "mutual fund", "personal finance", "interest rate"],
        exclusions: &[],
        whole_word: true,
    },
    CategoryRule {
        name: "News & Media",
        parent: None,
        weight: 2,
        keywords: &[
            "news", "headline", "headlines", "breaking", "journalism", "politics", "election",
            "reporter", "press", "editorial", "opinion", "briefing",
        ],
        url_patterns: &[
            r"nytimes\.", r"bbc\.", r"cnn\.", r"theguardian\.", r"reuters\.", r"apnews\.",
            r"washingtonpost\.",
        ],
        indicators: &["breaking news", "latest news", "live coverage"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Shopping",
        parent: None,
        weight: 2,
        keywords: &[
            "shop", "store", "buy", "price", "prices", "cart", "deal", "deals", "discount",
            "coupon", "sale", "shipping", "marketplace", "checkout", "order",
        ],
        url_patterns: &[r"amazon\.", r"ebay\.", r"etsy\.", r"aliexpress\.", r"walmart\."],
        indicators: &["add to cart", "free shipping", "best price"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Social Media",
        parent: Some("Entertainment"),
        weight: 3,
        keywords: &[
            "social", "twitter", "facebook", "instagram", "reddit", "linkedin", "tiktok",
            "community", "forum", "followers", "thread",
        ],
        url_patterns: &[
            r"twitter\.com", r"//x\.com", r"facebook\.com", r"instagram\.com", r"reddit\.com",
            r"linkedin\.com", r"tiktok\.com", r"mastodon\.",
        ],
        indicators: &["social media", "join the conversation"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Entertainment",
        parent: None,
        weight: 2,
        keywords: &[
            "movie", "movies", "film", "show", "series", "music", "game", "games", "gaming",
            "streaming", "podcast", "celebrity", "trailer", "episode", "concert", "anime",
        ],
        url_patterns: &[
            r"netflix\.", r"youtube\.com", r"spotify\.", r"twitch\.tv", r"imdb\.", r"hulu\.",
        ],
        indicators: &["watch online", "video game", "box office"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Education",
        parent: None,
        weight: 2,
        keywords: &[
            "course", "courses", "learn", "learning", "tutorial", "lecture", "university",
            "college", "school", "curriculum", "study", "education", "academy", "research",
            "science", "textbook",
        ],
        url_patterns: &[
            r"coursera\.", r"udemy\.", r"edx\.", r"khanacademy\.", r"arxiv\.org", r"\.edu/",
        ],
        indicators: &["online course", "language learning", "study guide"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Travel",
        parent: None,
        weight: 2,
        keywords: &[
            "travel", "trip", "flight", "flights", "hotel", "hotels", "vacation", "destination",
            "itinerary", "tourism", "airline", "cruise", "passport", "backpacking",
        ],
        url_patterns: &[
            r"booking\.", r"tripadvisor\.", r"airbnb\.", r"expedia\.", r"lonelyplanet\.",
            r"kayak\.",
        ],
        indicators: &["travel guide", "road trip", "national park", "things to do"],
        exclusions: &[],
        whole_word: false,
    },
    CategoryRule {
        name: "Home & Garden",
        parent: None,
        weight: 2,
        keywords: &[
            "home", "garden", "gardening", "kitchen", "furniture", "decor", "diy", "renovation",
            "lawn", "plants", "interior", "cleaning", "recipe", "recipes", "cooking", "baking",
        ],
        url_patterns: &[r"allrecipes\.", r"epicurious\.", r"recipe\.", r"houzz\.", r"bhg\."],
        indicators: &["home improvement", "interior design", "step by step recipe"],
        // "Home" appears in the page chrome of countless corporate sites;
        // pharma phrasing is the strongest false-positive source.
        exclusions: &["pharmaceutical", "pharma", "clinical trial", "biotech"],
        whole_word: false,
    },
];

/// Exact-host → category table. Hosts are compared with any leading
/// "www." stripped.
pub static DOMAIN_CATEGORIES: &[(&str, &str)] = &[
    ("github.com", "Web Development"),
    ("gitlab.com", "Web Development"),
    ("stackoverflow.com", "Web Development"),
    ("news.ycombinator.com", "Technology"),
    ("novartis.com", "Pharmaceutical Companies"),
    ("pfizer.com", "Pharmaceutical Companies"),
    ("roche.com", "Pharmaceutical Companies"),
    ("astrazeneca.com", "Pharmaceutical Companies"),
    ("webmd.com", "Health"),
    ("mayoclinic.org", "Health"),
    ("bloomberg.com", "Finance"),
    ("investopedia.com", "Finance"),
    ("nytimes.com", "News & Media"),
    ("bbc.com", "News & Media"),
    ("bbc.co.uk", "News & Media"),
    ("cnn.com", "News & Media"),
    ("theguardian.com", "News & Media"),
    ("reuters.com", "News & Media"),
    ("amazon.com", "Shopping"),
    ("ebay.com", "Shopping"),
    ("etsy.com", "Shopping"),
    ("twitter.com", "Social Media"),
    ("x.com", "Social Media"),
    ("facebook.com", "Social Media"),
    ("instagram.com", "Social Media"),
    ("reddit.com", "Social Media"),
    ("linkedin.com", "Social Media"),
    ("netflix.com", "Entertainment"),
    ("youtube.com", "Entertainment"),
    ("spotify.com", "Entertainment"),
    ("imdb.com", "Entertainment"),
    ("coursera.org", "Education"),
    ("udemy.com", "Education"),
    ("edx.org", "Education"),
    ("khanacademy.org", "Education"),
    ("arxiv.org", "Education"),
    ("booking.com", "Travel"),
    ("airbnb.com", "Travel"),
    ("tripadvisor.com", "Travel"),
    ("allrecipes.com", "Home & Garden"),
    ("epicurious.com", "Home & Garden"),
];

/// The parent of a built-in preset, if the name is one.
pub fn preset_parent(name: &str) -> Option<&'static str> {
    DEFAULT_TAXONOMY
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .and_then(|r| r.parent)
}

/// The keyword list of a built-in preset, if the name is one.
pub fn preset_keywords(name: &str) -> Option<&'static [&'static str]> {
    DEFAULT_TAXONOMY
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .map(|r| r.keywords)
}

/// URL-safe slug for a category name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Web Development"), "web-development");
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("  Odd   Spacing  "), "odd-spacing");
        assert_eq!(slugify("Uncategorized"), "uncategorized");
    }

    #[test]
    fn test_nine_roots() {
        let roots = DEFAULT_TAXONOMY.iter().filter(|r| r.parent.is_none()).count();
        assert_eq!(roots, 9);
    }

    #[test]
    fn test_parents_exist_and_slugs_unique() {
        let names: HashSet<&str> = DEFAULT_TAXONOMY.iter().map(|r| r.name).collect();
        for rule in DEFAULT_TAXONOMY {
            if let Some(parent) = rule.parent {
                assert!(names.contains(parent), "missing parent {parent}");
            }
        }
        let slugs: HashSet<String> = DEFAULT_TAXONOMY.iter().map(|r| slugify(r.name)).collect();
        assert_eq!(slugs.len(), DEFAULT_TAXONOMY.len());
    }

    #[test]
    fn test_domain_table_points_at_known_categories() {
        let names: HashSet<&str> = DEFAULT_TAXONOMY.iter().map(|r| r.name).collect();
        for (_, category) in DOMAIN_CATEGORIES {
            assert!(names.contains(category), "unknown category {category}");
        }
    }
}

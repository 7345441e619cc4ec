//! Page metadata enrichment: reachability validation with a HEAD→GET
//! fallback, and HTML metadata extraction (title, meta description,
//! OpenGraph tags, bounded body text).

pub mod http;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

pub use self::http::HttpClient;
use self::http::{BODY_TIMEOUT, HEAD_TIMEOUT, PROBE_TIMEOUT};

/// Maximum number of body-text characters kept per page.
const BODY_TEXT_LIMIT: usize = 5_000;

/// Subtrees that contribute chrome, not content.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
];

/// Metadata pulled from a fetched page. All fields best-effort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub body_text: String,
}

/// The enrichment seam: validation and metadata fetching.
///
/// The orchestrator only sees this trait, so tests drive the pipeline
/// with canned responses instead of the live network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Whether the URL is worth storing at all.
    async fn validate(&self, url: &str) -> bool;
    /// Fetch and extract page metadata; None on transport failure.
    async fn fetch(&self, url: &str) -> Option<PageMetadata>;
}

/// Live network fetcher.
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn validate(&self, url: &str) -> bool {
        // Internal addresses are accepted without a probe: they are
        // unreachable from here but perfectly valid bookmarks.
        if is_internal(url) {
            return true;
        }

        if let Ok(status) = self.client.head(url, HEAD_TIMEOUT).await {
            if status < 400 {
                return true;
            }
        }

        // Some servers reject HEAD outright; retry once with a GET that
        // stops at the headers. Server errors still fail validation.
        match self.client.get_status(url, PROBE_TIMEOUT).await {
            Ok(status) => status < 500,
            Err(_) => false,
        }
    }

    async fn fetch(&self, url: &str) -> Option<PageMetadata> {
        if is_internal(url) {
            return None;
        }
        let (_status, body) = self.client.get_text(url, BODY_TIMEOUT).await.ok()?;
        Some(extract_metadata(&body))
    }
}

/// Whether a URL points at an internal or browser-local address.
pub fn is_internal(raw_url: &str) -> bool {
    let parsed = match url::Url::parse(raw_url.trim()) {
        Ok(u) => u,
        Err(_) => return false,
    };

    matches!(
        parsed.scheme(),
        "chrome-extension" | "moz-extension" | "safari-web-extension" | "about" | "file" | "chrome" | "edge"
    ) || parsed.host_str().map_or(false, is_internal_host)
}

fn is_internal_host(host: &str) -> bool {
    let host = host.to_lowercase();
    if host == "localhost" || host == "::1" || host == "[::1]" {
        return true;
    }
    if host.ends_with(".local") || host.ends_with(".internal") {
        return true;
    }
    // Loopback and RFC-1918 ranges.
    if host.starts_with("127.") || host.starts_with("10.") || host.starts_with("192.168.") {
        return true;
    }
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some(second) = rest.split('.').next() {
            if let Ok(n) = second.parse::<u8>() {
                return (16..=31).contains(&n);
            }
        }
    }
    false
}

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static META_DESC_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static OG_TITLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static OG_DESC_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static OG_IMAGE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());

/// Extract structured metadata from raw HTML.
pub fn extract_metadata(html: &str) -> PageMetadata {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|el| collapse(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let meta_description = meta_content(&doc, &META_DESC_SEL);
    let og_title = meta_content(&doc, &OG_TITLE_SEL);
    let og_description = meta_content(&doc, &OG_DESC_SEL);
    let og_image = meta_content(&doc, &OG_IMAGE_SEL);

    let mut raw = String::new();
    collect_text(doc.root_element(), &mut raw);
    let body_text: String = collapse(&raw).chars().take(BODY_TEXT_LIMIT).collect();

    PageMetadata {
        title,
        meta_description,
        og_title,
        og_description,
        og_image,
        body_text,
    }
}

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(collapse)
        .filter(|c| !c.is_empty())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accumulate text content, skipping chrome subtrees and the head.
fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                out.push(' ');
                out.push_str(&text.text);
            }
            scraper::Node::Element(element) => {
                let name = element.name();
                if EXCLUDED_TAGS.contains(&name) || name == "head" {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

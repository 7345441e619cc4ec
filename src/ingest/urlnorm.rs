//! URL canonicalization for bookmark equality.
//!
//! Two bookmarks are the same bookmark iff their canonical forms are
//! equal. The canonical form is also the storage key, so everything that
//! touches the store goes through [`normalize_url`] first.

use url::Url;

/// Produce the canonical form of a URL.
///
/// Rules: lowercase scheme and host (path stays case-sensitive), drop
/// default ports, drop one trailing slash from the path, keep query and
/// fragment verbatim. Unparseable input falls back to lowercased trimmed
/// text so equality still behaves sensibly for junk entries.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return trimmed.to_lowercase(),
    };

    // Host-less URLs (about:, javascript:, data:) have no useful
    // structure to canonicalize.
    let host = match parsed.host_str() {
        Some(h) => h.to_lowercase(),
        None => return trimmed.to_lowercase(),
    };

    // `Url::port` already reports None for the scheme's default port.
    let port = match parsed.port() {
        Some(p) => format!(":{p}"),
        None => String::new(),
    };

    let mut path = parsed.path().to_string();
    if path.ends_with('/') {
        path.pop();
    }

    let query = parsed
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    let fragment = parsed
        .fragment()
        .map(|f| format!("#{f}"))
        .unwrap_or_default();

    format!("{}://{host}{port}{path}{query}{fragment}", parsed.scheme())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_lowercased_path_preserved() {
        assert_eq!(
            normalize_url("HTTPS://ExAmPlE.com/Some/Path"),
            "https://example.com/Some/Path"
        );
    }

    #[test]
    fn test_default_ports_dropped() {
        assert_eq!(normalize_url("http://example.com:80/a"), "http://example.com/a");
        assert_eq!(normalize_url("https://example.com:443/a"), "https://example.com/a");
        assert_eq!(
            normalize_url("https://example.com:8443/a"),
            "https://example.com:8443/a"
        );
    }

    #[test]
    fn test_trailing_slash_folds() {
        // All three spellings collapse to the same canonical form.
        let expected = "https://x.com";
        assert_eq!(normalize_url("https://x.com/"), expected);
        assert_eq!(normalize_url("https://x.com"), expected);
        assert_eq!(normalize_url("HTTPS://X.COM/"), expected);
        assert_eq!(normalize_url("https://x.com/a/"), "https://x.com/a");
    }

    #[test]
    fn test_query_and_fragment_verbatim() {
        assert_eq!(
            normalize_url("https://example.com/s/?b=2&a=1#Frag"),
            "https://example.com/s?b=2&a=1#Frag"
        );
    }

    #[test]
    fn test_unparseable_falls_back_to_lowercase() {
        assert_eq!(normalize_url("  Not A URL  "), "not a url");
    }

    #[test]
    fn test_extension_scheme_keeps_structure() {
        assert_eq!(
            normalize_url("chrome-extension://x/y"),
            "chrome-extension://x/y"
        );
    }
}

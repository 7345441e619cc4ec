//! Thin async HTTP client over reqwest for reachability probes and page
//! fetches. Follows up to 5 redirects and presents a desktop browser
//! user-agent; timeouts are per-request because the probe and body
//! budgets differ.

use anyhow::Result;
use std::time::Duration;

/// HEAD reachability probe budget.
pub const HEAD_TIMEOUT: Duration = Duration::from_secs(5);
/// GET fallback probe budget (headers only).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(8);
/// Full page fetch budget.
pub const BODY_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// HTTP client for the enrichment pipeline.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// HEAD request; resolves to the final status after redirects.
    pub async fn head(&self, url: &str, timeout: Duration) -> Result<u16> {
        let resp = self.client.head(url).timeout(timeout).send().await?;
        Ok(resp.status().as_u16())
    }

    /// GET request that stops at the response headers.
    pub async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16> {
        let resp = self.client.get(url).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        // Dropping the response aborts the body transfer.
        drop(resp);
        Ok(status)
    }

    /// GET request returning status and body text.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<(u16, String)> {
        let resp = self.client.get(url).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

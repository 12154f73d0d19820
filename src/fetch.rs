//! Page fetching with a readability-proxy fallback.
//!
//! A page is fetched directly first. If that fails at the transport level,
//! returns a non-success status, or yields a body that looks like a block
//! page, the same URL is requested once more through the proxy and that
//! second answer is returned whatever it is.

use crate::config::FetchConfig;
use crate::error::ScraperError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

/// Markers of a cookie/privacy consent interstitial. All must be present.
const CONSENT_MARKERS: &[&str] = &["before you continue", "consent"];

/// Marker of an anti-bot challenge page.
const UNUSUAL_TRAFFIC_MARKER: &str = "unusual traffic";

/// Where a fetch result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The direct request was accepted.
    Direct,
    /// The proxy request completed (with any status).
    Proxy,
    /// The proxy request failed at the transport level.
    Error,
}

/// Outcome of fetching one page.
///
/// Callers must check [`FetchResult::is_success`] before using the body.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code, or 0 when no response was received.
    pub status: u16,

    /// Response body, or diagnostic text when `provenance` is `Error`.
    pub body: String,

    /// Which path produced this result.
    pub provenance: Provenance,
}

impl FetchResult {
    /// Builds a result for a transport failure.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            body: message.into(),
            provenance: Provenance::Error,
        }
    }

    /// Returns true for a 2xx status with a non-empty body.
    pub fn is_success(&self) -> bool {
        self.provenance != Provenance::Error
            && (200..300).contains(&self.status)
            && !self.body.is_empty()
    }
}

/// Source of page bodies.
///
/// Discovery, extraction and the pipeline only see this trait, so tests can
/// feed them canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches a page. Never fails; inspect the result instead.
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// Returns true if a body is too short or is a consent/anti-bot page.
pub fn looks_blocked_or_empty(body: &str, min_chars: usize) -> bool {
    if body.chars().count() < min_chars {
        return true;
    }

    let lower = body.to_lowercase();
    if CONSENT_MARKERS.iter().all(|m| lower.contains(m)) {
        return true;
    }

    lower.contains(UNUSUAL_TRAFFIC_MARKER)
}

/// HTTP fetcher used against the live site.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Creates a fetcher with the configured headers, timeout and redirects.
    ///
    /// The client keeps a cookie store, so consent cookies set by one
    /// response are sent with later requests of the same run.
    pub fn new(config: FetchConfig) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&config.accept_language).map_err(|_| {
            ScraperError::InvalidHeader {
                name: "Accept-Language".to_string(),
                value: config.accept_language.clone(),
            }
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;

        Ok(Self { client, config })
    }

    /// Returns the proxy URL for a page.
    pub fn proxy_url(&self, url: &str) -> String {
        format!("{}{}", self.config.proxy_prefix, url)
    }

    /// Issues one GET and reads the whole body.
    async fn get(&self, url: &str) -> Result<(u16, String), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn fetch_direct(&self, url: &str) -> Option<FetchResult> {
        match self.get(url).await {
            Ok((status, body)) => {
                if !(200..300).contains(&status) {
                    debug!(url, status, "direct fetch returned non-success status");
                    return None;
                }
                if looks_blocked_or_empty(&body, self.config.min_body_chars) {
                    debug!(url, len = body.len(), "direct fetch looks blocked or empty");
                    return None;
                }
                Some(FetchResult {
                    status,
                    body,
                    provenance: Provenance::Direct,
                })
            }
            Err(e) => {
                debug!(url, error = %e, "direct fetch failed");
                None
            }
        }
    }

    async fn fetch_proxy(&self, url: &str) -> FetchResult {
        let proxied = self.proxy_url(url);
        match self.get(&proxied).await {
            Ok((status, body)) => FetchResult {
                status,
                body,
                provenance: Provenance::Proxy,
            },
            Err(e) => {
                warn!(url, error = %e, "proxy fetch failed");
                FetchResult::error(format!("proxy fetch failed for {}: {}", url, e))
            }
        }
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        if let Some(result) = self.fetch_direct(url).await {
            return result;
        }

        warn!(url, "falling back to proxy");
        self.fetch_proxy(url).await
    }
}

/// Applies rate limiting delay.
///
/// Delays that do not fit a `Duration` are logged and skipped.
pub async fn rate_limit(delay_sec: f64) {
    match Duration::try_from_secs_f64(delay_sec) {
        Ok(delay) if !delay.is_zero() => tokio::time::sleep(delay).await,
        Ok(_) => {}
        Err(e) => warn!(delay_sec, error = %e, "ignoring unusable delay"),
    }
}

//! Puzzle page discovery from seed pages.

use crate::config::{ScrapingConfig, SiteConfig};
use crate::fetch::{PageSource, rate_limit};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Path ending of a puzzle post.
static PUZZLE_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/puzzle\d{3}\.html$").unwrap());

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Collects puzzle page URLs linked from seed pages.
pub struct LinkDiscoverer {
    domain: String,
    max_pages: usize,
    seed_delay_sec: f64,
}

impl LinkDiscoverer {
    /// Creates a discoverer for the given site.
    pub fn new(site: &SiteConfig, config: &ScrapingConfig) -> Self {
        Self {
            domain: site.domain.clone(),
            max_pages: config.max_pages,
            seed_delay_sec: config.seed_delay_sec,
        }
    }

    /// Fetches each seed in order and returns the sorted, deduplicated
    /// puzzle links, capped at `max_pages`.
    ///
    /// Seeds that fail to load contribute nothing. Links are compared as
    /// exact strings.
    pub async fn discover(&self, source: &dyn PageSource, seed_urls: &[String]) -> Vec<String> {
        let mut found = BTreeSet::new();

        for (idx, seed) in seed_urls.iter().enumerate() {
            if idx > 0 {
                rate_limit(self.seed_delay_sec).await;
            }

            let result = source.fetch(seed).await;
            if !result.is_success() {
                debug!(seed = %seed, status = result.status, "skipping seed");
                continue;
            }

            let links = self.extract_links(&result.body);
            debug!(seed = %seed, count = links.len(), "seed links");
            found.extend(links);
        }

        let urls: Vec<String> = found.into_iter().take(self.max_pages).collect();
        info!(count = urls.len(), "discovered puzzle pages");
        urls
    }

    /// Returns the on-domain puzzle links of one page.
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        doc.select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| self.is_puzzle_link(href))
            .map(str::to_string)
            .collect()
    }

    fn is_puzzle_link(&self, href: &str) -> bool {
        href.contains(&self.domain) && PUZZLE_LINK_REGEX.is_match(href)
    }
}

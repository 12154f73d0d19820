//! Run orchestration: discovery, per-page extraction and the miss breaker.
//!
//! Everything runs strictly in sequence; one request is in flight at a time.

use crate::config::Config;
use crate::discovery::LinkDiscoverer;
use crate::fetch::{PageSource, rate_limit};
use crate::post::{PostExtractor, PuzzleRecord};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Highest puzzle number representable in a page URL.
const MAX_PUZZLE_ID: u32 = 999;

/// How page URLs are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Harvest links from seed pages, generating URLs only if none are found.
    Discover,
    /// Count upward from `start` until the miss breaker trips.
    Sequential { start: u32 },
}

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: ScanMode,
    /// Stop once this many records were extracted.
    pub max_records: Option<usize>,
}

/// Counts back-to-back misses and trips at a fixed threshold.
#[derive(Debug, Clone)]
pub struct MissBreaker {
    threshold: u32,
    consecutive: u32,
}

impl MissBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
        }
    }

    /// Resets the miss count.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Counts a miss. Returns true once the threshold is reached.
    pub fn record_miss(&mut self) -> bool {
        self.consecutive += 1;
        self.is_tripped()
    }

    pub fn is_tripped(&self) -> bool {
        self.consecutive >= self.threshold
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

/// Drives a scrape from seed pages to sorted records.
pub struct Pipeline<'a> {
    source: &'a dyn PageSource,
    config: &'a Config,
    discoverer: LinkDiscoverer,
    extractor: PostExtractor,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline that fetches through `source`.
    pub fn new(source: &'a dyn PageSource, config: &'a Config) -> Self {
        Self {
            source,
            config,
            discoverer: LinkDiscoverer::new(&config.site, &config.scraping),
            extractor: PostExtractor::new(&config.site, &config.scraping),
        }
    }

    /// Runs a scrape and returns the records sorted by id.
    pub async fn run(&self, seed_urls: &[String], options: &RunOptions) -> Vec<PuzzleRecord> {
        let mut records = match options.mode {
            ScanMode::Discover => {
                let urls = self.discover_urls(seed_urls).await;
                self.scan_list(&urls, options.max_records).await
            }
            ScanMode::Sequential { start } => {
                self.scan_sequential(start, options.max_records).await
            }
        };

        records.sort_by_key(|r| r.id);

        if records.is_empty() {
            warn!("no puzzles were extracted");
        } else {
            info!(count = records.len(), "extracted puzzles");
        }
        records
    }

    /// Discovers page URLs, falling back to generated ones.
    async fn discover_urls(&self, seed_urls: &[String]) -> Vec<String> {
        let urls = self.discoverer.discover(self.source, seed_urls).await;

        // Separates the last seed request from the first post request.
        if !seed_urls.is_empty() {
            self.pause().await;
        }

        if !urls.is_empty() {
            return urls;
        }

        let count = self.config.scraping.fallback_count.min(MAX_PUZZLE_ID);
        warn!(count, "discovery found nothing, generating page URLs");
        (1..=count).map(|id| self.config.site.page_url(id)).collect()
    }

    /// Extracts every URL of a fixed list.
    async fn scan_list(&self, urls: &[String], max_records: Option<usize>) -> Vec<PuzzleRecord> {
        let mut collector = Collector::new(max_records);

        for (idx, url) in urls.iter().enumerate() {
            if idx > 0 {
                self.pause().await;
            }

            if let Some(record) = self.extractor.extract(self.source, url).await {
                collector.push(record);
            } else {
                debug!(url = %url, "no puzzle extracted");
            }

            if collector.is_full() {
                info!("record limit reached");
                break;
            }
        }

        collector.into_records()
    }

    /// Counts upward from `start` until the breaker trips, the record limit
    /// is reached, or the numbering runs out.
    async fn scan_sequential(&self, start: u32, max_records: Option<usize>) -> Vec<PuzzleRecord> {
        let mut collector = Collector::new(max_records);
        let mut breaker = MissBreaker::new(self.config.scraping.miss_threshold);

        for id in start.max(1)..=MAX_PUZZLE_ID {
            if id > start.max(1) {
                self.pause().await;
            }

            let url = self.config.site.page_url(id);
            match self.extractor.extract(self.source, &url).await {
                Some(record) => {
                    breaker.record_success();
                    collector.push(record);
                }
                None => {
                    debug!(url = %url, misses = breaker.consecutive() + 1, "miss");
                    if breaker.record_miss() {
                        info!(
                            last_id = id,
                            misses = breaker.consecutive(),
                            "too many consecutive misses, stopping scan"
                        );
                        break;
                    }
                }
            }

            if collector.is_full() {
                info!("record limit reached");
                break;
            }
        }

        collector.into_records()
    }

    async fn pause(&self) {
        rate_limit(self.config.scraping.delay_between_requests_sec).await;
    }
}

/// Accumulates records, keeping the first record per id.
struct Collector {
    records: Vec<PuzzleRecord>,
    seen: HashSet<u32>,
    limit: Option<usize>,
}

impl Collector {
    fn new(limit: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    fn push(&mut self, record: PuzzleRecord) {
        if !self.seen.insert(record.id) {
            debug!(id = record.id, url = %record.url, "duplicate puzzle id, keeping first");
            return;
        }
        info!(id = record.id, title = %record.title, "extracted puzzle");
        self.records.push(record);
    }

    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.records.len() >= limit)
    }

    fn into_records(self) -> Vec<PuzzleRecord> {
        self.records
    }
}

//! Configuration management for PuzzleScrape.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "PuzzleScrape";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder replaced by the zero-padded puzzle number in page URLs.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The blog being scraped.
    pub site: SiteConfig,

    /// HTTP fetch behavior.
    pub fetch: FetchConfig,

    /// Pipeline and extraction settings.
    pub scraping: ScrapingConfig,

    /// Output artifact settings.
    pub output: OutputConfig,
}

/// Site layout and naming conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Domain that discovered links must contain.
    pub domain: String,

    /// Pages fetched only to harvest puzzle links.
    pub seed_urls: Vec<String>,

    /// URL of a puzzle page, with `{id}` standing for the 3-digit number.
    pub page_url_template: String,

    /// Host suffixes of the image CDN. Images elsewhere are ignored.
    pub image_hosts: Vec<String>,

    /// Value of the `source` field in the output document.
    pub source_label: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let domain = "layton-puzzles.blogspot.com".to_string();
        Self {
            seed_urls: vec![
                format!("https://{}/", domain),
                format!("https://{}/search?max-results=500", domain),
            ],
            page_url_template: format!("https://{}/puzzle{}.html", domain, ID_PLACEHOLDER),
            image_hosts: vec![
                "blogger.googleusercontent.com".to_string(),
                "bp.blogspot.com".to_string(),
            ],
            source_label: domain.clone(),
            domain,
        }
    }
}

impl SiteConfig {
    /// Builds the page URL for a puzzle number.
    pub fn page_url(&self, id: u32) -> String {
        self.page_url_template
            .replace(ID_PLACEHOLDER, &format!("{:03}", id))
    }
}

/// HTTP fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent sent with every request.
    pub user_agent: String,

    /// Accept-Language sent with every request.
    pub accept_language: String,

    /// Per-request timeout in seconds.
    pub timeout_sec: u64,

    /// Maximum redirects followed per request.
    pub max_redirects: usize,

    /// Bodies shorter than this are treated as blocked or empty.
    pub min_body_chars: usize,

    /// Readability proxy origin; the original URL is appended to it.
    pub proxy_prefix: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_sec: 30,
            max_redirects: 10,
            min_body_chars: 4000,
            proxy_prefix: "https://r.jina.ai/".to_string(),
        }
    }
}

/// What a "Progress" label means inside a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressHandling {
    /// Progress is a tracked section; reward text is captured from it.
    Section,
    /// Progress marks the end of relevant content.
    Stop,
}

/// Where images go when no section label has been seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanImages {
    /// Assign them to the puzzle section.
    Puzzle,
    /// Drop them.
    Discard,
}

/// Pipeline and extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Delay between page fetches in seconds.
    pub delay_between_requests_sec: f64,

    /// Delay between seed page fetches in seconds.
    pub seed_delay_sec: f64,

    /// Safety cap on the number of discovered pages.
    pub max_pages: usize,

    /// Number of pages generated when discovery finds nothing.
    pub fallback_count: u32,

    /// First puzzle number tried in sequential mode.
    pub start_id: u32,

    /// Consecutive misses that end a sequential scan.
    pub miss_threshold: u32,

    /// Stop after this many records were extracted.
    pub max_records: Option<usize>,

    /// Meaning of the "Progress" label.
    pub progress_handling: ProgressHandling,

    /// Policy for images seen before any section label.
    pub orphan_images: OrphanImages,

    /// Longest paragraph accepted as solution text.
    pub solution_max_chars: usize,

    /// Longest paragraph accepted as reward text.
    pub reward_max_chars: usize,

    /// Maximum images kept in the solution section.
    pub solution_image_cap: usize,

    /// Words that mark a paragraph as reward text.
    pub reward_keywords: Vec<String>,

    /// Directory for raw HTML of rejected pages.
    pub debug_dir: Option<PathBuf>,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            delay_between_requests_sec: 1.0,
            seed_delay_sec: 0.5,
            max_pages: 500,
            fallback_count: 170,
            start_id: 1,
            miss_threshold: 8,
            max_records: None,
            progress_handling: ProgressHandling::Section,
            orphan_images: OrphanImages::Puzzle,
            solution_max_chars: 260,
            reward_max_chars: 280,
            solution_image_cap: 2,
            reward_keywords: vec![
                "picarat".to_string(),
                "hint coin".to_string(),
                "coin".to_string(),
                "reward".to_string(),
            ],
            debug_dir: None,
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON document.
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("puzzles.json"),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.domain.trim().is_empty() {
            return Err(invalid("site.domain", "must not be empty"));
        }

        if !self.site.page_url_template.contains(ID_PLACEHOLDER) {
            return Err(invalid(
                "site.page_url_template",
                &format!("must contain the {} placeholder", ID_PLACEHOLDER),
            ));
        }

        if self.fetch.timeout_sec == 0 {
            return Err(invalid("fetch.timeout_sec", "must be greater than 0"));
        }

        if url::Url::parse(&self.fetch.proxy_prefix).is_err() {
            return Err(invalid("fetch.proxy_prefix", "must be an absolute URL"));
        }

        if self.scraping.max_pages == 0 {
            return Err(invalid("scraping.max_pages", "must be greater than 0"));
        }

        if self.scraping.miss_threshold == 0 {
            return Err(invalid("scraping.miss_threshold", "must be greater than 0"));
        }

        if !(1..=999).contains(&self.scraping.start_id) {
            return Err(invalid("scraping.start_id", "must be between 1 and 999"));
        }

        for (key, delay) in [
            (
                "scraping.delay_between_requests_sec",
                self.scraping.delay_between_requests_sec,
            ),
            ("scraping.seed_delay_sec", self.scraping.seed_delay_sec),
        ] {
            if Duration::try_from_secs_f64(delay).is_err() {
                return Err(invalid(key, "must be a finite, non-negative number of seconds"));
            }
        }

        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

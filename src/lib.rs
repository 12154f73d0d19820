//! PuzzleScrape - puzzle walkthrough blog scraper.
//!
//! This library provides functionality for:
//! - Fetching pages directly, with a readability-proxy fallback for blocked responses
//! - Discovering puzzle post URLs from seed pages
//! - Extracting puzzle records (title, solution, reward, sectioned images) from posts
//! - Writing the collected puzzles as a JSON document

pub mod config;
pub mod console;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod post;
pub mod readme;
pub mod sections;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use discovery::LinkDiscoverer;
pub use error::{ConfigError, OutputError, ReadmeError, ScraperError};
pub use fetch::{FetchResult, Fetcher, PageSource, Provenance};
pub use output::PuzzleDocument;
pub use pipeline::{MissBreaker, Pipeline, RunOptions, ScanMode};
pub use post::{PostExtractor, PuzzleRecord, SectionImages};
pub use sections::{Label, Section, classify};

//! Error types for PuzzleScrape.
//!
//! Uses `thiserror` for structured error definitions. Page fetches and
//! post extraction deliberately do not appear here: those report failure
//! through `FetchResult` and `Option` so one bad page never aborts a run.

use thiserror::Error;

/// Error type for scraper setup.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A header value could not be encoded
    #[error("Invalid header value for '{name}': {value}")]
    InvalidHeader { name: String, value: String },
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for writing the puzzle JSON artifact.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Failed to write the output file
    #[error("Failed to write output: {0}")]
    WriteError(#[from] std::io::Error),

    /// Failed to serialize the document
    #[error("Failed to serialize puzzles: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Error type for the README impossible-puzzle block.
#[derive(Error, Debug)]
pub enum ReadmeError {
    /// A required input file does not exist
    #[error("{0} not found")]
    MissingFile(String),

    /// Failed to read or write a file
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// impossible.json is not a JSON object
    #[error("Failed to parse impossible list: {0}")]
    ParseError(#[from] serde_json::Error),

    /// README lacks the block markers
    #[error("README markers not found. Add:\n{start}\n{end}")]
    MarkersNotFound { start: String, end: String },
}

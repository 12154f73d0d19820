//! The JSON document written at the end of a run.

use crate::error::OutputError;
use crate::post::PuzzleRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleDocument {
    pub source: String,
    pub generated_at_unix: i64,
    pub count: usize,
    pub puzzles: Vec<PuzzleRecord>,
}

impl PuzzleDocument {
    /// Wraps records stamped with the current time.
    pub fn new(source: &str, puzzles: Vec<PuzzleRecord>) -> Self {
        Self {
            source: source.to_string(),
            generated_at_unix: chrono::Utc::now().timestamp(),
            count: puzzles.len(),
            puzzles,
        }
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document, creating parent directories as needed.
    pub async fn write_to(&self, path: &Path) -> Result<(), OutputError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut json = self.to_json()?;
        json.push('\n');
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

//! Keeps the README's list of impossible puzzles in sync with
//! `impossible.json`.

use crate::error::ReadmeError;
use std::collections::BTreeMap;
use std::path::Path;

/// Opening marker of the generated block.
pub const START_MARKER: &str = "<!-- IMPOSSIBLE:START -->";

/// Closing marker of the generated block.
pub const END_MARKER: &str = "<!-- IMPOSSIBLE:END -->";

/// Parses `impossible.json`: an object mapping puzzle numbers to names.
///
/// Keys that are not numbers are skipped. Non-string values are rendered
/// as their JSON text.
pub fn parse_impossible(json: &str) -> Result<BTreeMap<u32, String>, ReadmeError> {
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;

    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let id = key.trim().parse::<u32>().ok()?;
            let name = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((id, name))
        })
        .collect())
}

/// Renders the block between (and including) the markers.
pub fn build_block(items: &BTreeMap<u32, String>) -> String {
    let mut lines = vec![START_MARKER.to_string(), String::new()];

    if items.is_empty() {
        lines.push("_No impossible puzzles listed._".to_string());
    } else {
        lines.push("Known broken / unsolvable puzzles are flagged in the UI:".to_string());
        lines.push(String::new());
        for (id, name) in items {
            lines.push(format!("- {:03} — *{}*", id, name));
        }
    }

    lines.push(String::new());
    lines.push(END_MARKER.to_string());
    lines.join("\n")
}

/// Replaces everything from the first start marker to the first end marker.
pub fn replace_block(text: &str, block: &str) -> Result<String, ReadmeError> {
    let markers_missing = || ReadmeError::MarkersNotFound {
        start: START_MARKER.to_string(),
        end: END_MARKER.to_string(),
    };

    let start = text.find(START_MARKER).ok_or_else(markers_missing)?;
    let end = text.find(END_MARKER).ok_or_else(markers_missing)?;
    if end < start {
        return Err(markers_missing());
    }

    let before = &text[..start];
    let after = &text[end + END_MARKER.len()..];
    Ok(format!("{}{}{}", before, block, after))
}

/// Rewrites the README block. Returns true if the file changed.
pub fn update_readme(readme: &Path, impossible: &Path) -> Result<bool, ReadmeError> {
    if !readme.exists() {
        return Err(ReadmeError::MissingFile(readme.display().to_string()));
    }
    if !impossible.exists() {
        return Err(ReadmeError::MissingFile(impossible.display().to_string()));
    }

    let items = parse_impossible(&std::fs::read_to_string(impossible)?)?;
    let old = std::fs::read_to_string(readme)?;
    let new = replace_block(&old, &build_block(&items))?;

    if new == old {
        return Ok(false);
    }

    std::fs::write(readme, new)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_impossible_sorts_and_skips() {
        let items = parse_impossible(r#"{"12": "Laser Maze", "3": "Broken Clock", "x": "bad"}"#)
            .unwrap();
        let ids: Vec<u32> = items.keys().copied().collect();
        assert_eq!(ids, vec![3, 12]);
        assert_eq!(items[&3], "Broken Clock");
    }

    #[test]
    fn test_parse_impossible_rejects_non_object() {
        assert!(parse_impossible("[1, 2]").is_err());
    }

    #[test]
    fn test_build_block() {
        let empty = build_block(&BTreeMap::new());
        assert!(empty.contains("_No impossible puzzles listed._"));
        assert!(empty.starts_with(START_MARKER));
        assert!(empty.ends_with(END_MARKER));

        let mut items = BTreeMap::new();
        items.insert(7, "Sliding Tiles".to_string());
        let block = build_block(&items);
        assert!(block.contains("- 007 — *Sliding Tiles*"));
    }

    #[test]
    fn test_replace_block_requires_markers() {
        assert!(matches!(
            replace_block("# Title\n", "x"),
            Err(ReadmeError::MarkersNotFound { .. })
        ));
    }

    #[test]
    fn test_update_readme() {
        let dir = tempdir().unwrap();
        let readme = dir.path().join("README.md");
        let impossible = dir.path().join("impossible.json");

        std::fs::write(
            &readme,
            format!("# Puzzles\n\n{}\nold\n{}\n\nFooter\n", START_MARKER, END_MARKER),
        )
        .unwrap();
        std::fs::write(&impossible, r#"{"42": "Impossible Bridge"}"#).unwrap();

        assert!(update_readme(&readme, &impossible).unwrap());
        let content = std::fs::read_to_string(&readme).unwrap();
        assert!(content.starts_with("# Puzzles\n\n"));
        assert!(content.contains("- 042 — *Impossible Bridge*"));
        assert!(!content.contains("old"));
        assert!(content.ends_with("\n\nFooter\n"));

        // Second run is a no-op.
        assert!(!update_readme(&readme, &impossible).unwrap());
    }

    #[test]
    fn test_update_readme_missing_file() {
        let dir = tempdir().unwrap();
        let result = update_readme(&dir.path().join("README.md"), &dir.path().join("i.json"));
        assert!(matches!(result, Err(ReadmeError::MissingFile(_))));
    }
}

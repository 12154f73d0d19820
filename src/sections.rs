//! Section labels used inside a puzzle post.
//!
//! Posts mark their parts with short English labels ("Puzzle 012",
//! "Hint 1", "Solution", ...). [`classify`] maps a block of normalized text
//! to the section it opens.

use crate::config::ProgressHandling;
use std::fmt;

/// A semantic part of a puzzle post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Scene,
    Puzzle,
    Hint1,
    Hint2,
    Hint3,
    Solution,
    Progress,
}

impl Section {
    /// Every section, in output order.
    pub const ALL: [Section; 7] = [
        Section::Scene,
        Section::Puzzle,
        Section::Hint1,
        Section::Hint2,
        Section::Hint3,
        Section::Solution,
        Section::Progress,
    ];

    /// Returns the key used for this section in the output document.
    pub fn key(self) -> &'static str {
        match self {
            Section::Scene => "scene",
            Section::Puzzle => "puzzle",
            Section::Hint1 => "hint1",
            Section::Hint2 => "hint2",
            Section::Hint3 => "hint3",
            Section::Solution => "solution",
            Section::Progress => "progress",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What a label block means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// The block opens a section.
    Section(Section),
    /// Nothing after this block is collected.
    Stop,
}

/// Classifies whitespace-collapsed, trimmed text.
///
/// Returns `None` for ordinary body text. Checks run in order and the first
/// match wins; "watch the scene" is matched anywhere because it appears
/// mid-sentence, every other label only as a prefix.
pub fn classify(text: &str, progress: ProgressHandling) -> Option<Label> {
    if text.is_empty() {
        return None;
    }

    let lower = text.to_lowercase();

    if lower.contains("watch the scene") {
        return Some(Label::Section(Section::Scene));
    }

    if lower.starts_with("puzzle ") {
        return Some(Label::Section(Section::Puzzle));
    }

    if lower.starts_with("hint 1") {
        return Some(Label::Section(Section::Hint1));
    }
    if lower.starts_with("hint 2") {
        return Some(Label::Section(Section::Hint2));
    }
    if lower.starts_with("hint 3") {
        return Some(Label::Section(Section::Hint3));
    }

    if lower.starts_with("solution") {
        return Some(Label::Section(Section::Solution));
    }

    if lower.starts_with("progress") {
        return Some(match progress {
            ProgressHandling::Section => Label::Section(Section::Progress),
            ProgressHandling::Stop => Label::Stop,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(text: &str) -> Option<Label> {
        classify(text, ProgressHandling::Section)
    }

    #[test]
    fn test_prefix_labels() {
        assert_eq!(section("Puzzle 012 - Fork in the Road"), Some(Label::Section(Section::Puzzle)));
        assert_eq!(section("Hint 1"), Some(Label::Section(Section::Hint1)));
        assert_eq!(section("HINT 2: look closer"), Some(Label::Section(Section::Hint2)));
        assert_eq!(section("hint 3"), Some(Label::Section(Section::Hint3)));
        assert_eq!(section("Solution"), Some(Label::Section(Section::Solution)));
        assert_eq!(section("Progress"), Some(Label::Section(Section::Progress)));
    }

    #[test]
    fn test_scene_matches_anywhere() {
        assert_eq!(
            section("Before solving, watch the scene with Luke."),
            Some(Label::Section(Section::Scene))
        );
        // Checked before the prefix rules.
        assert_eq!(
            section("Puzzle tip: watch the scene first"),
            Some(Label::Section(Section::Scene))
        );
    }

    #[test]
    fn test_progress_stop_mode() {
        assert_eq!(classify("Progress", ProgressHandling::Stop), Some(Label::Stop));
        assert_eq!(
            classify("Solution", ProgressHandling::Stop),
            Some(Label::Section(Section::Solution))
        );
    }

    #[test]
    fn test_body_text_is_unclassified() {
        assert_eq!(section(""), None);
        assert_eq!(section("Turn left twice."), None);
        assert_eq!(section("Puzzles are fun"), None);
        assert_eq!(section("The solution is below"), None);
    }

    #[test]
    fn test_classify_is_stable() {
        for text in ["Puzzle 001", "Hint 2", "Solution", "plain text", "Progress"] {
            let first = section(text);
            assert_eq!(section(text), first);
        }
    }

    #[test]
    fn test_section_keys() {
        let keys: Vec<&str> = Section::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            vec!["scene", "puzzle", "hint1", "hint2", "hint3", "solution", "progress"]
        );
        assert_eq!(Section::Hint2.to_string(), "hint2");
    }
}

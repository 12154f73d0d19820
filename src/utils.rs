//! Utility functions for common text operations.

use regex::Regex;
use std::sync::LazyLock;

/// Leading "Puzzle 003", "Puzzle 003 -" and similar.
static PUZZLE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*puzzle\s*\d{3}\s*[-:–—]?\s*").unwrap());

/// Leading "003 -", "003 –" and similar.
static NUMBER_DASH_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{3}\s*[-:–—]\s*").unwrap());

/// Leading "003 ".
static NUMBER_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{3}\s+").unwrap());

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns a filesystem-safe name derived from a URL.
///
/// # Arguments
/// * `url` - The page URL
///
/// # Returns
/// The last non-empty path segment (without `.html`), with every character
/// outside `[A-Za-z0-9_-]` replaced by `_`. Falls back to `page`.
pub fn url_slug(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    let stem = last.strip_suffix(".html").unwrap_or(last);

    let slug: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

/// Returns a title without its puzzle-number prefix, for display.
///
/// Falls back to `Puzzle NNN` when nothing is left.
pub fn display_title(title: &str, id: u32) -> String {
    let s = title.trim();
    let s = PUZZLE_PREFIX_REGEX.replace(s, "");
    let s = NUMBER_DASH_PREFIX_REGEX.replace(&s, "");
    let s = NUMBER_PREFIX_REGEX.replace(&s, "");
    let s = s.trim();

    if s.is_empty() {
        format!("Puzzle {:03}", id)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hint\n\t 1  "), "Hint 1");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("\n \n"), "");
    }

    #[test]
    fn test_url_slug() {
        assert_eq!(url_slug("https://x.blogspot.com/2024/01/puzzle007.html"), "puzzle007");
        assert_eq!(url_slug("https://x.blogspot.com/p/about me.html?m=1"), "about_me");
        assert_eq!(url_slug("https://x.blogspot.com/"), "x_blogspot_com");
        assert_eq!(url_slug(""), "page");
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("Puzzle 003 - Where's My House?", 3), "Where's My House?");
        assert_eq!(display_title("puzzle 010: Matchsticks", 10), "Matchsticks");
        assert_eq!(display_title("003 – Strange Sign", 3), "Strange Sign");
        assert_eq!(display_title("003 Strange Sign", 3), "Strange Sign");
        assert_eq!(display_title("Puzzle 004", 4), "Puzzle 004");
        assert_eq!(display_title("", 12), "Puzzle 012");
    }
}

//! Puzzle post extraction.
//!
//! A post page is flattened into an ordered list of [`PageNode`]s, then
//! walked once. Label blocks move the cursor between sections; body text
//! and CDN images are filed under whichever section is open.

use crate::config::{OrphanImages, ScrapingConfig, SiteConfig};
use crate::fetch::PageSource;
use crate::sections::{Label, Section, classify};
use crate::utils::{normalize_text, url_slug};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Title used when a page has no heading and no `<title>`.
const PLACEHOLDER_TITLE: &str = "Untitled puzzle";

/// A standalone 3-digit run inside a title.
static TITLE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{3})(?:\D|$)").unwrap());

/// The page number inside a `puzzleNNN.html` URL.
static URL_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"puzzle(\d{3})\.html").unwrap());

/// CSS selectors used for parsing.
struct Selectors {
    /// Content containers, most specific first. The last one always matches.
    containers: Vec<Selector>,
    /// Heading selectors tried for the title, in order.
    titles: Vec<Selector>,
    /// Document `<title>`.
    document_title: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            containers: [
                "div.post-body.entry-content",
                "div.post-body",
                "div.entry-content",
                "article",
                "div.post",
                "body",
            ]
            .iter()
            .map(|s| Selector::parse(s).unwrap())
            .collect(),
            titles: ["h3", "h2", "h1"]
                .iter()
                .map(|s| Selector::parse(s).unwrap())
                .collect(),
            document_title: Selector::parse("title").unwrap(),
        }
    }
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(Selectors::new);

/// Image URLs of a post, grouped by section.
///
/// Every section is a field, so every key is always present when
/// serialized. Lists keep document order and never repeat a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionImages {
    pub scene: Vec<String>,
    pub puzzle: Vec<String>,
    pub hint1: Vec<String>,
    pub hint2: Vec<String>,
    pub hint3: Vec<String>,
    pub solution: Vec<String>,
    pub progress: Vec<String>,
}

impl SectionImages {
    /// Returns the images of a section.
    pub fn get(&self, section: Section) -> &[String] {
        match section {
            Section::Scene => &self.scene,
            Section::Puzzle => &self.puzzle,
            Section::Hint1 => &self.hint1,
            Section::Hint2 => &self.hint2,
            Section::Hint3 => &self.hint3,
            Section::Solution => &self.solution,
            Section::Progress => &self.progress,
        }
    }

    fn get_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Scene => &mut self.scene,
            Section::Puzzle => &mut self.puzzle,
            Section::Hint1 => &mut self.hint1,
            Section::Hint2 => &mut self.hint2,
            Section::Hint3 => &mut self.hint3,
            Section::Solution => &mut self.solution,
            Section::Progress => &mut self.progress,
        }
    }

    /// Appends a URL unless the section already has it.
    pub fn push_unique(&mut self, section: Section, url: &str) -> bool {
        let list = self.get_mut(section);
        if list.iter().any(|u| u == url) {
            return false;
        }
        list.push(url.to_string());
        true
    }

    /// Total number of images across sections.
    pub fn total(&self) -> usize {
        Section::ALL.iter().map(|s| self.get(*s).len()).sum()
    }
}

/// One extracted puzzle post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub solution_text: String,
    pub reward_text: String,
    pub images: SectionImages,
}

/// Kind of a flattened block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Heading,
    Paragraph,
    Image,
}

/// A block-level element of the post, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub kind: NodeKind,
    /// Whitespace-collapsed text; empty for images.
    pub text: String,
    /// `src` of an image.
    pub src: Option<String>,
}

/// Flattens the descendants of `container` into heading, paragraph and
/// image nodes. Nested blocks each produce their own node.
pub fn flatten(container: ElementRef) -> Vec<PageNode> {
    container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter_map(|elem| {
            let kind = match elem.value().name() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => NodeKind::Heading,
                "p" | "div" | "span" => NodeKind::Paragraph,
                "img" => NodeKind::Image,
                _ => return None,
            };

            if kind == NodeKind::Image {
                return Some(PageNode {
                    kind,
                    text: String::new(),
                    src: elem.value().attr("src").map(str::to_string),
                });
            }

            Some(PageNode {
                kind,
                text: normalize_text(&elem.text().collect::<String>()),
                src: None,
            })
        })
        .collect()
}

/// Position of the walk inside a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// No label seen yet.
    Unset,
    /// Inside a labelled section.
    In(Section),
    /// A stop label was seen; nothing more is collected.
    Stopped,
}

/// Text and images collected by one walk.
#[derive(Debug, Default)]
struct Collected {
    solution_text: String,
    reward_text: String,
    images: SectionImages,
}

/// Extracts [`PuzzleRecord`]s from post pages.
pub struct PostExtractor {
    config: ScrapingConfig,
    image_hosts: Vec<String>,
    reward_keywords: Vec<String>,
}

impl PostExtractor {
    /// Creates an extractor for the given site.
    pub fn new(site: &SiteConfig, config: &ScrapingConfig) -> Self {
        Self {
            image_hosts: site.image_hosts.iter().map(|h| h.to_lowercase()).collect(),
            reward_keywords: config
                .reward_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            config: config.clone(),
        }
    }

    /// Fetches and extracts one post. `None` if the fetch failed or the
    /// page has no puzzle number.
    pub async fn extract(&self, source: &dyn PageSource, url: &str) -> Option<PuzzleRecord> {
        let result = source.fetch(url).await;
        if !result.is_success() {
            debug!(url, status = result.status, "post fetch failed");
            return None;
        }

        let record = self.parse(url, &result.body);
        if record.is_none()
            && let Some(dir) = &self.config.debug_dir
        {
            dump_html(dir, url, &result.body).await;
        }
        record
    }

    /// Extracts a record from an already fetched page.
    pub fn parse(&self, url: &str, html: &str) -> Option<PuzzleRecord> {
        let doc = Html::parse_document(html);

        let title = extract_title(&doc);
        let Some(id) = extract_id(&title, url) else {
            debug!(url, title = %title, "no puzzle number found");
            return None;
        };

        let container = find_container(&doc)?;
        let collected = self.walk(&flatten(container));

        Some(PuzzleRecord {
            id,
            title,
            url: url.to_string(),
            solution_text: collected.solution_text,
            reward_text: collected.reward_text,
            images: collected.images,
        })
    }

    /// Runs the section state machine over flattened nodes.
    fn walk(&self, nodes: &[PageNode]) -> Collected {
        let mut cursor = Cursor::Unset;
        let mut out = Collected::default();

        for node in nodes {
            if node.kind == NodeKind::Image {
                if let Some(src) = &node.src {
                    self.file_image(cursor, src, &mut out.images);
                }
                continue;
            }

            if cursor == Cursor::Stopped {
                continue;
            }

            match classify(&node.text, self.config.progress_handling) {
                Some(Label::Stop) => cursor = Cursor::Stopped,
                Some(Label::Section(section)) => {
                    debug!(%section, label = %node.text, "entering section");
                    cursor = Cursor::In(section);
                }
                None => self.capture_text(cursor, &node.text, &mut out),
            }
        }

        out
    }

    fn capture_text(&self, cursor: Cursor, text: &str, out: &mut Collected) {
        if text.is_empty() {
            return;
        }
        let len = text.chars().count();
        let lower = text.to_lowercase();

        match cursor {
            Cursor::In(Section::Solution)
                if out.solution_text.is_empty()
                    && len <= self.config.solution_max_chars
                    && !lower.starts_with("hint") =>
            {
                out.solution_text = text.to_string();
            }
            Cursor::In(Section::Progress)
                if out.reward_text.is_empty()
                    && len <= self.config.reward_max_chars
                    && self.reward_keywords.iter().any(|k| lower.contains(k)) =>
            {
                out.reward_text = text.to_string();
            }
            _ => {}
        }
    }

    fn file_image(&self, cursor: Cursor, src: &str, images: &mut SectionImages) {
        let Some(src) = self.cdn_url(src) else {
            return;
        };

        let section = match cursor {
            Cursor::Stopped => return,
            Cursor::In(section) => section,
            Cursor::Unset => match self.config.orphan_images {
                OrphanImages::Puzzle => Section::Puzzle,
                OrphanImages::Discard => return,
            },
        };

        // The template repeats a stray image after the two real solution shots.
        if section == Section::Solution && images.solution.len() >= self.config.solution_image_cap
        {
            return;
        }

        images.push_unique(section, &src);
    }

    /// Returns the absolute URL if `src` is hosted on the image CDN.
    fn cdn_url(&self, src: &str) -> Option<String> {
        let src = src.trim();
        let absolute = match src.strip_prefix("//") {
            Some(rest) => format!("https://{}", rest),
            None => src.to_string(),
        };

        let parsed = url::Url::parse(&absolute).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        let on_cdn = self
            .image_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)));

        on_cdn.then_some(absolute)
    }
}

/// Returns the first container selector that matches.
fn find_container(doc: &Html) -> Option<ElementRef<'_>> {
    SELECTORS
        .containers
        .iter()
        .find_map(|sel| doc.select(sel).next())
}

/// Extracts the post title: first h3, h2 or h1, then `<title>`.
fn extract_title(doc: &Html) -> String {
    for sel in &SELECTORS.titles {
        if let Some(elem) = doc.select(sel).next() {
            let title = normalize_text(&elem.text().collect::<String>());
            if !title.is_empty() {
                return title;
            }
        }
    }

    if let Some(elem) = doc.select(&SELECTORS.document_title).next() {
        let title = normalize_text(&elem.text().collect::<String>());
        if !title.is_empty() {
            return title;
        }
    }

    PLACEHOLDER_TITLE.to_string()
}

/// Finds the puzzle number in the title, then in the URL.
fn extract_id(title: &str, url: &str) -> Option<u32> {
    let from_title = TITLE_ID_REGEX
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|id| *id > 0);

    from_title.or_else(|| {
        URL_ID_REGEX
            .captures(url)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|id| *id > 0)
    })
}

/// Writes the raw HTML of a rejected page for later inspection.
async fn dump_html(dir: &Path, url: &str, html: &str) {
    let path = dir.join(format!("{}.html", url_slug(url)));
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %e, "could not create debug directory");
        return;
    }
    match tokio::fs::write(&path, html).await {
        Ok(()) => debug!(path = %path.display(), "wrote debug dump"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not write debug dump"),
    }
}

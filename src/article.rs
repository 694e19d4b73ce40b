//! Defines the [`ArticleRecord`] type and the logic for extracting a record
//! from an article document. Extraction never fails: every optional field
//! falls back to a default, and documents which shouldn't be listed come back
//! as [`Extraction::Skip`].

use crate::html::{self, document_elements, elements, is_tag_with_class};
use crate::palette;
use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use std::fmt;

/// The format of article dates, e.g. `Dec 05, 2025`.
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// Separates the date from the reading time in the date element, e.g.
/// `Dec 05, 2025 • 5 min read`.
pub const DATE_SEPARATOR: char = '•';

/// Separates the article title from the site name in `<title>`.
pub const TITLE_SEPARATOR: char = '|';

/// The description the authoring template ships with.
pub const DESCRIPTION_PLACEHOLDER: &str = "Article Description";

/// The title given to documents without a usable `<title>`.
pub const UNTITLED: &str = "Untitled Article";

/// Titles of pages which live next to the articles but aren't articles.
pub const EXCLUDED_TITLES: &[&str] = &["Untitled", UNTITLED, "404 Not Found", "Articles"];

/// Paragraphs shorter than this are passed over for the description when a
/// following paragraph exists.
const MIN_PARAGRAPH_CHARS: usize = 20;

const MAX_DESCRIPTION_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Whether an article is listed. Unlisted articles keep their file but are
/// left out of the listing pages and the search index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Unlisted,
}

impl Visibility {
    /// The value of the `visibility` meta tag for unlisted documents.
    pub const UNLISTED: &'static str = "unlisted";

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => Visibility::UNLISTED,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized data for one article, rebuilt from its document on every
/// run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleRecord {
    /// The document title up to the first `|`.
    pub title: String,

    /// A short summary; may be empty.
    pub description: String,

    /// The date as written in the document; may be empty.
    pub date_display: String,

    /// The parsed date, or [`NaiveDate::MIN`] when `date_display` doesn't
    /// parse, so undated articles sort last.
    pub date_sort_key: NaiveDate,

    /// The card/search thumbnail, relative to the site root; may be empty.
    pub image_url: String,

    pub visibility: Visibility,

    /// The article's path relative to the site root, e.g.
    /// `articles/attention.html`.
    pub link: String,

    /// The card background gradient (see [`palette::color`]).
    pub color: &'static str,

    /// The card icon class (see [`palette::icon`]).
    pub icon: &'static str,
}

/// Why a document was left out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The document carries the unlisted visibility flag.
    Unlisted,

    /// The document's title marks it as a placeholder or non-article page.
    ExcludedTitle(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::Unlisted => f.write_str("unlisted"),
            SkipReason::ExcludedTitle(title) => write!(f, "excluded title `{}`", title),
        }
    }
}

/// The result of extracting a record from a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    Record(ArticleRecord),
    Skip(SkipReason),
}

/// Extracts an [`ArticleRecord`] from the markup of one article. `link` is
/// the article's site-root-relative path.
pub fn extract(content: &str, link: &str) -> Extraction {
    let document = Html::parse_document(content);

    let visibility = visibility(&document);
    if visibility == Visibility::Unlisted {
        return Extraction::Skip(SkipReason::Unlisted);
    }

    let title = title(&document);
    if EXCLUDED_TITLES.contains(&title.as_str()) {
        return Extraction::Skip(SkipReason::ExcludedTitle(title));
    }

    let body = body(&document);
    let date_display = date_display(&document);
    Extraction::Record(ArticleRecord {
        description: description(&document, body),
        date_sort_key: date_sort_key(&date_display),
        date_display,
        image_url: body.map(image_url).unwrap_or_default(),
        visibility,
        link: link.to_owned(),
        color: palette::color(&title),
        icon: palette::icon(&title),
        title,
    })
}

/// Reads the `<meta name="visibility">` flag. Only the value `unlisted`
/// hides a document.
pub fn visibility(document: &Html) -> Visibility {
    match meta_content(document, "visibility") {
        Some(Visibility::UNLISTED) => Visibility::Unlisted,
        _ => Visibility::Public,
    }
}

/// Parses a display date. Anything that doesn't match [`DATE_FORMAT`] yields
/// [`NaiveDate::MIN`].
pub fn date_sort_key(date_display: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_display.trim(), DATE_FORMAT).unwrap_or(NaiveDate::MIN)
}

/// Returns the `content` of the first `<meta name="{name}">`.
pub fn meta_content<'a>(document: &'a Html, name: &str) -> Option<&'a str> {
    document_elements(document)
        .find(|e| e.value().name() == "meta" && e.value().attr("name") == Some(name))
        .and_then(|e| e.value().attr("content"))
}

/// The document's `<title>` up to the first `|`, or [`UNTITLED`].
pub fn title(document: &Html) -> String {
    let title = document_elements(document)
        .find(|e| e.value().name() == "title")
        .map(|e| html::text(&e))
        .unwrap_or_default();
    match title.split(TITLE_SEPARATOR).next().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_owned(),
        _ => UNTITLED.to_owned(),
    }
}

/// The article's content region.
fn body(document: &Html) -> Option<ElementRef<'_>> {
    const BODY_SIGNATURES: &[(&str, &str)] = &[
        ("article", "article-body"),
        ("div", "article-body"),
        ("div", "entry-content"),
    ];
    BODY_SIGNATURES.iter().find_map(|(name, class)| {
        document_elements(document).find(|e| is_tag_with_class(e, name, class))
    })
}

fn description(document: &Html, body: Option<ElementRef>) -> String {
    match meta_content(document, "description").map(str::trim) {
        Some(description) if !description.is_empty() && description != DESCRIPTION_PLACEHOLDER => {
            description.to_owned()
        }
        _ => body.map(paragraph_description).unwrap_or_default(),
    }
}

fn paragraph_description(body: ElementRef) -> String {
    let mut paragraphs = elements(body)
        .filter(|e| e.value().name() == "p")
        .map(|p| html::text(&p));
    let text = match paragraphs.next() {
        None => return String::new(),
        Some(first) if first.chars().count() < MIN_PARAGRAPH_CHARS => {
            paragraphs.next().unwrap_or(first)
        }
        Some(first) => first,
    };
    truncate(&text, MAX_DESCRIPTION_CHARS)
}

/// Cuts `text` to `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_owned(),
        Some((end, _)) => format!("{}{}", &text[..end], ELLIPSIS),
    }
}

fn image_url(body: ElementRef) -> String {
    let sources = |root: ElementRef<'_>| {
        elements(root)
            .filter(|e| e.value().name() == "img")
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| !src.is_empty())
            .map(str::to_owned)
            .collect::<Vec<String>>()
    };

    let image = sources(body)
        .into_iter()
        .find(|src| !src.to_lowercase().contains("icon"))
        .or_else(|| {
            elements(body)
                .find(|e| e.value().name() == "figure")
                .and_then(|figure| sources(figure).into_iter().next())
        })
        .unwrap_or_default();

    // Articles live one directory below the site root, which is where cards
    // and search results resolve images from.
    match image.strip_prefix("../") {
        Some(stripped) => stripped.to_owned(),
        None => image,
    }
}

fn date_display(document: &Html) -> String {
    ["span", "div"]
        .iter()
        .find_map(|name| {
            document_elements(document).find(|e| is_tag_with_class(e, name, "article-meta-small"))
        })
        .map(|e| {
            html::text(&e)
                .split(DATE_SEPARATOR)
                .next()
                .unwrap_or_default()
                .trim()
                .to_owned()
        })
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Builds an article document the way the authoring template lays one
    /// out. `head` and `body` are inserted verbatim.
    pub(crate) fn article(title: &str, date: &str, head: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{} | Jane Doe</title>
{}
</head>
<body>
<article class="article-body">
<h1>{}</h1>
<div class="article-meta-small">{} • 5 min read</div>
{}
</article>
</body>
</html>"#,
            title, head, title, date, body
        )
    }

    fn record(content: &str) -> ArticleRecord {
        match extract(content, "articles/test.html") {
            Extraction::Record(record) => record,
            Extraction::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_extract_full_record() {
        let content = article(
            "Attention Is All You Need",
            "Dec 05, 2025",
            r#"<meta name="description" content="A tour of transformers.">"#,
            r#"<p>Transformers replaced recurrence with attention.</p>
<img src="../assets/icons/star.svg">
<img src="../assets/images/attention.png">"#,
        );
        let record = record(&content);
        assert_eq!("Attention Is All You Need", record.title);
        assert_eq!("A tour of transformers.", record.description);
        assert_eq!("Dec 05, 2025", record.date_display);
        assert_eq!(NaiveDate::from_ymd_opt(2025, 12, 5), Some(record.date_sort_key));
        assert_eq!("assets/images/attention.png", record.image_url);
        assert_eq!(Visibility::Public, record.visibility);
        assert_eq!("articles/test.html", record.link);
        assert_eq!(palette::color(&record.title), record.color);
        assert_eq!(palette::icon(&record.title), record.icon);
    }

    #[test]
    fn test_unlisted_is_skipped() {
        let content = article(
            "Hidden",
            "Dec 05, 2025",
            r#"<meta name="visibility" content="unlisted">"#,
            "",
        );
        assert_eq!(
            Extraction::Skip(SkipReason::Unlisted),
            extract(&content, "articles/hidden.html")
        );
    }

    #[test]
    fn test_other_visibility_values_are_public() {
        let content = article(
            "Shown",
            "",
            r#"<meta name="visibility" content="public">"#,
            "",
        );
        assert_eq!(Visibility::Public, record(&content).visibility);
    }

    #[test]
    fn test_excluded_titles_are_skipped() {
        for title in &["Articles", "404 Not Found", "Untitled"] {
            let content = article(title, "", "", "");
            assert_eq!(
                Extraction::Skip(SkipReason::ExcludedTitle(title.to_string())),
                extract(&content, "articles/x.html")
            );
        }
    }

    #[test]
    fn test_missing_title_is_skipped() {
        assert_eq!(
            Extraction::Skip(SkipReason::ExcludedTitle(UNTITLED.to_owned())),
            extract("<html><body><p>No title here.</p></body></html>", "articles/x.html")
        );
    }

    #[test]
    fn test_description_placeholder_falls_back_to_paragraph() {
        let content = article(
            "Placeholder",
            "",
            r#"<meta name="description" content="Article Description">"#,
            "<p>This paragraph is long enough to be a description.</p>",
        );
        assert_eq!(
            "This paragraph is long enough to be a description.",
            record(&content).description
        );
    }

    #[test]
    fn test_short_first_paragraph_is_passed_over() {
        let content = article(
            "Short",
            "",
            "",
            "<p>Intro.</p><p>The second paragraph carries the substance.</p>",
        );
        assert_eq!(
            "The second paragraph carries the substance.",
            record(&content).description
        );
    }

    #[test]
    fn test_short_only_paragraph_is_kept() {
        let content = article("Short", "", "", "<p>Intro.</p>");
        assert_eq!("Intro.", record(&content).description);
    }

    #[test]
    fn test_long_description_is_truncated() {
        let long = "x".repeat(200);
        let content = article("Long", "", "", &format!("<p>{}</p>", long));
        let description = record(&content).description;
        assert_eq!(format!("{}...", "x".repeat(150)), description);

        let exact = "y".repeat(150);
        let content = article("Exact", "", "", &format!("<p>{}</p>", exact));
        assert_eq!(exact, record(&content).description);
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!("éé...", truncate("ééé", 2));
        assert_eq!("ééé", truncate("ééé", 3));
    }

    #[test]
    fn test_no_description_and_no_paragraphs() {
        let content = article("Bare", "Dec 05, 2025", "", "");
        assert_eq!("", record(&content).description);
    }

    #[test]
    fn test_image_falls_back_to_figure() {
        let content = article(
            "Figures",
            "",
            "",
            r#"<img src="../assets/icon-logo.png"><figure><img src="../assets/icon-figure.png"></figure>"#,
        );
        assert_eq!("assets/icon-figure.png", record(&content).image_url);
    }

    #[test]
    fn test_image_outside_body_is_ignored() {
        let content = format!(
            "{}{}",
            r#"<img src="/banner.png">"#,
            article("No Images", "", "", "<p>Nothing to see.</p>")
        );
        assert_eq!("", record(&content).image_url);
    }

    #[test]
    fn test_absolute_image_is_kept() {
        let content = article("Remote", "", "", r#"<img src="https://cdn.example.com/a.png">"#);
        assert_eq!("https://cdn.example.com/a.png", record(&content).image_url);
    }

    #[test]
    fn test_unparsable_date() {
        let content = article("Someday", "Sometime soon", "", "");
        let record = record(&content);
        assert_eq!("Sometime soon", record.date_display);
        assert_eq!(NaiveDate::MIN, record.date_sort_key);
    }

    #[test]
    fn test_missing_date_element() {
        let content = "<html><head><title>Dateless</title></head><body></body></html>";
        let record = record(content);
        assert_eq!("", record.date_display);
        assert_eq!(NaiveDate::MIN, record.date_sort_key);
    }

    #[test]
    fn test_span_date_preferred() {
        let content = article(
            "Dates",
            "Jan 01, 2020",
            "",
            r#"<span class="article-meta-small">Mar 14, 2024</span>"#,
        );
        assert_eq!("Mar 14, 2024", record(&content).date_display);
    }
}

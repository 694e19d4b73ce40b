//! Converts the markdown source of a new article into the HTML placed in the
//! article body.

use pulldown_cmark::*;

/// The deepest heading level HTML has.
const MAX_HEADING: u32 = 6;

/// Converts markdown to HTML, appending the result to `out`.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(out, Parser::new_ext(markdown, options).map(convert));
}

fn convert(ev: Event) -> Event {
    match ev {
        Event::Start(tag) => Event::Start(convert_tag(tag)),
        Event::End(tag) => Event::End(convert_tag(tag)),
        _ => ev,
    }
}

fn convert_tag(tag: Tag) -> Tag {
    match tag {
        // The article title is the page's h1, so a `#` in the source becomes
        // an h2.
        Tag::Heading(level) => Tag::Heading((level + 1).min(MAX_HEADING)),

        // Articles link to each other by their markdown file names; the
        // published files end in `.html`.
        Tag::Link(kind, url, title) => match convert_link(&url) {
            Some(converted) => Tag::Link(kind, CowStr::Boxed(converted.into_boxed_str()), title),
            None => Tag::Link(kind, url, title),
        },
        _ => tag,
    }
}

/// Rewrites a relative `.md` link to `.html`, keeping any fragment. Returns
/// `None` for links which should be left alone.
fn convert_link(url: &str) -> Option<String> {
    if url.contains("://") || url.starts_with('/') || url.starts_with("mailto:") {
        return None;
    }
    let (path, fragment) = match url.find('#') {
        Some(i) => url.split_at(i),
        None => (url, ""),
    };
    path.strip_suffix(".md")
        .map(|stem| format!("{}.html{}", stem, fragment))
}

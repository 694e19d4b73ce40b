//! Renders listing pages. A listing page is the base listing template with
//! its card grid refilled from one [`Page`] of records and a fresh pagination
//! control appended after the grid.
//!
//! Cards and the pagination control are [`gtmpl`] templates. The defaults
//! below can be replaced through the theme settings in `folio.yaml`; a
//! replacement pagination template must keep the
//! `justify-content:center` style on its outer `div`, since that is how
//! controls from earlier runs are recognized and dropped.

use crate::article::ArticleRecord;
use crate::config::Config;
use crate::html::{self, is_tag_with_class, Rewrite, Rewriter};
use crate::write::Page;
use gtmpl::{Context, Template, Value};
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The class of the `div` holding the cards.
pub const GRID_CLASS: &str = "articles-grid";

/// The style fragment (with whitespace removed) that marks a pagination
/// control.
pub const PAGINATION_SIGNATURE: &str = "justify-content:center";

pub const DEFAULT_CARD_TEMPLATE: &str = r#"
<article class="article-card">
    <div class="article-card-image">
        <div class="placeholder-img" style="background: {{.color}};"></div>
        <div class="blog-overlay"><i class="fas {{.icon}}"></i></div>
    </div>
    <div class="article-card-content">
        <span class="article-meta-small">{{.date}}</span>
        <h3>{{.title}}</h3>
        <a href="{{.link}}" class="article-read-btn">Read Article</a>
    </div>
</article>"#;

pub const DEFAULT_PAGINATION_TEMPLATE: &str = r#"<div style="display:flex; justify-content:center; gap:1rem; margin-top:3rem;">{{if .prev}}
    <a href="{{.prev}}" class="btn btn-secondary">Previous</a>{{end}}
    <span style="align-self:center; font-weight:600;">{{.label}}</span>{{if .next}}
    <a href="{{.next}}" class="btn btn-primary">Next</a>{{end}}
</div>"#;

/// Renders [`Page`]s into complete listing documents.
pub struct Renderer {
    /// The parsed base template. Never modified; every render serializes it
    /// afresh.
    base: Html,
    card_template: Template,
    pagination_template: Template,
}

impl Renderer {
    /// Builds a renderer from template sources. `base` is the listing
    /// document; `name` identifies it in errors. Fails if `base` has no card
    /// grid.
    pub fn new(name: &str, base: &str, card: &str, pagination: &str) -> Result<Renderer> {
        let renderer = Renderer {
            base: Html::parse_document(base),
            card_template: parse_template(card)?,
            pagination_template: parse_template(pagination)?,
        };
        match renderer.grid() {
            Some(_) => Ok(renderer),
            None => Err(Error::MissingGrid(name.to_owned())),
        }
    }

    /// Loads the listing template and any theme overrides named by `config`.
    pub fn from_config(config: &Config) -> Result<Renderer> {
        let base = read_template_file(&config.listing_template)?;
        let card = match &config.card_template {
            Some(path) => read_template_file(path)?,
            None => DEFAULT_CARD_TEMPLATE.to_owned(),
        };
        let pagination = match &config.pagination_template {
            Some(path) => read_template_file(path)?,
            None => DEFAULT_PAGINATION_TEMPLATE.to_owned(),
        };
        Renderer::new(
            &config.listing_template.display().to_string(),
            &base,
            &card,
            &pagination,
        )
    }

    /// Renders one listing page: the base template with the grid's children
    /// replaced by one card per record, every earlier pagination control
    /// after the grid dropped, and a new control appended to the grid's
    /// container.
    pub fn render(&self, page: &Page) -> Result<String> {
        let grid = self.grid().ok_or_else(|| Error::MissingGrid(String::from("listing template")))?;
        let container = grid
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or_else(|| Error::MissingGrid(String::from("listing template")))?;

        let mut cards = String::new();
        for record in page.records.iter() {
            cards.push_str(&execute(&self.card_template, card_value(record))?);
        }
        cards.push('\n');
        let pagination = execute(&self.pagination_template, pagination_value(page))?;

        // Earlier runs appended their control to the container, so only the
        // grid's following siblings can hold one.
        let mut rewriter = Rewriter::new();
        for control in grid
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .filter(is_pagination_control)
        {
            rewriter.add(control, Rewrite::Remove);
        }
        rewriter
            .add(grid, Rewrite::ReplaceChildren(cards))
            .add(container, Rewrite::Append(pagination));
        Ok(rewriter.render(&self.base))
    }

    fn grid(&self) -> Option<ElementRef<'_>> {
        grid(&self.base)
    }
}

fn grid(document: &Html) -> Option<ElementRef<'_>> {
    html::document_elements(document).find(|e| is_tag_with_class(e, "div", GRID_CLASS))
}

/// Returns true if `markup` is a listing page, i.e. it has a card grid.
pub fn is_listing_page(markup: &str) -> bool {
    grid(&Html::parse_document(markup)).is_some()
}

/// Returns true for `div`s styled like a pagination control.
fn is_pagination_control(element: &ElementRef) -> bool {
    element.value().name() == "div"
        && element
            .value()
            .attr("style")
            .map(|style| {
                style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .contains(PAGINATION_SIGNATURE)
            })
            .unwrap_or(false)
}

/// The template value for one card. Every field is HTML-escaped.
fn card_value(record: &ArticleRecord) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(html::escape(&record.title)));
    m.insert(
        "description".to_owned(),
        Value::String(html::escape(&record.description)),
    );
    m.insert("date".to_owned(), Value::String(html::escape(&record.date_display)));
    m.insert("image".to_owned(), Value::String(html::escape(&record.image_url)));
    m.insert("link".to_owned(), Value::String(html::escape(&record.link)));
    m.insert("color".to_owned(), Value::String(record.color.to_owned()));
    m.insert("icon".to_owned(), Value::String(record.icon.to_owned()));
    Value::Object(m)
}

/// The template value for the pagination control: `prev` and `next` (nil
/// when absent), `label`, `number` and `total`.
fn pagination_value(page: &Page) -> Value {
    let option_to_value = |opt: &Option<String>| match opt {
        Some(link) => Value::String(html::escape(link)),
        None => Value::Nil,
    };

    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("prev".to_owned(), option_to_value(&page.prev));
    m.insert("next".to_owned(), option_to_value(&page.next));
    m.insert("label".to_owned(), Value::String(page.label()));
    m.insert("number".to_owned(), Value::String(page.number.to_string()));
    m.insert("total".to_owned(), Value::String(page.total_pages.to_string()));
    Value::Object(m)
}

fn parse_template(contents: &str) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(contents)
        .map_err(|e| Error::ParseTemplate(e.to_string()))?;
    Ok(template)
}

fn execute(template: &Template, value: Value) -> Result<String> {
    let context = Context::from(value).map_err(|e| Error::Template(e.to_string()))?;
    let mut out: Vec<u8> = Vec::new();
    template
        .execute(&mut out, &context)
        .map_err(|e| Error::Template(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Error::Template(e.to_string()))
}

fn read_template_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering a listing page.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while reading template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing card or pagination templates.
    ParseTemplate(String),

    /// Returned for errors executing card or pagination templates.
    Template(String),

    /// Returned when the listing template has no card grid.
    MissingGrid(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Template(err) => err.fmt(f),
            Error::MissingGrid(name) => write!(
                f,
                "'{}' has no `div.{}` to hold the article cards",
                name, GRID_CLASS
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::MissingGrid(_) => None,
        }
    }
}

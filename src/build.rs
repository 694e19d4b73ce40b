//! Exports the [`build_site`] function which stitches together the high-level
//! steps of regenerating the site: scanning the articles
//! ([`crate::parser`]), rendering and writing the listing pages
//! ([`crate::listing`], [`crate::write`]), and writing the search index
//! ([`crate::search`]).

use crate::config::Config;
use crate::listing::{Error as RenderError, Renderer};
use crate::parser::{Error as ParseError, Parser as ArticleParser};
use crate::search::{self, Error as IndexError};
use crate::write::{paginate, Error as WriteError, PageNames, Writer};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

/// What a build produced.
#[derive(Debug)]
pub struct Report {
    /// The number of listed articles.
    pub articles: usize,

    /// The listing pages written, first page first.
    pub pages: Vec<PathBuf>,

    /// The number of entries in the search index.
    pub index_entries: usize,
}

/// Regenerates the listing pages and search index from a [`Config`].
///
/// The listing template is loaded and checked before anything else happens,
/// so a missing or unusable template aborts the build without touching the
/// existing output.
pub fn build_site(config: &Config) -> Result<Report> {
    let renderer = Renderer::from_config(config)?;

    let parser = ArticleParser::from_config(config);
    let records = parser.parse_articles(&config.articles_directory)?;
    info!(
        directory = %config.articles_directory.display(),
        articles = records.len(),
        "scanned articles"
    );

    let index = search::build_index(&records, &config.search_extra);

    let names = PageNames::new(&config.listing_page);
    let pages = paginate(records, config.index_page_size, &names);
    let articles = pages.iter().map(|page| page.records.len()).sum();
    let writer = Writer {
        renderer: &renderer,
        output_directory: &config.root_directory,
        names: &names,
    };
    let written = writer.write_pages(&pages)?;

    let index_file = File::create(&config.search_index).map_err(|err| Error::Index {
        path: config.search_index.clone(),
        err: IndexError::Io(err),
    })?;
    search::write_index(&index, std::io::BufWriter::new(index_file)).map_err(|err| {
        Error::Index {
            path: config.search_index.clone(),
            err,
        }
    })?;
    info!(
        path = %config.search_index.display(),
        entries = index.len(),
        "wrote search index"
    );

    Ok(Report {
        articles,
        pages: written,
        index_entries: index.len(),
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during scanning,
/// loading templates, writing pages, or writing the index.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors scanning the articles directory.
    Parse(ParseError),

    /// Returned for errors loading the listing templates.
    Render(RenderError),

    /// Returned for errors rendering or writing listing pages.
    Write(WriteError),

    /// Returned for errors writing the search index.
    Index { path: PathBuf, err: IndexError },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Index { path, err } => {
                write!(f, "Writing search index '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Index { path: _, err } => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<RenderError> for Error {
    /// Converts [`RenderError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

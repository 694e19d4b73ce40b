//! Defines the [`Parser`] type, which scans the articles directory and turns
//! each article document into an [`ArticleRecord`] (see [`crate::article`]).

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::article::{self, ArticleRecord, Extraction};
use crate::config::Config;

/// The authoring template's file name. It sits among the articles but is
/// never one of them.
pub const TEMPLATE_FILE_NAME: &str = "template.html";

pub const HTML_EXTENSION: &str = ".html";

/// Parses [`ArticleRecord`]s from the article documents in a directory.
pub struct Parser<'a> {
    /// `article_url_prefix` is the site-root-relative directory of the
    /// articles. Record links are `{article_url_prefix}/{file_name}`.
    article_url_prefix: &'a str,

    /// `reserved_file_name` names the authoring template, which is skipped.
    reserved_file_name: &'a str,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(article_url_prefix: &'a str, reserved_file_name: &'a str) -> Parser<'a> {
        Parser {
            article_url_prefix,
            reserved_file_name,
        }
    }

    pub fn from_config(config: &'a Config) -> Parser<'a> {
        Parser::new(
            &config.article_url_prefix,
            config
                .article_template
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(TEMPLATE_FILE_NAME),
        )
    }

    /// The site-root-relative link for the article in `file_name`.
    pub fn link(&self, file_name: &str) -> String {
        match self.article_url_prefix.is_empty() {
            true => file_name.to_owned(),
            false => format!("{}/{}", self.article_url_prefix, file_name),
        }
    }

    /// Searches `source_directory` (not its subdirectories) for article
    /// documents and returns a record for every one that should be listed.
    /// Records come back in file-name order; callers needing date order sort
    /// them (see [`crate::write::paginate`]).
    ///
    /// A document which can't be read is logged and left out. Only a
    /// directory which can't be listed fails the scan.
    pub fn parse_articles(&self, source_directory: &Path) -> Result<Vec<ArticleRecord>> {
        let mut records = Vec::new();
        for path in self.article_files(source_directory)? {
            match self.parse_article(&path) {
                Ok(Extraction::Record(record)) => records.push(record),
                Ok(Extraction::Skip(reason)) => {
                    debug!(path = %path.display(), %reason, "skipping document");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse article");
                }
            }
        }
        Ok(records)
    }

    /// Lists the article documents in `source_directory`, sorted by file
    /// name.
    pub fn article_files(&self, source_directory: &Path) -> Result<Vec<PathBuf>> {
        html_files(source_directory).map(|files| {
            files
                .into_iter()
                .filter(|path| {
                    path.file_name().and_then(|name| name.to_str()) != Some(self.reserved_file_name)
                })
                .collect()
        })
    }

    fn parse_article(&self, path: &Path) -> Result<Extraction> {
        match self._parse_article(path) {
            Ok(extraction) => Ok(extraction),
            Err(e) => Err(Error::Annotated(
                format!("parsing article `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_article(&self, path: &Path) -> Result<Extraction> {
        use std::io::Read;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| InvalidFileNameError(path.to_owned()))?;
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        Ok(article::extract(&contents, &self.link(file_name)))
    }
}

/// Lists the `.html` files directly inside `directory`, sorted by file name.
pub fn html_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for result in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = result?;
        if entry.path().is_file() && entry.file_name().to_string_lossy().ends_with(HTML_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a scan operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error scanning for articles.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O errors reading an article.
    Io(std::io::Error),

    /// Returned when the articles directory can't be listed.
    WalkDir(walkdir::Error),

    /// Returned when a file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator when listing directories.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

//! Builds the site search index: one flat entry per listed article followed
//! by fixed entries for pages that aren't articles. The index is written
//! whole on every run, never merged with a previous one.

use crate::article::ArticleRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// The category given to article entries.
pub const ARTICLE_CATEGORY: &str = "Article";

/// One searchable page, in the shape the site's search script reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchEntry {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Path relative to the site root.
    pub url: String,

    pub category: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub image: String,
}

impl From<&ArticleRecord> for SearchEntry {
    fn from(record: &ArticleRecord) -> SearchEntry {
        SearchEntry {
            title: record.title.clone(),
            description: record.description.clone(),
            url: record.link.clone(),
            category: ARTICLE_CATEGORY.to_owned(),
            date: record.date_display.clone(),
            image: record.image_url.clone(),
        }
    }
}

/// The non-article entries used when `folio.yaml` doesn't list its own.
pub fn default_extra_entries() -> Vec<SearchEntry> {
    vec![
        SearchEntry {
            title: "Machine Learning Projects".to_owned(),
            description: "A collection of machine learning projects and case studies.".to_owned(),
            url: "projects/machine_learning.html".to_owned(),
            category: "Project".to_owned(),
            date: String::new(),
            image: String::new(),
        },
        SearchEntry {
            title: "About".to_owned(),
            description: "Learn more about the author of this site.".to_owned(),
            url: "about.html".to_owned(),
            category: "Page".to_owned(),
            date: String::new(),
            image: String::new(),
        },
    ]
}

/// Maps `records` (already filtered to listed articles) to entries, in
/// order, and appends `extra`.
pub fn build_index(records: &[ArticleRecord], extra: &[SearchEntry]) -> Vec<SearchEntry> {
    records
        .iter()
        .map(SearchEntry::from)
        .chain(extra.iter().cloned())
        .collect()
}

/// Serializes `entries` as a pretty-printed JSON array into `w`.
pub fn write_index<W: Write>(entries: &[SearchEntry], mut w: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut w, entries)?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing the search index.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when the entries can't be serialized.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Json(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible index operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts [`serde_json::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible index operations.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::listing::test::record;

    #[test]
    fn test_build_index() {
        let mut first = record("First", "Dec 05, 2025");
        first.description = "About the first.".to_owned();
        first.image_url = "assets/first.png".to_owned();
        let records = vec![first, record("Second", "")];

        let index = build_index(&records, &default_extra_entries());
        assert_eq!(4, index.len());
        assert_eq!(
            SearchEntry {
                title: "First".to_owned(),
                description: "About the first.".to_owned(),
                url: "articles/first.html".to_owned(),
                category: "Article".to_owned(),
                date: "Dec 05, 2025".to_owned(),
                image: "assets/first.png".to_owned(),
            },
            index[0]
        );
        assert_eq!("Second", index[1].title);
        assert_eq!("Project", index[2].category);
        assert_eq!("about.html", index[3].url);
    }

    #[test]
    fn test_write_index() -> Result<()> {
        let index = build_index(&[record("Only", "Jan 01, 2024")], &[]);
        let mut out = Vec::new();
        write_index(&index, &mut out)?;
        let json = String::from_utf8(out).unwrap();
        assert!(json.starts_with("[\n  {\n    \"title\": \"Only\""));
        let parsed: Vec<SearchEntry> = serde_json::from_str(&json)?;
        assert_eq!(index, parsed);
        Ok(())
    }

    #[test]
    fn test_extra_entries_from_yaml() {
        let entries: Vec<SearchEntry> = serde_yaml::from_str(
            "- title: Contact\n  url: contact.html\n  category: Page\n",
        )
        .unwrap();
        assert_eq!("", entries[0].description);
        assert_eq!("", entries[0].image);
    }
}

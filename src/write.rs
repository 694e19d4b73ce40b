use crate::article::ArticleRecord;
use crate::listing::{is_listing_page, Error as RenderError, Renderer};
use crate::parser::{html_files, Error as ScanError, HTML_EXTENSION};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Responsible for rendering listing [`Page`]s and writing them to disk.
pub struct Writer<'a> {
    /// Renders each page into a complete document.
    pub renderer: &'a Renderer,

    /// The directory in which the listing files will be written. The first
    /// page is `{output_directory}/articles.html`, the rest
    /// `{output_directory}/articles-2.html`, etc.
    pub output_directory: &'a Path,

    /// Names the page files.
    pub names: &'a PageNames<'a>,
}

impl Writer<'_> {
    /// Renders every page and, only once all of them rendered, writes them
    /// to disk. Listing files left over from an earlier run with more pages
    /// are removed. Returns the paths written.
    pub fn write_pages(&self, pages: &[Page]) -> Result<Vec<PathBuf>> {
        let rendered = pages
            .iter()
            .map(|page| -> Result<(PathBuf, String)> {
                Ok((
                    self.output_directory.join(&page.file_name),
                    self.renderer.render(page)?,
                ))
            })
            .collect::<Result<Vec<(PathBuf, String)>>>()?;

        std::fs::create_dir_all(self.output_directory)?;
        let mut written = Vec::with_capacity(rendered.len());
        for (path, contents) in rendered {
            std::fs::write(&path, contents)?;
            info!(path = %path.display(), "wrote listing page");
            written.push(path);
        }

        self.remove_stale_pages(pages.len())?;
        Ok(written)
    }

    /// Removes listing files numbered past `total_pages`. A file only counts
    /// as a listing page if its name fits [`PageNames`] and it has a card
    /// grid, so unrelated pages which happen to share the naming pattern are
    /// left alone.
    fn remove_stale_pages(&self, total_pages: usize) -> Result<()> {
        for path in html_files(self.output_directory)? {
            let numbered_past_end = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| self.names.page_number(name))
                .map(|number| number > total_pages)
                .unwrap_or(false);
            if !numbered_past_end {
                continue;
            }
            if !is_listing_page(&std::fs::read_to_string(&path)?) {
                warn!(path = %path.display(), "keeping page named like a listing page without a card grid");
                continue;
            }
            std::fs::remove_file(&path)?;
            info!(path = %path.display(), "removed stale listing page");
        }
        Ok(())
    }
}

/// Names listing page files after the first page's file name: page 1 keeps
/// it (`articles.html`), page `n` inserts `-n` before the extension
/// (`articles-n.html`).
pub struct PageNames<'a> {
    first: &'a str,
    stem: &'a str,
}

impl<'a> PageNames<'a> {
    pub fn new(first: &'a str) -> PageNames<'a> {
        PageNames {
            first,
            stem: first.strip_suffix(HTML_EXTENSION).unwrap_or(first),
        }
    }

    /// The file name of the 1-based page `number`.
    pub fn file_name(&self, number: usize) -> String {
        match number > 1 {
            false => self.first.to_owned(),
            true => format!("{}-{}{}", self.stem, number, HTML_EXTENSION),
        }
    }

    /// The inverse of [`PageNames::file_name`].
    pub fn page_number(&self, file_name: &str) -> Option<usize> {
        if file_name == self.first {
            return Some(1);
        }
        file_name
            .strip_prefix(self.stem)?
            .strip_prefix('-')?
            .strip_suffix(HTML_EXTENSION)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .filter(|number| *number > 1)
    }
}

/// One listing page: a run of consecutive records in date order along with
/// its position among the pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: usize,

    /// The number of pages in the listing.
    pub total_pages: usize,

    /// The records on this page, most recent first.
    pub records: Vec<ArticleRecord>,

    /// The file this page is written to.
    pub file_name: String,

    /// The file name of the previous page, if any.
    pub prev: Option<String>,

    /// The file name of the next page, if any.
    pub next: Option<String>,
}

impl Page {
    /// The position label, e.g. `Page 1 of 2`.
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.number, self.total_pages)
    }
}

/// Orders records most recent first. The sort is stable: records with equal
/// dates, including every undated record, keep their relative order.
pub fn sort_records(records: &mut [ArticleRecord]) {
    records.sort_by(|a, b| b.date_sort_key.cmp(&a.date_sort_key));
}

/// Sorts `records` (see [`sort_records`]) and splits them into pages of
/// `page_size`. There is always at least one page, so an empty corpus still
/// gets a first listing page. `page_size` must be at least 1.
pub fn paginate(mut records: Vec<ArticleRecord>, page_size: usize, names: &PageNames) -> Vec<Page> {
    sort_records(&mut records);

    let page_size = page_size.max(1);
    let total_pages = match records.len() % page_size {
        0 => (records.len() / page_size).max(1),
        _ => records.len() / page_size + 1,
    };

    let mut chunks: Vec<Vec<ArticleRecord>> = Vec::with_capacity(total_pages);
    let mut records = records.into_iter().peekable();
    while records.peek().is_some() {
        chunks.push(records.by_ref().take(page_size).collect());
    }
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let number = i + 1;
            Page {
                number,
                total_pages,
                records: chunk,
                file_name: names.file_name(number),
                prev: match number {
                    1 => None,
                    _ => Some(names.file_name(number - 1)),
                },
                next: match number < total_pages {
                    false => None,
                    true => Some(names.file_name(number + 1)),
                },
            }
        })
        .collect()
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error rendering a page.
    Render(RenderError),

    /// An error writing the output files.
    Io(io::Error),

    /// An error listing the output directory.
    Scan(ScanError),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ScanError> for Error {
    /// Converts a [`ScanError`] into an [`Error`]. This allows us to use the
    /// `?` operator when listing the output directory.
    fn from(err: ScanError) -> Error {
        Error::Scan(err)
    }
}

impl From<RenderError> for Error {
    /// Converts a [`RenderError`] into an [`Error`]. This allows us to use
    /// the `?` operator when rendering pages.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Scan(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Scan(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::listing::test::{record, LISTING};
    use crate::listing::{DEFAULT_CARD_TEMPLATE, DEFAULT_PAGINATION_TEMPLATE};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn names() -> PageNames<'static> {
        PageNames::new("articles.html")
    }

    fn titles(page: &Page) -> Vec<&str> {
        page.records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_page_names() {
        let names = names();
        assert_eq!("articles.html", names.file_name(1));
        assert_eq!("articles-2.html", names.file_name(2));
        assert_eq!("articles-12.html", names.file_name(12));
        assert_eq!(Some(1), names.page_number("articles.html"));
        assert_eq!(Some(12), names.page_number("articles-12.html"));
        assert_eq!(None, names.page_number("articles-1.html"));
        assert_eq!(None, names.page_number("articles-.html"));
        assert_eq!(None, names.page_number("articles-two.html"));
        assert_eq!(None, names.page_number("projects-2.html"));
    }

    #[test]
    fn test_sorts_by_date_descending_with_undated_last() {
        let records = vec![
            record("Undated A", ""),
            record("Old", "Jan 01, 2020"),
            record("Garbled", "yesterday"),
            record("New", "Mar 03, 2025"),
            record("Middle", "Jun 15, 2023"),
            record("Undated B", ""),
        ];
        let pages = paginate(records, 9, &names());
        assert_eq!(1, pages.len());
        assert_eq!(
            vec!["New", "Middle", "Old", "Undated A", "Garbled", "Undated B"],
            titles(&pages[0])
        );
    }

    #[test]
    fn test_equal_dates_keep_scan_order() {
        let records = vec![
            record("First", "Mar 03, 2025"),
            record("Second", "Mar 03, 2025"),
            record("Third", "Mar 03, 2025"),
        ];
        let pages = paginate(records, 2, &names());
        assert_eq!(vec!["First", "Second"], titles(&pages[0]));
        assert_eq!(vec!["Third"], titles(&pages[1]));
    }

    #[test]
    fn test_eleven_records_make_two_pages() {
        let records = (0..11)
            .map(|i| record(&format!("Article {}", i), ""))
            .collect();
        let pages = paginate(records, 9, &names());
        assert_eq!(2, pages.len());
        assert_eq!(9, pages[0].records.len());
        assert_eq!(2, pages[1].records.len());
        assert_eq!("Page 1 of 2", pages[0].label());
        assert_eq!("Page 2 of 2", pages[1].label());
    }

    #[test]
    fn test_empty_corpus_makes_one_page() {
        let pages = paginate(Vec::new(), 9, &names());
        assert_eq!(1, pages.len());
        assert!(pages[0].records.is_empty());
        assert_eq!("Page 1 of 1", pages[0].label());
        assert_eq!(None, pages[0].prev);
        assert_eq!(None, pages[0].next);
        assert_eq!("articles.html", pages[0].file_name);
    }

    #[test]
    fn test_prev_and_next_links() {
        for total in 1..=5usize {
            let records = (0..total * 3)
                .map(|i| record(&format!("Article {}", i), ""))
                .collect();
            let pages = paginate(records, 3, &names());
            assert_eq!(total, pages.len());
            for page in pages.iter() {
                assert_eq!(total, page.total_pages);
                match page.number {
                    1 => assert_eq!(None, page.prev),
                    2 => assert_eq!(Some("articles.html".to_owned()), page.prev),
                    n => assert_eq!(Some(format!("articles-{}.html", n - 1)), page.prev),
                }
                match page.number == total {
                    true => assert_eq!(None, page.next),
                    false => assert_eq!(Some(format!("articles-{}.html", page.number + 1)), page.next),
                }
            }
        }
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let records = (0..18).map(|i| record(&format!("Article {}", i), "")).collect();
        let pages = paginate(records, 9, &names());
        assert_eq!(2, pages.len());
        assert_eq!(9, pages[1].records.len());
    }

    #[test]
    fn test_write_pages_removes_stale_pages() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("articles-3.html"), LISTING)?;
        std::fs::write(dir.path().join("articles-2.html"), LISTING)?;
        std::fs::write(dir.path().join("articles-4.html"), "<p>not a listing</p>")?;
        std::fs::write(dir.path().join("about.html"), "keep")?;

        let renderer = Renderer::new(
            "articles.html",
            LISTING,
            DEFAULT_CARD_TEMPLATE,
            DEFAULT_PAGINATION_TEMPLATE,
        )?;
        let names = names();
        let writer = Writer {
            renderer: &renderer,
            output_directory: dir.path(),
            names: &names,
        };
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let records = (0..4)
            .map(|i| record(&format!("Article {}", i), &day.format("%b %d, %Y").to_string()))
            .collect();
        let written = writer.write_pages(&paginate(records, 2, &names))?;

        assert_eq!(
            vec![dir.path().join("articles.html"), dir.path().join("articles-2.html")],
            written
        );
        assert!(!dir.path().join("articles-3.html").exists());
        assert!(dir.path().join("articles-4.html").exists());
        assert!(dir.path().join("about.html").exists());
        let second = std::fs::read_to_string(dir.path().join("articles-2.html"))?;
        assert!(second.contains("Page 2 of 2"));
        Ok(())
    }

    #[test]
    fn test_unlistable_output_directory_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let renderer = Renderer::new(
            "articles.html",
            LISTING,
            DEFAULT_CARD_TEMPLATE,
            DEFAULT_PAGINATION_TEMPLATE,
        )?;
        let names = names();
        let missing = dir.path().join("missing");
        let writer = Writer {
            renderer: &renderer,
            output_directory: &missing,
            names: &names,
        };
        assert!(matches!(writer.remove_stale_pages(1), Err(Error::Scan(_))));
        Ok(())
    }
}

//! Site management operations behind the `folio` subcommands other than
//! `build`: listing content with its visibility, moving documents between
//! public, unlisted and private, creating draft articles from the authoring
//! template, hiding or showing sections of the home page, and archiving the
//! drafts.
//!
//! Document edits are pure functions from markup to markup
//! ([`with_visibility`], [`render_article`], [`with_section_hidden`]); the
//! remaining functions wrap them with the file handling.

use crate::article::{self, Visibility};
use crate::config::Config;
use crate::html::{self, document_elements, elements, Rewrite, Rewriter};
use crate::markdown;
use crate::parser::{self, Error as ScanError};
use scraper::{ElementRef, Html};
use std::fmt;
use std::fs;
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// The style given to hidden home page sections.
pub const HIDDEN_SECTION_STYLE: &str = "display: none !important;";

/// The timestamp in backup archive names, e.g. `2025-12-05_14-30-00`.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Appended to the date of new articles.
pub const READING_TIME: &str = "5 min read";

/// The kind of document, which decides its public and drafts directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Article,
    Project,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Kind::Article => "article",
            Kind::Project => "project",
        })
    }
}

/// Where a document stands. Private documents live in the drafts
/// directories and aren't served at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Public,
    Unlisted,
    Private,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Status::Public => "public",
            Status::Unlisted => "unlisted",
            Status::Private => "private",
        })
    }
}

/// One managed document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub kind: Kind,
    pub status: Status,
    pub title: String,
    pub path: PathBuf,
}

/// The input for [`create_article`].
#[derive(Clone, Debug, Default)]
pub struct NewArticle {
    pub title: String,
    pub description: String,

    /// The display date, e.g. `Dec 05, 2025`.
    pub date: String,

    /// The article body as markdown.
    pub markdown: String,
}

/// The managed directories, public before drafts.
const LOCATIONS: [(Kind, bool); 4] = [
    (Kind::Article, false),
    (Kind::Project, false),
    (Kind::Article, true),
    (Kind::Project, true),
];

fn directory(config: &Config, kind: Kind, draft: bool) -> &Path {
    match (kind, draft) {
        (Kind::Article, false) => &config.articles_directory,
        (Kind::Project, false) => &config.projects_directory,
        (Kind::Article, true) => &config.article_drafts_directory,
        (Kind::Project, true) => &config.project_drafts_directory,
    }
}

/// Lists every document in the managed directories. Directories which don't
/// exist are skipped; documents which can't be read are logged and skipped.
pub fn status(config: &Config) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for &(kind, draft) in LOCATIONS.iter() {
        let dir = directory(config, kind, draft);
        if !dir.is_dir() {
            continue;
        }
        for path in parser::html_files(dir)? {
            if path == config.article_template {
                continue;
            }
            let contents = match read(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable document");
                    continue;
                }
            };
            let document = Html::parse_document(&contents);
            entries.push(Entry {
                kind,
                status: match (draft, article::visibility(&document)) {
                    (true, _) => Status::Private,
                    (false, Visibility::Public) => Status::Public,
                    (false, Visibility::Unlisted) => Status::Unlisted,
                },
                title: article::title(&document),
                path,
            });
        }
    }
    Ok(entries)
}

/// Moves the document at `file` to `status` and returns its new path.
///
/// `file` is either a path into one of the managed directories or a bare
/// file name, which is looked up in them. Going private moves the document
/// into the drafts directory for its kind; going public or unlisted moves it
/// back out if needed and sets its visibility flag.
pub fn set_visibility(config: &Config, file: &Path, status: Status) -> Result<PathBuf> {
    let (path, kind) = locate(config, file)?;
    if path == config.article_template {
        return Err(Error::Reserved(path));
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::NotFound(file.to_owned()))?;
    let target_directory = directory(config, kind, status == Status::Private);
    let target = target_directory.join(file_name);
    if target != path && target.exists() {
        return Err(Error::Exists(target));
    }

    let visibility = match status {
        Status::Public => Some(Visibility::Public),
        Status::Unlisted => Some(Visibility::Unlisted),
        Status::Private => None,
    };
    if let Some(visibility) = visibility {
        let contents = read(&path)?;
        if article::visibility(&Html::parse_document(&contents)) != visibility {
            write(&path, &with_visibility(&contents, visibility))?;
        }
    }

    if target != path {
        fs::create_dir_all(target_directory).map_err(|err| Error::Io {
            path: target_directory.to_owned(),
            err,
        })?;
        fs::rename(&path, &target).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
    }
    info!(path = %target.display(), %status, "set visibility");
    Ok(target)
}

/// Finds the managed directory holding `file`, returning the document's path
/// in that directory and its kind.
fn locate(config: &Config, file: &Path) -> Result<(PathBuf, Kind)> {
    if file.is_file() {
        let parent = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let parent = parent.canonicalize().map_err(|err| Error::Io {
            path: parent.to_owned(),
            err,
        })?;
        for &(kind, draft) in LOCATIONS.iter() {
            let dir = directory(config, kind, draft);
            if dir.canonicalize().ok().as_deref() == Some(parent.as_path()) {
                if let Some(name) = file.file_name() {
                    return Ok((dir.join(name), kind));
                }
            }
        }
        return Err(Error::Unmanaged(file.to_owned()));
    }
    if file.components().count() == 1 {
        for &(kind, draft) in LOCATIONS.iter() {
            let candidate = directory(config, kind, draft).join(file);
            if candidate.is_file() {
                return Ok((candidate, kind));
            }
        }
    }
    Err(Error::NotFound(file.to_owned()))
}

/// Returns `contents` with its visibility flag set for `visibility`: an
/// unlisted document gets `<meta name="visibility" content="unlisted">`
/// (updated in place or added to `<head>`), a public one loses the tag.
pub fn with_visibility(contents: &str, visibility: Visibility) -> String {
    let document = Html::parse_document(contents);
    let flags: Vec<ElementRef> = document_elements(&document)
        .filter(|e| e.value().name() == "meta" && e.value().attr("name") == Some("visibility"))
        .collect();

    let mut rewriter = Rewriter::new();
    match visibility {
        Visibility::Public => {
            for flag in flags {
                rewriter.add(flag, Rewrite::Remove);
            }
        }
        Visibility::Unlisted => match flags.first() {
            Some(flag) => {
                rewriter.add(
                    *flag,
                    Rewrite::SetAttribute(
                        String::from("content"),
                        Some(String::from(Visibility::UNLISTED)),
                    ),
                );
            }
            None => {
                let head = document_elements(&document)
                    .find(|e| e.value().name() == "head")
                    .unwrap_or_else(|| document.root_element());
                rewriter.add(
                    head,
                    Rewrite::Append(format!(
                        r#"<meta name="visibility" content="{}">"#,
                        Visibility::UNLISTED
                    )),
                );
            }
        },
    }
    rewriter.render(&document)
}

/// Creates a draft article from the authoring template and returns its
/// path. The file is named after the slugified title and is never
/// overwritten.
pub fn create_article(config: &Config, draft: &NewArticle) -> Result<PathBuf> {
    let slug = slug::slugify(&draft.title);
    if slug.is_empty() {
        return Err(Error::InvalidTitle(draft.title.clone()));
    }
    if article::date_sort_key(&draft.date) == chrono::NaiveDate::MIN {
        warn!(date = %draft.date, "date doesn't parse; the article will sort last");
    }

    let template = read(&config.article_template)?;
    let contents = render_article(&template, draft, &config.author)?;

    let directory = &config.article_drafts_directory;
    fs::create_dir_all(directory).map_err(|err| Error::Io {
        path: directory.clone(),
        err,
    })?;
    let path = directory.join(format!("{}{}", slug, parser::HTML_EXTENSION));
    let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::Exists(path))
        }
        Err(err) => return Err(Error::Io { path, err }),
    };
    file.write_all(contents.as_bytes())
        .map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
    info!(path = %path.display(), "created draft article");
    Ok(path)
}

/// Fills the authoring template `template` with `draft`.
///
/// Sets `<title>` (suffixed with `| {author}` when there is an author), the
/// description meta and, inside the article body, the `h1` and the
/// `article-meta-small` date line. Everything else in the body is replaced by
/// the rendered markdown.
pub fn render_article(template: &str, draft: &NewArticle, author: &str) -> Result<String> {
    let document = Html::parse_document(template);
    let body = document_elements(&document)
        .find(|e| e.value().classes().any(|c| c == "article-body"))
        .ok_or(Error::MissingArticleBody)?;
    let heading = elements(body).find(|e| e.value().name() == "h1");
    let date_line = elements(body).find(|e| e.value().classes().any(|c| c == "article-meta-small"));
    let date_text = format!("{} {} {}", draft.date, article::DATE_SEPARATOR, READING_TIME);
    let full_title = match author.is_empty() {
        true => draft.title.clone(),
        false => format!("{} {} {}", draft.title, article::TITLE_SEPARATOR, author),
    };

    let mut rewriter = Rewriter::new();
    if let Some(title) = document_elements(&document).find(|e| e.value().name() == "title") {
        rewriter.add(title, Rewrite::ReplaceChildren(html::escape(&full_title)));
    }
    let description = document_elements(&document)
        .find(|e| e.value().name() == "meta" && e.value().attr("name") == Some("description"));
    match description {
        Some(meta) => {
            rewriter.add(
                meta,
                Rewrite::SetAttribute(String::from("content"), Some(draft.description.clone())),
            );
        }
        None => {
            if let Some(head) = document_elements(&document).find(|e| e.value().name() == "head") {
                rewriter.add(
                    head,
                    Rewrite::Append(format!(
                        r#"<meta name="description" content="{}">"#,
                        html::escape(&draft.description)
                    )),
                );
            }
        }
    }

    // Keep the body's children which hold the heading or the date line and
    // drop the rest.
    let keep: Vec<_> = heading.iter().chain(date_line.iter()).map(|e| e.id()).collect();
    for child in body.children().filter_map(ElementRef::wrap) {
        if !elements(child).any(|e| keep.contains(&e.id())) {
            rewriter.add(child, Rewrite::Remove);
        }
    }

    let mut content = String::from("\n");
    match heading {
        Some(heading) => {
            rewriter.add(heading, Rewrite::ReplaceChildren(html::escape(&draft.title)));
        }
        None => content.push_str(&format!("<h1>{}</h1>\n", html::escape(&draft.title))),
    }
    match date_line {
        Some(date_line) => {
            rewriter.add(date_line, Rewrite::ReplaceChildren(html::escape(&date_text)));
        }
        None => content.push_str(&format!(
            "<div class=\"article-meta-small\">{}</div>\n",
            html::escape(&date_text)
        )),
    }
    markdown::to_html(&mut content, &draft.markdown);
    rewriter.add(body, Rewrite::Append(content));
    Ok(rewriter.render(&document))
}

/// Hides or shows the home page section with the id `id`.
pub fn toggle_section(config: &Config, id: &str, hidden: bool) -> Result<()> {
    let contents = read(&config.home_page)?;
    write(&config.home_page, &with_section_hidden(&contents, id, hidden)?)?;
    info!(section = id, hidden, "toggled section");
    Ok(())
}

/// Returns `contents` with the element whose id is `id` hidden (its style
/// set to [`HIDDEN_SECTION_STYLE`]) or shown (its style removed).
pub fn with_section_hidden(contents: &str, id: &str, hidden: bool) -> Result<String> {
    let document = Html::parse_document(contents);
    let section = document_elements(&document)
        .find(|e| e.value().id() == Some(id))
        .ok_or_else(|| Error::MissingSection(id.to_owned()))?;
    let style = match hidden {
        true => Some(String::from(HIDDEN_SECTION_STYLE)),
        false => None,
    };
    let mut rewriter = Rewriter::new();
    rewriter.add(section, Rewrite::SetAttribute(String::from("style"), style));
    Ok(rewriter.render(&document))
}

/// Archives both drafts directories into
/// `{backups_directory}/drafts_backup_{timestamp}.zip` and returns the
/// archive's path.
pub fn backup_drafts(config: &Config) -> Result<PathBuf> {
    let directory = &config.backups_directory;
    fs::create_dir_all(directory).map_err(|err| Error::Io {
        path: directory.clone(),
        err,
    })?;
    let path = directory.join(format!(
        "drafts_backup_{}.zip",
        chrono::Local::now().format(BACKUP_TIMESTAMP_FORMAT)
    ));
    let file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::Exists(path))
        }
        Err(err) => return Err(Error::Io { path, err }),
    };
    let files = archive_drafts(config, file)?;
    info!(path = %path.display(), files, "backed up drafts");
    Ok(path)
}

/// Writes a zip archive of the drafts into `w`: article drafts under
/// `articles/`, project drafts under `projects/`. Missing drafts directories
/// are skipped. Returns the number of files archived.
pub fn archive_drafts<W: Write + Seek>(config: &Config, w: W) -> Result<usize> {
    let mut zip = ZipWriter::new(w);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;
    for &(prefix, directory) in [
        ("articles", &config.article_drafts_directory),
        ("projects", &config.project_drafts_directory),
    ]
    .iter()
    {
        if !directory.is_dir() {
            continue;
        }
        for result in WalkDir::new(directory)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(directory).unwrap_or(entry.path());
            let name = format!(
                "{}/{}",
                prefix,
                relative.to_string_lossy().replace('\\', "/")
            );
            zip.start_file(name, options)?;
            let mut source = fs::File::open(entry.path()).map_err(|err| Error::Io {
                path: entry.path().to_owned(),
                err,
            })?;
            io::copy(&mut source, &mut zip).map_err(|err| Error::Io {
                path: entry.path().to_owned(),
                err,
            })?;
            files += 1;
        }
    }
    zip.finish()?;
    Ok(files)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a failed management operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a file can't be read, written, or moved.
    Io { path: PathBuf, err: io::Error },

    /// Returned when a managed directory can't be listed.
    Scan(ScanError),

    /// Returned when the named document doesn't exist.
    NotFound(PathBuf),

    /// Returned when the document isn't in one of the managed directories.
    Unmanaged(PathBuf),

    /// Returned when asked to move the authoring template.
    Reserved(PathBuf),

    /// Returned instead of overwriting an existing document.
    Exists(PathBuf),

    /// Returned when a title yields an empty file name.
    InvalidTitle(String),

    /// Returned when the authoring template has no `article-body` element.
    MissingArticleBody,

    /// Returned when the home page has no element with the given id.
    MissingSection(String),

    /// Returned when a drafts directory can't be walked.
    Walk(walkdir::Error),

    /// Returned when the backup archive can't be written.
    Archive(zip::result::ZipError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "`{}`: {}", path.display(), err),
            Error::Scan(err) => err.fmt(f),
            Error::NotFound(path) => write!(f, "No such document: `{}`", path.display()),
            Error::Unmanaged(path) => write!(
                f,
                "`{}` is not in an articles, projects, or drafts directory",
                path.display()
            ),
            Error::Reserved(path) => {
                write!(f, "`{}` is the authoring template", path.display())
            }
            Error::Exists(path) => write!(f, "`{}` already exists", path.display()),
            Error::InvalidTitle(title) => {
                write!(f, "Can't make a file name from the title `{}`", title)
            }
            Error::MissingArticleBody => {
                write!(f, "The authoring template has no `article-body` element")
            }
            Error::MissingSection(id) => write!(f, "No section with id `{}`", id),
            Error::Walk(err) => err.fmt(f),
            Error::Archive(err) => write!(f, "Writing backup archive: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Scan(err) => Some(err),
            Error::Walk(err) => Some(err),
            Error::Archive(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScanError> for Error {
    /// Converts [`ScanError`]s into [`Error`]. This allows us to use the `?`
    /// operator when listing directories.
    fn from(err: ScanError) -> Error {
        Error::Scan(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when walking the drafts.
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}

impl From<zip::result::ZipError> for Error {
    /// Converts [`zip::result::ZipError`]s into [`Error`]. This allows us to
    /// use the `?` operator when writing archives.
    fn from(err: zip::result::ZipError) -> Error {
        Error::Archive(err)
    }
}
